use serde_json::Value;

use super::types::RawAnalysis;
use crate::models::enums::{Specialty, Urgency};
use crate::models::AnalysisResult;

pub const DEFAULT_CONFIDENCE: u8 = 50;

pub const DEFAULT_ANALYSIS: &str =
    "Unable to analyze your symptoms at this time. Please consult a healthcare professional.";

pub const DEFAULT_RECOMMENDATIONS: &str =
    "Unable to provide recommendations at this time. Please consult a healthcare professional.";

/// Coerce a loosely shaped analysis into a valid `AnalysisResult`.
pub fn normalize_analysis(raw: RawAnalysis, raw_response: String) -> AnalysisResult {
    AnalysisResult {
        analysis: text_or(RawAnalysis::text(&raw.analysis), DEFAULT_ANALYSIS),
        confidence: normalize_confidence(raw.confidence.as_ref()),
        urgency: normalize_urgency(RawAnalysis::text(&raw.urgency)),
        recommendations: text_or(RawAnalysis::text(&raw.recommendations), DEFAULT_RECOMMENDATIONS),
        possible_conditions: normalize_conditions(raw.possible_conditions),
        recommended_specialty: normalize_specialty(RawAnalysis::text(&raw.recommended_specialty)),
        raw_response,
    }
}

/// Non-string and blank values take the caution default.
fn text_or(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

/// Clamp into 0..=100; missing or non-numeric values become 50.
pub fn normalize_confidence(value: Option<&Value>) -> u8 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => n.round().clamp(0.0, 100.0) as u8,
        _ => DEFAULT_CONFIDENCE,
    }
}

/// Unknown urgency labels become `routine`.
pub fn normalize_urgency(value: Option<&str>) -> Urgency {
    value
        .and_then(|v| v.trim().to_lowercase().parse().ok())
        .unwrap_or(Urgency::Routine)
}

/// Non-list values become an empty list; non-string members are dropped.
pub fn normalize_conditions(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        _ => vec![],
    }
}

/// Labels outside the catalog become General Medicine.
pub fn normalize_specialty(value: Option<&str>) -> Specialty {
    value
        .and_then(Specialty::from_label)
        .unwrap_or(Specialty::GeneralMedicine)
}

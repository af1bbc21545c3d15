use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AnalysisSource, Specialty, Urgency};

/// Normalized outcome of one symptom analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis: String,
    /// Always within 0..=100.
    pub confidence: u8,
    pub urgency: Urgency,
    pub recommendations: String,
    pub possible_conditions: Vec<String>,
    pub recommended_specialty: Specialty,
    /// Upstream text, or the marked fallback serialization.
    pub raw_response: String,
}

/// An `AnalysisResult` together with the path that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub source: AnalysisSource,
}

/// A persisted analysis row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    pub id: Uuid,
    pub report_id: Uuid,
    pub result: AnalysisResult,
    pub source: AnalysisSource,
    pub created_at: NaiveDateTime,
}

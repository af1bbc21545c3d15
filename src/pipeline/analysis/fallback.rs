//! Keyword fallback classifier.
//!
//! Used whenever the upstream model cannot produce an analysis. Pure and
//! total: every description, including nonsense, maps to a result.
//!
//! `FALLBACK_RULES` is evaluated top-down and the first rule with any
//! matching keyword wins. The order is load-bearing: specific rules must
//! stay above the generic ones that share words with them (chest pain above
//! joint pain above bare "pain"). Keep this in mind when inserting rules.

use serde::Serialize;
use serde_json::Value;

use super::types::RawAnalysis;
use crate::models::enums::{Severity, Specialty, Urgency};

/// Prefix that marks `raw_response` as produced by this classifier.
pub const FALLBACK_MARKER: &str = "[fallback-engine:keyword-rules]";

const MATCHED_CONFIDENCE: u8 = 70;
const UNMATCHED_CONFIDENCE: u8 = 50;

pub struct FallbackRule {
    pub keywords: &'static [&'static str],
    pub specialty: Specialty,
    pub urgency: Urgency,
    pub analysis: &'static str,
}

impl FallbackRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

pub static FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        keywords: &[
            "unconscious",
            "not breathing",
            "severe bleeding",
            "heavy bleeding",
            "overdose",
            "suicid",
            "choking",
        ],
        specialty: Specialty::EmergencyMedicine,
        urgency: Urgency::Emergency,
        analysis: "Your description includes signs that may need immediate emergency care.",
    },
    FallbackRule {
        keywords: &[
            "chest pain",
            "chest tightness",
            "chest pressure",
            "heart attack",
            "heartbeat",
            "palpitation",
            "heart racing",
        ],
        specialty: Specialty::Cardiology,
        urgency: Urgency::Emergency,
        analysis: "Chest or heart-related symptoms can indicate a cardiovascular problem and should be checked promptly.",
    },
    FallbackRule {
        keywords: &[
            "seizure",
            "numbness",
            "slurred speech",
            "migraine",
            "headache",
            "dizz",
            "tingling",
            "memory loss",
            "faint",
        ],
        specialty: Specialty::Neurology,
        urgency: Urgency::Urgent,
        analysis: "Your symptoms may involve the nervous system and are worth a neurological assessment.",
    },
    FallbackRule {
        keywords: &[
            "shortness of breath",
            "difficulty breathing",
            "wheez",
            "asthma",
            "persistent cough",
            "coughing blood",
        ],
        specialty: Specialty::Pulmonology,
        urgency: Urgency::Urgent,
        analysis: "Breathing-related symptoms suggest an assessment of your lungs and airways.",
    },
    FallbackRule {
        keywords: &[
            "heartburn",
            "acid reflux",
            "stomach",
            "abdominal",
            "nausea",
            "vomit",
            "diarrh",
            "constipat",
            "bloat",
        ],
        specialty: Specialty::Gastroenterology,
        urgency: Urgency::Routine,
        analysis: "Your symptoms point to the digestive system.",
    },
    FallbackRule {
        keywords: &["rash", "skin", "itch", "acne", "eczema", "hives", "mole", "blister"],
        specialty: Specialty::Dermatology,
        urgency: Urgency::Routine,
        analysis: "Your symptoms appear to be skin-related and can be evaluated by a dermatologist.",
    },
    FallbackRule {
        keywords: &["eye", "vision", "blurred", "blurry", "conjunctivitis"],
        specialty: Specialty::Ophthalmology,
        urgency: Urgency::Routine,
        analysis: "Eye or vision symptoms are best examined by an eye specialist.",
    },
    FallbackRule {
        keywords: &[
            "earache",
            "ear pain",
            "ear infection",
            "hearing",
            "sore throat",
            "tonsil",
            "sinus",
            "nasal",
            "nosebleed",
        ],
        specialty: Specialty::Ent,
        urgency: Urgency::Routine,
        analysis: "Ear, nose or throat symptoms can be assessed by an ENT specialist.",
    },
    FallbackRule {
        keywords: &["tooth", "teeth", "gums", "dental", "jaw"],
        specialty: Specialty::Dentistry,
        urgency: Urgency::Routine,
        analysis: "Your symptoms appear to be dental and can be checked by a dentist.",
    },
    FallbackRule {
        keywords: &["urin", "bladder", "kidney", "prostate"],
        specialty: Specialty::Urology,
        urgency: Urgency::Routine,
        analysis: "Urinary or kidney-related symptoms can be evaluated by a urologist.",
    },
    FallbackRule {
        keywords: &["pregnan", "menstrua", "period pain", "vaginal", "pelvic", "ovar"],
        specialty: Specialty::Gynecology,
        urgency: Urgency::Routine,
        analysis: "Your symptoms may relate to reproductive health and can be assessed by a gynecologist.",
    },
    FallbackRule {
        keywords: &["child", "baby", "infant", "toddler", "my son", "my daughter"],
        specialty: Specialty::Pediatrics,
        urgency: Urgency::Routine,
        analysis: "Symptoms in children are best assessed by a pediatrician.",
    },
    FallbackRule {
        keywords: &["anxiety", "anxious", "depress", "panic", "insomnia", "stress", "mood"],
        specialty: Specialty::Psychiatry,
        urgency: Urgency::Routine,
        analysis: "Your description suggests emotional or mental health concerns that a mental health professional can help with.",
    },
    FallbackRule {
        keywords: &["thyroid", "diabet", "blood sugar", "excessive thirst", "hormon"],
        specialty: Specialty::Endocrinology,
        urgency: Urgency::Routine,
        analysis: "Your symptoms may be related to hormones or metabolism.",
    },
    FallbackRule {
        keywords: &[
            "joint",
            "back pain",
            "fracture",
            "bone",
            "sprain",
            "knee",
            "shoulder",
            "muscle",
        ],
        specialty: Specialty::Orthopedics,
        urgency: Urgency::Routine,
        analysis: "Your symptoms appear to involve bones, joints or muscles.",
    },
    FallbackRule {
        keywords: &["fever", "flu", "cold", "fatigue", "tired", "pain", "cough"],
        specialty: Specialty::GeneralMedicine,
        urgency: Urgency::Routine,
        analysis: "Your symptoms are common and can be assessed by a general practitioner.",
    },
];

const UNMATCHED_ANALYSIS: &str = "We could not match your symptoms to a specific area. \
A general practitioner can assess them and refer you if needed.";

/// Fully populated result of the keyword classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackAnalysis {
    pub analysis: String,
    pub confidence: u8,
    pub urgency: Urgency,
    pub recommendations: String,
    pub possible_conditions: Vec<String>,
    pub recommended_specialty: Specialty,
}

/// Classify a description without any I/O.
pub fn classify_symptoms(description: &str, severity: Severity) -> FallbackAnalysis {
    let lowered = description.to_lowercase();
    let matched = FALLBACK_RULES.iter().find(|rule| rule.matches(&lowered));

    let (specialty, base_urgency, analysis, confidence) = match matched {
        Some(rule) => (rule.specialty, rule.urgency, rule.analysis, MATCHED_CONFIDENCE),
        None => (
            Specialty::GeneralMedicine,
            Urgency::Routine,
            UNMATCHED_ANALYSIS,
            UNMATCHED_CONFIDENCE,
        ),
    };

    let urgency = match (severity, matched) {
        (Severity::Severe, Some(_)) => Urgency::Emergency,
        (Severity::Severe, None) => Urgency::Urgent,
        _ => base_urgency,
    };

    FallbackAnalysis {
        analysis: analysis.to_string(),
        confidence,
        urgency,
        recommendations: recommendations_for(specialty, urgency),
        possible_conditions: vec![
            format!("Potential {} Condition", specialty.as_str()),
            "Inflammation".to_string(),
            "Infection".to_string(),
        ],
        recommended_specialty: specialty,
    }
}

fn recommendations_for(specialty: Specialty, urgency: Urgency) -> String {
    let lead = match urgency {
        Urgency::Emergency => "Seek emergency care immediately or call your local emergency number.",
        Urgency::Urgent => "Book an appointment as soon as possible, ideally within 24 hours.",
        Urgency::Routine => "Book a routine appointment and monitor your symptoms.",
    };
    format!(
        "{lead} We recommend consulting a {} specialist. This is an automated suggestion, \
         not a diagnosis; please consult a healthcare professional.",
        specialty.as_str()
    )
}

/// `raw_response` text recorded for a fallback result.
pub fn fallback_raw_response(fallback: &FallbackAnalysis) -> String {
    let json = serde_json::to_string(fallback).unwrap_or_default();
    format!("{FALLBACK_MARKER} {json}")
}

impl From<FallbackAnalysis> for RawAnalysis {
    fn from(f: FallbackAnalysis) -> Self {
        RawAnalysis {
            analysis: Some(Value::from(f.analysis)),
            confidence: Some(Value::from(f.confidence)),
            urgency: Some(Value::from(f.urgency.as_str())),
            recommendations: Some(Value::from(f.recommendations)),
            possible_conditions: Some(Value::from(f.possible_conditions)),
            recommended_specialty: Some(Value::from(f.recommended_specialty.as_str())),
        }
    }
}

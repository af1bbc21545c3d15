//! Symptom triage: the caller side of the analysis pipeline.
//!
//! intake → persist report → analyze → persist analysis → practitioner match

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{
    find_practitioner_by_specialty, get_analysis_for_report, get_symptom_report,
    insert_symptom_analysis, insert_symptom_report,
};
use crate::db::DatabaseError;
use crate::models::enums::{AnalysisSource, Severity};
use crate::models::{
    AnalysisResult, IntakeError, Practitioner, StoredAnalysis, StoredSymptomReport, SymptomImage,
    SymptomReport,
};
use crate::pipeline::analysis::SymptomAnalyzer;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Symptom report not found: {0}")]
    ReportNotFound(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Raw intake form as submitted by a patient.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomSubmission {
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
    /// Bare base64 or a `data:` URI.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_mime_type: Option<String>,
}

impl SymptomSubmission {
    /// Validate the form into a report.
    pub fn into_report(self) -> Result<SymptomReport, IntakeError> {
        let image = match self.image.as_deref().map(str::trim) {
            Some(payload) if !payload.is_empty() => {
                let mime = self.image_mime_type.as_deref().unwrap_or("image/jpeg");
                Some(SymptomImage::from_base64(payload, mime)?)
            }
            _ => None,
        };
        SymptomReport::new(
            &self.description,
            self.severity,
            self.duration.as_deref(),
            self.additional_notes.as_deref(),
            image,
        )
    }
}

/// Result of a triage submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageOutcome {
    pub report_id: Uuid,
    pub result: AnalysisResult,
    pub source: AnalysisSource,
    /// Suggested practitioner, when the directory has one.
    pub practitioner: Option<Practitioner>,
}

/// A stored report with its latest analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageRecord {
    pub report: StoredSymptomReport,
    pub analysis: Option<StoredAnalysis>,
}

/// Run a submission through intake, analysis and practitioner matching.
pub fn submit_symptoms(
    conn: &Connection,
    analyzer: &SymptomAnalyzer,
    submission: SymptomSubmission,
) -> Result<TriageOutcome, TriageError> {
    let report = submission.into_report()?;
    insert_symptom_report(conn, &report)?;

    let outcome = analyzer.analyze(&report);

    insert_symptom_analysis(
        conn,
        &StoredAnalysis {
            id: Uuid::new_v4(),
            report_id: report.id,
            result: outcome.result.clone(),
            source: outcome.source,
            created_at: Utc::now().naive_utc(),
        },
    )?;

    let practitioner = find_practitioner_by_specialty(conn, outcome.result.recommended_specialty)?;

    tracing::info!(
        report_id = %report.id,
        source = outcome.source.as_str(),
        urgency = outcome.result.urgency.as_str(),
        specialty = outcome.result.recommended_specialty.as_str(),
        matched_practitioner = practitioner.is_some(),
        "Triage completed"
    );

    Ok(TriageOutcome {
        report_id: report.id,
        result: outcome.result,
        source: outcome.source,
        practitioner,
    })
}

pub fn get_triage(conn: &Connection, report_id: &Uuid) -> Result<TriageRecord, TriageError> {
    let report =
        get_symptom_report(conn, report_id)?.ok_or(TriageError::ReportNotFound(*report_id))?;
    let analysis = get_analysis_for_report(conn, report_id)?;
    Ok(TriageRecord { report, analysis })
}

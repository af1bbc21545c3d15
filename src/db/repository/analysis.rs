use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::enums::{AnalysisSource, Specialty, Urgency};
use crate::models::{AnalysisResult, StoredAnalysis};

pub fn insert_symptom_analysis(
    conn: &Connection,
    analysis: &StoredAnalysis,
) -> Result<(), DatabaseError> {
    let conditions = serde_json::to_string(&analysis.result.possible_conditions)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    conn.execute(
        "INSERT INTO symptom_analyses (id, report_id, analysis, confidence, urgency,
         recommendations, possible_conditions, recommended_specialty, raw_response, source, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            analysis.id.to_string(),
            analysis.report_id.to_string(),
            analysis.result.analysis,
            analysis.result.confidence,
            analysis.result.urgency.as_str(),
            analysis.result.recommendations,
            conditions,
            analysis.result.recommended_specialty.as_str(),
            analysis.result.raw_response,
            analysis.source.as_str(),
            analysis.created_at,
        ],
    )?;
    Ok(())
}

type AnalysisRow = (
    String, String, String, u8, String, String,
    String, String, String, String, NaiveDateTime,
);

/// Most recent analysis recorded for a report.
pub fn get_analysis_for_report(
    conn: &Connection,
    report_id: &Uuid,
) -> Result<Option<StoredAnalysis>, DatabaseError> {
    let row: Option<AnalysisRow> = conn
        .query_row(
            "SELECT id, report_id, analysis, confidence, urgency, recommendations,
             possible_conditions, recommended_specialty, raw_response, source, created_at
             FROM symptom_analyses WHERE report_id = ?1
             ORDER BY created_at DESC LIMIT 1",
            params![report_id.to_string()],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                ))
            },
        )
        .optional()?;

    let Some((
        id, report_id, analysis, confidence, urgency, recommendations,
        conditions, specialty, raw_response, source, created_at,
    )) = row
    else {
        return Ok(None);
    };

    let possible_conditions: Vec<String> = serde_json::from_str(&conditions)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    Ok(Some(StoredAnalysis {
        id: parse_uuid(&id)?,
        report_id: parse_uuid(&report_id)?,
        result: AnalysisResult {
            analysis,
            confidence,
            urgency: Urgency::from_str(&urgency)?,
            recommendations,
            possible_conditions,
            recommended_specialty: Specialty::from_str(&specialty)?,
            raw_response,
        },
        source: AnalysisSource::from_str(&source)?,
        created_at,
    }))
}

use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::enums::Severity;
use crate::models::{StoredSymptomReport, SymptomReport};

/// Persist an intake report. Only the image's MIME type and size are kept.
pub fn insert_symptom_report(conn: &Connection, report: &SymptomReport) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO symptom_reports (id, description, severity, duration, additional_notes,
         image_mime_type, image_size, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            report.id.to_string(),
            report.description,
            report.severity.as_str(),
            report.duration,
            report.additional_notes,
            report.image.as_ref().map(|i| i.mime_type.as_str()),
            report.image.as_ref().map(|i| i.data.len() as i64),
            report.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_symptom_report(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<StoredSymptomReport>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, description, severity, duration, additional_notes,
             image_mime_type, image_size, created_at
             FROM symptom_reports WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                    row.get::<_, chrono::NaiveDateTime>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((id, description, severity, duration, additional_notes, mime, size, created_at)) = row
    else {
        return Ok(None);
    };

    Ok(Some(StoredSymptomReport {
        id: parse_uuid(&id)?,
        description,
        severity: Severity::from_str(&severity)?,
        duration,
        additional_notes,
        image_mime_type: mime,
        image_size: size,
        created_at,
    }))
}

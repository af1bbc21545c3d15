use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{parse_optional_uuid, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::QueueEntryStatus;
use crate::models::QueueEntry;

const QUEUE_COLUMNS: &str =
    "id, clinic_id, patient_id, patient_name, ticket_number, status, joined_at, served_at";

pub fn insert_queue_entry(conn: &Connection, entry: &QueueEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO queue_entries (id, clinic_id, patient_id, patient_name, ticket_number,
         status, joined_at, served_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id.to_string(),
            entry.clinic_id.to_string(),
            entry.patient_id.map(|id| id.to_string()),
            entry.patient_name,
            entry.ticket_number,
            entry.status.as_str(),
            entry.joined_at,
            entry.served_at,
        ],
    )?;
    Ok(())
}

/// Next ticket number for a clinic; numbering starts at 1.
pub fn next_ticket_number(conn: &Connection, clinic_id: &Uuid) -> Result<u32, DatabaseError> {
    let max: u32 = conn.query_row(
        "SELECT COALESCE(MAX(ticket_number), 0) FROM queue_entries WHERE clinic_id = ?1",
        params![clinic_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(max + 1)
}

/// Waiting entries holding a ticket lower than `ticket_number`.
pub fn count_waiting_before(
    conn: &Connection,
    clinic_id: &Uuid,
    ticket_number: u32,
) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM queue_entries
         WHERE clinic_id = ?1 AND status = 'waiting' AND ticket_number < ?2",
        params![clinic_id.to_string(), ticket_number],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Waiting entries for a clinic, oldest ticket first.
pub fn list_waiting_entries(
    conn: &Connection,
    clinic_id: &Uuid,
) -> Result<Vec<QueueEntry>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {QUEUE_COLUMNS} FROM queue_entries
         WHERE clinic_id = ?1 AND status = 'waiting' ORDER BY ticket_number"
    ))?;
    let rows = stmt.query_map(params![clinic_id.to_string()], read_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(into_entry(row?)?);
    }
    Ok(entries)
}

pub fn get_queue_entry(conn: &Connection, id: &Uuid) -> Result<Option<QueueEntry>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {QUEUE_COLUMNS} FROM queue_entries WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;
    row.map(into_entry).transpose()
}

/// Mark an entry served. Returns false when it was not waiting.
pub fn mark_entry_served(
    conn: &Connection,
    id: &Uuid,
    served_at: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE queue_entries SET status = 'served', served_at = ?2
         WHERE id = ?1 AND status = 'waiting'",
        params![id.to_string(), served_at],
    )?;
    Ok(updated == 1)
}

type QueueRow = (
    String, String, Option<String>, String, u32, String,
    NaiveDateTime, Option<NaiveDateTime>,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<QueueRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn into_entry(row: QueueRow) -> Result<QueueEntry, DatabaseError> {
    let (id, clinic_id, patient_id, patient_name, ticket_number, status, joined_at, served_at) =
        row;
    Ok(QueueEntry {
        id: parse_uuid(&id)?,
        clinic_id: parse_uuid(&clinic_id)?,
        patient_id: parse_optional_uuid(patient_id)?,
        patient_name,
        ticket_number,
        status: QueueEntryStatus::from_str(&status)?,
        joined_at,
        served_at,
    })
}

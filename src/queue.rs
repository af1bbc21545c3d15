//! Digital clinic queue: joining, status, serving, wait estimates.
//!
//! Ticket numbers are allocated per clinic starting at 1. A patient's
//! position counts the waiting tickets issued before theirs, so serving
//! someone moves everyone behind them forward.

use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{
    count_waiting_before, get_clinic, get_patient, insert_queue_entry, list_waiting_entries,
    mark_entry_served, next_ticket_number,
};
use crate::db::DatabaseError;
use crate::models::enums::QueueEntryStatus;
use crate::models::{Clinic, QueueEntry};

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Clinic not found: {0}")]
    ClinicNotFound(Uuid),

    #[error("Patient not found: {0}")]
    PatientNotFound(Uuid),

    #[error("Patient name must not be empty")]
    InvalidName,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for QueueError {
    fn from(e: rusqlite::Error) -> Self {
        QueueError::Database(DatabaseError::Sqlite(e))
    }
}

// ─── Types ────────────────────────────────────────────────────────────────────

/// Issued to a patient who joins a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTicket {
    pub entry_id: Uuid,
    pub ticket_number: u32,
    /// 1-based place in line.
    pub position: u32,
    pub estimated_wait_minutes: u32,
}

/// Snapshot of a clinic's queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub clinic: Clinic,
    pub waiting: Vec<QueueEntry>,
    /// Expected wait for someone joining now.
    pub estimated_wait_minutes: u32,
}

// ─── Operations ───────────────────────────────────────────────────────────────

/// Minutes until a patient with `people_ahead` waiting before them is seen.
pub fn estimate_wait_minutes(people_ahead: u32, avg_consult_minutes: u32) -> u32 {
    people_ahead.saturating_mul(avg_consult_minutes)
}

fn require_clinic(conn: &Connection, clinic_id: &Uuid) -> Result<Clinic, QueueError> {
    get_clinic(conn, clinic_id)?.ok_or(QueueError::ClinicNotFound(*clinic_id))
}

/// Add a patient to the clinic's queue and hand back their ticket.
pub fn join_queue(
    conn: &Connection,
    clinic_id: &Uuid,
    patient_name: &str,
    patient_id: Option<Uuid>,
) -> Result<QueueTicket, QueueError> {
    let patient_name = patient_name.trim();
    if patient_name.is_empty() {
        return Err(QueueError::InvalidName);
    }

    let clinic = require_clinic(conn, clinic_id)?;
    if let Some(pid) = patient_id {
        if get_patient(conn, &pid)?.is_none() {
            return Err(QueueError::PatientNotFound(pid));
        }
    }

    // Take the write lock before reading the next ticket number so concurrent
    // joins wait on busy_timeout instead of failing on lock upgrade.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let entry = QueueEntry {
        id: Uuid::new_v4(),
        clinic_id: clinic.id,
        patient_id,
        patient_name: patient_name.to_string(),
        ticket_number: next_ticket_number(&tx, &clinic.id)?,
        status: QueueEntryStatus::Waiting,
        joined_at: Utc::now().naive_utc(),
        served_at: None,
    };
    insert_queue_entry(&tx, &entry)?;
    let ahead = count_waiting_before(&tx, &clinic.id, entry.ticket_number)?;
    tx.commit()?;

    tracing::info!(
        clinic_id = %clinic.id,
        ticket = entry.ticket_number,
        ahead,
        "Patient joined queue"
    );

    Ok(QueueTicket {
        entry_id: entry.id,
        ticket_number: entry.ticket_number,
        position: ahead + 1,
        estimated_wait_minutes: estimate_wait_minutes(ahead, clinic.avg_consult_minutes),
    })
}

pub fn queue_status(conn: &Connection, clinic_id: &Uuid) -> Result<QueueStatus, QueueError> {
    let clinic = require_clinic(conn, clinic_id)?;
    let waiting = list_waiting_entries(conn, &clinic.id)?;
    let ahead = u32::try_from(waiting.len()).unwrap_or(u32::MAX);
    let estimated_wait_minutes = estimate_wait_minutes(ahead, clinic.avg_consult_minutes);

    Ok(QueueStatus {
        clinic,
        waiting,
        estimated_wait_minutes,
    })
}

/// Mark the oldest waiting entry served. `None` when nobody is waiting.
pub fn serve_next(conn: &Connection, clinic_id: &Uuid) -> Result<Option<QueueEntry>, QueueError> {
    let clinic = require_clinic(conn, clinic_id)?;
    let Some(mut next) = list_waiting_entries(conn, &clinic.id)?.into_iter().next() else {
        return Ok(None);
    };

    let served_at = Utc::now().naive_utc();
    if !mark_entry_served(conn, &next.id, served_at)? {
        // Served concurrently by another desk.
        return Ok(None);
    }
    next.status = QueueEntryStatus::Served;
    next.served_at = Some(served_at);

    tracing::info!(clinic_id = %clinic.id, ticket = next.ticket_number, "Served next patient");
    Ok(Some(next))
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::QueueEntryStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    /// Average consultation length used for wait estimates.
    pub avg_consult_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub patient_name: String,
    pub ticket_number: u32,
    pub status: QueueEntryStatus,
    pub joined_at: NaiveDateTime,
    pub served_at: Option<NaiveDateTime>,
}

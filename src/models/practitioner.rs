use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Specialty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    pub id: Uuid,
    pub name: String,
    pub specialty: Specialty,
    pub clinic_id: Option<Uuid>,
    pub phone: Option<String>,
    pub available: bool,
}

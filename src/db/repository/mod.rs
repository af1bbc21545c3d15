//! Repository layer: entity-scoped database operations.

mod analysis;
mod clinic;
mod patient;
mod practitioner;
mod queue_entry;
mod symptom_report;

use uuid::Uuid;

use super::DatabaseError;

pub use analysis::*;
pub use clinic::*;
pub use patient::*;
pub use practitioner::*;
pub use queue_entry::*;
pub use symptom_report::*;

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_optional_uuid(value: Option<String>) -> Result<Option<Uuid>, DatabaseError> {
    value.as_deref().map(parse_uuid).transpose()
}

//! API endpoint handlers, grouped by resource.

pub mod clinics;
pub mod health;
pub mod patients;
pub mod practitioners;
pub mod symptoms;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a path identifier.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}

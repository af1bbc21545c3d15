use base64::Engine as _;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::enums::Severity;

/// Largest image accepted with a symptom report (10 MiB decoded).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Symptom description cannot be empty")]
    EmptyDescription,

    #[error("Image too large ({0} bytes), maximum is 10 MiB")]
    ImageTooLarge(usize),

    #[error("Image payload is not valid base64: {0}")]
    InvalidImage(String),
}

/// An image attached to a symptom report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl SymptomImage {
    /// Decode an uploaded image. Accepts bare base64 or a
    /// `data:<mime>;base64,` URI, whose MIME type wins over `mime_type`.
    pub fn from_base64(payload: &str, mime_type: &str) -> Result<Self, IntakeError> {
        let (mime, encoded) = match split_data_uri(payload) {
            Some((uri_mime, rest)) => (uri_mime.to_string(), rest),
            None => (mime_type.to_string(), payload.trim()),
        };
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| IntakeError::InvalidImage(e.to_string()))?;
        Ok(Self {
            mime_type: mime,
            data,
        })
    }
}

/// Split `data:image/png;base64,AAAA` into (`image/png`, `AAAA`).
pub(crate) fn split_data_uri(payload: &str) -> Option<(&str, &str)> {
    let rest = payload.trim().strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime = meta.split(';').next().unwrap_or("");
    Some((mime, data))
}

/// Patient-supplied symptom input. Immutable once built.
#[derive(Debug, Clone)]
pub struct SymptomReport {
    pub id: Uuid,
    pub description: String,
    pub severity: Severity,
    pub duration: Option<String>,
    pub additional_notes: Option<String>,
    pub image: Option<SymptomImage>,
    pub created_at: NaiveDateTime,
}

impl SymptomReport {
    pub fn new(
        description: &str,
        severity: Severity,
        duration: Option<&str>,
        additional_notes: Option<&str>,
        image: Option<SymptomImage>,
    ) -> Result<Self, IntakeError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(IntakeError::EmptyDescription);
        }
        if let Some(img) = &image {
            if img.data.len() > MAX_IMAGE_BYTES {
                return Err(IntakeError::ImageTooLarge(img.data.len()));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            description: description.to_string(),
            severity,
            duration: non_blank(duration),
            additional_notes: non_blank(additional_notes),
            image,
            created_at: Utc::now().naive_utc(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Stored form of a report; image bytes are not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSymptomReport {
    pub id: Uuid,
    pub description: String,
    pub severity: Severity,
    pub duration: Option<String>,
    pub additional_notes: Option<String>,
    pub image_mime_type: Option<String>,
    pub image_size: Option<i64>,
    pub created_at: NaiveDateTime,
}

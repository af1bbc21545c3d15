//! Basic patient profiles and the QR code handed to the patient for check-in.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{get_patient, insert_patient};
use crate::db::DatabaseError;
use crate::models::Patient;

/// Prefix of the payload encoded in a patient QR code.
pub const PATIENT_QR_PREFIX: &str = "carequeue:patient:";

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient name must not be empty")]
    InvalidName,

    #[error("Patient not found: {0}")]
    NotFound(Uuid),

    #[error("QR generation failed: {0}")]
    QrCode(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub fn create_patient(
    conn: &Connection,
    full_name: &str,
    phone: Option<&str>,
) -> Result<Patient, PatientError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(PatientError::InvalidName);
    }

    let patient = Patient {
        id: Uuid::new_v4(),
        full_name: full_name.to_string(),
        phone: phone.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string),
        created_at: Utc::now().naive_utc(),
    };
    insert_patient(conn, &patient)?;
    tracing::info!(patient_id = %patient.id, "Patient profile created");
    Ok(patient)
}

/// Text carried by the patient's QR code.
pub fn patient_qr_payload(id: &Uuid) -> String {
    format!("{PATIENT_QR_PREFIX}{id}")
}

/// Render a patient's QR code as an SVG document.
pub fn patient_qr_svg(conn: &Connection, id: &Uuid) -> Result<String, PatientError> {
    let patient = get_patient(conn, id)?.ok_or(PatientError::NotFound(*id))?;
    generate_qr_code(&patient_qr_payload(&patient.id))
}

/// Generate a QR code as an SVG string.
fn generate_qr_code(payload: &str) -> Result<String, PatientError> {
    use qrcode::render::svg;
    use qrcode::QrCode;

    let code = QrCode::new(payload.as_bytes()).map_err(|e| PatientError::QrCode(e.to_string()))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .max_dimensions(300, 300)
        .dark_color(svg::Color("#1c1917"))
        .light_color(svg::Color("#ffffff"))
        .quiet_zone(true)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn create_trims_fields() {
        let conn = open_memory_database().unwrap();
        let patient = create_patient(&conn, "  Amina Yusuf ", Some("  ")).unwrap();
        assert_eq!(patient.full_name, "Amina Yusuf");
        assert_eq!(patient.phone, None);
        assert_eq!(get_patient(&conn, &patient.id).unwrap().unwrap(), patient);
    }

    #[test]
    fn blank_name_rejected() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            create_patient(&conn, "", None),
            Err(PatientError::InvalidName)
        ));
    }

    #[test]
    fn qr_payload_names_patient() {
        let id = Uuid::nil();
        assert_eq!(
            patient_qr_payload(&id),
            "carequeue:patient:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn qr_svg_renders_for_known_patient() {
        let conn = open_memory_database().unwrap();
        let patient = create_patient(&conn, "Amina Yusuf", Some("+254700000000")).unwrap();
        let svg = patient_qr_svg(&conn, &patient.id).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#1c1917"));
    }

    #[test]
    fn qr_for_unknown_patient_is_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            patient_qr_svg(&conn, &Uuid::new_v4()),
            Err(PatientError::NotFound(_))
        ));
    }
}

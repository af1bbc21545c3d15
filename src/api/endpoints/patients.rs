//! Patient profile endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Patient;
use crate::patient;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(body) = payload?;
    let conn = ctx.core.open_db()?;
    let created = patient::create_patient(&conn, &body.full_name, body.phone.as_deref())?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/patients/:id/qr` - SVG QR code for check-in.
pub async fn qr(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let patient_id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let svg = patient::patient_qr_svg(&conn, &patient_id)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

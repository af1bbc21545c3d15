//! Clinic and queue endpoints.
//!
//! - `GET /api/clinics`, `POST /api/clinics`
//! - `GET /api/clinics/:id/queue` - queue snapshot
//! - `POST /api/clinics/:id/queue` - join the queue
//! - `POST /api/clinics/:id/queue/next` - serve the next patient

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{insert_clinic, list_clinics};
use crate::models::{Clinic, QueueEntry};
use crate::queue::{self, QueueStatus, QueueTicket};

/// Average consultation length assumed when a clinic does not state one.
const DEFAULT_CONSULT_MINUTES: u32 = 15;

/// `GET /api/clinics`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Clinic>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(list_clinics(&conn)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClinic {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub avg_consult_minutes: Option<u32>,
}

/// `POST /api/clinics`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewClinic>, JsonRejection>,
) -> Result<(StatusCode, Json<Clinic>), ApiError> {
    let Json(body) = payload?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Clinic name must not be empty".into()));
    }
    let avg_consult_minutes = body.avg_consult_minutes.unwrap_or(DEFAULT_CONSULT_MINUTES);
    if avg_consult_minutes == 0 {
        return Err(ApiError::BadRequest(
            "avgConsultMinutes must be greater than zero".into(),
        ));
    }

    let clinic = Clinic {
        id: Uuid::new_v4(),
        name: name.to_string(),
        address: body.address,
        avg_consult_minutes,
    };
    let conn = ctx.core.open_db()?;
    insert_clinic(&conn, &clinic)?;

    Ok((StatusCode::CREATED, Json(clinic)))
}

/// `GET /api/clinics/:id/queue`
pub async fn queue_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<QueueStatus>, ApiError> {
    let clinic_id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(queue::queue_status(&conn, &clinic_id)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub patient_name: String,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
}

/// `POST /api/clinics/:id/queue`
pub async fn join(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QueueTicket>), ApiError> {
    let clinic_id = parse_id(&id)?;
    let Json(body) = payload?;
    let conn = ctx.core.open_db()?;
    let ticket = queue::join_queue(&conn, &clinic_id, &body.patient_name, body.patient_id)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[derive(Serialize)]
pub struct ServeNextResponse {
    pub served: Option<QueueEntry>,
}

/// `POST /api/clinics/:id/queue/next`
pub async fn serve_next(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ServeNextResponse>, ApiError> {
    let clinic_id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let served = queue::serve_next(&conn, &clinic_id)?;
    Ok(Json(ServeNextResponse { served }))
}

//! Practitioner directory endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{get_clinic, insert_practitioner, list_practitioners};
use crate::models::enums::Specialty;
use crate::models::Practitioner;

#[derive(Deserialize)]
pub struct PractitionerQuery {
    pub specialty: Option<String>,
}

fn parse_specialty(label: &str) -> Result<Specialty, ApiError> {
    Specialty::from_label(label)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown specialty: {label}")))
}

/// `GET /api/practitioners?specialty=Cardiology`
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<PractitionerQuery>, QueryRejection>,
) -> Result<Json<Vec<Practitioner>>, ApiError> {
    let Query(query) = query?;
    let specialty = query.specialty.as_deref().map(parse_specialty).transpose()?;

    let conn = ctx.core.open_db()?;
    Ok(Json(list_practitioners(&conn, specialty)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPractitioner {
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub clinic_id: Option<Uuid>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// `POST /api/practitioners` - register a practitioner.
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewPractitioner>, JsonRejection>,
) -> Result<(StatusCode, Json<Practitioner>), ApiError> {
    let Json(body) = payload?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Practitioner name must not be empty".into()));
    }

    let conn = ctx.core.open_db()?;
    if let Some(clinic_id) = body.clinic_id {
        if get_clinic(&conn, &clinic_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Clinic not found: {clinic_id}")));
        }
    }

    let practitioner = Practitioner {
        id: Uuid::new_v4(),
        name: name.to_string(),
        specialty: parse_specialty(&body.specialty)?,
        clinic_id: body.clinic_id,
        phone: body.phone,
        available: true,
    };
    insert_practitioner(&conn, &practitioner)?;

    Ok((StatusCode::CREATED, Json(practitioner)))
}

//! Symptom triage endpoints.
//!
//! - `POST /api/symptoms/analyze` - submit symptoms, get an analysis
//! - `GET /api/symptoms/:id` - stored report with its analysis

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::triage::{self, SymptomSubmission, TriageOutcome, TriageRecord};

/// `POST /api/symptoms/analyze`
///
/// The analyzer blocks (upstream HTTP and retry pauses), so the whole
/// submission runs on the blocking pool.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SymptomSubmission>, JsonRejection>,
) -> Result<Json<TriageOutcome>, ApiError> {
    let Json(submission) = payload?;

    let core = ctx.core.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<TriageOutcome, ApiError> {
        let conn = core.open_db()?;
        let analyzer = core.analyzer();
        Ok(triage::submit_symptoms(&conn, &analyzer, submission)?)
    })
    .await??;

    Ok(Json(outcome))
}

/// `GET /api/symptoms/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<TriageRecord>, ApiError> {
    let report_id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(triage::get_triage(&conn, &report_id)?))
}

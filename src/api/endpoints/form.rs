//! Form session endpoints: open, edit, reset and submit the active form.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{parse_diagnosis, ApiContext, ResultResponse};
use crate::form::{FormSession, FormSnapshot};
use crate::pipeline::prediction::submit_form;

#[derive(Deserialize)]
pub struct StartRequest {
    pub diagnosis: String,
}

#[derive(Deserialize)]
pub struct FieldChange {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// `GET /api/form`: the active form session.
pub async fn current(State(ctx): State<ApiContext>) -> Result<Json<FormSnapshot>, ApiError> {
    let form = ctx.core.lock_form()?;
    Ok(Json(form.snapshot()))
}

/// `POST /api/form/start`: discard the active form and open a fresh one.
pub async fn start(
    State(ctx): State<ApiContext>,
    Json(req): Json<StartRequest>,
) -> Result<Json<FormSnapshot>, ApiError> {
    let diagnosis = parse_diagnosis(&req.diagnosis)?;
    let mut form = ctx.core.lock_form()?;
    *form = FormSession::new(diagnosis);
    tracing::debug!(%diagnosis, session_id = %form.id(), "Form opened");
    Ok(Json(form.snapshot()))
}

/// `PUT /api/form/field`: record one field edit.
pub async fn update_field(
    State(ctx): State<ApiContext>,
    Json(change): Json<FieldChange>,
) -> Result<Json<FormSnapshot>, ApiError> {
    let mut form = ctx.core.lock_form()?;
    form.on_field_change(&change.name, &change.value)?;
    Ok(Json(form.snapshot()))
}

/// `POST /api/form/reset`: empty the active form.
pub async fn reset(State(ctx): State<ApiContext>) -> Result<Json<FormSnapshot>, ApiError> {
    let mut form = ctx.core.lock_form()?;
    form.reset();
    Ok(Json(form.snapshot()))
}

/// `POST /api/form/submit`: validate, predict and store the active form.
pub async fn submit(State(ctx): State<ApiContext>) -> Result<Json<ResultResponse>, ApiError> {
    let stored = submit_form(&ctx.core).await?;
    Ok(Json(stored.into()))
}

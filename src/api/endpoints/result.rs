//! Stored result endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ResultResponse};

/// `GET /api/result`: the last prediction and its display model.
///
/// With nothing stored the browser is sent back to the form.
pub async fn fetch(State(ctx): State<ApiContext>) -> Result<Json<ResultResponse>, ApiError> {
    let stored = ctx.core.stored_result()?.ok_or(ApiError::NoResult)?;
    Ok(Json(stored.into()))
}

/// `DELETE /api/result`: start a new diagnosis.
pub async fn clear(State(ctx): State<ApiContext>) -> Result<StatusCode, ApiError> {
    ctx.core.clear_result()?;
    Ok(StatusCode::NO_CONTENT)
}

//! One-shot prediction: a complete raw form in, a stored result out.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{parse_diagnosis, ApiContext, RawFormBody, ResultResponse};
use crate::pipeline::prediction;

/// `POST /api/predict/:diagnosis`
pub async fn run(
    State(ctx): State<ApiContext>,
    Path(slug): Path<String>,
    Json(body): Json<RawFormBody>,
) -> Result<Json<ResultResponse>, ApiError> {
    let diagnosis = parse_diagnosis(&slug)?;
    let raw = body.into_raw()?;
    let stored = prediction::submit(&ctx.core, diagnosis, &raw).await?;
    Ok(Json(stored.into()))
}

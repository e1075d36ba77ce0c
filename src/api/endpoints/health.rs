//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::models::ApiStatus;
use crate::prediction_service::ActiveRequest;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Prediction backend reachability, probed on every call.
    pub backend: ApiStatus,
    pub backend_url: String,
    pub prediction_in_flight: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_request: Option<ActiveRequest>,
}

/// `GET /api/health`: service status and backend reachability.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let backend = ctx.core.refresh_api_status().await;
    let predictions = ctx.core.predictions();

    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        backend,
        backend_url: ctx.core.client().base_url().to_string(),
        prediction_in_flight: predictions.is_busy(),
        current_request: predictions.current_request(),
    })
}

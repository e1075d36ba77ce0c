//! Form schema endpoint.

use axum::extract::Path;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::parse_diagnosis;
use crate::models::schema;
use crate::models::{DiagnosisType, FieldSpec};

#[derive(Serialize)]
pub struct SchemaResponse {
    pub diagnosis: DiagnosisType,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

/// `GET /api/schema/:diagnosis`: field descriptions for one form.
pub async fn describe(Path(slug): Path<String>) -> Result<Json<SchemaResponse>, ApiError> {
    let diagnosis = parse_diagnosis(&slug)?;
    Ok(Json(SchemaResponse {
        diagnosis,
        title: diagnosis.display_name(),
        fields: schema::fields(diagnosis),
    }))
}

//! Shared types for the local API layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::form::RawFormState;
use crate::models::{DiagnosisType, StoredResult};
use crate::results::{self, DisplayModel};

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// A stored result together with its rendering.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub result: StoredResult,
    pub display: DisplayModel,
}

impl From<StoredResult> for ResultResponse {
    fn from(result: StoredResult) -> Self {
        let display = results::present(result.diagnosis_type, &result.result);
        Self { result, display }
    }
}

/// Resolve a `:diagnosis` path segment.
pub fn parse_diagnosis(slug: &str) -> Result<DiagnosisType, ApiError> {
    DiagnosisType::from_slug(slug)
        .map_err(|_| ApiError::NotFound(format!("Unknown diagnosis type: {slug}")))
}

/// Raw form values as sent by the browser.
///
/// Strings are taken as typed; numbers are accepted for convenience and
/// rendered back to text; `null` means empty.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct RawFormBody(pub BTreeMap<String, serde_json::Value>);

impl RawFormBody {
    pub fn into_raw(self) -> Result<RawFormState, ApiError> {
        let mut raw = RawFormState::new();
        for (name, value) in self.0 {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Null => String::new(),
                _ => {
                    return Err(ApiError::BadRequest(format!(
                        "{name} must be a string or number"
                    )))
                }
            };
            raw.set(&name, &text);
        }
        Ok(raw)
    }
}

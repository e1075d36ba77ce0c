pub mod client;
pub mod normalize;
pub mod orchestrator;
pub mod wire;

pub use client::*;
pub use normalize::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::models::DiagnosisType;
use crate::session_bridge::StoreError;

/// Form input that cannot become a valid feature payload.
///
/// Always raised before any network call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Required fields missing: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("{field} must be a number, got {value:?}")]
    NotNumeric { field: String, value: String },

    #[error("{value:?} is not an allowed value for {field}")]
    UnknownOption { field: String, value: String },

    #[error("{field} is not a field of the {diagnosis} form")]
    UnknownField {
        field: String,
        diagnosis: DiagnosisType,
    },
}

impl ValidationError {
    /// The field the user should be pointed at (first one when several).
    pub fn field(&self) -> &str {
        match self {
            Self::MissingFields { fields } => fields.first().map(String::as_str).unwrap_or(""),
            Self::NotNumeric { field, .. }
            | Self::UnknownOption { field, .. }
            | Self::UnknownField { field, .. } => field,
        }
    }
}

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("System offline: cannot reach prediction service ({0})")]
    Transport(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Malformed prediction response: {0}")]
    ResponseParsing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("A prediction request is already in flight")]
    InFlight,

    #[error("Internal lock error")]
    LockPoisoned,

    #[error("Prediction task failed: {0}")]
    TaskFailed(String),

    #[error("Result store error: {0}")]
    Store(#[from] StoreError),
}

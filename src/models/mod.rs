pub mod enums;
pub mod prediction;
pub mod schema;

pub use enums::{ApiStatus, DiagnosisType, FieldKind, ParseEnumError, RiskTier};
pub use prediction::{PredictionResult, StoredResult};
pub use schema::{FieldOption, FieldSpec};

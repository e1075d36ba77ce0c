use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::DiagnosisType;

/// Canonical prediction returned by any backend variant.
///
/// Both backend response shapes are converted into this one type before
/// anything else in the crate sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 1 = condition predicted, 0 = not predicted.
    pub prediction: u8,
    /// Probability of the positive class, in [0, 1].
    pub probability: f64,
    /// Model confidence in its own verdict, in [0, 1].
    pub confidence: f64,
    pub diagnosis: String,
    pub risk_level: String,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

impl PredictionResult {
    pub fn is_positive(&self) -> bool {
        self.prediction == 1
    }
}

/// What the session bridge holds: one result plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub diagnosis_type: DiagnosisType,
    pub result: PredictionResult,
    /// RFC 3339 timestamp of when the result was stored.
    pub stored_at: String,
}

impl StoredResult {
    pub fn new(diagnosis_type: DiagnosisType, result: PredictionResult) -> Self {
        Self {
            diagnosis_type,
            result,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_result() -> PredictionResult {
    PredictionResult {
        prediction: 1,
        probability: 0.72,
        confidence: 0.72,
        diagnosis: "Diabetes".into(),
        risk_level: "High".into(),
        recommendations: vec![
            "Consult with an endocrinologist.".into(),
            "Monitor blood sugar regularly.".into(),
        ],
        feature_importance: Some(BTreeMap::from([
            ("Glucose".to_string(), 0.4),
            ("Age".to_string(), 0.1),
            ("BMI".to_string(), 0.5),
        ])),
        model_used: Some("Random Forest".into()),
        disclaimer: None,
    }
}

//! Backend wire shapes and their conversion to `PredictionResult`.
//!
//! Two response shapes exist:
//! - model routes (`/predict/*`): `confidence` is either a fraction or a
//!   label such as `"Very High"`; everything else maps one-to-one.
//! - generic route (`/api/predict`): `probabilities{negative, positive}`,
//!   `prediction_label`, a single `recommendation` and a `disclaimer`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{FeaturePayload, PredictionError};
use crate::models::{DiagnosisType, PredictionResult, RiskTier};

// ═══════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════

/// Request body. Model routes take the payload flat; the generic route
/// wraps it under `features`.
#[derive(Serialize)]
#[serde(untagged)]
pub enum PredictRequest<'a> {
    Flat(&'a FeaturePayload),
    Wrapped { features: &'a FeaturePayload },
}

impl<'a> PredictRequest<'a> {
    pub fn for_diagnosis(diagnosis: DiagnosisType, payload: &'a FeaturePayload) -> Self {
        match diagnosis {
            DiagnosisType::General => Self::Wrapped { features: payload },
            DiagnosisType::Diabetes | DiagnosisType::HeartDisease => Self::Flat(payload),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Responses
// ═══════════════════════════════════════════════════════════

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfidenceField {
    Fraction(f64),
    Label(String),
}

/// Response body from `/predict/diabetes` and `/predict/heart-disease`.
#[derive(Deserialize)]
struct ModelResponse {
    prediction: i64,
    probability: f64,
    confidence: ConfidenceField,
    diagnosis: String,
    risk_level: String,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    feature_importance: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    model_used: Option<String>,
}

#[derive(Deserialize)]
struct ClassProbabilities {
    negative: f64,
    positive: f64,
}

/// Response body from `/api/predict`.
#[derive(Deserialize)]
struct GeneralResponse {
    #[serde(default)]
    prediction: Option<i64>,
    prediction_label: String,
    probabilities: ClassProbabilities,
    #[serde(default)]
    recommendation: Option<String>,
    #[serde(default)]
    feature_importance: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    disclaimer: Option<String>,
}

/// Error body: Flask-style `{"error": ...}` or FastAPI-style `{"detail": ...}`.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Parse a 2xx body into the canonical result.
pub fn parse_response(
    diagnosis: DiagnosisType,
    body: &[u8],
) -> Result<PredictionResult, PredictionError> {
    let parsing = |e: serde_json::Error| PredictionError::ResponseParsing(e.to_string());
    match diagnosis {
        DiagnosisType::General => from_general(serde_json::from_slice(body).map_err(parsing)?),
        DiagnosisType::Diabetes | DiagnosisType::HeartDisease => {
            from_model(serde_json::from_slice(body).map_err(parsing)?)
        }
    }
}

/// User-facing message for a non-2xx response.
///
/// The backend's own message is returned verbatim when it is a string;
/// otherwise a generic message with the status code.
pub fn server_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| {
            [parsed.error, parsed.detail]
                .into_iter()
                .flatten()
                .find_map(|value| value.as_str().map(str::to_string))
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("Server error: {status}"))
}

fn from_model(raw: ModelResponse) -> Result<PredictionResult, PredictionError> {
    let prediction = check_class(raw.prediction)?;
    let probability = check_unit("probability", raw.probability)?;
    let confidence = match raw.confidence {
        ConfidenceField::Fraction(value) => check_unit("confidence", value)?,
        ConfidenceField::Label(_) => probability.max(1.0 - probability),
    };

    Ok(PredictionResult {
        prediction,
        probability,
        confidence,
        diagnosis: raw.diagnosis,
        risk_level: raw.risk_level,
        recommendations: raw.recommendations,
        feature_importance: check_importance(raw.feature_importance)?,
        model_used: raw.model_used,
        disclaimer: None,
    })
}

fn from_general(raw: GeneralResponse) -> Result<PredictionResult, PredictionError> {
    let positive = check_unit("probabilities.positive", raw.probabilities.positive)?;
    let negative = check_unit("probabilities.negative", raw.probabilities.negative)?;
    let prediction = match raw.prediction {
        Some(class) => check_class(class)?,
        None => u8::from(raw.prediction_label.eq_ignore_ascii_case("positive")),
    };

    Ok(PredictionResult {
        prediction,
        probability: positive,
        confidence: positive.max(negative),
        diagnosis: raw.prediction_label,
        risk_level: RiskTier::from_probability(positive).label().to_string(),
        recommendations: raw
            .recommendation
            .filter(|r| !r.trim().is_empty())
            .into_iter()
            .collect(),
        feature_importance: check_importance(raw.feature_importance)?,
        model_used: None,
        disclaimer: raw.disclaimer,
    })
}

fn check_class(value: i64) -> Result<u8, PredictionError> {
    match value {
        0 => Ok(0),
        1 => Ok(1),
        other => Err(PredictionError::ResponseParsing(format!(
            "prediction must be 0 or 1, got {other}"
        ))),
    }
}

fn check_unit(name: &str, value: f64) -> Result<f64, PredictionError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(PredictionError::ResponseParsing(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_importance(
    importance: Option<BTreeMap<String, f64>>,
) -> Result<Option<BTreeMap<String, f64>>, PredictionError> {
    if let Some(values) = &importance {
        for (name, value) in values {
            check_unit(&format!("feature_importance.{name}"), *value)?;
        }
    }
    Ok(importance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::RawFormState;
    use crate::pipeline::prediction::normalize;

    #[test]
    fn model_response_with_label_confidence() {
        let body = br#"{
            "diagnosis": "Diabetes",
            "prediction": 1,
            "probability": 0.82,
            "confidence": "High",
            "risk_level": "Very High",
            "recommendations": ["See an endocrinologist.", "Exercise."],
            "model_used": "Random Forest",
            "feature_values": {"Glucose": 180}
        }"#;
        let result = parse_response(DiagnosisType::Diabetes, body).unwrap();
        assert_eq!(result.prediction, 1);
        assert_eq!(result.probability, 0.82);
        assert_eq!(result.confidence, 0.82);
        assert_eq!(result.risk_level, "Very High");
        assert_eq!(result.recommendations.len(), 2);
        assert_eq!(result.model_used.as_deref(), Some("Random Forest"));
        assert!(result.feature_importance.is_none());
    }

    #[test]
    fn model_response_with_fraction_confidence() {
        let body = br#"{"diagnosis": "No Heart Disease", "prediction": 0,
            "probability": 0.1, "confidence": 0.9, "risk_level": "Low",
            "recommendations": [], "feature_importance": {"Age": 0.3}}"#;
        let result = parse_response(DiagnosisType::HeartDisease, body).unwrap();
        assert_eq!(result.prediction, 0);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.feature_importance.unwrap()["Age"], 0.3);
    }

    #[test]
    fn low_probability_label_confidence_uses_complement() {
        let body = br#"{"diagnosis": "No Diabetes", "prediction": 0,
            "probability": 0.2, "confidence": "High", "risk_level": "Low",
            "recommendations": []}"#;
        let result = parse_response(DiagnosisType::Diabetes, body).unwrap();
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn general_response_maps_to_canonical() {
        let body = br#"{
            "prediction": 1,
            "prediction_label": "Positive",
            "probability": 0.64,
            "probabilities": {"negative": 0.36, "positive": 0.64},
            "recommendation": "Schedule a follow-up.",
            "feature_importance": {"glucose": 0.4, "bmi": 0.5},
            "disclaimer": "Review with a clinician."
        }"#;
        let result = parse_response(DiagnosisType::General, body).unwrap();
        assert_eq!(result.prediction, 1);
        assert_eq!(result.probability, 0.64);
        assert_eq!(result.confidence, 0.64);
        assert_eq!(result.diagnosis, "Positive");
        assert_eq!(result.risk_level, "High");
        assert_eq!(result.recommendations, vec!["Schedule a follow-up."]);
        assert_eq!(result.disclaimer.as_deref(), Some("Review with a clinician."));
    }

    #[test]
    fn general_negative_uses_positive_probability() {
        let body = br#"{"prediction_label": "Negative", "probability": 0.9,
            "probabilities": {"negative": 0.9, "positive": 0.1},
            "recommendation": "", "feature_importance": null}"#;
        let result = parse_response(DiagnosisType::General, body).unwrap();
        assert_eq!(result.prediction, 0);
        assert_eq!(result.probability, 0.1);
        assert_eq!(result.confidence, 0.9);
        assert!(result.recommendations.is_empty());
        assert_eq!(result.risk_level, "Low");
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let body = br#"{"diagnosis": "x", "prediction": 1, "probability": 1.4,
            "confidence": 0.9, "risk_level": "High", "recommendations": []}"#;
        let err = parse_response(DiagnosisType::Diabetes, body).unwrap_err();
        assert!(matches!(err, PredictionError::ResponseParsing(_)));
    }

    #[test]
    fn out_of_range_importance_rejected() {
        let body = br#"{"diagnosis": "x", "prediction": 1, "probability": 0.7,
            "confidence": 0.7, "risk_level": "High", "recommendations": [],
            "feature_importance": {"Age": 0.2, "Glucose": 1.3}}"#;
        let err = parse_response(DiagnosisType::Diabetes, body).unwrap_err();
        assert!(err.to_string().contains("feature_importance.Glucose"));

        let body = br#"{"prediction_label": "Positive", "probability": 0.6,
            "probabilities": {"negative": 0.4, "positive": 0.6},
            "feature_importance": {"bmi": -0.1}}"#;
        let err = parse_response(DiagnosisType::General, body).unwrap_err();
        assert!(matches!(err, PredictionError::ResponseParsing(_)));
    }

    #[test]
    fn invalid_class_rejected() {
        let body = br#"{"diagnosis": "x", "prediction": 2, "probability": 0.4,
            "confidence": 0.9, "risk_level": "High", "recommendations": []}"#;
        assert!(parse_response(DiagnosisType::Diabetes, body).is_err());
    }

    #[test]
    fn garbage_body_rejected() {
        let err = parse_response(DiagnosisType::Diabetes, b"<html>").unwrap_err();
        assert!(matches!(err, PredictionError::ResponseParsing(_)));
    }

    #[test]
    fn server_message_prefers_backend_text() {
        assert_eq!(
            server_message(500, r#"{"detail": "Prediction error: scaler missing"}"#),
            "Prediction error: scaler missing"
        );
        assert_eq!(
            server_message(400, r#"{"error": "Invalid request. Expected \"features\" key."}"#),
            "Invalid request. Expected \"features\" key."
        );
    }

    #[test]
    fn server_message_falls_back_to_status() {
        assert_eq!(server_message(502, ""), "Server error: 502");
        assert_eq!(server_message(500, "Internal Server Error"), "Server error: 500");
        // FastAPI validation errors carry a list, not a message
        assert_eq!(
            server_message(422, r#"{"detail": [{"loc": ["body", "Age"]}]}"#),
            "Server error: 422"
        );
    }

    #[test]
    fn general_request_wraps_features() {
        let raw = RawFormState::from_pairs([("age", "40"), ("gender", "Male")]);
        let payload = normalize(DiagnosisType::General, &raw).unwrap();
        let json =
            serde_json::to_value(PredictRequest::for_diagnosis(DiagnosisType::General, &payload))
                .unwrap();
        assert_eq!(json["features"]["gender"], "Male");
        assert!(json["features"]["bmi"].is_null());
    }

    #[test]
    fn model_request_is_flat() {
        let payload =
            normalize(DiagnosisType::Diabetes, &crate::pipeline::prediction::normalize::diabetes_form())
                .unwrap();
        let json =
            serde_json::to_value(PredictRequest::for_diagnosis(DiagnosisType::Diabetes, &payload))
                .unwrap();
        assert_eq!(json.as_object().unwrap().len(), 8);
        assert_eq!(json["Glucose"], 138.0);
    }
}

//! Result presenter: turns a `PredictionResult` into what the results
//! page renders. Pure and deterministic: the same result always yields the
//! same display model.

use serde::Serialize;

use crate::models::{DiagnosisType, PredictionResult, RiskTier};

/// Maximum number of contributing factors shown.
pub const MAX_FACTORS: usize = 5;

/// One contributing factor, ranked by importance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFactor {
    pub name: String,
    /// Underscores replaced with spaces.
    pub label: String,
    pub importance: f64,
    pub importance_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayModel {
    pub diagnosis_type: DiagnosisType,
    pub diagnosis: String,
    pub is_high_risk: bool,
    pub risk_tier: RiskTier,
    pub risk_label: &'static str,
    /// `round((1 - probability) * 100)`, 0..=100.
    pub health_score_percent: u8,
    /// Positive class, as shown in the probability breakdown.
    pub probability_percent: f64,
    /// Negative class, `100 - probability_percent` before rounding.
    pub negative_percent: f64,
    pub confidence_percent: f64,
    pub ranked_factors: Vec<RankedFactor>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

pub fn present(diagnosis_type: DiagnosisType, result: &PredictionResult) -> DisplayModel {
    let risk_tier = RiskTier::from_label(&result.risk_level)
        .unwrap_or_else(|| RiskTier::from_probability(result.probability));

    DisplayModel {
        diagnosis_type,
        diagnosis: result.diagnosis.clone(),
        is_high_risk: result.is_positive(),
        risk_tier,
        risk_label: risk_tier.label(),
        health_score_percent: health_score_percent(result.probability),
        probability_percent: round1(result.probability * 100.0),
        negative_percent: round1((1.0 - result.probability) * 100.0),
        confidence_percent: round1(result.confidence * 100.0),
        ranked_factors: rank_factors(result),
        recommendations: result.recommendations.clone(),
        model_used: result.model_used.clone(),
        disclaimer: result.disclaimer.clone(),
    }
}

pub fn health_score_percent(probability: f64) -> u8 {
    ((1.0 - probability.clamp(0.0, 1.0)) * 100.0).round() as u8
}

/// Top factors by importance, descending. Equal importances keep name order.
pub fn rank_factors(result: &PredictionResult) -> Vec<RankedFactor> {
    let Some(importance) = &result.feature_importance else {
        return Vec::new();
    };

    // BTreeMap iteration is name-ordered and sort_by is stable
    let mut entries: Vec<(&String, f64)> = importance.iter().map(|(k, v)| (k, *v)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    entries
        .into_iter()
        .take(MAX_FACTORS)
        .map(|(name, value)| RankedFactor {
            name: name.clone(),
            label: name.replace('_', " "),
            importance: value,
            importance_percent: round1(value * 100.0),
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

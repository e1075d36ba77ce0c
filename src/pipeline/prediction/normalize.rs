//! Payload normalizer: raw form strings → backend feature payload.
//!
//! Rules, per field in schema order:
//! - empty (after trim) → `null`
//! - `Numeric` / `Categorical` → finite `f64`; categorical codes must
//!   match a declared option
//! - `Label` → the trimmed string, which must match a declared option
//!
//! Required fields may not end up `null`.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::ValidationError;
use crate::form::RawFormState;
use crate::models::schema::{self, FieldSpec};
use crate::models::{DiagnosisType, FieldKind};

/// One non-null payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

/// Backend-ready feature vector. Keys follow schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeaturePayload {
    entries: Vec<(&'static str, Option<FeatureValue>)>,
}

impl FeaturePayload {
    pub fn get(&self, name: &str) -> Option<&Option<FeatureValue>> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&FeatureValue>)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of fields that carry a value.
    pub fn filled(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_some()).count()
    }
}

impl Serialize for FeaturePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Convert a raw form into the payload shape for `diagnosis`.
///
/// Keys in `raw` that the schema does not declare are ignored.
pub fn normalize(
    diagnosis: DiagnosisType,
    raw: &RawFormState,
) -> Result<FeaturePayload, ValidationError> {
    let specs = schema::fields(diagnosis);
    let mut entries = Vec::with_capacity(specs.len());
    let mut missing = Vec::new();

    for spec in specs {
        let value = raw.get(spec.name).map(str::trim).unwrap_or("");
        if value.is_empty() {
            if spec.required {
                missing.push(spec.name.to_string());
            }
            entries.push((spec.name, None));
            continue;
        }
        entries.push((spec.name, Some(coerce(spec, value)?)));
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields { fields: missing });
    }

    Ok(FeaturePayload { entries })
}

fn coerce(spec: &FieldSpec, value: &str) -> Result<FeatureValue, ValidationError> {
    match spec.kind {
        FieldKind::Numeric => parse_number(spec, value).map(FeatureValue::Number),
        FieldKind::Categorical => {
            let code = parse_number(spec, value)?;
            let declared = spec
                .options
                .iter()
                .any(|opt| opt.value.parse::<f64>().is_ok_and(|v| v == code));
            if !declared {
                return Err(unknown_option(spec, value));
            }
            Ok(FeatureValue::Number(code))
        }
        FieldKind::Label => spec
            .option(value)
            .map(|opt| FeatureValue::Text(opt.value.to_string()))
            .ok_or_else(|| unknown_option(spec, value)),
    }
}

fn parse_number(spec: &FieldSpec, value: &str) -> Result<f64, ValidationError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError::NotNumeric {
            field: spec.name.to_string(),
            value: value.to_string(),
        })
}

fn unknown_option(spec: &FieldSpec, value: &str) -> ValidationError {
    ValidationError::UnknownOption {
        field: spec.name.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn diabetes_form() -> RawFormState {
    RawFormState::from_pairs([
        ("Pregnancies", "2"),
        ("Glucose", "138"),
        ("BloodPressure", "78"),
        ("SkinThickness", "32"),
        ("Insulin", "120"),
        ("BMI", "31.2"),
        ("DiabetesPedigreeFunction", "0.42"),
        ("Age", "47"),
    ])
}

#[cfg(test)]
pub(crate) fn heart_form() -> RawFormState {
    RawFormState::from_pairs([
        ("Age", "55"),
        ("Sex", "1"),
        ("ChestPainType", "2"),
        ("RestingBP", "140"),
        ("Cholesterol", "250"),
        ("FastingBS", "1"),
        ("RestingECG", "1"),
        ("MaxHR", "150"),
        ("ExerciseAngina", "1"),
        ("Oldpeak", "2.3"),
        ("ST_Slope", "1"),
    ])
}

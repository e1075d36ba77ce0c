//! Form collector: the active form session and its raw field values.
//!
//! Values are stored exactly as typed. Nothing is validated per keystroke
//! except that the field exists on the form; required/typed checks run
//! when the form is submitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::schema;
use crate::models::DiagnosisType;
use crate::pipeline::prediction::{FeaturePayload, FeatureValue, ValidationError};

// ═══════════════════════════════════════════════════════════
// RawFormState
// ═══════════════════════════════════════════════════════════

/// Field name → raw string value (possibly empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFormState {
    values: BTreeMap<String, String>,
}

impl RawFormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Render a normalized payload back into raw strings. `null` → "".
    pub fn from_payload(payload: &FeaturePayload) -> Self {
        let values = payload
            .iter()
            .map(|(key, value)| {
                let raw = match value {
                    None => String::new(),
                    Some(FeatureValue::Number(n)) => n.to_string(),
                    Some(FeatureValue::Text(s)) => s.clone(),
                };
                (key.to_string(), raw)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Overwrite one field's value.
    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════
// FormSession
// ═══════════════════════════════════════════════════════════

/// One open form: which diagnosis it is for and what has been typed.
#[derive(Debug, Clone)]
pub struct FormSession {
    id: Uuid,
    diagnosis: DiagnosisType,
    raw: RawFormState,
}

/// Serializable view of the form for the browser.
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub session_id: Uuid,
    pub diagnosis: DiagnosisType,
    pub values: RawFormState,
    pub missing_required: Vec<&'static str>,
}

impl FormSession {
    /// Open a fresh, empty form.
    pub fn new(diagnosis: DiagnosisType) -> Self {
        Self {
            id: Uuid::new_v4(),
            diagnosis,
            raw: RawFormState::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn diagnosis(&self) -> DiagnosisType {
        self.diagnosis
    }

    pub fn raw(&self) -> &RawFormState {
        &self.raw
    }

    /// Record one edit. Only names declared by the schema are accepted.
    pub fn on_field_change(&mut self, name: &str, value: &str) -> Result<(), ValidationError> {
        if schema::field(self.diagnosis, name).is_none() {
            return Err(ValidationError::UnknownField {
                field: name.to_string(),
                diagnosis: self.diagnosis,
            });
        }
        self.raw.set(name, value);
        Ok(())
    }

    /// Empty the form. The diagnosis type stays, the session id changes.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.id = Uuid::new_v4();
    }

    /// Required fields that are missing or blank, in schema order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        schema::fields(self.diagnosis)
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| {
                self.raw
                    .get(spec.name)
                    .map_or(true, |value| value.trim().is_empty())
            })
            .map(|spec| spec.name)
            .collect()
    }

    /// Gate for `on_submit`: fails while any required field is blank.
    pub fn check_submittable(&self) -> Result<(), ValidationError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields {
                fields: missing.into_iter().map(String::from).collect(),
            })
        }
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            session_id: self.id,
            diagnosis: self.diagnosis,
            values: self.raw.clone(),
            missing_required: self.missing_required(),
        }
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new(DiagnosisType::Diabetes)
    }
}

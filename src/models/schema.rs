//! Feature schema: the declarative form description per diagnosis type.
//!
//! Field names are the exact payload keys the prediction backend expects,
//! in the order the backend documents them. Everything here is `'static`
//! and built at compile time.

use serde::Serialize;

use super::enums::{DiagnosisType, FieldKind};

/// One selectable value of a categorical field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldOption {
    /// Raw form value. For `Categorical` fields this is the numeric code.
    pub value: &'static str,
    pub label: &'static str,
}

/// Declarative description of one input field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [FieldOption],
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            options: &[],
            required: true,
            placeholder: None,
            step: None,
            min: None,
            max: None,
        }
    }

    const fn numeric(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Numeric)
    }

    const fn categorical(
        name: &'static str,
        label: &'static str,
        options: &'static [FieldOption],
    ) -> Self {
        let mut spec = Self::new(name, label, FieldKind::Categorical);
        spec.options = options;
        spec
    }

    const fn text_label(
        name: &'static str,
        label: &'static str,
        options: &'static [FieldOption],
    ) -> Self {
        let mut spec = Self::new(name, label, FieldKind::Label);
        spec.options = options;
        spec
    }

    const fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    const fn step(mut self, step: &'static str) -> Self {
        self.step = Some(step);
        self
    }

    const fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Look up the option whose raw value matches `value`.
    pub fn option(&self, value: &str) -> Option<&'static FieldOption> {
        self.options.iter().find(|opt| opt.value == value)
    }
}

fn no_options(options: &&'static [FieldOption]) -> bool {
    options.is_empty()
}

const fn opt(value: &'static str, label: &'static str) -> FieldOption {
    FieldOption { value, label }
}

const NO_YES: &[FieldOption] = &[opt("0", "No"), opt("1", "Yes")];
const ZERO_TO_TWO: &[FieldOption] = &[opt("0", "0"), opt("1", "1"), opt("2", "2")];
const SEX: &[FieldOption] = &[opt("1", "Male"), opt("0", "Female")];
const CHEST_PAIN: &[FieldOption] = &[
    opt("0", "Type 0"),
    opt("1", "Type 1"),
    opt("2", "Type 2"),
    opt("3", "Type 3"),
];
const GENDER: &[FieldOption] = &[opt("Male", "Male"), opt("Female", "Female")];

static DIABETES_FIELDS: [FieldSpec; 8] = [
    FieldSpec::numeric("Pregnancies", "Pregnancies")
        .placeholder("0")
        .range(0.0, 20.0),
    FieldSpec::numeric("Glucose", "Glucose (mg/dL)")
        .placeholder("120")
        .range(0.0, 300.0),
    FieldSpec::numeric("BloodPressure", "Blood Pressure")
        .placeholder("80")
        .range(0.0, 200.0),
    FieldSpec::numeric("SkinThickness", "Skin Thickness")
        .placeholder("20")
        .range(0.0, 100.0),
    FieldSpec::numeric("Insulin", "Insulin")
        .placeholder("85")
        .range(0.0, 1000.0),
    FieldSpec::numeric("BMI", "BMI")
        .placeholder("24.5")
        .step("0.1")
        .range(0.0, 70.0),
    FieldSpec::numeric("DiabetesPedigreeFunction", "Diabetes Pedigree")
        .placeholder("0.47")
        .step("0.001")
        .range(0.0, 3.0),
    FieldSpec::numeric("Age", "Age")
        .placeholder("45")
        .range(1.0, 120.0),
];

static HEART_DISEASE_FIELDS: [FieldSpec; 11] = [
    FieldSpec::numeric("Age", "Age")
        .placeholder("52")
        .range(1.0, 120.0),
    FieldSpec::categorical("Sex", "Sex", SEX),
    FieldSpec::categorical("ChestPainType", "Chest Pain", CHEST_PAIN),
    FieldSpec::numeric("RestingBP", "Resting BP")
        .placeholder("130")
        .range(0.0, 250.0),
    FieldSpec::numeric("Cholesterol", "Cholesterol")
        .placeholder("210")
        .range(0.0, 600.0),
    FieldSpec::categorical("FastingBS", "Fasting BS > 120", NO_YES),
    FieldSpec::categorical("RestingECG", "Resting ECG", ZERO_TO_TWO),
    FieldSpec::numeric("MaxHR", "Max Heart Rate")
        .placeholder("160")
        .range(0.0, 250.0),
    FieldSpec::categorical("ExerciseAngina", "Exercise Angina", NO_YES),
    FieldSpec::numeric("Oldpeak", "Oldpeak (ST)")
        .placeholder("1.2")
        .step("0.1")
        .range(0.0, 10.0),
    FieldSpec::categorical("ST_Slope", "ST Slope", ZERO_TO_TWO),
];

static GENERAL_FIELDS: [FieldSpec; 9] = [
    FieldSpec::numeric("age", "Age").range(0.0, 120.0),
    FieldSpec::text_label("gender", "Gender", GENDER),
    FieldSpec::numeric("pregnancies", "Pregnancies")
        .range(0.0, 20.0)
        .optional(),
    FieldSpec::numeric("glucose", "Glucose Level (mg/dL)")
        .step("0.1")
        .range(0.0, 300.0)
        .optional(),
    FieldSpec::numeric("blood_pressure", "Blood Pressure (mmHg)")
        .range(0.0, 200.0)
        .optional(),
    FieldSpec::numeric("skin_thickness", "Skin Thickness (mm)")
        .range(0.0, 100.0)
        .optional(),
    FieldSpec::numeric("insulin", "Insulin Level (μU/mL)")
        .range(0.0, 1000.0)
        .optional(),
    FieldSpec::numeric("bmi", "BMI")
        .step("0.1")
        .range(0.0, 70.0)
        .optional(),
    FieldSpec::numeric("diabetes_pedigree", "Diabetes Pedigree")
        .step("0.001")
        .range(0.0, 3.0)
        .optional(),
];

/// Ordered field specs for a diagnosis type.
pub fn fields(diagnosis: DiagnosisType) -> &'static [FieldSpec] {
    match diagnosis {
        DiagnosisType::Diabetes => &DIABETES_FIELDS,
        DiagnosisType::HeartDisease => &HEART_DISEASE_FIELDS,
        DiagnosisType::General => &GENERAL_FIELDS,
    }
}

/// Find one field by name within a diagnosis type.
pub fn field(diagnosis: DiagnosisType, name: &str) -> Option<&'static FieldSpec> {
    fields(diagnosis).iter().find(|spec| spec.name == name)
}

/// Payload keys in backend order.
pub fn keys(diagnosis: DiagnosisType) -> Vec<&'static str> {
    fields(diagnosis).iter().map(|spec| spec.name).collect()
}

use serde::{Deserialize, Serialize};

/// A string did not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value:?}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(DiagnosisType {
    Diabetes => "diabetes",
    HeartDisease => "heart_disease",
    General => "general",
});

str_enum!(FieldKind {
    Numeric => "numeric",
    Categorical => "categorical",
    Label => "label",
});

str_enum!(RiskTier {
    Low => "low",
    Moderate => "moderate",
    High => "high",
    VeryHigh => "very_high",
});

str_enum!(ApiStatus {
    Unknown => "unknown",
    Online => "online",
    Offline => "offline",
});

impl DiagnosisType {
    pub const ALL: [DiagnosisType; 3] = [
        DiagnosisType::Diabetes,
        DiagnosisType::HeartDisease,
        DiagnosisType::General,
    ];

    /// Parse a URL slug. Accepts both `heart_disease` and `heart-disease`.
    pub fn from_slug(slug: &str) -> Result<Self, ParseEnumError> {
        slug.trim().to_ascii_lowercase().replace('-', "_").parse()
    }

    /// Backend path that serves this diagnosis type.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Diabetes => "/predict/diabetes",
            Self::HeartDisease => "/predict/heart-disease",
            Self::General => "/api/predict",
        }
    }

    /// Human-readable name for logs and headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Diabetes => "Diabetes",
            Self::HeartDisease => "Heart Disease",
            Self::General => "General Screening",
        }
    }
}

impl RiskTier {
    /// Tier thresholds used by the prediction backend.
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            Self::Low
        } else if probability < 0.6 {
            Self::Moderate
        } else if probability < 0.8 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    /// Label in the backend's wording.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Parse a backend label such as `"Very High"` or `"moderate"`.
    pub fn from_label(label: &str) -> Option<Self> {
        let slug = label.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        slug.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnosis_type_round_trips_through_str() {
        for ty in DiagnosisType::ALL {
            assert_eq!(ty.as_str().parse::<DiagnosisType>().unwrap(), ty);
        }
    }

    #[test]
    fn diagnosis_slug_accepts_hyphen() {
        assert_eq!(
            DiagnosisType::from_slug("heart-disease").unwrap(),
            DiagnosisType::HeartDisease
        );
        assert_eq!(
            DiagnosisType::from_slug("Diabetes").unwrap(),
            DiagnosisType::Diabetes
        );
        let err = DiagnosisType::from_slug("cancer").unwrap_err();
        assert_eq!(err.field, "DiagnosisType");
        assert_eq!(err.value, "cancer");
    }

    #[test]
    fn endpoints_match_backend_routes() {
        assert_eq!(DiagnosisType::Diabetes.endpoint(), "/predict/diabetes");
        assert_eq!(DiagnosisType::HeartDisease.endpoint(), "/predict/heart-disease");
        assert_eq!(DiagnosisType::General.endpoint(), "/api/predict");
    }

    #[test]
    fn diagnosis_type_serializes_snake_case() {
        let json = serde_json::to_string(&DiagnosisType::HeartDisease).unwrap();
        assert_eq!(json, "\"heart_disease\"");
    }

    #[test]
    fn risk_tier_thresholds() {
        assert_eq!(RiskTier::from_probability(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.29), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.3), RiskTier::Moderate);
        assert_eq!(RiskTier::from_probability(0.6), RiskTier::High);
        assert_eq!(RiskTier::from_probability(0.8), RiskTier::VeryHigh);
        assert_eq!(RiskTier::from_probability(1.0), RiskTier::VeryHigh);
    }

    #[test]
    fn risk_tier_from_backend_label() {
        assert_eq!(RiskTier::from_label("Very High"), Some(RiskTier::VeryHigh));
        assert_eq!(RiskTier::from_label("Moderate"), Some(RiskTier::Moderate));
        assert_eq!(RiskTier::from_label("elevated"), None);
    }
}

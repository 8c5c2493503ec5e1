//! Risk level classification for heart failure mortality.
//!
//! Maps a death probability (percent) to one of four fixed buckets.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Display color tag attached to a risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Success,
    Warning,
    Danger,
}

/// Risk of heart failure complications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    /// Death probability in [0, 20)
    Low,
    /// Death probability in [20, 40)
    Moderate,
    /// Death probability in [40, 60)
    High,
    /// Death probability in [60, 100]
    Critical,
}

impl RiskLevel {
    /// Classify a death probability expressed as a percentage.
    ///
    /// Buckets are half-open on the right except the last one, so 20, 40 and
    /// 60 fall into the upper bucket. Values below 0 land in `Low` and values
    /// above 100 in `Critical`; NaN is treated as `Critical`.
    #[must_use]
    pub fn from_death_probability(death_probability: f64) -> Self {
        if death_probability < 20.0 {
            Self::Low
        } else if death_probability < 40.0 {
            Self::Moderate
        } else if death_probability < 60.0 {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// Level name as shown to callers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    #[must_use]
    pub fn color(&self) -> ColorTag {
        match self {
            Self::Low => ColorTag::Success,
            Self::Moderate => ColorTag::Warning,
            Self::High | Self::Critical => ColorTag::Danger,
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk of heart failure complications",
            Self::Moderate => "Moderate risk - monitor closely",
            Self::High => "High risk - immediate medical attention recommended",
            Self::Critical => "Critical risk - urgent medical intervention required",
        }
    }
}

/// Shorthand for [`RiskLevel::from_death_probability`].
#[must_use]
pub fn risk_level(death_probability: f64) -> RiskLevel {
    RiskLevel::from_death_probability(death_probability)
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// Serialized as `{level, color, description}`.
impl Serialize for RiskLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RiskLevel", 3)?;
        s.serialize_field("level", self.label())?;
        s.serialize_field("color", &self.color())?;
        s.serialize_field("description", self.description())?;
        s.end()
    }
}

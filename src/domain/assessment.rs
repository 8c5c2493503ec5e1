//! Scored outcome for a single patient.

use serde::Serialize;

use super::risk::RiskLevel;

/// Binary label produced by the classifier.
pub const LABEL_SURVIVAL: u8 = 0;
pub const LABEL_DEATH_EVENT: u8 = 1;

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Interpreted model output returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    /// 0 = survival, 1 = death event
    pub prediction: u8,

    /// Probability of the death event class, percent, 2 decimals
    pub death_probability: f64,

    /// Probability of the survival class, percent, 2 decimals
    pub survival_probability: f64,

    /// Derived from `death_probability`
    pub risk_level: RiskLevel,
}

impl Assessment {
    /// Build an assessment from a label and `[p_survival, p_death]`.
    ///
    /// The risk level is taken from the rounded death percentage so the two
    /// returned values always agree.
    #[must_use]
    pub fn new(prediction: u8, probabilities: [f64; 2]) -> Self {
        let [p_survival, p_death] = probabilities;
        let death_probability = round2(p_death * 100.0);
        let survival_probability = round2(p_survival * 100.0);

        Self {
            prediction,
            death_probability,
            survival_probability,
            risk_level: RiskLevel::from_death_probability(death_probability),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages_are_rounded() {
        let a = Assessment::new(LABEL_SURVIVAL, [0.876_54, 0.123_46]);
        assert!((a.death_probability - 12.35).abs() < 1e-9);
        assert!((a.survival_probability - 87.65).abs() < 1e-9);
        assert_eq!(a.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        for i in 0..=1000 {
            let p = f64::from(i) / 1000.0;
            let a = Assessment::new(LABEL_DEATH_EVENT, [1.0 - p, p]);
            assert!(
                (a.death_probability + a.survival_probability - 100.0).abs() <= 0.01 + 1e-9,
                "p={p}"
            );
        }
    }

    #[test]
    fn test_risk_uses_rounded_value() {
        // 19.996% rounds to 20.00% and must be reported as Moderate.
        let a = Assessment::new(LABEL_SURVIVAL, [0.800_04, 0.199_96]);
        assert!((a.death_probability - 20.0).abs() < 1e-9);
        assert_eq!(a.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn test_serialized_fields() {
        let json = serde_json::to_value(Assessment::new(LABEL_DEATH_EVENT, [0.3, 0.7]))
            .expect("serialize");
        assert_eq!(json["prediction"], 1);
        assert_eq!(json["death_probability"], 70.0);
        assert_eq!(json["survival_probability"], 30.0);
        assert_eq!(json["risk_level"]["level"], "Critical");
    }
}

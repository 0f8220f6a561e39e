//! Score combiner and risk tiers.
//!
//! final = (medical*0.3 + counselor*0.4 + questionnaire*0.3) / 4 * 100
//!
//! The divisor treats every term as a 4-point scale, which is why the
//! questionnaire score is capped at 4.

use serde::Serialize;

pub const MEDICAL_WEIGHT: f64 = 0.3;
pub const COUNSELOR_WEIGHT: f64 = 0.4;
pub const QUESTIONNAIRE_WEIGHT: f64 = 0.3;
const SCALE: f64 = 4.0;

pub const HIGH_RISK_THRESHOLD: f64 = 70.0;
pub const MODERATE_RISK_THRESHOLD: f64 = 40.0;

/// Weighted final percentage from the three component scores.
pub fn final_score(medical: u8, counselor: u8, questionnaire: u8) -> f64 {
    let weighted = f64::from(medical) * MEDICAL_WEIGHT
        + f64::from(counselor) * COUNSELOR_WEIGHT
        + f64::from(questionnaire) * QUESTIONNAIRE_WEIGHT;
    weighted / SCALE * 100.0
}

/// Display form of the final percentage (two decimals).
pub fn format_percent(score: f64) -> String {
    format!("{score:.2}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Evaluated high to low: `>= 70` high, `>= 40` moderate, else low.
    pub fn classify(score: f64) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if score >= MODERATE_RISK_THRESHOLD {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Moderate => "Moderate Risk",
            RiskTier::High => "High Risk",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk Detected",
            RiskTier::Moderate => "Moderate Risk Detected",
            RiskTier::High => "High Risk Detected",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            RiskTier::Low => "You're doing well. Keep going!",
            RiskTier::Moderate => "Caution advised. Talk to someone you trust.",
            RiskTier::High => "Immediate professional help is strongly recommended.",
        }
    }
}

//! Heuristic medical scorer.
//!
//! Four independent indicators are matched against the normalized report text
//! (first occurrence only). Each contributes 0 or 1, so the score is 0..=4.
//! Missing or malformed fields simply do not match.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const MAX_MEDICAL_SCORE: u8 = 4;

pub const SYSTOLIC_LIMIT: u64 = 140;
pub const DIASTOLIC_LIMIT: u64 = 90;
pub const CORTISOL_LIMIT: u64 = 20;
pub const HEART_RATE_LIMIT: u64 = 100;

const SEROTONIN_LOW: &str = "Serotonin Level: Low";

static RE_BLOOD_PRESSURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Blood Pressure:\s*([0-9]{2,3})/([0-9]{2,3})").expect("blood pressure regex")
});
static RE_CORTISOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Cortisol Level:\s*([0-9]+)").expect("cortisol regex"));
static RE_HEART_RATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Heart Rate:\s*([0-9]+)").expect("heart rate regex"));

/// Which indicators fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MedicalFindings {
    pub blood_pressure_high: bool,
    pub cortisol_high: bool,
    pub serotonin_low: bool,
    pub heart_rate_high: bool,
}

impl MedicalFindings {
    pub fn score(&self) -> u8 {
        [
            self.blood_pressure_high,
            self.cortisol_high,
            self.serotonin_low,
            self.heart_rate_high,
        ]
        .iter()
        .filter(|hit| **hit)
        .count() as u8
    }

    /// Human-readable labels of the fired indicators, in scan order.
    pub fn reasons(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.blood_pressure_high {
            out.push("elevated blood pressure");
        }
        if self.cortisol_high {
            out.push("high cortisol level");
        }
        if self.serotonin_low {
            out.push("low serotonin level");
        }
        if self.heart_rate_high {
            out.push("elevated heart rate");
        }
        out
    }
}

/// Scan normalized text for the four indicators.
pub fn evaluate(text: &str) -> MedicalFindings {
    let blood_pressure_high = RE_BLOOD_PRESSURE
        .captures(text)
        .map(|caps| {
            let systolic = parse_reading(&caps[1]);
            let diastolic = parse_reading(&caps[2]);
            systolic > SYSTOLIC_LIMIT || diastolic > DIASTOLIC_LIMIT
        })
        .unwrap_or(false);

    MedicalFindings {
        blood_pressure_high,
        cortisol_high: first_reading(&RE_CORTISOL, text).is_some_and(|n| n > CORTISOL_LIMIT),
        serotonin_low: text.contains(SEROTONIN_LOW),
        heart_rate_high: first_reading(&RE_HEART_RATE, text).is_some_and(|n| n > HEART_RATE_LIMIT),
    }
}

/// Medical score in 0..=4.
pub fn medical_score(text: &str) -> u8 {
    evaluate(text).score()
}

fn first_reading(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text).map(|caps| parse_reading(&caps[1]))
}

// Captures are ASCII digits only, so a parse failure can only be overflow.
fn parse_reading(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

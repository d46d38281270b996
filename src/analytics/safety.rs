//! Site safety score and risk levels.

use serde::Serialize;
use std::fmt;

use crate::telemetry::{SensorReading, Vibration};

/// Temperature above which the score is penalised (°C)
pub const TEMPERATURE_LIMIT: f64 = 38.0;

/// Gas level above which the score is penalised (ppm)
pub const GAS_LIMIT: f64 = 400.0;

/// Compute the 0-100 safety score for a reading
pub fn safety_score(reading: &SensorReading) -> u8 {
    raw_safety_score(
        reading.temperature,
        reading.gas_level,
        f64::from(reading.helmet_violations),
        reading.vibration == Some(Vibration::High),
    ) as u8
}

/// Score from raw values; `helmet_violations` may be fractional when it comes
/// from a forecast
pub(crate) fn raw_safety_score(
    temperature: f64,
    gas_level: f64,
    helmet_violations: f64,
    high_vibration: bool,
) -> f64 {
    let mut score = 100.0;

    // Penalties are capped at the full score
    if temperature > TEMPERATURE_LIMIT {
        score -= ((temperature - TEMPERATURE_LIMIT) * 2.0).min(100.0).trunc();
    }
    if gas_level > GAS_LIMIT {
        score -= ((gas_level - GAS_LIMIT) / 5.0).min(100.0).trunc();
    }
    score -= (helmet_violations * 10.0).min(100.0);
    if high_vibration {
        score -= 10.0;
    }

    score.clamp(0.0, 100.0)
}

/// Risk band for a safety score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            RiskLevel::Low
        } else if score >= 50 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    /// Operator guidance for this band
    pub fn advice(&self) -> &'static str {
        match self {
            RiskLevel::Low => "site stable",
            RiskLevel::Moderate => "monitor closely",
            RiskLevel::High => "take immediate action",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        };
        write!(f, "{}", name)
    }
}

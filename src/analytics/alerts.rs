//! Safety Alerts
//!
//! Classifies a reading into at most one alert, most severe first, and logs
//! alerts as they change.

use std::sync::Mutex;

use super::safety::{safety_score, GAS_LIMIT, TEMPERATURE_LIMIT};
use crate::poller::ReadingObserver;
use crate::telemetry::SensorReading;

/// Score below which a reading is critical
pub const CRITICAL_SCORE: u8 = 50;

/// The most severe condition present in a reading
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Critical { score: u8 },
    HighGas { gas_level: f64 },
    Overheat { temperature: f64 },
    HelmetViolation { count: u32 },
}

impl Alert {
    /// First matching condition wins; `None` for a safe reading
    pub fn evaluate(reading: &SensorReading) -> Option<Self> {
        let score = safety_score(reading);

        if score < CRITICAL_SCORE {
            Some(Alert::Critical { score })
        } else if reading.gas_level > GAS_LIMIT {
            Some(Alert::HighGas {
                gas_level: reading.gas_level,
            })
        } else if reading.temperature > TEMPERATURE_LIMIT {
            Some(Alert::Overheat {
                temperature: reading.temperature,
            })
        } else if reading.helmet_violations > 0 {
            Some(Alert::HelmetViolation {
                count: reading.helmet_violations,
            })
        } else {
            None
        }
    }

    pub fn message(&self) -> String {
        match self {
            Alert::Critical { score } => format!(
                "🚨 CRITICAL: Safety score low ({})! Immediate action required.",
                score
            ),
            Alert::HighGas { gas_level } => format!("⚠️ High Gas Detected: {} ppm.", gas_level),
            Alert::Overheat { temperature } => {
                format!("🔥 Overheat Risk: {}°C detected on site.", temperature)
            }
            Alert::HelmetViolation { count } => {
                format!("🪖 Helmet Violation(s) Detected: {}", count)
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Alert::Critical { .. } => "critical",
            Alert::HighGas { .. } => "high_gas",
            Alert::Overheat { .. } => "overheat",
            Alert::HelmetViolation { .. } => "helmet_violation",
        }
    }
}

/// Transition of the active alert
#[derive(Debug, Clone, PartialEq)]
pub enum AlertChange {
    /// A new alert replaced no alert or a different one
    Raised(Alert),
    /// The previous alert no longer applies
    Cleared,
}

/// Logs a warning whenever the active alert changes
#[derive(Debug, Default)]
pub struct AlertMonitor {
    active: Mutex<Option<Alert>>,
}

impl AlertMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alert raised by the most recent reading
    pub fn active(&self) -> Option<Alert> {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Record a reading; `None` when the active alert is unchanged
    pub fn update(&self, reading: &SensorReading) -> Option<AlertChange> {
        let alert = Alert::evaluate(reading);
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());

        if *active == alert {
            return None;
        }

        let change = match &alert {
            Some(a) => {
                tracing::warn!(kind = a.kind(), "{}", a.message());
                AlertChange::Raised(a.clone())
            }
            None => {
                tracing::info!("Site readings back to normal");
                AlertChange::Cleared
            }
        };

        *active = alert;
        Some(change)
    }
}

impl ReadingObserver for AlertMonitor {
    fn observe(&self, reading: &SensorReading) {
        self.update(reading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_reading_has_no_alert() {
        assert_eq!(Alert::evaluate(&SensorReading::new(30.0, 250.0, 0)), None);
    }

    #[test]
    fn test_priority_order() {
        // Score 100 - 4 - 10 = 86, gas wins over temperature
        let alert = Alert::evaluate(&SensorReading::new(40.0, 450.0, 0));
        assert_eq!(alert, Some(Alert::HighGas { gas_level: 450.0 }));

        let alert = Alert::evaluate(&SensorReading::new(39.0, 300.0, 1));
        assert_eq!(alert, Some(Alert::Overheat { temperature: 39.0 }));

        let alert = Alert::evaluate(&SensorReading::new(30.0, 300.0, 2));
        assert_eq!(alert, Some(Alert::HelmetViolation { count: 2 }));

        let alert = Alert::evaluate(&SensorReading::new(30.0, 300.0, 6));
        assert_eq!(alert, Some(Alert::Critical { score: 40 }));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Alert::Critical { score: 42 }.message(),
            "🚨 CRITICAL: Safety score low (42)! Immediate action required."
        );
        assert_eq!(
            Alert::HelmetViolation { count: 3 }.message(),
            "🪖 Helmet Violation(s) Detected: 3"
        );
    }

    #[test]
    fn test_monitor_reports_changes_only() {
        let monitor = AlertMonitor::new();
        let violating = SensorReading::new(30.0, 300.0, 1);

        assert_eq!(
            monitor.update(&violating),
            Some(AlertChange::Raised(Alert::HelmetViolation { count: 1 }))
        );
        assert_eq!(monitor.update(&violating), None);
        assert_eq!(monitor.active(), Some(Alert::HelmetViolation { count: 1 }));
    }

    #[test]
    fn test_monitor_distinguishes_cleared_from_unchanged() {
        let monitor = AlertMonitor::new();
        let safe = SensorReading::new(30.0, 300.0, 0);

        // Safe from the start is not a change
        assert_eq!(monitor.update(&safe), None);

        monitor.update(&SensorReading::new(30.0, 300.0, 1));
        assert_eq!(monitor.update(&safe), Some(AlertChange::Cleared));
        assert_eq!(monitor.active(), None);
        assert_eq!(monitor.update(&safe), None);

        // Escalation is a new alert, not a clear
        monitor.update(&SensorReading::new(39.0, 300.0, 0));
        assert_eq!(
            monitor.update(&SensorReading::new(30.0, 300.0, 6)),
            Some(AlertChange::Raised(Alert::Critical { score: 40 }))
        );
    }
}

//! Telemetry Types
//!
//! Wire shapes for the detection backend's `/get_data` and `/run_ai` endpoints.

use serde::{Deserialize, Serialize};

/// Vibration level reported by the site sensor simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vibration {
    Normal,
    High,
}

/// One telemetry snapshot from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Ambient temperature in °C
    pub temperature: f64,
    /// Gas concentration in ppm
    pub gas_level: f64,
    /// Number of workers detected without a helmet
    pub helmet_violations: u32,
    /// Vibration level, when the sensor reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration: Option<Vibration>,
}

impl SensorReading {
    pub fn new(temperature: f64, gas_level: f64, helmet_violations: u32) -> Self {
        Self {
            temperature,
            gas_level,
            helmet_violations,
            vibration: None,
        }
    }

    /// Builder: set vibration level
    pub fn vibration(mut self, vibration: Vibration) -> Self {
        self.vibration = Some(vibration);
        self
    }

    /// Temperature with its unit suffix, e.g. `"36.2 °C"`
    pub fn temperature_text(&self) -> String {
        format!("{} °C", self.temperature)
    }

    /// Gas level with its unit suffix, e.g. `"412 ppm"`
    pub fn gas_level_text(&self) -> String {
        format!("{} ppm", self.gas_level)
    }

    pub fn helmet_violations_text(&self) -> String {
        self.helmet_violations.to_string()
    }
}

/// Body of a `/run_ai` response as sent over the wire
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDetectionReply {
    pub status: String,
    #[serde(default)]
    pub data: Option<DetectionData>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DetectionData {
    pub helmet_violations: u32,
}

/// Interpreted outcome of a detection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionReply {
    /// The run finished and reported its violation count
    Success { helmet_violations: u32 },
    /// The backend answered with a non-success status
    Failed { status: String, message: String },
}

impl RawDetectionReply {
    /// Returns `None` when a success reply carries no data
    pub(crate) fn interpret(self) -> Option<DetectionReply> {
        if self.status == "success" {
            return self.data.map(|d| DetectionReply::Success {
                helmet_violations: d.helmet_violations,
            });
        }

        Some(DetectionReply::Failed {
            status: self.status,
            message: self.message.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_suffixes() {
        let reading = SensorReading::new(36.2, 412.0, 3);
        assert_eq!(reading.temperature_text(), "36.2 °C");
        assert_eq!(reading.gas_level_text(), "412 ppm");
        assert_eq!(reading.helmet_violations_text(), "3");
    }

    #[test]
    fn test_reading_from_backend_json() {
        let reading: SensorReading = serde_json::from_str(
            r#"{"temperature": 39.5, "gas_level": 287.25, "helmet_violations": 0, "vibration": "High"}"#,
        )
        .unwrap();

        assert_eq!(reading.temperature, 39.5);
        assert_eq!(reading.gas_level, 287.25);
        assert_eq!(reading.vibration, Some(Vibration::High));
        assert_eq!(reading.gas_level_text(), "287.25 ppm");
    }

    #[test]
    fn test_reading_rejects_negative_violations() {
        let result: Result<SensorReading, _> = serde_json::from_str(
            r#"{"temperature": 30, "gas_level": 100, "helmet_violations": -1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_detection_reply_success() {
        let raw: RawDetectionReply = serde_json::from_str(
            r#"{"status": "success", "data": {"helmet_violations": 3}}"#,
        )
        .unwrap();
        assert_eq!(
            raw.interpret(),
            Some(DetectionReply::Success { helmet_violations: 3 })
        );
    }

    #[test]
    fn test_detection_reply_error() {
        let raw: RawDetectionReply =
            serde_json::from_str(r#"{"status": "error", "message": "camera offline"}"#).unwrap();
        assert_eq!(
            raw.interpret(),
            Some(DetectionReply::Failed {
                status: "error".to_string(),
                message: "camera offline".to_string(),
            })
        );
    }

    #[test]
    fn test_success_without_data_is_not_interpretable() {
        let raw: RawDetectionReply = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert_eq!(raw.interpret(), None);
    }
}

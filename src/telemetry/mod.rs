//! Backend Telemetry
//!
//! Typed access to the detection backend:
//! - `GET /get_data` - latest sensor reading
//! - `GET /run_ai` - one-shot helmet detection run

mod client;
mod types;

pub use client::{BackendClient, BackendConfig, BackendError};
pub use types::{DetectionReply, SensorReading, Vibration};

use async_trait::async_trait;

/// Source of sensor readings and detection runs
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch the latest sensor reading
    async fn fetch_reading(&self) -> Result<SensorReading, BackendError>;

    /// Run a detection pass and return its outcome
    async fn run_detection(&self) -> Result<DetectionReply, BackendError>;
}

//! # SafeSite
//!
//! Live telemetry client for the SafeSite construction-safety dashboard.
//!
//! ## Features
//!
//! - **Live readouts**: fixed-cadence polling of the detection backend
//! - **Tolerant**: failed polls show a placeholder and polling carries on
//! - **Detection runs**: one-shot helmet detection with a status line
//! - **Safety analytics**: safety score, risk level, trend forecast, alerts
//!
//! ## Modules
//!
//! - [`telemetry`]: Backend client and wire types
//! - [`display`]: Display elements and the context that binds them
//! - [`poller`]: Live-data poller
//! - [`detection`]: Detection trigger
//! - [`analytics`]: Safety score, history, forecast, and alerts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use safesite::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(BackendClient::new(BackendConfig::default())?);
//!
//!     let ids = ElementIds::default();
//!     let document = ConsoleDocument::new(&ids);
//!     let display = DisplayContext::bind(&document, &ids);
//!
//!     let poller = Arc::new(LiveDataPoller::new(source, display));
//!     let handle = poller.start_polling(DEFAULT_POLL_INTERVAL)?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.stop().await;
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod detection;
pub mod display;
pub mod poller;
pub mod telemetry;

// Re-export top-level types for convenience
pub use telemetry::{
    BackendClient, BackendConfig, BackendError, DetectionReply, SensorReading, TelemetrySource,
    Vibration,
};

pub use display::{
    ConsoleDocument, DisplayContext, ElementIds, ElementLookup, FailurePolicy, MemoryDocument,
    TextSink, NO_LIVE_DATA,
};

pub use poller::{
    LiveDataPoller, PollStats, PollerError, PollerHandle, ReadingObserver, DEFAULT_POLL_INTERVAL,
};

pub use detection::{DetectionOutcome, DetectionTrigger, CANNOT_CONNECT, DETECTION_BUSY};

pub use analytics::{
    moving_average_forecast, safety_score, Alert, AlertChange, AlertMonitor, ReadingHistory,
    RiskLevel, SharedHistory,
};

pub use config::{Config, ConfigError, ConfigWarning, LoadedConfig, LoggingConfig};

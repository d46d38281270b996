//! Detection Trigger
//!
//! One-shot "run detection" action. The status line shows a busy message right
//! away and is replaced with the outcome once the backend answers. Triggers are
//! not de-duplicated: concurrent runs each write their own outcome.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::display::DisplayContext;
use crate::telemetry::{BackendError, DetectionReply, TelemetrySource};

/// Status text while a detection run is in flight
pub const DETECTION_BUSY: &str = "⏳ Running AI detection...";

/// Status text when the backend cannot be reached
pub const CANNOT_CONNECT: &str = "⚠️ Cannot connect to backend.";

/// Result of a detection run as shown to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    Complete { helmet_violations: u32 },
    Failed { message: String },
    CannotConnect,
}

impl DetectionOutcome {
    fn from_result(result: Result<DetectionReply, BackendError>) -> Self {
        match result {
            Ok(DetectionReply::Success { helmet_violations }) => {
                DetectionOutcome::Complete { helmet_violations }
            }
            Ok(DetectionReply::Failed { message, .. }) => DetectionOutcome::Failed { message },
            // Unreadable bodies land here too
            Err(_) => DetectionOutcome::CannotConnect,
        }
    }

    /// Status line text for this outcome
    pub fn message(&self) -> String {
        match self {
            DetectionOutcome::Complete { helmet_violations } => {
                format!("✅ Detection Complete! Helmet Violations: {}", helmet_violations)
            }
            DetectionOutcome::Failed { message } => format!("❌ Error: {}", message),
            DetectionOutcome::CannotConnect => CANNOT_CONNECT.to_string(),
        }
    }
}

/// Runs detection passes and reports them on the status element
pub struct DetectionTrigger {
    source: Arc<dyn TelemetrySource>,
    display: DisplayContext,
}

impl DetectionTrigger {
    pub fn new(source: Arc<dyn TelemetrySource>, display: DisplayContext) -> Self {
        Self { source, display }
    }

    /// Run one detection pass and wait for its outcome
    pub async fn trigger(&self) -> DetectionOutcome {
        self.display.set_status(DETECTION_BUSY);
        self.complete().await
    }

    /// Show the busy message now and run the pass in the background
    pub fn trigger_detached(self: &Arc<Self>) -> JoinHandle<DetectionOutcome> {
        self.display.set_status(DETECTION_BUSY);

        let trigger = Arc::clone(self);
        tokio::spawn(async move { trigger.complete().await })
    }

    async fn complete(&self) -> DetectionOutcome {
        let result = self.source.run_detection().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Detection run failed");
        }

        let outcome = DetectionOutcome::from_result(result);
        tracing::info!(outcome = %outcome.message(), "Detection run finished");

        self.display.set_status(&outcome.message());
        outcome
    }
}

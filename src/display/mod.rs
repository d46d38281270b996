//! Display Elements
//!
//! The poller and the detection trigger never reach for global page state.
//! They write through a [`DisplayContext`], which holds handles to the
//! elements it resolved from an [`ElementLookup`] at construction time.
//! Elements the host does not provide are skipped silently.

mod console;
mod memory;

pub use console::{ConsoleDocument, ConsoleElement};
pub use memory::{MemoryDocument, MemoryElement};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::telemetry::SensorReading;

/// Text shown in the primary element when no reading could be fetched
pub const NO_LIVE_DATA: &str = "No live data available.";

/// A display element that accepts text
pub trait TextSink: Send + Sync {
    /// Replace the element's text
    fn set_text(&self, text: &str);

    /// Current text, if the element can report it
    fn text(&self) -> Option<String> {
        None
    }
}

/// Resolves element identifiers to display elements
pub trait ElementLookup {
    fn element(&self, id: &str) -> Option<Arc<dyn TextSink>>;
}

/// Identifiers of the elements the dashboard writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementIds {
    #[serde(default = "default_temperature_id")]
    pub temperature: String,

    #[serde(default = "default_gas_id")]
    pub gas_level: String,

    #[serde(default = "default_helmet_id")]
    pub helmet_violations: String,

    #[serde(default = "default_status_id")]
    pub detection_status: String,
}

fn default_temperature_id() -> String {
    "temperature".to_string()
}

fn default_gas_id() -> String {
    "gas".to_string()
}

fn default_helmet_id() -> String {
    "helmet".to_string()
}

fn default_status_id() -> String {
    "ai-status".to_string()
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            temperature: default_temperature_id(),
            gas_level: default_gas_id(),
            helmet_violations: default_helmet_id(),
            detection_status: default_status_id(),
        }
    }
}

/// What happens to the secondary elements when a poll fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave gas and helmet readouts showing their last values
    #[default]
    KeepLast,
    /// Blank gas and helmet readouts
    Clear,
}

/// Element handles used by the poller and the detection trigger
#[derive(Clone, Default)]
pub struct DisplayContext {
    temperature: Option<Arc<dyn TextSink>>,
    gas_level: Option<Arc<dyn TextSink>>,
    helmet_violations: Option<Arc<dyn TextSink>>,
    detection_status: Option<Arc<dyn TextSink>>,
}

impl DisplayContext {
    /// Resolve all elements from a lookup
    pub fn bind(lookup: &dyn ElementLookup, ids: &ElementIds) -> Self {
        let ctx = Self {
            temperature: lookup.element(&ids.temperature),
            gas_level: lookup.element(&ids.gas_level),
            helmet_violations: lookup.element(&ids.helmet_violations),
            detection_status: lookup.element(&ids.detection_status),
        };

        tracing::debug!(
            temperature = ctx.temperature.is_some(),
            gas_level = ctx.gas_level.is_some(),
            helmet_violations = ctx.helmet_violations.is_some(),
            detection_status = ctx.detection_status.is_some(),
            "Bound display elements"
        );

        ctx
    }

    /// Write every field of a reading into its element
    pub fn render_reading(&self, reading: &SensorReading) {
        write(&self.temperature, &reading.temperature_text());
        write(&self.gas_level, &reading.gas_level_text());
        write(&self.helmet_violations, &reading.helmet_violations_text());
    }

    /// Show the placeholder after a failed poll
    pub fn render_unavailable(&self, policy: FailurePolicy) {
        write(&self.temperature, NO_LIVE_DATA);

        if policy == FailurePolicy::Clear {
            write(&self.gas_level, "");
            write(&self.helmet_violations, "");
        }
    }

    /// Replace the detection status line
    pub fn set_status(&self, text: &str) {
        write(&self.detection_status, text);
    }
}

fn write(sink: &Option<Arc<dyn TextSink>>, text: &str) {
    if let Some(sink) = sink {
        sink.set_text(text);
    }
}

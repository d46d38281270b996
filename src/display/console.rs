//! Console display elements for the CLI
//!
//! Each element prints `label  text` to stdout when its text changes.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, RwLock};

use super::{ElementIds, ElementLookup, TextSink};

/// Element that echoes its text to stdout
#[derive(Debug)]
pub struct ConsoleElement {
    label: String,
    text: RwLock<Option<String>>,
}

impl ConsoleElement {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: RwLock::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl TextSink for ConsoleElement {
    fn set_text(&self, text: &str) {
        let mut current = self.text.write().unwrap_or_else(|e| e.into_inner());
        if current.as_deref() == Some(text) {
            return;
        }
        *current = Some(text.to_string());
        drop(current);

        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{:<20} {}", self.label, text);
    }

    fn text(&self) -> Option<String> {
        self.text.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Console elements for the standard dashboard readouts
pub struct ConsoleDocument {
    elements: HashMap<String, Arc<ConsoleElement>>,
}

impl ConsoleDocument {
    /// Create one labelled element per dashboard identifier
    pub fn new(ids: &ElementIds) -> Self {
        let labels = [
            (&ids.temperature, "🌡️  Temperature"),
            (&ids.gas_level, "🧪 Gas Level"),
            (&ids.helmet_violations, "⛑️  Helmet Violations"),
            (&ids.detection_status, "🤖 Detection"),
        ];

        let elements = labels
            .into_iter()
            .map(|(id, label)| (id.clone(), Arc::new(ConsoleElement::new(label))))
            .collect();

        Self { elements }
    }
}

impl ElementLookup for ConsoleDocument {
    fn element(&self, id: &str) -> Option<Arc<dyn TextSink>> {
        self.elements
            .get(id)
            .map(|e| Arc::clone(e) as Arc<dyn TextSink>)
    }
}

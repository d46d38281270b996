//! In-memory display elements, for embedding and tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{ElementLookup, TextSink};

/// Element that keeps its text in memory
#[derive(Debug, Default)]
pub struct MemoryElement {
    text: RwLock<String>,
    writes: RwLock<usize>,
}

impl MemoryElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the text has been set
    pub fn writes(&self) -> usize {
        *self.writes.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl TextSink for MemoryElement {
    fn set_text(&self, text: &str) {
        let mut current = self.text.write().unwrap_or_else(|e| e.into_inner());
        current.clear();
        current.push_str(text);
        drop(current);

        *self.writes.write().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn text(&self) -> Option<String> {
        Some(self.text.read().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

/// A set of in-memory elements addressed by identifier
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: HashMap<String, Arc<MemoryElement>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document holding one empty element per identifier
    pub fn with_elements(ids: &[&str]) -> Self {
        let mut doc = Self::new();
        for id in ids {
            doc.insert(id);
        }
        doc
    }

    /// Add an element, returning its handle
    pub fn insert(&mut self, id: &str) -> Arc<MemoryElement> {
        Arc::clone(
            self.elements
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(MemoryElement::new())),
        )
    }

    pub fn get(&self, id: &str) -> Option<Arc<MemoryElement>> {
        self.elements.get(id).cloned()
    }

    /// Text of an element, `None` if the element does not exist
    pub fn text_of(&self, id: &str) -> Option<String> {
        self.elements.get(id).and_then(|e| e.text())
    }
}

impl ElementLookup for MemoryDocument {
    fn element(&self, id: &str) -> Option<Arc<dyn TextSink>> {
        self.elements
            .get(id)
            .map(|e| Arc::clone(e) as Arc<dyn TextSink>)
    }
}

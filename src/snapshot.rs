//! Capture and exact reversal of an element's style properties.

use crate::host::{HostDocument, StylePriority};

/// Properties the engine writes on the pinned panel while pinned.
pub const PINNED_PANEL_PROPERTIES: [&str; 21] = [
    "position",
    "top",
    "right",
    "left",
    "width",
    "height",
    "z-index",
    "background-color",
    "border",
    "box-shadow",
    "border-radius",
    "transform",
    "transition",
    "overflow",
    "overflow-x",
    "overflow-y",
    "padding",
    "padding-left",
    "margin",
    "resize",
    "display",
];

/// Properties the engine writes on the displaced panel while pinned.
pub const DISPLACED_PANEL_PROPERTIES: [&str; 6] = [
    "transform",
    "transition",
    "margin-left",
    "left",
    "right",
    "z-index",
];

/// Values that mean "nothing was set"; restoring them clears the property so
/// the host's own cascade applies again.
const INITIAL_VALUES: [&str; 4] = ["", "none", "auto", "initial"];

pub fn is_initial_value(value: &str) -> bool {
    let value = value.trim();
    INITIAL_VALUES.iter().any(|initial| *initial == value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SnapshotEntry {
    property: String,
    value: String,
    priority: StylePriority,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl StyleSnapshot {
    fn entry(&self, property: &str) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|entry| entry.property == property)
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.entry(property).map(|entry| entry.value.as_str())
    }

    pub fn priority(&self, property: &str) -> Option<StylePriority> {
        self.entry(property).map(|entry| entry.priority)
    }

    pub fn covers(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.property.as_str())
    }
}

/// Records each property's explicit inline value with its priority, or the
/// computed value when no inline value is set.
pub fn capture<D: HostDocument>(doc: &D, node: &D::Node, properties: &[&str]) -> StyleSnapshot {
    let entries = properties
        .iter()
        .map(|property| {
            let inline = doc.inline_style(node, property);
            let (value, priority) = if inline.is_empty() {
                (doc.computed_style(node, property), StylePriority::Normal)
            } else {
                (inline, doc.inline_priority(node, property))
            };
            SnapshotEntry {
                property: (*property).to_string(),
                value,
                priority,
            }
        })
        .collect();
    StyleSnapshot { entries }
}

/// Writes every captured value back. Idempotent.
pub fn restore<D: HostDocument>(doc: &D, node: &D::Node, snapshot: &StyleSnapshot) {
    for entry in &snapshot.entries {
        if is_initial_value(&entry.value) {
            doc.remove_style(node, &entry.property);
        } else {
            doc.set_style(node, &entry.property, &entry.value, entry.priority);
        }
    }
}

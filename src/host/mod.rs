use std::fmt::Debug;
use std::time::Duration;

use crate::geometry::{Rect, Viewport};

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Handle returned by [`HostDocument::subscribe`]; every asynchronous callback
/// is tagged with the id it was registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StylePriority {
    #[default]
    Normal,
    Important,
}

impl StylePriority {
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Important => "important",
        }
    }
}

/// Notification channels the engine can ask the host for.
#[derive(Debug, Clone, PartialEq)]
pub enum Subscription<N> {
    /// Child-list additions anywhere under the document root.
    NodesAdded,
    /// Size changes of one element.
    ContentResize { target: N },
    /// Viewport (window) size changes.
    ViewportResize,
    /// Repeating timer.
    Interval { period: Duration },
    /// One-shot timer.
    Timeout { delay: Duration },
    /// Pointer-down on `handle`, then pointer moves/release anywhere.
    ResizeDrag { handle: N },
    /// Click on `target`.
    Activation { target: N },
}

/// Callbacks delivered back from the host, each tagged with its registration.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent<N> {
    NodesAdded { watch: WatchId, nodes: Vec<N> },
    ContentResized { watch: WatchId },
    ViewportResized { watch: WatchId },
    IntervalElapsed { watch: WatchId },
    TimerFired { watch: WatchId },
    DragStart { watch: WatchId, pointer_x: f64 },
    DragMove { watch: WatchId, pointer_x: f64 },
    DragEnd { watch: WatchId },
    Activated { watch: WatchId },
}

impl<N> HostEvent<N> {
    pub fn watch(&self) -> WatchId {
        match self {
            Self::NodesAdded { watch, .. }
            | Self::ContentResized { watch }
            | Self::ViewportResized { watch }
            | Self::IntervalElapsed { watch }
            | Self::TimerFired { watch }
            | Self::DragStart { watch, .. }
            | Self::DragMove { watch, .. }
            | Self::DragEnd { watch }
            | Self::Activated { watch } => *watch,
        }
    }
}

/// Query and mutation surface of the host page.
///
/// Node handles are non-owning: the host may detach or drop the underlying
/// element at any time, so callers check [`HostDocument::is_connected`]
/// before trusting a handle they kept around.
pub trait HostDocument {
    type Node: Clone + PartialEq + Debug;

    fn root(&self) -> Self::Node;
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    /// Elements matching a CSS selector in document order, optionally scoped
    /// to the descendants of `scope`.
    fn query_all(&self, scope: Option<&Self::Node>, selector: &str) -> Vec<Self::Node>;
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;
    fn class_name(&self, node: &Self::Node) -> String;
    fn tag_name(&self, node: &Self::Node) -> String;
    fn bounding_rect(&self, node: &Self::Node) -> Rect;
    fn viewport(&self) -> Viewport;

    /// Explicit inline value, empty when unset.
    fn inline_style(&self, node: &Self::Node, property: &str) -> String;
    /// Priority of the inline value; `Normal` when unset.
    fn inline_priority(&self, node: &Self::Node, property: &str) -> StylePriority;
    /// Resolved value after the cascade.
    fn computed_style(&self, node: &Self::Node, property: &str) -> String;
    fn set_style(&self, node: &Self::Node, property: &str, value: &str, priority: StylePriority);
    fn remove_style(&self, node: &Self::Node, property: &str);

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
    fn is_connected(&self, node: &Self::Node) -> bool;
    /// Moves `node` under `parent`, before `before` or last when `None`.
    fn insert_before(&self, parent: &Self::Node, node: &Self::Node, before: Option<&Self::Node>);
    fn remove(&self, node: &Self::Node);
    /// `None` when the host refuses to create the element.
    fn create_element(&self, tag: &str) -> Option<Self::Node>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn set_text(&self, node: &Self::Node, text: &str);

    fn subscribe(&self, subscription: Subscription<Self::Node>) -> WatchId;
    fn unsubscribe(&self, watch: WatchId);

    /// Asks an embedded rich-text editor to recompute its own layout.
    fn relayout_rich_editor(&self, _node: &Self::Node) {}

    fn append_child(&self, parent: &Self::Node, node: &Self::Node) {
        self.insert_before(parent, node, None);
    }

    fn append_to_root(&self, node: &Self::Node) {
        let root = self.root();
        self.append_child(&root, node);
    }

    fn contains_class(&self, node: &Self::Node, fragment: &str) -> bool {
        self.class_name(node).contains(fragment)
    }
}

use crate::config::PinConfig;
use crate::host::{HostDocument, StylePriority};
use crate::layout::{self, ContentSizing, Motion, ResizeSession};
use crate::locator::PanelLocator;
use crate::snapshot::{self, StyleSnapshot, DISPLACED_PANEL_PROPERTIES};
use crate::watch::WatcherSet;

const DRAG_BODY_PROPERTIES: [&str; 2] = ["cursor", "user-select"];

/// Where the pinned panel lived before it was re-parented to the root.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorPoint<N> {
    pub parent: N,
    pub next_sibling: Option<N>,
}

impl<N: Clone + PartialEq> AnchorPoint<N> {
    pub fn capture<D: HostDocument<Node = N>>(doc: &D, node: &N) -> Option<Self> {
        Some(Self {
            parent: doc.parent(node)?,
            next_sibling: doc.next_sibling(node),
        })
    }

    /// Puts `node` back before its original next sibling when that sibling is
    /// still under the same parent, otherwise appends it to the parent.
    pub fn reinsert<D: HostDocument<Node = N>>(&self, doc: &D, node: &N) {
        let before = self
            .next_sibling
            .as_ref()
            .filter(|sibling| doc.parent(sibling).as_ref() == Some(&self.parent));
        doc.insert_before(&self.parent, node, before);
    }
}

/// An in-flight drag on the resize handle.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub session: ResizeSession,
    pub body_snapshot: StyleSnapshot,
}

/// Everything captured at pin time and needed to undo it. Present exactly
/// while the engine is pinned.
#[derive(Debug)]
pub struct PinContext<N> {
    pub pinned: N,
    pub pinned_snapshot: StyleSnapshot,
    pub anchor: Option<AnchorPoint<N>>,
    pub displaced: Option<N>,
    pub displaced_snapshot: StyleSnapshot,
    /// Panels swapped out or detached while pinned, with their pre-pin styles.
    pub retired: Vec<(N, StyleSnapshot)>,
    pub sizing: ContentSizing<N>,
    pub watchers: WatcherSet,
    pub handle: Option<N>,
    pub drag: Option<DragState>,
    pub last_offset: Option<f64>,
}

impl<N: Clone + PartialEq> PinContext<N> {
    /// Switches tracking to `node`. The previous panel is retired: it keeps
    /// its translation, so it cannot qualify again and bounce tracking back,
    /// and is restored on unpin if it is in the document by then.
    pub fn track_displaced<D: HostDocument<Node = N>>(&mut self, doc: &D, node: N) {
        if self.displaced.as_ref() == Some(&node) {
            return;
        }
        self.retire_displaced();
        let returning = self.retired.iter().position(|(retired, _)| *retired == node);
        self.displaced_snapshot = match returning {
            Some(index) => self.retired.remove(index).1,
            None => snapshot::capture(doc, &node, &DISPLACED_PANEL_PROPERTIES),
        };
        self.displaced = Some(node);
    }

    /// Hard-restores every retired panel still in the document.
    pub fn restore_retired<D: HostDocument<Node = N>>(&mut self, doc: &D) {
        for (node, snapshot) in self.retired.drain(..) {
            if doc.is_connected(&node) {
                snapshot::restore(doc, &node, &snapshot);
            }
        }
    }

    /// Stops tracking the current panel but keeps its pre-pin snapshot, since
    /// the host may attach the same element again before unpin.
    pub fn retire_displaced(&mut self) {
        if let Some(previous) = self.displaced.take() {
            let snapshot = std::mem::take(&mut self.displaced_snapshot);
            self.retired.push((previous, snapshot));
        }
    }

    /// The tracked displaced panel, re-located through the strategies when
    /// the handle has gone stale.
    pub fn live_displaced<D: HostDocument<Node = N>>(
        &mut self,
        doc: &D,
        locator: &PanelLocator,
    ) -> Option<N> {
        if let Some(node) = self.displaced.as_ref().filter(|node| doc.is_connected(node)) {
            return Some(node.clone());
        }
        if self.displaced.is_some() {
            tracing::debug!("tracked displaced panel detached; re-locating");
            self.retire_displaced();
        }
        let info = locator.locate(doc)?;
        self.track_displaced(doc, info.node.clone());
        Some(info.node)
    }

    /// Idempotent correction of the displaced panel's translation.
    pub fn reanchor<D: HostDocument<Node = N>>(
        &mut self,
        doc: &D,
        locator: &PanelLocator,
        motion: Motion,
        config: &PinConfig,
    ) -> Option<f64> {
        let Some(displaced) = self.live_displaced(doc, locator) else {
            tracing::trace!("no displaced panel to re-anchor");
            return None;
        };
        let offset = layout::reanchor(doc, &self.pinned, &displaced, motion, config);
        self.last_offset = Some(offset);
        Some(offset)
    }

    pub fn begin_drag<D: HostDocument<Node = N>>(&mut self, doc: &D, pointer_x: f64) {
        let body = doc.root();
        let body_snapshot = snapshot::capture(doc, &body, &DRAG_BODY_PROPERTIES);
        doc.set_style(&body, "cursor", "col-resize", StylePriority::Normal);
        doc.set_style(&body, "user-select", "none", StylePriority::Normal);
        let start_width = doc.bounding_rect(&self.pinned).width;
        tracing::debug!(pointer_x, start_width, "resize drag started");
        self.drag = Some(DragState {
            session: ResizeSession::begin(pointer_x, start_width),
            body_snapshot,
        });
    }

    pub fn end_drag<D: HostDocument<Node = N>>(&mut self, doc: &D) {
        if let Some(drag) = self.drag.take() {
            snapshot::restore(doc, &doc.root(), &drag.body_snapshot);
            tracing::debug!("resize drag ended");
        }
    }
}

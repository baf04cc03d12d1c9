//! Detectors that notice when the host has invalidated the pinned layout.
//!
//! Three independent channels feed one idempotent re-anchor: structural
//! additions, size changes of the pinned panel's content region, and a
//! periodic re-validation that catches writes no observer reports. All of
//! them, plus any deferred corrections, live in one [`WatcherSet`] so they
//! can be torn down together.

use std::time::Duration;

use crate::config::PinConfig;
use crate::host::{HostDocument, Subscription, WatchId};
use crate::layout::transform_is_cleared;
use crate::locator::{PanelInfo, PanelLocator};

/// One-shot work scheduled on a host timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Settling correction: instant re-anchor from live geometry.
    Reanchor,
    /// Ask the rich editor to relayout once a drag settles.
    EditorRelayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Structural,
    ContentSize,
    Revalidate,
    Viewport,
    Drag,
    Deferred(Deferred),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct WatcherSet {
    structural: Option<WatchId>,
    content: Option<WatchId>,
    revalidate: Option<WatchId>,
    viewport: Option<WatchId>,
    drag: Option<WatchId>,
    deferred: Vec<(WatchId, Deferred)>,
}

impl WatcherSet {
    /// Subscribes every detector for a freshly pinned panel.
    pub fn start<D: HostDocument>(
        doc: &D,
        pinned: &D::Node,
        handle: Option<&D::Node>,
        config: &PinConfig,
    ) -> Self {
        let content = doc
            .query_all(Some(pinned), &config.content_region_selector)
            .into_iter()
            .next()
            .map(|target| doc.subscribe(Subscription::ContentResize { target }));
        if content.is_none() {
            tracing::debug!("content region not found; size watch inactive");
        }
        let watchers = Self {
            structural: Some(doc.subscribe(Subscription::NodesAdded)),
            content,
            revalidate: Some(doc.subscribe(Subscription::Interval {
                period: config.revalidate_interval(),
            })),
            viewport: Some(doc.subscribe(Subscription::ViewportResize)),
            drag: handle.map(|handle| {
                doc.subscribe(Subscription::ResizeDrag {
                    handle: handle.clone(),
                })
            }),
            deferred: Vec::new(),
        };
        tracing::debug!(active = watchers.active(), "change watchers started");
        watchers
    }

    pub fn defer<D: HostDocument>(&mut self, doc: &D, delay: Duration, task: Deferred) -> WatchId {
        let watch = doc.subscribe(Subscription::Timeout { delay });
        self.deferred.push((watch, task));
        watch
    }

    /// Cancels every pending instance of `task`.
    pub fn cancel<D: HostDocument>(&mut self, doc: &D, task: Deferred) {
        self.deferred.retain(|(watch, pending)| {
            if *pending == task {
                doc.unsubscribe(*watch);
                false
            } else {
                true
            }
        });
    }

    pub fn classify(&self, watch: WatchId) -> Option<WatchKind> {
        let is = |slot: Option<WatchId>| slot == Some(watch);
        if is(self.structural) {
            Some(WatchKind::Structural)
        } else if is(self.content) {
            Some(WatchKind::ContentSize)
        } else if is(self.revalidate) {
            Some(WatchKind::Revalidate)
        } else if is(self.viewport) {
            Some(WatchKind::Viewport)
        } else if is(self.drag) {
            Some(WatchKind::Drag)
        } else {
            self.deferred
                .iter()
                .find(|(pending, _)| *pending == watch)
                .map(|(_, task)| WatchKind::Deferred(*task))
        }
    }

    /// Forgets a deferred task whose one-shot timer has fired and releases
    /// the timer's registration.
    pub fn take_deferred<D: HostDocument>(
        &mut self,
        doc: &D,
        watch: WatchId,
    ) -> Option<Deferred> {
        let position = self
            .deferred
            .iter()
            .position(|(pending, _)| *pending == watch)?;
        doc.unsubscribe(watch);
        Some(self.deferred.remove(position).1)
    }

    pub fn active(&self) -> usize {
        [
            self.structural,
            self.content,
            self.revalidate,
            self.viewport,
            self.drag,
        ]
        .iter()
        .flatten()
        .count()
            + self.deferred.len()
    }

    /// Unsubscribes everything. After this returns no watch id from this set
    /// classifies, so callbacks already queued by the host fall through.
    pub fn stop<D: HostDocument>(&mut self, doc: &D) {
        let standing = [
            self.structural.take(),
            self.content.take(),
            self.revalidate.take(),
            self.viewport.take(),
            self.drag.take(),
        ];
        for watch in standing.into_iter().flatten() {
            doc.unsubscribe(watch);
        }
        for (watch, _) in self.deferred.drain(..) {
            doc.unsubscribe(watch);
        }
        tracing::debug!("change watchers stopped");
    }
}

/// A newly added subtree that carries a displaced-panel candidate other than
/// the one being tracked: the host closed and reopened the panel.
pub fn recreated_panel<D: HostDocument>(
    doc: &D,
    locator: &PanelLocator,
    added: &[D::Node],
    tracked: Option<&D::Node>,
) -> Option<D::Node> {
    added
        .iter()
        .filter_map(|node| locator.recognize_in(doc, node))
        .find(|candidate| Some(candidate) != tracked)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Revalidation<N> {
    Unchanged,
    /// A different element now qualifies as the displaced panel.
    Swap(PanelInfo<N>),
    /// The tracked panel's translation was cleared behind our back.
    TransformLost,
    /// Nothing tracked and nothing qualifies, or the tracked node is gone.
    Lost,
}

pub fn revalidate<D: HostDocument>(
    doc: &D,
    locator: &PanelLocator,
    tracked: Option<&D::Node>,
) -> Revalidation<D::Node> {
    let tracked = tracked.filter(|node| doc.is_connected(node));
    if let Some(info) = locator.locate(doc) {
        if Some(&info.node) != tracked {
            return Revalidation::Swap(info);
        }
    }
    match tracked {
        Some(node) if transform_is_cleared(&doc.inline_style(node, "transform")) => {
            Revalidation::TransformLost
        }
        Some(_) => Revalidation::Unchanged,
        None => Revalidation::Lost,
    }
}

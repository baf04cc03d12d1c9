//! The pin lifecycle: entry, exit, and every correction in between.
//!
//! [`PinEngine`] owns all mutable engine state. Host callbacks come back in
//! through [`PinEngine::dispatch`] tagged with the [`WatchId`] they were
//! registered under; ids that are no longer registered are dropped, which is
//! what keeps a callback queued before `unpin` from touching the page.

mod context;
mod discovery;

pub use context::{AnchorPoint, DragState, PinContext};
pub use discovery::{DiscoveryError, DiscoveryPoll};

use serde::Serialize;

use crate::config::PinConfig;
use crate::cosmetic::{self, CosmeticSink, SuggestPopupPatch};
use crate::error::{EngineError, EngineResult};
use crate::host::{HostDocument, HostEvent, StylePriority, Subscription, WatchId};
use crate::layout::{self, sizing, ContentSizing, Motion};
use crate::locator::{locate_pinned_panel, PanelLocator};
use crate::snapshot::{self, StyleSnapshot, DISPLACED_PANEL_PROPERTIES, PINNED_PANEL_PROPERTIES};
use crate::state::{PinEvent, PinState, StateMachine};
use crate::ui::ToggleControl;
use crate::watch::{self, Deferred, Revalidation, WatchKind, WatcherSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    Pinned,
    AlreadyPinned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpinOutcome {
    Unpinned,
    AlreadyUnpinned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Searching,
    Found,
    Exhausted,
}

/// Diagnostic view of the engine, serializable for the host console.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub state: PinState,
    pub discovery: DiscoveryStatus,
    pub discovery_attempts: u32,
    pub tracking_displaced: bool,
    pub translation: Option<f64>,
    pub active_watches: usize,
    pub transitions: usize,
}

/// Hard reset of a displaced panel, run once its animated reversal is done.
#[derive(Debug)]
struct PendingRestore<N> {
    watch: WatchId,
    node: N,
    snapshot: StyleSnapshot,
}

pub struct PinEngine<D: HostDocument, S = SuggestPopupPatch> {
    doc: D,
    config: PinConfig,
    locator: PanelLocator,
    machine: StateMachine,
    discovery: DiscoveryPoll,
    pinned_panel: Option<D::Node>,
    control: Option<ToggleControl<D::Node>>,
    context: Option<PinContext<D::Node>>,
    pending_restore: Option<PendingRestore<D::Node>>,
    cosmetics: S,
}

impl<D: HostDocument> PinEngine<D> {
    pub fn new(doc: D, config: PinConfig) -> Self {
        Self::with_cosmetics(doc, config, SuggestPopupPatch)
    }
}

impl<D: HostDocument, S: CosmeticSink<D>> PinEngine<D, S> {
    pub fn with_cosmetics(doc: D, config: PinConfig, cosmetics: S) -> Self {
        let locator = PanelLocator::from_config(&config.locator);
        Self {
            doc,
            config,
            locator,
            machine: StateMachine::new(),
            discovery: DiscoveryPoll::default(),
            pinned_panel: None,
            control: None,
            context: None,
            pending_restore: None,
            cosmetics,
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn config(&self) -> &PinConfig {
        &self.config
    }

    pub fn state(&self) -> PinState {
        self.machine.state()
    }

    pub fn control(&self) -> Option<&ToggleControl<D::Node>> {
        self.control.as_ref()
    }

    /// Looks for the pinned panel and injects the toggle once it exists.
    /// While the host is still rendering, retries are scheduled on a timer.
    pub fn start(&mut self) -> EngineResult<DiscoveryStatus> {
        if self.control.is_some() {
            return Ok(DiscoveryStatus::Found);
        }
        if self.discovery.is_finished() && self.pinned_panel.is_none() {
            return Err(DiscoveryError::Exhausted {
                id: self.config.pinned_panel_id.clone(),
                attempts: self.discovery.attempts(),
            }
            .into());
        }
        self.discover()
    }

    fn discover(&mut self) -> EngineResult<DiscoveryStatus> {
        match locate_pinned_panel(&self.doc, &self.config.pinned_panel_id) {
            Ok(panel) => {
                self.discovery.finish(&self.doc);
                tracing::info!(
                    attempts = self.discovery.attempts() + 1,
                    "formula bar found; injecting toggle"
                );
                self.control = ToggleControl::inject(&self.doc, &panel);
                self.sync_control();
                self.pinned_panel = Some(panel);
                Ok(DiscoveryStatus::Found)
            }
            Err(err) => {
                tracing::debug!(
                    %err,
                    attempt = self.discovery.attempts() + 1,
                    "formula bar not rendered yet"
                );
                match self.discovery.schedule_retry(&self.doc, &self.config) {
                    Ok(_) => Ok(DiscoveryStatus::Searching),
                    Err(exhausted) => {
                        tracing::warn!(%exhausted, "giving up on formula bar discovery");
                        Err(exhausted.into())
                    }
                }
            }
        }
    }

    /// The pinned panel, re-located by id when the kept handle went stale.
    fn live_pinned_panel(&mut self) -> EngineResult<D::Node> {
        if let Some(panel) = self
            .pinned_panel
            .as_ref()
            .filter(|panel| self.doc.is_connected(panel))
        {
            return Ok(panel.clone());
        }
        let panel = locate_pinned_panel(&self.doc, &self.config.pinned_panel_id)?;
        tracing::debug!("re-located formula bar after host re-render");
        if let Some(control) = self.control.take() {
            if self.doc.is_connected(control.node()) {
                self.control = Some(control);
            } else {
                control.remove(&self.doc);
                self.control = ToggleControl::inject(&self.doc, &panel);
            }
        }
        self.pinned_panel = Some(panel.clone());
        Ok(panel)
    }

    pub fn pin(&mut self) -> EngineResult<PinOutcome> {
        if self.machine.is_redundant(PinEvent::Pin) {
            tracing::debug!("pin requested while already pinned");
            return Ok(PinOutcome::AlreadyPinned);
        }
        let pinned = self.live_pinned_panel()?;
        self.finish_pending_restore();
        let Some(info) = self.locator.locate(&self.doc) else {
            tracing::warn!("properties panel not found; cannot pin yet");
            return Err(EngineError::NotReady);
        };

        let doc = &self.doc;
        let config = &self.config;
        let anchor = AnchorPoint::capture(doc, &pinned);
        if anchor.is_none() {
            tracing::warn!("formula bar has no parent; it will stay at the root after unpin");
        }
        let pinned_snapshot = snapshot::capture(doc, &pinned, &PINNED_PANEL_PROPERTIES);
        let displaced_snapshot = snapshot::capture(doc, &info.node, &DISPLACED_PANEL_PROPERTIES);

        layout::apply_pinned_layout(doc, &pinned, &info, config);
        doc.append_to_root(&pinned);
        let handle = layout::create_resize_handle(doc, &pinned);
        let mut sizing = ContentSizing::default();
        sizing.apply(doc, &pinned, config);

        let mut watchers = WatcherSet::start(doc, &pinned, handle.as_ref(), config);
        watchers.defer(doc, config.relayout_delay(), Deferred::EditorRelayout);
        watchers.defer(doc, config.settle_delay(), Deferred::Reanchor);

        self.machine.transition(PinEvent::Pin)?;
        self.context = Some(PinContext {
            pinned,
            pinned_snapshot,
            anchor,
            displaced: Some(info.node),
            displaced_snapshot,
            retired: Vec::new(),
            sizing,
            watchers,
            handle,
            drag: None,
            last_offset: Some(info.rect.width),
        });
        self.sync_control();
        tracing::info!(
            width = info.rect.width,
            height = info.rect.height,
            strategy = info.strategy,
            "formula bar pinned"
        );
        Ok(PinOutcome::Pinned)
    }

    pub fn unpin(&mut self) -> EngineResult<UnpinOutcome> {
        if self.machine.is_redundant(PinEvent::Unpin) {
            tracing::debug!("unpin requested while already unpinned");
            return Ok(UnpinOutcome::AlreadyUnpinned);
        }
        self.finish_pending_restore();

        if let Some(mut ctx) = self.context.take() {
            let doc = &self.doc;
            ctx.watchers.stop(doc);
            ctx.end_drag(doc);
            if let Some(handle) = ctx.handle.take() {
                doc.remove(&handle);
            }
            if let Some(displaced) = ctx.displaced.take() {
                let original = std::mem::take(&mut ctx.displaced_snapshot);
                self.pending_restore =
                    begin_displaced_restore(doc, displaced, original, &self.config);
            }
            ctx.restore_retired(doc);
            ctx.sizing.restore(doc);
            snapshot::restore(doc, &ctx.pinned, &ctx.pinned_snapshot);
            if let Some(anchor) = &ctx.anchor {
                anchor.reinsert(doc, &ctx.pinned);
            }
        }

        self.machine.transition(PinEvent::Unpin)?;
        self.sync_control();
        tracing::info!("formula bar unpinned");
        Ok(UnpinOutcome::Unpinned)
    }

    pub fn toggle(&mut self) -> EngineResult<PinState> {
        match self.machine.state() {
            PinState::Unpinned => {
                self.pin()?;
            }
            PinState::Pinned => {
                self.unpin()?;
            }
        }
        Ok(self.machine.state())
    }

    /// Recomputes the displaced panel's translation from live geometry.
    /// Returns the applied offset, or `None` when unpinned or when no
    /// displaced panel can be found.
    pub fn reanchor(&mut self, motion: Motion) -> Option<f64> {
        if !self.machine.state().is_pinned() {
            return None;
        }
        let ctx = self.context.as_mut()?;
        ctx.reanchor(&self.doc, &self.locator, motion, &self.config)
    }

    pub fn dispatch(&mut self, event: HostEvent<D::Node>) {
        let watch = event.watch();
        if self.discovery.owns(watch) {
            self.discovery.fired(&self.doc);
            if let Err(err) = self.discover() {
                tracing::debug!(%err, "discovery stopped");
            }
            return;
        }
        if self.control.as_ref().is_some_and(|control| control.watch() == watch) {
            if let HostEvent::Activated { .. } = event {
                if let Err(err) = self.toggle() {
                    tracing::warn!(%err, "toggle failed");
                }
            }
            return;
        }
        if self
            .pending_restore
            .as_ref()
            .is_some_and(|pending| pending.watch == watch)
        {
            self.finish_pending_restore();
            return;
        }
        if !self.machine.state().is_pinned() {
            tracing::trace!(?watch, "ignoring callback while unpinned");
            return;
        }
        let Some(kind) = self
            .context
            .as_ref()
            .and_then(|ctx| ctx.watchers.classify(watch))
        else {
            tracing::trace!(?watch, "ignoring callback from inactive watch");
            return;
        };

        match (kind, event) {
            (WatchKind::Structural, HostEvent::NodesAdded { nodes, .. }) => {
                self.on_nodes_added(&nodes)
            }
            (WatchKind::ContentSize, HostEvent::ContentResized { .. }) => self.on_content_resized(),
            (WatchKind::Revalidate, HostEvent::IntervalElapsed { .. }) => self.on_revalidate(),
            (WatchKind::Viewport, HostEvent::ViewportResized { .. }) => {
                self.reanchor(Motion::Instant);
            }
            (WatchKind::Drag, HostEvent::DragStart { pointer_x, .. }) => {
                if let Some(ctx) = self.context.as_mut() {
                    ctx.begin_drag(&self.doc, pointer_x);
                }
            }
            (WatchKind::Drag, HostEvent::DragMove { pointer_x, .. }) => self.on_drag_move(pointer_x),
            (WatchKind::Drag, HostEvent::DragEnd { .. }) => {
                if let Some(ctx) = self.context.as_mut() {
                    ctx.end_drag(&self.doc);
                }
            }
            (WatchKind::Deferred(_), HostEvent::TimerFired { .. }) => self.on_deferred(watch),
            (kind, event) => tracing::debug!(?kind, ?event, "callback does not match its watch"),
        }
    }

    fn on_nodes_added(&mut self, nodes: &[D::Node]) {
        for node in nodes {
            for popup in cosmetic::popups_in(&self.doc, node) {
                self.cosmetics.patch_popup(&self.doc, &popup);
            }
        }
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        let Some(panel) =
            watch::recreated_panel(&self.doc, &self.locator, nodes, ctx.displaced.as_ref())
        else {
            return;
        };
        tracing::info!("properties panel re-created by host; re-anchoring");
        ctx.track_displaced(&self.doc, panel);
        for delay in self.config.structural_delays() {
            ctx.watchers.defer(&self.doc, delay, Deferred::Reanchor);
        }
    }

    fn on_content_resized(&mut self) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        ctx.sizing.apply(&self.doc, &ctx.pinned, &self.config);
        ctx.reanchor(&self.doc, &self.locator, Motion::Instant, &self.config);
    }

    fn on_revalidate(&mut self) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        match watch::revalidate(&self.doc, &self.locator, ctx.displaced.as_ref()) {
            Revalidation::Unchanged => {}
            Revalidation::Swap(info) => {
                tracing::info!(strategy = info.strategy, "properties panel swapped; re-anchoring");
                ctx.track_displaced(&self.doc, info.node);
                ctx.reanchor(&self.doc, &self.locator, Motion::Instant, &self.config);
                ctx.watchers
                    .defer(&self.doc, self.config.swap_recheck(), Deferred::Reanchor);
            }
            Revalidation::TransformLost => {
                tracing::debug!("properties panel transform was cleared; reapplying");
                ctx.reanchor(&self.doc, &self.locator, Motion::Instant, &self.config);
            }
            Revalidation::Lost => {
                if ctx.displaced.is_some() {
                    tracing::debug!("properties panel closed; waiting for it to return");
                    ctx.retire_displaced();
                }
            }
        }
    }

    fn on_drag_move(&mut self, pointer_x: f64) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        let Some(requested) = ctx
            .drag
            .as_ref()
            .map(|drag| drag.session.requested_width(pointer_x))
        else {
            return;
        };
        let width =
            layout::apply_manual_width(&self.doc, &ctx.pinned, &mut ctx.sizing, requested, &self.config);
        ctx.reanchor(&self.doc, &self.locator, Motion::Instant, &self.config);
        ctx.watchers.cancel(&self.doc, Deferred::EditorRelayout);
        ctx.watchers
            .defer(&self.doc, self.config.relayout_delay(), Deferred::EditorRelayout);
        tracing::trace!(requested, width, "resize drag moved");
    }

    fn on_deferred(&mut self, watch: WatchId) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        match ctx.watchers.take_deferred(&self.doc, watch) {
            Some(Deferred::Reanchor) => {
                ctx.reanchor(&self.doc, &self.locator, Motion::Instant, &self.config);
            }
            Some(Deferred::EditorRelayout) => {
                sizing::relayout_rich_editor(&self.doc, &ctx.pinned, &self.config);
            }
            None => {}
        }
    }

    /// Completes an outstanding displaced-panel reset and releases its timer;
    /// also used to cut the animated reversal short.
    fn finish_pending_restore(&mut self) {
        if let Some(pending) = self.pending_restore.take() {
            self.doc.unsubscribe(pending.watch);
            if self.doc.is_connected(&pending.node) {
                snapshot::restore(&self.doc, &pending.node, &pending.snapshot);
            }
            tracing::debug!("properties panel fully restored");
        }
    }

    fn sync_control(&mut self) {
        let state = self.machine.state();
        if let Some(control) = self.control.as_mut() {
            control.sync(&self.doc, state);
        }
    }

    pub fn status(&self) -> EngineStatus {
        let discovery = if self.pinned_panel.is_some() {
            DiscoveryStatus::Found
        } else if self.discovery.is_finished() {
            DiscoveryStatus::Exhausted
        } else {
            DiscoveryStatus::Searching
        };
        let ctx = self.context.as_ref();
        EngineStatus {
            state: self.machine.state(),
            discovery,
            discovery_attempts: self.discovery.attempts(),
            tracking_displaced: ctx.is_some_and(|ctx| ctx.displaced.is_some()),
            translation: ctx.and_then(|ctx| ctx.last_offset),
            active_watches: ctx.map_or(0, |ctx| ctx.watchers.active()),
            transitions: self.machine.transitions(),
        }
    }

    /// Returns the page to its original state and releases every host
    /// subscription. Ends Unpinned.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.unpin() {
            tracing::warn!(%err, "unpin during shutdown failed");
        }
        self.finish_pending_restore();
        self.discovery.finish(&self.doc);
        if let Some(control) = self.control.take() {
            control.remove(&self.doc);
        }
        tracing::info!("pin engine shut down");
    }
}

/// Slides the displaced panel back with an eased transition and schedules
/// the hard reset for when the transition has finished.
fn begin_displaced_restore<D: HostDocument>(
    doc: &D,
    node: D::Node,
    snapshot: StyleSnapshot,
    config: &PinConfig,
) -> Option<PendingRestore<D::Node>> {
    if !doc.is_connected(&node) {
        return None;
    }
    let original = snapshot
        .get("transform")
        .filter(|value| !value.trim().is_empty())
        .unwrap_or("none");
    doc.set_style(
        &node,
        "transition",
        &layout::transform_transition(config),
        StylePriority::Normal,
    );
    doc.set_style(&node, "transform", original, StylePriority::Normal);
    doc.remove_style(&node, "z-index");
    let watch = doc.subscribe(Subscription::Timeout {
        delay: config.transition(),
    });
    Some(PendingRestore {
        watch,
        node,
        snapshot,
    })
}

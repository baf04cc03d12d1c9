//! Discovery of the two managed elements in the host document.
//!
//! The pinned panel has a fixed id and is found by it alone. The displaced
//! panel has no stable identity, so it is recognized by an ordered list of
//! selector strategies filtered through a geometric heuristic.

use thiserror::Error;

use crate::config::LocatorConfig;
use crate::geometry::{Rect, Viewport};
use crate::host::HostDocument;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("pinned panel #{id} not found")]
    PinnedPanelMissing { id: String },
}

/// Finds the pinned panel by id. No fallback.
pub fn locate_pinned_panel<D: HostDocument>(doc: &D, id: &str) -> Result<D::Node, LocateError> {
    doc.element_by_id(id)
        .ok_or_else(|| LocateError::PinnedPanelMissing { id: id.to_string() })
}

/// "Looks like a panel docked at the trailing edge."
#[derive(Debug, Clone, PartialEq)]
pub struct DockedPanelHeuristic {
    pub class_fragment: String,
    pub min_width: f64,
    pub min_height: f64,
    pub edge_margin: f64,
}

impl DockedPanelHeuristic {
    pub fn from_config(config: &LocatorConfig) -> Self {
        Self {
            class_fragment: config.class_fragment.clone(),
            min_width: config.min_width,
            min_height: config.min_height,
            edge_margin: config.edge_margin,
        }
    }

    pub fn qualifies(&self, rect: Rect, viewport: Viewport) -> bool {
        rect.width > self.min_width
            && rect.height > self.min_height
            && rect.right() > viewport.width - self.edge_margin
    }

    pub fn recognizes(&self, class_name: &str, rect: Rect, viewport: Viewport) -> bool {
        class_name.contains(&self.class_fragment) && self.qualifies(rect, viewport)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelInfo<N> {
    pub node: N,
    pub rect: Rect,
    /// Index of the selector strategy that produced the match.
    pub strategy: usize,
}

/// Picks the first candidate that qualifies, scanning strategies in order.
///
/// `candidates[i]` holds what strategy `i` matched, in document order.
pub fn select_candidate<N: Clone>(
    candidates: &[Vec<(N, Rect)>],
    heuristic: &DockedPanelHeuristic,
    viewport: Viewport,
) -> Option<PanelInfo<N>> {
    candidates
        .iter()
        .enumerate()
        .find_map(|(strategy, matched)| {
            matched
                .iter()
                .find(|(_, rect)| heuristic.qualifies(*rect, viewport))
                .map(|(node, rect)| PanelInfo {
                    node: node.clone(),
                    rect: *rect,
                    strategy,
                })
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelLocator {
    strategies: Vec<String>,
    heuristic: DockedPanelHeuristic,
}

impl PanelLocator {
    pub fn from_config(config: &LocatorConfig) -> Self {
        Self {
            strategies: config.selectors.clone(),
            heuristic: DockedPanelHeuristic::from_config(config),
        }
    }

    pub fn heuristic(&self) -> &DockedPanelHeuristic {
        &self.heuristic
    }

    /// Returns the displaced panel, or `None` when no candidate qualifies.
    /// Absence is expected: the user may simply not have the panel open.
    pub fn locate<D: HostDocument>(&self, doc: &D) -> Option<PanelInfo<D::Node>> {
        let viewport = doc.viewport();
        // Evaluated lazily so later strategies are only queried when needed.
        for (strategy, selector) in self.strategies.iter().enumerate() {
            let matched = doc
                .query_all(None, selector)
                .into_iter()
                .map(|node| {
                    let rect = doc.bounding_rect(&node);
                    (node, rect)
                })
                .collect::<Vec<_>>();
            tracing::trace!(selector, count = matched.len(), "displaced panel strategy");
            if let Some(mut info) = select_candidate(&[matched], &self.heuristic, viewport) {
                info.strategy = strategy;
                tracing::debug!(selector, rect = ?info.rect, "located displaced panel");
                return Some(info);
            }
        }
        tracing::debug!("no displaced panel qualifies");
        None
    }

    /// Whether `node`, or one of its descendants, looks like the displaced
    /// panel. Used for freshly added subtrees.
    pub fn recognize_in<D: HostDocument>(&self, doc: &D, node: &D::Node) -> Option<D::Node> {
        let viewport = doc.viewport();
        let fragment = &self.heuristic.class_fragment;
        let recognizes = |candidate: &D::Node| {
            let class_name = doc.class_name(candidate);
            self.heuristic
                .recognizes(&class_name, doc.bounding_rect(candidate), viewport)
        };
        if recognizes(node) {
            return Some(node.clone());
        }
        doc.query_all(Some(node), &format!("[class*=\"{fragment}\"]"))
            .into_iter()
            .find(|candidate| recognizes(candidate))
    }
}

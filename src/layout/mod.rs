//! Derived geometry that keeps the pinned and displaced panels adjacent.

use crate::config::PinConfig;
use crate::geometry::{parse_px, px};
use crate::host::{HostDocument, StylePriority};
use crate::locator::PanelInfo;
use crate::ui::PANEL_CHROME;

pub mod resize;
pub mod sizing;

pub use resize::{clamp_width, create_resize_handle, ResizeSession};
pub use sizing::ContentSizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// No transition; used during drags and rapid corrections.
    Instant,
    /// Bounded eased transition.
    Animated,
}

/// `translateX(-{offset}px)`.
pub fn translate_x(offset: f64) -> String {
    format!("translateX({})", px(-offset))
}

/// Horizontal component of a `translateX(...)` transform.
pub fn parse_translate_x(value: &str) -> Option<f64> {
    let inner = value
        .trim()
        .strip_prefix("translateX(")?
        .strip_suffix(')')?;
    parse_px(inner)
}

/// Whether a transform value no longer carries any translation.
pub fn transform_is_cleared(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == "none"
}

/// Eased transition used for displaced-panel slides.
pub fn transform_transition(config: &PinConfig) -> String {
    format!("transform {}ms ease-in-out", config.timing.transition_ms)
}

/// Fixes the pinned panel at the trailing edge with the displaced panel's
/// pre-pin box, and slides the displaced panel left by that width.
pub fn apply_pinned_layout<D: HostDocument>(
    doc: &D,
    pinned: &D::Node,
    displaced: &PanelInfo<D::Node>,
    config: &PinConfig,
) {
    let rect = displaced.rect;
    tracing::debug!(
        width = rect.width,
        height = rect.height,
        top = rect.top,
        "applying pinned layout"
    );

    let panel = &displaced.node;
    doc.set_style(panel, "transition", &transform_transition(config), StylePriority::Normal);
    doc.set_style(panel, "transform", &translate_x(rect.width), StylePriority::Normal);
    doc.set_style(
        panel,
        "z-index",
        &config.displaced_z_index.to_string(),
        StylePriority::Normal,
    );

    let chrome = PANEL_CHROME;
    let normal = [
        (
            "transition",
            format!("all {}ms ease-in-out", config.timing.transition_ms),
        ),
        ("position", "fixed".to_string()),
        ("top", px(rect.top)),
        ("right", "0px".to_string()),
        ("left", "auto".to_string()),
        ("z-index", config.pinned_z_index.to_string()),
        ("background-color", chrome.panel_background.to_string()),
        ("border", chrome.panel_border.to_string()),
        ("box-shadow", chrome.panel_shadow.to_string()),
        ("border-radius", chrome.panel_radius.to_string()),
        ("padding", chrome.panel_padding.to_string()),
        ("padding-left", chrome.panel_padding_leading.to_string()),
        ("margin", "0".to_string()),
        ("resize", "none".to_string()),
    ];
    for (property, value) in &normal {
        doc.set_style(pinned, property, value, StylePriority::Normal);
    }
    let important = [
        ("width", px(rect.width)),
        ("height", px(rect.height)),
        ("display", "block".to_string()),
        ("overflow", "visible".to_string()),
    ];
    for (property, value) in &important {
        doc.set_style(pinned, property, value, StylePriority::Important);
    }
}

/// Re-derives the displaced panel's translation from live geometry:
/// `viewport.width - pinned.left`. Returns the applied offset.
pub fn reanchor<D: HostDocument>(
    doc: &D,
    pinned: &D::Node,
    displaced: &D::Node,
    motion: Motion,
    config: &PinConfig,
) -> f64 {
    let left = doc.bounding_rect(pinned).left;
    let offset = doc.viewport().trailing_span_from(left);
    let transition = match motion {
        Motion::Instant => "none".to_string(),
        Motion::Animated => transform_transition(config),
    };
    doc.set_style(displaced, "transition", &transition, StylePriority::Normal);
    doc.set_style(displaced, "transform", &translate_x(offset), StylePriority::Normal);
    doc.set_style(
        displaced,
        "z-index",
        &config.displaced_z_index.to_string(),
        StylePriority::Normal,
    );
    tracing::debug!(offset, ?motion, "re-anchored displaced panel");
    offset
}

/// Clamps and enforces a manually requested width, then re-derives the
/// sub-editor sizing. Returns the width actually applied.
pub fn apply_manual_width<D: HostDocument>(
    doc: &D,
    pinned: &D::Node,
    sizing: &mut ContentSizing<D::Node>,
    requested: f64,
    config: &PinConfig,
) -> f64 {
    let width = clamp_width(requested, &config.resize);
    doc.set_style(pinned, "width", &px(width), StylePriority::Important);
    sizing.apply(doc, pinned, config);
    width
}

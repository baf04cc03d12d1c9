use crate::config::ResizeConfig;
use crate::host::{HostDocument, StylePriority};
use crate::ui::PANEL_CHROME;

/// State of one manual drag, from pointer-down to release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    start_x: f64,
    start_width: f64,
}

impl ResizeSession {
    pub const fn begin(start_x: f64, start_width: f64) -> Self {
        Self {
            start_x,
            start_width,
        }
    }

    /// The panel grows leftwards: dragging towards smaller x widens it.
    pub fn requested_width(&self, pointer_x: f64) -> f64 {
        self.start_width + (self.start_x - pointer_x)
    }
}

pub fn clamp_width(width: f64, config: &ResizeConfig) -> f64 {
    if width.is_nan() {
        return config.min_width;
    }
    width.clamp(config.min_width, config.max_width)
}

/// Appends the drag handle along the pinned panel's leading edge.
pub fn create_resize_handle<D: HostDocument>(doc: &D, pinned: &D::Node) -> Option<D::Node> {
    let chrome = PANEL_CHROME;
    let Some(handle) = doc.create_element("div") else {
        tracing::warn!("could not create resize handle; manual resize disabled");
        return None;
    };
    doc.set_attribute(&handle, "id", chrome.handle_id);
    let z_index = chrome.handle_z_index.to_string();
    for (property, value) in [
        ("position", "absolute"),
        ("left", "0"),
        ("top", "0"),
        ("bottom", "0"),
        ("width", chrome.handle_width),
        ("background", chrome.handle_background),
        ("cursor", "col-resize"),
        ("z-index", z_index.as_str()),
        ("border-right", chrome.handle_border),
    ] {
        doc.set_style(&handle, property, value, StylePriority::Normal);
    }
    doc.append_child(pinned, &handle);
    Some(handle)
}

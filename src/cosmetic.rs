//! Visual patch for suggestion popups that appear while the bar is pinned.
//!
//! Purely cosmetic: nothing here feeds back into the pin state.

use crate::host::{HostDocument, StylePriority};
use crate::ui::PANEL_CHROME;

const POPUP_SELECTOR: &str = ".suggest-widget, .monaco-list, .parameter-hints-widget";
const POPUP_ROW_SELECTOR: &str = ".monaco-list-row, .suggest-item, .label-name, .label-text";

pub trait CosmeticSink<D: HostDocument> {
    fn patch_popup(&self, doc: &D, popup: &D::Node);
}

/// Forces suggestion popups above the pinned panel with a bounded height.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuggestPopupPatch;

impl<D: HostDocument> CosmeticSink<D> for SuggestPopupPatch {
    fn patch_popup(&self, doc: &D, popup: &D::Node) {
        let chrome = PANEL_CHROME;
        let z_index = chrome.popup_z_index.to_string();
        for (property, value) in [
            ("z-index", z_index.as_str()),
            ("position", "fixed"),
            ("max-height", chrome.popup_max_height),
            ("overflow", "auto"),
            ("background", "white"),
            ("border", "1px solid #ccc"),
            ("box-shadow", "0 2px 8px rgba(0,0,0,0.15)"),
        ] {
            doc.set_style(popup, property, value, StylePriority::Important);
        }
        for row in doc.query_all(Some(popup), POPUP_ROW_SELECTOR) {
            doc.set_style(&row, "color", "#000", StylePriority::Important);
            doc.set_style(&row, "background", "transparent", StylePriority::Important);
        }
        tracing::trace!("patched suggestion popup");
    }
}

/// Popups contained in (or equal to) a freshly added node.
pub fn popups_in<D: HostDocument>(doc: &D, added: &D::Node) -> Vec<D::Node> {
    if doc.matches(added, POPUP_SELECTOR) {
        return vec![added.clone()];
    }
    doc.query_all(Some(added), POPUP_SELECTOR)
}

use crate::config::PinConfig;
use crate::geometry::px;
use crate::host::{HostDocument, StylePriority};
use crate::snapshot::{self, StyleSnapshot};

/// Every property a sizing rule may write on a sub-element.
const SIZING_PROPERTIES: [&str; 10] = [
    "width",
    "max-width",
    "min-width",
    "height",
    "display",
    "overflow",
    "overflow-x",
    "overflow-y",
    "position",
    "box-sizing",
];

const EDITOR_CONTAINER_SELECTOR: &str = ".formulaBarContainer_w14rc";
const EDITOR_SELECTOR: &str = ".formulaBarEditor_180503v, #formulabar";
const RICH_EDITOR_LINES_SELECTOR: &str = ".view-lines";
const TEXT_INPUT_SELECTOR: &str = "textarea, input[type=\"text\"]";
const FORMULA_INPUT_SELECTOR: &str = ".formula-input";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizingValue {
    Fixed(&'static str),
    /// Panel content width minus the chrome allowance.
    EditorWidth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SizingRule {
    selector: String,
    declarations: Vec<(&'static str, SizingValue, StylePriority)>,
}

impl SizingRule {
    fn new(
        selector: impl Into<String>,
        declarations: &[(&'static str, SizingValue, StylePriority)],
    ) -> Self {
        Self {
            selector: selector.into(),
            declarations: declarations.to_vec(),
        }
    }
}

fn sizing_rules(config: &PinConfig) -> Vec<SizingRule> {
    use SizingValue::{EditorWidth, Fixed};
    use StylePriority::{Important, Normal};

    let inputs = format!(
        "{TEXT_INPUT_SELECTOR}, {FORMULA_INPUT_SELECTOR}, {}",
        config.rich_editor_selector
    );
    vec![
        SizingRule::new(
            EDITOR_CONTAINER_SELECTOR,
            &[
                ("height", Fixed("auto"), Important),
                ("display", Fixed("block"), Important),
                ("width", Fixed("100%"), Important),
            ],
        ),
        SizingRule::new(
            EDITOR_SELECTOR,
            &[
                ("width", EditorWidth, Important),
                ("max-width", EditorWidth, Important),
                ("min-width", EditorWidth, Important),
                // Visible overflow lets the suggestion popup escape the editor.
                ("overflow", Fixed("visible"), Important),
                ("position", Fixed("relative"), Important),
            ],
        ),
        SizingRule::new(
            config.content_region_selector.as_str(),
            &[
                ("width", Fixed("100%"), Normal),
                ("height", Fixed("100%"), Normal),
                ("max-width", Fixed("100%"), Normal),
                ("box-sizing", Fixed("border-box"), Normal),
            ],
        ),
        SizingRule::new(
            format!("{}, {RICH_EDITOR_LINES_SELECTOR}", config.rich_editor_selector),
            &[
                ("overflow-x", Fixed("hidden"), Important),
                ("overflow-y", Fixed("visible"), Important),
            ],
        ),
        SizingRule::new(
            inputs,
            &[
                ("width", Fixed("calc(100% - 2px)"), Normal),
                ("max-width", Fixed("calc(100% - 2px)"), Normal),
                ("box-sizing", Fixed("border-box"), Normal),
            ],
        ),
        SizingRule::new(
            TEXT_INPUT_SELECTOR,
            &[
                ("overflow-x", Fixed("hidden"), Important),
                ("overflow-y", Fixed("auto"), Important),
            ],
        ),
    ]
}

/// Width given to the editor sub-elements for a panel of `panel_width`.
pub fn editor_width(panel_width: f64, config: &PinConfig) -> f64 {
    (panel_width - config.resize.chrome_allowance).max(config.resize.min_width)
}

/// Derived sizing of the pinned panel's internal editor elements, with a
/// snapshot of every sub-element taken before it is first touched.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSizing<N> {
    touched: Vec<(N, StyleSnapshot)>,
}

impl<N> Default for ContentSizing<N> {
    fn default() -> Self {
        Self {
            touched: Vec::new(),
        }
    }
}

impl<N: Clone + PartialEq> ContentSizing<N> {
    pub fn touched(&self) -> usize {
        self.touched.len()
    }

    /// Re-derives sub-element sizing from the panel's current width so no
    /// internal element overflows horizontally. Returns the editor width.
    pub fn apply<D: HostDocument<Node = N>>(&mut self, doc: &D, pinned: &N, config: &PinConfig) -> f64 {
        let width = editor_width(doc.bounding_rect(pinned).width, config);
        let editor_px = px(width);

        for rule in sizing_rules(config) {
            for node in doc.query_all(Some(pinned), &rule.selector) {
                self.remember(doc, &node);
                for (property, value, priority) in &rule.declarations {
                    let value = match value {
                        SizingValue::Fixed(value) => *value,
                        SizingValue::EditorWidth => editor_px.as_str(),
                    };
                    doc.set_style(&node, property, value, *priority);
                }
            }
        }

        doc.set_style(pinned, "overflow-x", "hidden", StylePriority::Important);
        doc.set_style(pinned, "overflow-y", "auto", StylePriority::Important);
        tracing::trace!(editor_width = width, "applied content sizing");
        width
    }

    fn remember<D: HostDocument<Node = N>>(&mut self, doc: &D, node: &N) {
        if self.touched.iter().any(|(known, _)| known == node) {
            return;
        }
        let snapshot = snapshot::capture(doc, node, &SIZING_PROPERTIES);
        self.touched.push((node.clone(), snapshot));
    }

    /// Restores every touched sub-element and forgets them.
    pub fn restore<D: HostDocument<Node = N>>(&mut self, doc: &D) {
        for (node, snapshot) in self.touched.drain(..) {
            if doc.is_connected(&node) {
                snapshot::restore(doc, &node, &snapshot);
            }
        }
    }
}

/// Asks the embedded rich editor, if any, to recompute its layout.
pub fn relayout_rich_editor<D: HostDocument>(doc: &D, pinned: &D::Node, config: &PinConfig) {
    if let Some(editor) = doc
        .query_all(Some(pinned), &config.rich_editor_selector)
        .into_iter()
        .next()
    {
        tracing::trace!("requesting rich editor relayout");
        doc.relayout_rich_editor(&editor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::host_page;
    use pretty_assertions::assert_eq;

    #[test]
    fn editor_width_subtracts_chrome_and_respects_minimum() {
        let config = PinConfig::default();
        assert_eq!(editor_width(450.0, &config), 428.0);
        assert_eq!(editor_width(210.0, &config), 200.0);
    }

    #[test]
    fn apply_sizes_editor_from_panel_width() {
        let (doc, page) = host_page();
        let config = PinConfig::default();
        doc.set_style(&page.pinned, "width", "450px", StylePriority::Important);
        let mut sizing = ContentSizing::default();

        let width = sizing.apply(&doc, &page.pinned, &config);

        assert_eq!(width, 428.0);
        assert_eq!(doc.inline_style(&page.editor, "width"), "428px");
        assert_eq!(doc.inline_style(&page.editor, "min-width"), "428px");
        assert_eq!(doc.inline_style(&page.editor, "overflow"), "visible");
        assert_eq!(doc.inline_style(&page.content_region, "box-sizing"), "border-box");
        assert_eq!(doc.inline_style(&page.rich_editor, "overflow-x"), "hidden");
        assert_eq!(doc.inline_style(&page.rich_editor, "width"), "calc(100% - 2px)");
        assert_eq!(doc.inline_style(&page.pinned, "overflow-x"), "hidden");
    }

    #[test]
    fn repeated_apply_snapshots_each_sub_element_once() {
        let (doc, page) = host_page();
        let config = PinConfig::default();
        let mut sizing = ContentSizing::default();

        sizing.apply(&doc, &page.pinned, &config);
        let touched = sizing.touched();
        sizing.apply(&doc, &page.pinned, &config);

        assert_eq!(sizing.touched(), touched);
        assert_eq!(touched, 5);
    }

    #[test]
    fn restore_returns_sub_elements_to_original_inline_state() {
        let (doc, page) = host_page();
        let config = PinConfig::default();
        doc.host_set_style(&page.content_region, "width", "640px");
        let before = doc.inline_properties(&page.content_region);
        let editor_before = doc.inline_properties(&page.editor);
        let mut sizing = ContentSizing::default();

        sizing.apply(&doc, &page.pinned, &config);
        sizing.restore(&doc);

        assert_eq!(doc.inline_properties(&page.content_region), before);
        assert_eq!(doc.inline_properties(&page.editor), editor_before);
        assert_eq!(sizing.touched(), 0);
    }

    #[test]
    fn relayout_targets_the_rich_editor() {
        let (doc, page) = host_page();
        relayout_rich_editor(&doc, &page.pinned, &PinConfig::default());
        assert_eq!(doc.relayouts(), vec![page.rich_editor]);
    }
}

use crate::host::{HostDocument, Subscription, WatchId};
use crate::state::PinState;

pub const TOGGLE_ID: &str = "pinFormulaBarButton";
const TOGGLE_CLASS: &str = "pinbar-toggle";

/// Label, icon name and tooltip for one toggle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleAppearance {
    pub label: &'static str,
    pub icon: &'static str,
    pub tooltip: &'static str,
}

pub const fn appearance_for(state: PinState) -> ToggleAppearance {
    match state {
        PinState::Unpinned => ToggleAppearance {
            label: "Pin",
            icon: "pin",
            tooltip: "Pin formula bar to right side",
        },
        PinState::Pinned => ToggleAppearance {
            label: "Reset",
            icon: "pin-off",
            tooltip: "Reset formula bar position",
        },
    }
}

/// The injected toggle button and its activation subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleControl<N> {
    node: N,
    watch: WatchId,
    shown: PinState,
}

impl<N: Clone + PartialEq> ToggleControl<N> {
    /// Appends the toggle as the last child of `container`, or adopts one
    /// left behind by an earlier injection.
    pub fn inject<D: HostDocument<Node = N>>(doc: &D, container: &N) -> Option<Self> {
        let selector = format!("#{TOGGLE_ID}");
        let node = match doc.query_all(Some(container), &selector).into_iter().next() {
            Some(existing) => {
                tracing::debug!("adopting existing toggle control");
                existing
            }
            None => {
                let button = doc.create_element("button")?;
                doc.set_attribute(&button, "id", TOGGLE_ID);
                doc.set_attribute(&button, "class", TOGGLE_CLASS);
                doc.set_attribute(&button, "type", "button");
                doc.append_child(container, &button);
                button
            }
        };
        let watch = doc.subscribe(Subscription::Activation {
            target: node.clone(),
        });
        let mut control = Self {
            node,
            watch,
            shown: PinState::Unpinned,
        };
        control.render(doc, PinState::Unpinned);
        Some(control)
    }

    pub fn watch(&self) -> WatchId {
        self.watch
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn shown(&self) -> PinState {
        self.shown
    }

    /// Reflects `state`; a no-op when already showing it.
    pub fn sync<D: HostDocument<Node = N>>(&mut self, doc: &D, state: PinState) {
        if self.shown != state {
            self.render(doc, state);
        }
    }

    fn render<D: HostDocument<Node = N>>(&mut self, doc: &D, state: PinState) {
        let appearance = appearance_for(state);
        doc.set_attribute(&self.node, "title", appearance.tooltip);
        doc.set_attribute(&self.node, "aria-label", appearance.tooltip);
        doc.set_attribute(&self.node, "aria-pressed", &state.is_pinned().to_string());
        doc.set_attribute(&self.node, "data-icon", appearance.icon);
        doc.set_text(&self.node, appearance.label);
        self.shown = state;
    }

    pub fn remove<D: HostDocument<Node = N>>(self, doc: &D) {
        doc.unsubscribe(self.watch);
        if doc.is_connected(&self.node) {
            doc.remove(&self.node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::host_page;

    #[test]
    fn inject_appends_last_child_and_subscribes_activation() {
        let (doc, page) = host_page();
        let control = ToggleControl::inject(&doc, &page.pinned).expect("toggle injected");

        assert_eq!(doc.children(&page.pinned).last(), Some(control.node()));
        assert_eq!(doc.attribute(control.node(), "id").as_deref(), Some(TOGGLE_ID));
        assert_eq!(
            doc.attribute(control.node(), "title").as_deref(),
            Some("Pin formula bar to right side")
        );
        assert_eq!(doc.text(control.node()), "Pin");
        assert_eq!(
            doc.find_watch(|subscription| matches!(
                subscription,
                Subscription::Activation { target } if target == control.node()
            )),
            Some(control.watch())
        );
    }

    #[test]
    fn second_injection_adopts_the_existing_button() {
        let (doc, page) = host_page();
        let first = ToggleControl::inject(&doc, &page.pinned).expect("toggle injected");
        let children = doc.children(&page.pinned).len();

        let second = ToggleControl::inject(&doc, &page.pinned).expect("toggle injected");

        assert_eq!(second.node(), first.node());
        assert_eq!(doc.children(&page.pinned).len(), children);
    }

    #[test]
    fn sync_switches_between_both_appearances() {
        let (doc, page) = host_page();
        let mut control = ToggleControl::inject(&doc, &page.pinned).expect("toggle injected");

        control.sync(&doc, PinState::Pinned);
        assert_eq!(control.shown(), PinState::Pinned);
        assert_eq!(
            doc.attribute(control.node(), "aria-label").as_deref(),
            Some("Reset formula bar position")
        );
        assert_eq!(doc.attribute(control.node(), "data-icon").as_deref(), Some("pin-off"));

        control.sync(&doc, PinState::Unpinned);
        assert_eq!(doc.text(control.node()), "Pin");
        assert_eq!(doc.attribute(control.node(), "aria-pressed").as_deref(), Some("false"));
    }

    #[test]
    fn remove_detaches_and_unsubscribes() {
        let (doc, page) = host_page();
        let control = ToggleControl::inject(&doc, &page.pinned).expect("toggle injected");
        let node = *control.node();

        control.remove(&doc);

        assert!(!doc.is_connected(&node));
        assert!(doc.subscriptions().is_empty());
    }
}

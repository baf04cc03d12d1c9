//! In-memory [`HostDocument`] used by unit tests.
//!
//! Models just enough of a browser document for the engine: a node tree,
//! a compound-selector subset (`tag`, `#id`, `.class`, `[attr="v"]`,
//! `[attr*="v"]`, comma lists), inline and computed styles, and a tiny
//! layout model where fixed positioning and `translateX` move the box.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::geometry::{parse_px, Rect, Viewport};
use crate::host::{HostDocument, StylePriority, Subscription, WatchId};
use crate::layout::parse_translate_x;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FakeNode(usize);

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    inline: BTreeMap<String, (String, StylePriority)>,
    computed: BTreeMap<String, String>,
    base_rect: Rect,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<NodeData>,
    viewport: Viewport,
    next_watch: u64,
    subscriptions: BTreeMap<WatchId, Subscription<FakeNode>>,
    mutation_count: usize,
    relayouts: Vec<FakeNode>,
}

#[derive(Debug)]
pub(crate) struct FakeDocument {
    inner: RefCell<Inner>,
}

impl FakeDocument {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        let body = NodeData {
            tag: "body".to_string(),
            ..NodeData::default()
        };
        Self {
            inner: RefCell::new(Inner {
                nodes: vec![body],
                viewport: Viewport::new(width, height),
                ..Inner::default()
            }),
        }
    }

    pub(crate) fn add(
        &self,
        parent: &FakeNode,
        tag: &str,
        attributes: &[(&str, &str)],
        rect: Rect,
    ) -> FakeNode {
        let node = self.create_element(tag).expect("fake elements are always created");
        {
            let mut inner = self.inner.borrow_mut();
            let data = &mut inner.nodes[node.0];
            for (name, value) in attributes {
                data.attributes.insert((*name).to_string(), (*value).to_string());
            }
            data.base_rect = rect;
        }
        self.insert_before(parent, &node, None);
        node
    }

    pub(crate) fn set_rect(&self, node: &FakeNode, rect: Rect) {
        self.inner.borrow_mut().nodes[node.0].base_rect = rect;
    }

    pub(crate) fn set_computed(&self, node: &FakeNode, property: &str, value: &str) {
        self.inner.borrow_mut().nodes[node.0]
            .computed
            .insert(property.to_string(), value.to_string());
    }

    pub(crate) fn set_viewport(&self, width: f64, height: f64) {
        self.inner.borrow_mut().viewport = Viewport::new(width, height);
    }

    /// Host-side style write that bypasses the mutation counter.
    pub(crate) fn host_set_style(&self, node: &FakeNode, property: &str, value: &str) {
        self.inner.borrow_mut().nodes[node.0]
            .inline
            .insert(property.to_string(), (value.to_string(), StylePriority::Normal));
    }

    pub(crate) fn host_set_important(&self, node: &FakeNode, property: &str, value: &str) {
        self.inner.borrow_mut().nodes[node.0]
            .inline
            .insert(property.to_string(), (value.to_string(), StylePriority::Important));
    }

    pub(crate) fn host_clear_style(&self, node: &FakeNode, property: &str) {
        self.inner.borrow_mut().nodes[node.0].inline.remove(property);
    }

    /// Host-side detach, as when the page re-renders a panel away.
    pub(crate) fn detach(&self, node: &FakeNode) {
        let mut inner = self.inner.borrow_mut();
        unlink(&mut inner, node.0);
    }

    pub(crate) fn priority(&self, node: &FakeNode, property: &str) -> Option<StylePriority> {
        self.inner.borrow().nodes[node.0]
            .inline
            .get(property)
            .map(|(_, priority)| *priority)
    }

    pub(crate) fn inline_properties(&self, node: &FakeNode) -> BTreeMap<String, String> {
        self.inner.borrow().nodes[node.0]
            .inline
            .iter()
            .map(|(name, (value, _))| (name.clone(), value.clone()))
            .collect()
    }

    pub(crate) fn children(&self, node: &FakeNode) -> Vec<FakeNode> {
        self.inner.borrow().nodes[node.0]
            .children
            .iter()
            .map(|index| FakeNode(*index))
            .collect()
    }

    pub(crate) fn attribute(&self, node: &FakeNode, name: &str) -> Option<String> {
        self.inner.borrow().nodes[node.0].attributes.get(name).cloned()
    }

    pub(crate) fn text(&self, node: &FakeNode) -> String {
        self.inner.borrow().nodes[node.0].text.clone()
    }

    pub(crate) fn mutation_count(&self) -> usize {
        self.inner.borrow().mutation_count
    }

    pub(crate) fn relayouts(&self) -> Vec<FakeNode> {
        self.inner.borrow().relayouts.clone()
    }

    pub(crate) fn subscriptions(&self) -> Vec<(WatchId, Subscription<FakeNode>)> {
        self.inner
            .borrow()
            .subscriptions
            .iter()
            .map(|(id, subscription)| (*id, subscription.clone()))
            .collect()
    }

    pub(crate) fn find_watch<F>(&self, predicate: F) -> Option<WatchId>
    where
        F: Fn(&Subscription<FakeNode>) -> bool,
    {
        self.inner
            .borrow()
            .subscriptions
            .iter()
            .find(|(_, subscription)| predicate(subscription))
            .map(|(id, _)| *id)
    }

    /// Pending one-shot timers ordered by delay, then registration order.
    pub(crate) fn timeouts(&self) -> Vec<(WatchId, Duration)> {
        let mut timeouts = self
            .inner
            .borrow()
            .subscriptions
            .iter()
            .filter_map(|(id, subscription)| match subscription {
                Subscription::Timeout { delay } => Some((*id, *delay)),
                _ => None,
            })
            .collect::<Vec<_>>();
        timeouts.sort_by_key(|(id, delay)| (*delay, *id));
        timeouts
    }

    /// Removes the earliest pending timeout from the ledger, as a browser
    /// does once a one-shot timer has fired.
    pub(crate) fn pop_timeout(&self) -> Option<WatchId> {
        let (id, _) = self.timeouts().into_iter().next()?;
        self.inner.borrow_mut().subscriptions.remove(&id);
        Some(id)
    }
}

fn unlink(inner: &mut Inner, index: usize) {
    if let Some(parent) = inner.nodes[index].parent.take() {
        inner.nodes[parent].children.retain(|child| *child != index);
    }
}

fn collect_descendants(inner: &Inner, index: usize, out: &mut Vec<usize>) {
    for child in &inner.nodes[index].children {
        out.push(*child);
        collect_descendants(inner, *child, out);
    }
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, bool, String)>,
}

fn parse_compound(selector: &str) -> Compound {
    let mut compound = Compound::default();
    let chars = selector.trim().chars().collect::<Vec<_>>();
    let ident = |start: usize| {
        let mut end = start;
        while end < chars.len()
            && (chars[end].is_alphanumeric() || chars[end] == '-' || chars[end] == '_')
        {
            end += 1;
        }
        (chars[start..end].iter().collect::<String>(), end)
    };

    let (tag, mut index) = ident(0);
    if !tag.is_empty() {
        compound.tag = Some(tag);
    }
    while index < chars.len() {
        match chars[index] {
            '#' => {
                let (id, next) = ident(index + 1);
                compound.id = Some(id);
                index = next;
            }
            '.' => {
                let (class, next) = ident(index + 1);
                compound.classes.push(class);
                index = next;
            }
            '[' => {
                let close = chars[index..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|offset| index + offset)
                    .unwrap_or(chars.len());
                let body = chars[index + 1..close].iter().collect::<String>();
                let (name, contains, value) = if let Some((name, value)) = body.split_once("*=")
                {
                    (name, true, value)
                } else if let Some((name, value)) = body.split_once('=') {
                    (name, false, value)
                } else {
                    (body.as_str(), true, "")
                };
                compound.attributes.push((
                    name.trim().to_string(),
                    contains,
                    value.trim().trim_matches('"').to_string(),
                ));
                index = close + 1;
            }
            _ => index += 1,
        }
    }
    compound
}

fn compound_matches(data: &NodeData, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if !data.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if data.attributes.get("id") != Some(id) {
            return false;
        }
    }
    let class = data.attributes.get("class").cloned().unwrap_or_default();
    if !compound
        .classes
        .iter()
        .all(|wanted| class.split_whitespace().any(|have| have == wanted))
    {
        return false;
    }
    compound.attributes.iter().all(|(name, contains, value)| {
        match data.attributes.get(name) {
            Some(actual) if *contains => actual.contains(value.as_str()),
            Some(actual) => actual == value,
            None => false,
        }
    })
}

fn selector_matches(data: &NodeData, selector: &str) -> bool {
    selector
        .split(',')
        .map(parse_compound)
        .any(|compound| compound_matches(data, &compound))
}

impl HostDocument for FakeDocument {
    type Node = FakeNode;

    fn root(&self) -> FakeNode {
        FakeNode(0)
    }

    fn element_by_id(&self, id: &str) -> Option<FakeNode> {
        self.query_all(None, &format!("#{id}")).into_iter().next()
    }

    fn query_all(&self, scope: Option<&FakeNode>, selector: &str) -> Vec<FakeNode> {
        let inner = self.inner.borrow();
        let mut candidates = Vec::new();
        collect_descendants(&inner, scope.map_or(0, |node| node.0), &mut candidates);
        candidates
            .into_iter()
            .filter(|index| selector_matches(&inner.nodes[*index], selector))
            .map(FakeNode)
            .collect()
    }

    fn matches(&self, node: &FakeNode, selector: &str) -> bool {
        selector_matches(&self.inner.borrow().nodes[node.0], selector)
    }

    fn class_name(&self, node: &FakeNode) -> String {
        self.attribute(node, "class").unwrap_or_default()
    }

    fn tag_name(&self, node: &FakeNode) -> String {
        self.inner.borrow().nodes[node.0].tag.to_ascii_uppercase()
    }

    fn bounding_rect(&self, node: &FakeNode) -> Rect {
        if !self.is_connected(node) {
            return Rect::default();
        }
        let inner = self.inner.borrow();
        let data = &inner.nodes[node.0];
        let inline = |property: &str| {
            data.inline
                .get(property)
                .map(|(value, _)| value.as_str())
                .unwrap_or("")
        };
        let mut rect = data.base_rect;
        if inline("position") == "fixed" {
            if let Some(width) = parse_px(inline("width")) {
                rect.width = width;
            }
            if let Some(height) = parse_px(inline("height")) {
                rect.height = height;
            }
            if let Some(top) = parse_px(inline("top")) {
                rect.top = top;
            }
            if let Some(right) = parse_px(inline("right")) {
                rect.left = inner.viewport.width - right - rect.width;
            } else if let Some(left) = parse_px(inline("left")) {
                rect.left = left;
            }
        } else if let Some(width) = parse_px(inline("width")) {
            rect.width = width;
        }
        if let Some(offset) = parse_translate_x(inline("transform")) {
            rect.left += offset;
        }
        rect
    }

    fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    fn inline_style(&self, node: &FakeNode, property: &str) -> String {
        self.inner.borrow().nodes[node.0]
            .inline
            .get(property)
            .map(|(value, _)| value.clone())
            .unwrap_or_default()
    }

    fn inline_priority(&self, node: &FakeNode, property: &str) -> StylePriority {
        self.priority(node, property).unwrap_or_default()
    }

    fn computed_style(&self, node: &FakeNode, property: &str) -> String {
        let inline = self.inline_style(node, property);
        if !inline.is_empty() {
            return inline;
        }
        self.inner.borrow().nodes[node.0]
            .computed
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn set_style(&self, node: &FakeNode, property: &str, value: &str, priority: StylePriority) {
        let mut inner = self.inner.borrow_mut();
        inner.mutation_count += 1;
        let data = &mut inner.nodes[node.0];
        if value.is_empty() {
            data.inline.remove(property);
        } else {
            data.inline
                .insert(property.to_string(), (value.to_string(), priority));
        }
    }

    fn remove_style(&self, node: &FakeNode, property: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.mutation_count += 1;
        inner.nodes[node.0].inline.remove(property);
    }

    fn parent(&self, node: &FakeNode) -> Option<FakeNode> {
        self.inner.borrow().nodes[node.0].parent.map(FakeNode)
    }

    fn next_sibling(&self, node: &FakeNode) -> Option<FakeNode> {
        let inner = self.inner.borrow();
        let parent = inner.nodes[node.0].parent?;
        let siblings = &inner.nodes[parent].children;
        let position = siblings.iter().position(|child| *child == node.0)?;
        siblings.get(position + 1).copied().map(FakeNode)
    }

    fn is_connected(&self, node: &FakeNode) -> bool {
        let inner = self.inner.borrow();
        let mut current = node.0;
        loop {
            if current == 0 {
                return true;
            }
            match inner.nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn insert_before(&self, parent: &FakeNode, node: &FakeNode, before: Option<&FakeNode>) {
        let mut inner = self.inner.borrow_mut();
        inner.mutation_count += 1;
        unlink(&mut inner, node.0);
        let children = &mut inner.nodes[parent.0].children;
        let position = before
            .and_then(|before| children.iter().position(|child| *child == before.0))
            .unwrap_or(children.len());
        children.insert(position, node.0);
        inner.nodes[node.0].parent = Some(parent.0);
    }

    fn remove(&self, node: &FakeNode) {
        let mut inner = self.inner.borrow_mut();
        inner.mutation_count += 1;
        unlink(&mut inner, node.0);
    }

    fn create_element(&self, tag: &str) -> Option<FakeNode> {
        let mut inner = self.inner.borrow_mut();
        inner.nodes.push(NodeData {
            tag: tag.to_string(),
            ..NodeData::default()
        });
        Some(FakeNode(inner.nodes.len() - 1))
    }

    fn set_attribute(&self, node: &FakeNode, name: &str, value: &str) {
        self.inner.borrow_mut().nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn set_text(&self, node: &FakeNode, text: &str) {
        self.inner.borrow_mut().nodes[node.0].text = text.to_string();
    }

    fn subscribe(&self, subscription: Subscription<FakeNode>) -> WatchId {
        let mut inner = self.inner.borrow_mut();
        inner.next_watch += 1;
        let id = WatchId(inner.next_watch);
        inner.subscriptions.insert(id, subscription);
        id
    }

    fn unsubscribe(&self, watch: WatchId) {
        self.inner.borrow_mut().subscriptions.remove(&watch);
    }

    fn relayout_rich_editor(&self, node: &FakeNode) {
        self.inner.borrow_mut().relayouts.push(*node);
    }
}

/// Nodes of the standard host page fixture.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HostPage {
    pub(crate) toolbar: FakeNode,
    pub(crate) pinned: FakeNode,
    pub(crate) trailing_sibling: FakeNode,
    pub(crate) content_region: FakeNode,
    pub(crate) editor: FakeNode,
    pub(crate) rich_editor: FakeNode,
    pub(crate) displaced: FakeNode,
}

/// Viewport 1600 wide; properties panel docked at the right edge with
/// width 320, height 600, top 80; formula bar inside a toolbar row.
pub(crate) fn host_page() -> (FakeDocument, HostPage) {
    let doc = FakeDocument::new(1600.0, 900.0);
    let body = doc.root();

    let toolbar = doc.add(
        &body,
        "div",
        &[("class", "toolbar_x1")],
        Rect::new(0.0, 40.0, 1600.0, 60.0),
    );
    let pinned = doc.add(
        &toolbar,
        "div",
        &[("id", "formulaBarContainer")],
        Rect::new(200.0, 40.0, 900.0, 60.0),
    );
    let trailing_sibling = doc.add(
        &toolbar,
        "div",
        &[("class", "toolbar-end")],
        Rect::new(1100.0, 40.0, 500.0, 60.0),
    );
    let content_region = doc.add(
        &pinned,
        "div",
        &[("class", "focusZone-298")],
        Rect::new(200.0, 40.0, 880.0, 60.0),
    );
    let editor_container = doc.add(
        &content_region,
        "div",
        &[("class", "formulaBarContainer_w14rc")],
        Rect::new(200.0, 40.0, 880.0, 60.0),
    );
    let editor = doc.add(
        &editor_container,
        "div",
        &[("id", "formulabar"), ("class", "formulaBarEditor_180503v")],
        Rect::new(200.0, 40.0, 860.0, 60.0),
    );
    let rich_editor = doc.add(
        &editor,
        "div",
        &[("class", "monaco-editor")],
        Rect::new(200.0, 40.0, 860.0, 60.0),
    );
    doc.add(
        &rich_editor,
        "div",
        &[("class", "view-lines")],
        Rect::new(200.0, 40.0, 860.0, 60.0),
    );
    let displaced = doc.add(
        &body,
        "div",
        &[("class", "sidebar-container container_1ma5eibo")],
        Rect::new(1280.0, 80.0, 320.0, 600.0),
    );

    for (property, value) in [
        ("position", "relative"),
        ("top", "auto"),
        ("right", "auto"),
        ("left", "auto"),
        ("width", "900px"),
        ("height", "60px"),
        ("z-index", "auto"),
        ("transform", "none"),
        ("transition", "all 0s ease 0s"),
        ("overflow", "hidden"),
        ("padding", "0px"),
        ("margin", "0px"),
        ("display", "flex"),
    ] {
        doc.set_computed(&pinned, property, value);
    }
    for (property, value) in [
        ("transform", "none"),
        ("transition", "all 0s ease 0s"),
        ("margin-left", "0px"),
        ("left", "auto"),
        ("right", "0px"),
        ("z-index", "auto"),
    ] {
        doc.set_computed(&displaced, property, value);
    }

    (
        doc,
        HostPage {
            toolbar,
            pinned,
            trailing_sibling,
            content_region,
            editor,
            rich_editor,
            displaced,
        },
    )
}

/// Adds a fresh properties panel as the host does when it re-renders one.
pub(crate) fn add_properties_panel(doc: &FakeDocument) -> FakeNode {
    let body = doc.root();
    let panel = doc.add(
        &body,
        "div",
        &[("class", "sidebar-container container_1ma5eibo")],
        Rect::new(1280.0, 80.0, 320.0, 600.0),
    );
    doc.set_computed(&panel, "transform", "none");
    doc.set_computed(&panel, "z-index", "auto");
    panel
}

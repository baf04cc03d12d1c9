//! [`HostDocument`] over a live browser document via `web-sys`.
//!
//! Every subscription wraps its JS callback in a [`Closure`] kept alive in the
//! registration table until `unsubscribe`; callbacks translate browser events
//! into [`HostEvent`]s and hand them to the installed sink.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CssStyleDeclaration, Document, Element, Event, EventTarget, HtmlElement, MouseEvent,
    MutationObserver, MutationObserverInit, MutationRecord, ResizeObserver, Window,
};

use super::{HostDocument, HostEvent, StylePriority, Subscription, WatchId};
use crate::geometry::{Rect, Viewport};

pub type EventSink = Rc<dyn Fn(HostEvent<Element>)>;

type SinkSlot = Rc<RefCell<Option<EventSink>>>;

type RegistrationTable = Rc<RefCell<HashMap<WatchId, Registration>>>;

fn emit(sink: &SinkSlot, event: HostEvent<Element>) {
    let callback = sink.borrow().clone();
    match callback {
        Some(callback) => callback(event),
        None => tracing::trace!("host event dropped; no sink installed"),
    }
}

fn log_js_error(result: Result<impl Sized, JsValue>, action: &str) {
    if let Err(err) = result {
        tracing::warn!(action, error = ?err, "browser call failed");
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(target: EventTarget, kind: &'static str, callback: Closure<dyn FnMut(Event)>) -> Self {
        log_js_error(
            target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref()),
            kind,
        );
        Self {
            target,
            kind,
            callback,
        }
    }

    fn detach(self) {
        log_js_error(
            self.target
                .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref()),
            self.kind,
        );
    }
}

enum Registration {
    Mutations {
        observer: MutationObserver,
        _callback: Closure<dyn FnMut(Array, MutationObserver)>,
    },
    Resize {
        observer: ResizeObserver,
        _callback: Closure<dyn FnMut(Array, ResizeObserver)>,
    },
    Interval {
        handle: i32,
        _callback: Closure<dyn FnMut()>,
    },
    Timeout {
        handle: i32,
        _callback: Closure<dyn FnMut()>,
    },
    Listeners(Vec<Listener>),
}

pub struct WebDocument {
    window: Window,
    document: Document,
    root: Element,
    next_watch: Cell<u64>,
    registrations: RegistrationTable,
    sink: SinkSlot,
}

impl WebDocument {
    /// `None` outside a browser window context or before `<body>` exists.
    pub fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        let root = Element::from(document.body()?);
        Some(Self {
            window,
            document,
            root,
            next_watch: Cell::new(0),
            registrations: Rc::new(RefCell::new(HashMap::new())),
            sink: Rc::new(RefCell::new(None)),
        })
    }

    pub fn set_sink(&self, sink: EventSink) {
        *self.sink.borrow_mut() = Some(sink);
    }

    fn allocate(&self) -> WatchId {
        let next = self.next_watch.get() + 1;
        self.next_watch.set(next);
        WatchId(next)
    }

    fn inline_declaration(&self, node: &Element) -> Option<CssStyleDeclaration> {
        node.dyn_ref::<HtmlElement>().map(HtmlElement::style)
    }

    fn register(&self, watch: WatchId, subscription: Subscription<Element>) -> Option<Registration> {
        let sink = Rc::clone(&self.sink);
        match subscription {
            Subscription::NodesAdded => {
                let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
                    move |records: Array, _observer: MutationObserver| {
                        let mut nodes = Vec::new();
                        for record in records.iter() {
                            let Ok(record) = record.dyn_into::<MutationRecord>() else {
                                continue;
                            };
                            let added = record.added_nodes();
                            for index in 0..added.length() {
                                if let Some(element) =
                                    added.get(index).and_then(|node| node.dyn_into::<Element>().ok())
                                {
                                    nodes.push(element);
                                }
                            }
                        }
                        if !nodes.is_empty() {
                            emit(&sink, HostEvent::NodesAdded { watch, nodes });
                        }
                    },
                );
                let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).ok()?;
                let init = MutationObserverInit::new();
                init.set_child_list(true);
                init.set_subtree(true);
                observer.observe_with_options(&self.root, &init).ok()?;
                Some(Registration::Mutations {
                    observer,
                    _callback: callback,
                })
            }
            Subscription::ContentResize { target } => {
                let callback = Closure::<dyn FnMut(Array, ResizeObserver)>::new(
                    move |_entries: Array, _observer: ResizeObserver| {
                        emit(&sink, HostEvent::ContentResized { watch });
                    },
                );
                let observer = ResizeObserver::new(callback.as_ref().unchecked_ref()).ok()?;
                observer.observe(&target);
                Some(Registration::Resize {
                    observer,
                    _callback: callback,
                })
            }
            Subscription::ViewportResize => {
                let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                    emit(&sink, HostEvent::ViewportResized { watch });
                });
                let target: EventTarget = self.window.clone().into();
                Some(Registration::Listeners(vec![Listener::attach(
                    target, "resize", callback,
                )]))
            }
            Subscription::Interval { period } => {
                let callback = Closure::<dyn FnMut()>::new(move || {
                    emit(&sink, HostEvent::IntervalElapsed { watch });
                });
                let handle = self
                    .window
                    .set_interval_with_callback_and_timeout_and_arguments_0(
                        callback.as_ref().unchecked_ref(),
                        millis(period),
                    )
                    .ok()?;
                Some(Registration::Interval {
                    handle,
                    _callback: callback,
                })
            }
            Subscription::Timeout { delay } => {
                let table: Weak<RefCell<HashMap<WatchId, Registration>>> =
                    Rc::downgrade(&self.registrations);
                let callback = Closure::<dyn FnMut()>::new(move || {
                    emit(&sink, HostEvent::TimerFired { watch });
                    // A fired timer is spent. wasm-bindgen defers freeing a
                    // closure dropped during its own call.
                    if let Some(table) = table.upgrade() {
                        let spent = table.borrow_mut().remove(&watch);
                        drop(spent);
                    }
                });
                let handle = self
                    .window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(
                        callback.as_ref().unchecked_ref(),
                        millis(delay),
                    )
                    .ok()?;
                Some(Registration::Timeout {
                    handle,
                    _callback: callback,
                })
            }
            Subscription::ResizeDrag { handle } => {
                let dragging = Rc::new(Cell::new(false));
                let down = {
                    let (sink, dragging) = (Rc::clone(&sink), Rc::clone(&dragging));
                    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                        let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                            return;
                        };
                        event.prevent_default();
                        dragging.set(true);
                        let pointer_x = f64::from(mouse.client_x());
                        emit(&sink, HostEvent::DragStart { watch, pointer_x });
                    })
                };
                let moved = {
                    let (sink, dragging) = (Rc::clone(&sink), Rc::clone(&dragging));
                    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                        if !dragging.get() {
                            return;
                        }
                        if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                            let pointer_x = f64::from(mouse.client_x());
                            emit(&sink, HostEvent::DragMove { watch, pointer_x });
                        }
                    })
                };
                let up = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                    if dragging.replace(false) {
                        emit(&sink, HostEvent::DragEnd { watch });
                    }
                });
                let document: EventTarget = self.document.clone().into();
                Some(Registration::Listeners(vec![
                    Listener::attach(handle.into(), "mousedown", down),
                    Listener::attach(document.clone(), "mousemove", moved),
                    Listener::attach(document, "mouseup", up),
                ]))
            }
            Subscription::Activation { target } => {
                let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                    event.prevent_default();
                    event.stop_propagation();
                    emit(&sink, HostEvent::Activated { watch });
                });
                Some(Registration::Listeners(vec![Listener::attach(
                    target.into(),
                    "click",
                    callback,
                )]))
            }
        }
    }
}

fn millis(duration: std::time::Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

impl HostDocument for WebDocument {
    type Node = Element;

    fn root(&self) -> Element {
        self.root.clone()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_all(&self, scope: Option<&Element>, selector: &str) -> Vec<Element> {
        let found = match scope {
            Some(scope) => scope.query_selector_all(selector),
            None => self.document.query_selector_all(selector),
        };
        let list = match found {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(selector, error = ?err, "invalid selector");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|index| list.get(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn class_name(&self, node: &Element) -> String {
        node.class_name()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name()
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn viewport(&self) -> Viewport {
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|value| value.as_f64()).unwrap_or(0.0)
        };
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn inline_style(&self, node: &Element, property: &str) -> String {
        self.inline_declaration(node)
            .and_then(|style| style.get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn inline_priority(&self, node: &Element, property: &str) -> StylePriority {
        let priority = self
            .inline_declaration(node)
            .map(|style| style.get_property_priority(property))
            .unwrap_or_default();
        if priority.eq_ignore_ascii_case("important") {
            StylePriority::Important
        } else {
            StylePriority::Normal
        }
    }

    fn computed_style(&self, node: &Element, property: &str) -> String {
        self.window
            .get_computed_style(node)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&self, node: &Element, property: &str, value: &str, priority: StylePriority) {
        if let Some(style) = self.inline_declaration(node) {
            log_js_error(
                style.set_property_with_priority(property, value, priority.as_css()),
                property,
            );
        }
    }

    fn remove_style(&self, node: &Element, property: &str) {
        if let Some(style) = self.inline_declaration(node) {
            log_js_error(style.remove_property(property), property);
        }
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn next_sibling(&self, node: &Element) -> Option<Element> {
        node.next_element_sibling()
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn insert_before(&self, parent: &Element, node: &Element, before: Option<&Element>) {
        let before: Option<&web_sys::Node> = before.map(AsRef::as_ref);
        log_js_error(parent.insert_before(node, before), "insertBefore");
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        match self.document.create_element(tag) {
            Ok(element) => Some(element),
            Err(err) => {
                tracing::warn!(tag, error = ?err, "createElement failed");
                None
            }
        }
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        log_js_error(node.set_attribute(name, value), name);
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn subscribe(&self, subscription: Subscription<Element>) -> WatchId {
        let watch = self.allocate();
        match self.register(watch, subscription) {
            Some(registration) => {
                self.registrations.borrow_mut().insert(watch, registration);
            }
            None => tracing::warn!(?watch, "browser refused subscription"),
        }
        watch
    }

    fn unsubscribe(&self, watch: WatchId) {
        let Some(registration) = self.registrations.borrow_mut().remove(&watch) else {
            return;
        };
        match registration {
            Registration::Mutations { observer, .. } => observer.disconnect(),
            Registration::Resize { observer, .. } => observer.disconnect(),
            Registration::Interval { handle, .. } => self.window.clear_interval_with_handle(handle),
            Registration::Timeout { handle, .. } => self.window.clear_timeout_with_handle(handle),
            Registration::Listeners(listeners) => {
                for listener in listeners {
                    listener.detach();
                }
            }
        }
    }

    fn relayout_rich_editor(&self, _node: &Element) {
        // The editor exposes no layout hook on its element; a synthetic
        // window resize makes it re-measure.
        match Event::new("resize") {
            Ok(event) => log_js_error(self.window.dispatch_event(&event), "dispatchEvent"),
            Err(err) => tracing::debug!(error = ?err, "could not build resize event"),
        }
    }
}

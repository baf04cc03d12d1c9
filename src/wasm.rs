//! `wasm-bindgen` exports: a [`PinBar`] handle owning a [`PinEngine`] over
//! the live page. Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::load_config;
use crate::engine::{DiscoveryStatus, PinEngine};
use crate::error::EngineError;
use crate::host::web::WebDocument;
use crate::host::HostEvent;
use crate::logging;

type SharedEngine = Rc<RefCell<PinEngine<WebDocument>>>;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!("pinbar panic at {}:{}: {info}", loc.file(), loc.line()),
                None => format!("pinbar panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn route(engine: &Weak<RefCell<PinEngine<WebDocument>>>, event: HostEvent<web_sys::Element>) {
    let Some(engine) = engine.upgrade() else {
        return;
    };
    match engine.try_borrow_mut() {
        Ok(mut engine) => engine.dispatch(event),
        Err(_) => tracing::debug!(watch = ?event.watch(), "engine busy; host event dropped"),
    };
}

/// JS handle for one pin engine attached to the current page.
#[wasm_bindgen]
pub struct PinBar {
    engine: SharedEngine,
}

#[wasm_bindgen]
impl PinBar {
    /// Builds the engine from optional JSON config overrides. Invalid JSON
    /// falls back to defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<PinBar, JsValue> {
        install_panic_hook();
        logging::init();
        let config = load_config(config_json.as_deref());
        let doc = WebDocument::from_window()
            .ok_or_else(|| JsValue::from_str("pinbar needs a browser document with a body"))?;
        let engine: SharedEngine = Rc::new(RefCell::new(PinEngine::new(doc, config)));
        let weak = Rc::downgrade(&engine);
        engine
            .borrow()
            .document()
            .set_sink(Rc::new(move |event: HostEvent<web_sys::Element>| {
                route(&weak, event)
            }));
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "pinbar attached");
        Ok(Self { engine })
    }

    /// Starts discovery; `true` once the toolbar control is in place,
    /// `false` while retries are still scheduled.
    pub fn start(&self) -> Result<bool, JsValue> {
        let status = self.engine.borrow_mut().start().map_err(to_js)?;
        Ok(status == DiscoveryStatus::Found)
    }

    /// `true` when this call pinned, `false` when already pinned.
    pub fn pin(&self) -> Result<bool, JsValue> {
        let outcome = self.engine.borrow_mut().pin().map_err(to_js)?;
        Ok(outcome == crate::engine::PinOutcome::Pinned)
    }

    pub fn unpin(&self) -> Result<bool, JsValue> {
        let outcome = self.engine.borrow_mut().unpin().map_err(to_js)?;
        Ok(outcome == crate::engine::UnpinOutcome::Unpinned)
    }

    /// Flips the pin and reports whether the bar is now pinned.
    pub fn toggle(&self) -> Result<bool, JsValue> {
        let state = self.engine.borrow_mut().toggle().map_err(to_js)?;
        Ok(state.is_pinned())
    }

    #[wasm_bindgen(js_name = isPinned)]
    pub fn is_pinned(&self) -> bool {
        self.engine.borrow().state().is_pinned()
    }

    /// Engine status as a JSON string.
    pub fn status(&self) -> Result<String, JsValue> {
        let status = self.engine.borrow().status();
        serde_json::to_string(&status).map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// Restores the page and releases every host subscription.
    pub fn shutdown(&self) {
        self.engine.borrow_mut().shutdown();
    }
}

//! Pins a host page's floating formula bar to the trailing edge of the
//! viewport and keeps the side panel it displaces anchored beside it.

pub mod config;
pub mod cosmetic;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod host;
pub mod layout;
pub mod locator;
pub mod logging;
pub mod snapshot;
pub mod state;
pub mod ui;
pub mod watch;

#[cfg(test)]
mod testing;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use config::{load_config, PinConfig};
pub use engine::{DiscoveryStatus, EngineStatus, PinEngine, PinOutcome, UnpinOutcome};
pub use error::{EngineError, EngineResult};
pub use host::{HostDocument, HostEvent, Subscription, WatchId};
pub use layout::Motion;
pub use state::PinState;

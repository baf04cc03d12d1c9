use crate::config::ConfigError;
use crate::engine::DiscoveryError;
use crate::locator::LocateError;
use crate::state::StateError;
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No displaced panel qualifies yet; the caller may retry later.
    #[error("displaced panel not available; pin deferred")]
    NotReady,
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

use super::event::PinEvent;
use super::model::PinState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid pin transition: from {from:?} using event {event:?}")]
    InvalidStateTransition { from: PinState, event: PinEvent },
}

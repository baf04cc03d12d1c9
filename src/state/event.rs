use super::model::PinState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Pin,
    Unpin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: PinState,
    pub event: PinEvent,
    pub to: PinState,
}

impl StateTransition {
    pub const fn new(from: PinState, event: PinEvent, to: PinState) -> Self {
        Self { from, event, to }
    }
}

use std::collections::VecDeque;

use super::error::{StateError, StateResult};
use super::{PinEvent, PinState, StateTransition};

const HISTORY_LIMIT: usize = 32;

#[derive(Debug)]
pub struct StateMachine {
    state: PinState,
    transition_history: VecDeque<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: PinState::default(),
            transition_history: VecDeque::new(),
        }
    }

    pub fn state(&self) -> PinState {
        self.state
    }

    pub fn can_transition(&self, event: PinEvent) -> bool {
        self.next_state(event).is_some()
    }

    /// The event would leave the state unchanged: pin while pinned, or
    /// unpin while unpinned. Callers treat these as no-ops.
    pub fn is_redundant(&self, event: PinEvent) -> bool {
        matches!(
            (self.state, event),
            (PinState::Pinned, PinEvent::Pin) | (PinState::Unpinned, PinEvent::Unpin)
        )
    }

    pub fn next_state(&self, event: PinEvent) -> Option<PinState> {
        match (self.state, event) {
            (PinState::Unpinned, PinEvent::Pin) => Some(PinState::Pinned),
            (PinState::Pinned, PinEvent::Unpin) => Some(PinState::Unpinned),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: PinEvent) -> StateResult<PinState> {
        tracing::debug!(from = ?self.state, event = ?event, "request pin transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid pin transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(self.state, event, next);
        self.state = next;
        if self.transition_history.len() == HISTORY_LIMIT {
            self.transition_history.pop_front();
        }
        self.transition_history.push_back(record);

        Ok(self.state)
    }

    pub fn transitions(&self) -> usize {
        self.transition_history.len()
    }
}

#[cfg(test)]
impl StateMachine {
    fn history(&self) -> Vec<StateTransition> {
        self.transition_history.iter().copied().collect()
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PinState::{:?}", self.state)
    }
}

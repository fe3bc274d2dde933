//! Signal Dispatch State Machine
//!
//! Defines the linear dispatch path and how failures end it.
//!
//! ```text
//! Start -> DetermineStatus -> ResolveIdentity -> Publish -> Done
//!                \________________\_______________\______-> Aborted
//! ```

use std::fmt;

/// Stages of a single dispatch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Nothing has happened yet
    Start,
    /// Deciding SUCCESS/FAILURE from the flag or the command
    DetermineStatus,
    /// Looking up instance ID and region
    ResolveIdentity,
    /// Sending the signal
    Publish,
    /// Signal published
    Done,
    /// A fatal error stopped the run
    Aborted,
}

impl FlowState {
    /// Whether the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Done | FlowState::Aborted)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Start => "start",
            FlowState::DetermineStatus => "determine-status",
            FlowState::ResolveIdentity => "resolve-identity",
            FlowState::Publish => "publish",
            FlowState::Done => "done",
            FlowState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Events that move the run forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// Run started
    Begin,
    /// Status is known
    StatusDetermined,
    /// Instance ID (and maybe region) is known
    IdentityResolved,
    /// Publisher accepted the signal
    Published,
    /// Fatal error
    Failed { reason: String },
}

/// Result of a state transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and state changed
    Advanced(FlowState),
    /// Run ended on a fatal error
    Aborted { from: FlowState, reason: String },
    /// Transition was invalid from current state
    Invalid { from: FlowState, event: FlowEvent },
}

/// Tracks where a dispatch run is
#[derive(Debug)]
pub struct FlowMachine {
    current_state: FlowState,
}

impl Default for FlowMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowMachine {
    /// Create a new state machine in Start state
    pub fn new() -> Self {
        Self {
            current_state: FlowState::Start,
        }
    }

    /// Get current state
    pub fn state(&self) -> FlowState {
        self.current_state
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: FlowEvent) -> TransitionResult {
        if let FlowEvent::Failed { reason } = &event {
            if self.current_state.is_terminal() {
                return TransitionResult::Invalid {
                    from: self.current_state,
                    event,
                };
            }
            let from = self.current_state;
            self.current_state = FlowState::Aborted;
            return TransitionResult::Aborted {
                from,
                reason: reason.clone(),
            };
        }

        match self.get_next_state(&event) {
            Some(state) => {
                self.current_state = state;
                TransitionResult::Advanced(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    fn get_next_state(&self, event: &FlowEvent) -> Option<FlowState> {
        use FlowEvent::*;
        use FlowState::*;

        match (self.current_state, event) {
            (Start, Begin) => Some(DetermineStatus),
            (DetermineStatus, StatusDetermined) => Some(ResolveIdentity),
            (ResolveIdentity, IdentityResolved) => Some(Publish),
            (Publish, Published) => Some(Done),
            _ => None,
        }
    }
}

//! Runtime errors.

use crate::core::ActorStatus;
use thiserror::Error;

/// Errors surfacing from `start`, `send`, `stop` and timer processing.
///
/// None of them crash an actor: a failed macrostep is rolled back and the
/// actor keeps running at the configuration it held before the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Guard '{guard}' in state '{state}' failed: {message}")]
    Guard {
        state: String,
        guard: String,
        message: String,
    },

    #[error("Actor '{parent}' already has a live child named '{name}'")]
    DuplicateChild { parent: String, name: String },

    #[error("Actor '{actor}' is not running ({status})")]
    NotRunning { actor: String, status: ActorStatus },

    #[error("Actor '{actor}' has already been started")]
    AlreadyStarted { actor: String },

    #[error("The empty event type is reserved for eventless transitions")]
    ReservedEventType,

    #[error("Eventless transitions from '{state}' did not settle within {limit} steps")]
    EventlessLoop { state: String, limit: usize },

    #[error("'{value}' is not a state of machine '{machine}'")]
    UnknownState { machine: String, value: String },
}

//! Core statechart types.
//!
//! This module contains the pure building blocks shared by the builder, the
//! resolver and the actor runtime:
//! - Events and triggers via the `Event` trait
//! - Actor addressing
//! - Guard predicates for transition control
//! - Active state values and bounded transition history
//!
//! Nothing in this module performs side effects.

mod address;
mod event;
mod guard;
mod history;
mod state;

pub use address::{ActorId, ActorRef, Target};
pub use event::{Event, Trigger};
pub use guard::Guard;
pub use history::{StateHistory, TransitionRecord};
pub use state::{ActorStatus, StateKind, StateValue};

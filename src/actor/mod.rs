//! Actors: interpreters, spawned children, mailboxes and timers.
//!
//! An [`Interpreter`] owns a whole actor tree. Messages are delivered one at a
//! time from a FIFO mailbox, and each delivery runs to completion before the
//! next starts. Delayed sends wait on a [`Clock`] and enter the same mailbox
//! when they fire.

mod clock;
mod diagnostics;
mod error;
mod interpreter;
mod options;
mod registry;
mod runtime;
pub(crate) mod system;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::RuntimeError;
pub use interpreter::{Interpreter, Snapshot, SubscriptionId};
pub use options::InterpreterOptions;
pub use runtime::{Actor, Runtime};
pub use system::Scope;

#[cfg(test)]
pub(crate) use system::Command;

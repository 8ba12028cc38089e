//! Harel: hierarchical state machines with spawned actors
//!
//! Harel interprets statecharts: nested compound states, ordered guarded
//! transition candidates, entry/exit/transition actions, eventless
//! transitions, delayed sends, and child actors addressed by name.
//!
//! The definition side is pure. A declarative [`MachineConfig`] is validated
//! once into an immutable [`Machine`], and resolving an event against it is a
//! function of the active state, the context and the event. The runtime side
//! is an [`Interpreter`] owning a tree of actors that exchange messages through
//! a run-to-completion mailbox.
//!
//! # Core Concepts
//!
//! - **Configuration**: plain data, written fluently or parsed from JSON
//! - **Guards and actions**: implementations registered by id on the builder
//! - **Macrostep**: one event plus the eventless transitions it enables,
//!   committed all-or-nothing
//! - **Actors**: spawned children with their own context, addressed by name
//!   or by reference
//!
//! # Example
//!
//! ```rust
//! use harel::prelude::*;
//!
//! event_enum! {
//!     enum Count {
//!         Inc => "INC",
//!     }
//! }
//!
//! let config = MachineConfig::new("counter")
//!     .initial("counting")
//!     .state(
//!         "counting",
//!         StateConfig::new()
//!             .on("INC", TransitionConfig::targetless().actions("increment"))
//!             .always(TransitionConfig::to("full").guard("isFull")),
//!     )
//!     .state("full", StateConfig::final_state());
//!
//! let machine = Machine::builder(config, 0u32)
//!     .action("increment", Action::assign(|n: &u32, _| n + 1))
//!     .guard("isFull", |n: &u32, _| *n >= 2)
//!     .build()
//!     .unwrap();
//!
//! let mut counter = Interpreter::new(&machine);
//! counter.start().unwrap();
//! counter.send(Count::Inc).unwrap();
//! counter.send(Count::Inc).unwrap();
//!
//! let snapshot = counter.snapshot();
//! assert!(snapshot.matches("full"));
//! assert!(snapshot.done);
//! assert_eq!(snapshot.context, 2);
//! ```

pub mod actor;
pub mod builder;
pub mod core;
pub mod effects;

pub use actor::{Interpreter, InterpreterOptions, RuntimeError, Snapshot};
pub use builder::{BuildError, Machine, MachineConfig, StateConfig, TransitionConfig};
pub use core::{Event, StateValue, Target};
pub use effects::Action;

/// Everything needed to configure, build and run machines.
pub mod prelude {
    pub use crate::actor::{
        Actor, Clock, Diagnostic, Diagnostics, Interpreter, InterpreterOptions, ManualClock,
        RuntimeError, Scope, Snapshot, SystemClock,
    };
    pub use crate::builder::{
        BuildError, ConfigError, Machine, MachineConfig, StateConfig, TransitionConfig,
    };
    pub use crate::core::{ActorRef, ActorStatus, Event, StateValue, Target, Trigger};
    pub use crate::effects::{Action, SendAction, SpawnAction};
    pub use crate::event_enum;
}

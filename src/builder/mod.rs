//! Builder API for machine construction.
//!
//! A [`MachineConfig`] describes the state tree and names guards and actions
//! by id. A [`MachineBuilder`] binds those ids to implementations and
//! validates the whole configuration, reporting every problem it finds in one
//! [`BuildError`].

pub mod config;
pub mod error;
pub mod machine;
pub mod macros;
pub(crate) mod tree;

pub use config::{ActionList, MachineConfig, StateConfig, TransitionConfig, TransitionList};
pub use error::{BuildError, ConfigError, LintWarning};
pub use machine::{Machine, MachineBuilder};

//! Build errors for machine configurations.

use std::fmt;
use thiserror::Error;

/// A single problem found in a machine configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Compound state '{state}' has no initial state. Set `initial` to one of its children")]
    MissingInitial { state: String },

    #[error("Initial state '{initial}' of '{state}' is not one of its children")]
    UnknownInitial { state: String, initial: String },

    #[error("State '{state}' declares initial state '{initial}' but has no children")]
    InitialOnLeaf { state: String, initial: String },

    #[error("Final state '{state}' cannot have children")]
    FinalWithChildren { state: String },

    #[error("Transition on '{trigger}' from '{state}' targets unknown state '{target}'")]
    UnknownTarget {
        state: String,
        trigger: String,
        target: String,
    },

    #[error("State '{parent}' has more than one child named '{key}'")]
    DuplicateKey { parent: String, key: String },

    #[error("State id '{id}' is used by more than one state")]
    DuplicateId { id: String },

    #[error("State key '{key}' under '{parent}' must be non-empty and must not contain '.' or '#'")]
    InvalidKey { parent: String, key: String },

    #[error("Guard '{guard}' used by '{state}' has no implementation")]
    UnknownGuard { state: String, guard: String },

    #[error("Action '{action}' used by '{state}' has no implementation")]
    UnknownAction { state: String, action: String },

    #[error("Configuration could not be parsed: {0}")]
    Parse(String),
}

/// Every problem found while building a machine.
///
/// Validation does not stop at the first problem; all of them are reported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid machine configuration{}", list(.errors))]
pub struct BuildError {
    errors: Vec<ConfigError>,
}

fn list(errors: &[ConfigError]) -> String {
    errors.iter().map(|error| format!("\n  - {error}")).collect()
}

impl BuildError {
    pub fn new(errors: Vec<ConfigError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ConfigError> {
        self.errors
    }
}

impl From<ConfigError> for BuildError {
    fn from(error: ConfigError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// A non-fatal finding about a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    /// Id of the state the finding is about
    pub state: String,
    pub message: String,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.state, self.message)
    }
}

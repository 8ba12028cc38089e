//! Interpreter tunables, shared by every actor in the tree.

use serde::{Deserialize, Serialize};

/// Tunables of an interpreter and every actor it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    /// Upper bound on eventless transitions taken in one macrostep.
    pub max_eventless_steps: usize,
    /// Transition records kept per actor.
    pub history_limit: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            max_eventless_steps: 1000,
            history_limit: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options: InterpreterOptions =
            serde_json::from_str(r#"{ "history_limit": 5 }"#).unwrap();

        assert_eq!(options.history_limit, 5);
        assert_eq!(options.max_eventless_steps, 1000);
    }
}

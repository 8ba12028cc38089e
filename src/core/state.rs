//! State kinds, active state values and actor status.
//!
//! All methods here are pure. A [`StateValue`] is the single active path from
//! the root to the active leaf, by state key.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Kind of a state node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    /// Leaf state without children.
    Atomic,
    /// State with children, exactly one of which is active.
    Compound,
    /// Leaf state marking completion of its parent.
    Final,
}

impl StateKind {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, StateKind::Compound)
    }
}

/// The active configuration of an actor: the keys from the root's child down
/// to the active leaf.
///
/// # Example
///
/// ```rust
/// use harel::core::StateValue;
///
/// let value = StateValue::from_path("play.turn.actor1");
///
/// assert!(value.matches("play"));
/// assert!(value.matches("play.turn"));
/// assert!(value.matches("play.turn.actor1"));
/// assert!(!value.matches("turn"));
/// assert!(!value.matches("play.evaluate"));
/// assert_eq!(value.leaf(), Some("actor1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateValue {
    path: Vec<String>,
}

impl StateValue {
    pub fn new(path: Vec<String>) -> Self {
        Self { path }
    }

    /// Parse a dotted path such as `"play.turn.actor1"`.
    pub fn from_path(path: &str) -> Self {
        Self {
            path: path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn leaf(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Dotted-path containment test against the active path.
    ///
    /// `"a.b"` matches while `a.b` or any of its descendants is active. The
    /// path is anchored at the root, so `"b"` does not match `a.b`.
    pub fn matches(&self, path: &str) -> bool {
        let mut len = 0;
        for (index, segment) in path.split('.').filter(|s| !s.is_empty()).enumerate() {
            match self.path.get(index) {
                Some(active) if active == segment => len += 1,
                _ => return false,
            }
        }
        len > 0
    }
}

impl Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join("."))
    }
}

/// Lifecycle of an actor. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorStatus {
    NotStarted,
    Running,
    Stopped,
}

impl Display for ActorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_prefixes_from_root() {
        let value = StateValue::from_path("a.b.c");

        assert!(value.matches("a"));
        assert!(value.matches("a.b"));
        assert!(value.matches("a.b.c"));
        assert!(!value.matches("a.b.c.d"));
        assert!(!value.matches("b.c"));
        assert!(!value.matches("a.d"));
    }

    #[test]
    fn empty_path_never_matches() {
        let value = StateValue::from_path("relaxed");

        assert!(!value.matches(""));
        assert!(!StateValue::default().matches("relaxed"));
    }

    #[test]
    fn display_joins_with_dots() {
        let value = StateValue::new(vec!["play".into(), "evaluate".into()]);

        assert_eq!(value.to_string(), "play.evaluate");
        assert_eq!(value, StateValue::from_path("play.evaluate"));
    }

    #[test]
    fn state_value_serializes_as_list() {
        let value = StateValue::from_path("play.turn");
        let json = serde_json::to_string(&value).unwrap();

        assert_eq!(json, r#"["play","turn"]"#);
        let back: StateValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn state_kind_uses_lowercase_names() {
        let kind: StateKind = serde_json::from_str("\"final\"").unwrap();

        assert_eq!(kind, StateKind::Final);
        assert!(kind.is_leaf());
        assert!(!StateKind::Compound.is_leaf());
    }

    #[test]
    fn status_display() {
        assert_eq!(ActorStatus::NotStarted.to_string(), "not started");
        assert_eq!(ActorStatus::Stopped.to_string(), "stopped");
    }
}

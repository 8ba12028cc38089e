//! Event primitives exchanged between actors.
//!
//! Events are the collaborator's own closed enum. The only thing the
//! interpreter needs from them is a type tag, which selects the candidate
//! transitions declared under `on` in the machine configuration.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

/// Trait for events delivered to state machines.
///
/// Usually generated with [`event_enum!`](crate::event_enum), which maps every
/// variant to its type tag with an exhaustive match.
///
/// # Example
///
/// ```rust
/// use harel::core::Event;
///
/// #[derive(Clone, Debug)]
/// enum Toggle {
///     Toggle,
///     Enable,
/// }
///
/// impl Event for Toggle {
///     fn event_type(&self) -> &str {
///         match self {
///             Self::Toggle => "TOGGLE",
///             Self::Enable => "ENABLE",
///         }
///     }
/// }
///
/// assert_eq!(Toggle::Enable.event_type(), "ENABLE");
/// ```
pub trait Event: Clone + Debug + 'static {
    /// The event's type tag.
    ///
    /// The empty string is reserved for eventless transitions and is rejected
    /// by [`Interpreter::send`](crate::actor::Interpreter::send).
    fn event_type(&self) -> &str;
}

/// The key a list of transition candidates is declared under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Trigger {
    /// A named event type.
    Event(String),
    /// The eventless trigger, evaluated right after every microstep.
    Always,
}

impl Trigger {
    /// Trigger for a named event type.
    pub fn event(event_type: impl Into<String>) -> Self {
        Trigger::Event(event_type.into())
    }

    /// Trigger matching the given event.
    pub fn of<E: Event>(event: &E) -> Self {
        Trigger::Event(event.event_type().to_string())
    }

    /// Map a configuration key to a trigger. The empty key is eventless.
    pub fn from_key(key: &str) -> Self {
        if key.is_empty() {
            Trigger::Always
        } else {
            Trigger::Event(key.to_string())
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Trigger::Always)
    }

    /// The event type this trigger stands for (`""` when eventless).
    pub fn event_type(&self) -> &str {
        match self {
            Trigger::Event(name) => name,
            Trigger::Always => "",
        }
    }
}

impl Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Event(name) => f.write_str(name),
            Trigger::Always => f.write_str("(always)"),
        }
    }
}

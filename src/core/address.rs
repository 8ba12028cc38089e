//! Actor identity and addressing.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

/// Stable identity of a running actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to an actor, usable as a send target.
///
/// Holding a reference never keeps the actor alive; sends to a stopped actor
/// are dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    id: ActorId,
    name: String,
}

impl ActorRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Name of the actor, unique among its siblings.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Destination of an addressed send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// The sending actor.
    Itself,
    /// The actor that spawned the sender.
    Parent,
    /// A live child of the sender, looked up by name when delivered.
    Child(String),
    /// A specific actor.
    Actor(ActorRef),
}

impl Target {
    pub fn child(name: impl Into<String>) -> Self {
        Target::Child(name.into())
    }
}

impl From<ActorRef> for Target {
    fn from(actor: ActorRef) -> Self {
        Target::Actor(actor)
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Itself => f.write_str("self"),
            Target::Parent => f.write_str("parent"),
            Target::Child(name) => write!(f, "child '{name}'"),
            Target::Actor(actor) => write!(f, "actor {actor}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_refs_are_unique_per_instance() {
        let a = ActorRef::new("child");
        let b = ActorRef::new("child");

        assert_eq!(a.name(), b.name());
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn actor_ref_converts_into_target() {
        let actor = ActorRef::new("worker");
        let target: Target = actor.clone().into();

        assert_eq!(target, Target::Actor(actor));
    }

    #[test]
    fn actor_id_serializes_as_uuid() {
        let id = ActorId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ActorId = serde_json::from_str(&json).unwrap();

        assert_eq!(id, back);
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}

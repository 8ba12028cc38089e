//! Declarative machine configuration.
//!
//! A configuration is plain data: it names guards and actions by id and
//! leaves their implementations to [`MachineBuilder`](super::MachineBuilder).
//! It can be written with the fluent API below or parsed from JSON in the
//! usual statechart shape.
//!
//! ```rust
//! use harel::builder::{MachineConfig, StateConfig};
//!
//! let from_builder = MachineConfig::new("toggle")
//!     .initial("relaxed")
//!     .state("relaxed", StateConfig::new().on("TOGGLE", "toggled"))
//!     .state("toggled", StateConfig::new().on("TOGGLE", "relaxed"));
//!
//! let from_json = MachineConfig::from_json(
//!     r#"{
//!         "id": "toggle",
//!         "initial": "relaxed",
//!         "states": {
//!             "relaxed": { "on": { "TOGGLE": "toggled" } },
//!             "toggled": { "on": { "TOGGLE": "relaxed" } }
//!         }
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(from_builder, from_json);
//! ```

use crate::builder::error::{BuildError, ConfigError};
use crate::core::StateKind;
use serde::{Deserialize, Serialize};

/// An ordered list of action ids. A single id and a list both normalize to
/// a sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany", into = "Vec<String>")]
pub struct ActionList(Vec<String>);

impl ActionList {
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn extend(&mut self, other: ActionList) {
        self.0.extend(other.0);
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for ActionList {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(id) => ActionList(vec![id]),
            OneOrMany::Many(ids) => ActionList(ids),
        }
    }
}

impl From<ActionList> for Vec<String> {
    fn from(list: ActionList) -> Self {
        list.0
    }
}

impl From<&str> for ActionList {
    fn from(id: &str) -> Self {
        ActionList(vec![id.to_string()])
    }
}

impl From<String> for ActionList {
    fn from(id: String) -> Self {
        ActionList(vec![id])
    }
}

impl From<Vec<String>> for ActionList {
    fn from(ids: Vec<String>) -> Self {
        ActionList(ids)
    }
}

impl From<Vec<&str>> for ActionList {
    fn from(ids: Vec<&str>) -> Self {
        ActionList(ids.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ActionList {
    fn from(ids: [&str; N]) -> Self {
        ActionList(ids.iter().map(|id| id.to_string()).collect())
    }
}

/// One transition candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TransitionRepr")]
pub struct TransitionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(skip_serializing_if = "ActionList::is_empty")]
    pub actions: ActionList,
}

impl TransitionConfig {
    /// A candidate moving to `target`.
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::default()
        }
    }

    /// A candidate without a target: its actions run, the active
    /// configuration stays as it is.
    pub fn targetless() -> Self {
        Self::default()
    }

    pub fn guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn actions(mut self, actions: impl Into<ActionList>) -> Self {
        self.actions.extend(actions.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TransitionRepr {
    Target(String),
    Full(TransitionFields),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TransitionFields {
    #[serde(default)]
    target: Option<String>,
    #[serde(default, alias = "cond")]
    guard: Option<String>,
    #[serde(default)]
    actions: ActionList,
}

impl From<TransitionRepr> for TransitionConfig {
    fn from(repr: TransitionRepr) -> Self {
        match repr {
            TransitionRepr::Target(target) => TransitionConfig::to(target),
            TransitionRepr::Full(fields) => TransitionConfig {
                target: fields.target,
                guard: fields.guard,
                actions: fields.actions,
            },
        }
    }
}

/// Ordered candidate list for one trigger. First match wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CandidatesRepr", into = "Vec<TransitionConfig>")]
pub struct TransitionList(Vec<TransitionConfig>);

impl TransitionList {
    pub fn candidates(&self) -> &[TransitionConfig] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidatesRepr {
    One(TransitionConfig),
    Many(Vec<TransitionConfig>),
}

impl From<CandidatesRepr> for TransitionList {
    fn from(repr: CandidatesRepr) -> Self {
        match repr {
            CandidatesRepr::One(candidate) => TransitionList(vec![candidate]),
            CandidatesRepr::Many(candidates) => TransitionList(candidates),
        }
    }
}

impl From<TransitionList> for Vec<TransitionConfig> {
    fn from(list: TransitionList) -> Self {
        list.0
    }
}

impl From<&str> for TransitionList {
    fn from(target: &str) -> Self {
        TransitionList(vec![TransitionConfig::to(target)])
    }
}

impl From<TransitionConfig> for TransitionList {
    fn from(candidate: TransitionConfig) -> Self {
        TransitionList(vec![candidate])
    }
}

impl From<Vec<TransitionConfig>> for TransitionList {
    fn from(candidates: Vec<TransitionConfig>) -> Self {
        TransitionList(candidates)
    }
}

impl<const N: usize> From<[TransitionConfig; N]> for TransitionList {
    fn from(candidates: [TransitionConfig; N]) -> Self {
        TransitionList(candidates.into())
    }
}

/// Configuration of one state node and its subtree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<StateKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    #[serde(skip_serializing_if = "ActionList::is_empty")]
    pub entry: ActionList,
    #[serde(skip_serializing_if = "ActionList::is_empty")]
    pub exit: ActionList,
    #[serde(with = "ordered_map", skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<(String, TransitionList)>,
    #[serde(skip_serializing_if = "TransitionList::is_empty")]
    pub always: TransitionList,
    #[serde(with = "ordered_map", skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<(String, StateConfig)>,
}

impl StateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A final state.
    pub fn final_state() -> Self {
        Self {
            kind: Some(StateKind::Final),
            ..Self::default()
        }
    }

    /// Override the node id used by `#id` targets.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn kind(mut self, kind: StateKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn initial(mut self, key: impl Into<String>) -> Self {
        self.initial = Some(key.into());
        self
    }

    pub fn entry(mut self, actions: impl Into<ActionList>) -> Self {
        self.entry.extend(actions.into());
        self
    }

    pub fn exit(mut self, actions: impl Into<ActionList>) -> Self {
        self.exit.extend(actions.into());
        self
    }

    /// Declare the candidates for an event type. The empty event type is
    /// the eventless trigger.
    pub fn on(mut self, event_type: impl Into<String>, transitions: impl Into<TransitionList>) -> Self {
        self.on.push((event_type.into(), transitions.into()));
        self
    }

    /// Declare eventless candidates.
    pub fn always(mut self, transitions: impl Into<TransitionList>) -> Self {
        self.always.0.extend(transitions.into().0);
        self
    }

    /// Add a child state.
    pub fn state(mut self, key: impl Into<String>, config: StateConfig) -> Self {
        self.states.push((key.into(), config));
        self
    }
}

/// Configuration of a whole machine: the root state node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineConfig {
    root: StateConfig,
}

impl MachineConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            root: StateConfig::new().id(id),
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        serde_json::from_str(json)
            .map_err(|e| BuildError::from(ConfigError::Parse(e.to_string())))
    }

    pub fn to_json(&self) -> Result<String, BuildError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BuildError::from(ConfigError::Parse(e.to_string())))
    }

    pub fn root(&self) -> &StateConfig {
        &self.root
    }

    pub fn initial(self, key: impl Into<String>) -> Self {
        Self {
            root: self.root.initial(key),
        }
    }

    pub fn entry(self, actions: impl Into<ActionList>) -> Self {
        Self {
            root: self.root.entry(actions),
        }
    }

    pub fn exit(self, actions: impl Into<ActionList>) -> Self {
        Self {
            root: self.root.exit(actions),
        }
    }

    pub fn on(self, event_type: impl Into<String>, transitions: impl Into<TransitionList>) -> Self {
        Self {
            root: self.root.on(event_type, transitions),
        }
    }

    pub fn always(self, transitions: impl Into<TransitionList>) -> Self {
        Self {
            root: self.root.always(transitions),
        }
    }

    pub fn state(self, key: impl Into<String>, config: StateConfig) -> Self {
        Self {
            root: self.root.state(key, config),
        }
    }
}

impl From<StateConfig> for MachineConfig {
    fn from(root: StateConfig) -> Self {
        Self { root }
    }
}

/// Maps kept as ordered entry lists so that declaration order survives and
/// duplicate keys reach validation instead of overwriting each other.
mod ordered_map {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, T>(entries: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Vec<(String, T)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_action_and_list_normalize() {
        let one: ActionList = serde_json::from_str(r#""contextify""#).unwrap();
        let many: ActionList = serde_json::from_str(r#"["writeTurn", "continueOrEnd"]"#).unwrap();

        assert_eq!(one, ActionList::from("contextify"));
        assert_eq!(many, ActionList::from(["writeTurn", "continueOrEnd"]));
    }

    #[test]
    fn transition_shorthand_and_full_forms_parse() {
        let short: TransitionList = serde_json::from_str(r#""toggled""#).unwrap();
        let full: TransitionList = serde_json::from_str(
            r##"[{ "target": "#evaluate", "cond": "cellIsFree" }, { "target": "actor1" }]"##,
        )
        .unwrap();

        assert_eq!(short.candidates(), &[TransitionConfig::to("toggled")]);
        assert_eq!(full.candidates().len(), 2);
        assert_eq!(full.candidates()[0].guard.as_deref(), Some("cellIsFree"));
        assert_eq!(full.candidates()[1].target.as_deref(), Some("actor1"));
    }

    #[test]
    fn targetless_candidate_parses() {
        let list: TransitionList = serde_json::from_str(r#"{ "actions": "ping" }"#).unwrap();

        assert_eq!(list.candidates(), &[TransitionConfig::targetless().actions("ping")]);
    }

    #[test]
    fn json_keeps_state_order_and_duplicates() {
        let config = MachineConfig::from_json(
            r#"{ "initial": "b", "states": { "b": {}, "a": {}, "b": { "type": "final" } } }"#,
        )
        .unwrap();

        let keys: Vec<&str> = config.root().states.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "b"]);
        assert_eq!(config.root().states[2].1.kind, Some(StateKind::Final));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = MachineConfig::from_json(r#"{ "initail": "a" }"#);

        assert!(result.is_err());
    }

    #[test]
    fn builder_and_json_agree_on_eventless_lists() {
        let json = MachineConfig::from_json(
            r#"{
                "initial": "message",
                "states": {
                    "message": { "on": { "": "await" } },
                    "await": {}
                }
            }"#,
        )
        .unwrap();

        let (event, list) = &json.root().states[0].1.on[0];
        assert_eq!(event, "");
        assert_eq!(list.candidates(), &[TransitionConfig::to("await")]);
    }

    #[test]
    fn config_serializes_back_to_json() {
        let config = MachineConfig::new("toggle")
            .initial("relaxed")
            .state("relaxed", StateConfig::new().on("TOGGLE", "toggled"))
            .state("toggled", StateConfig::new().on("TOGGLE", "relaxed"));

        let json = config.to_json().unwrap();
        let back = MachineConfig::from_json(&json).unwrap();

        assert_eq!(config, back);
    }

    #[test]
    fn entry_and_actions_accumulate() {
        let state = StateConfig::new().entry("a").entry(["b", "c"]);

        assert_eq!(state.entry.ids(), &["a", "b", "c"]);
    }
}

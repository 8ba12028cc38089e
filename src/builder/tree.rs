//! Immutable state node tree with a flat id index.
//!
//! Built once from a [`MachineConfig`]. Every structural problem is collected
//! through stillwater's `Validation` so a single build reports all of them.

use crate::builder::config::{MachineConfig, StateConfig, TransitionConfig};
use crate::builder::error::{BuildError, ConfigError, LintWarning};
use crate::core::{StateKind, StateValue, Trigger};
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigError>>;

const DEFAULT_MACHINE_ID: &str = "machine";

/// Index of a node in its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedTarget {
    pub node: NodeId,
    /// Target given relative to the source itself (`.child`): the source is
    /// not exited.
    pub internal: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Candidate {
    pub guard: Option<String>,
    pub actions: Vec<String>,
    pub target: Option<ResolvedTarget>,
}

#[derive(Clone, Debug)]
pub(crate) struct StateNode {
    pub key: String,
    pub id: String,
    pub path: Vec<String>,
    pub parent: Option<NodeId>,
    pub kind: StateKind,
    pub initial: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub entry: Vec<String>,
    pub exit: Vec<String>,
    pub on: HashMap<String, Vec<Candidate>>,
    pub always: Vec<Candidate>,
}

impl StateNode {
    pub fn candidates(&self, trigger: &Trigger) -> &[Candidate] {
        match trigger {
            Trigger::Always => &self.always,
            Trigger::Event(name) => self.on.get(name).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct StateTree {
    nodes: Vec<StateNode>,
    ids: HashMap<String, NodeId>,
}

impl StateTree {
    /// Build and validate the tree for `config`.
    pub fn build(config: &MachineConfig) -> Result<Self, BuildError> {
        let mut builder = TreeBuilder::default();
        let machine_id = config
            .root()
            .id
            .clone()
            .unwrap_or_else(|| DEFAULT_MACHINE_ID.to_string());
        builder.add_node(None, String::new(), &machine_id, config.root());

        let mut tree = StateTree {
            nodes: builder.nodes,
            ids: HashMap::new(),
        };
        let mut checks = builder.checks;

        for (index, node) in tree.nodes.iter().enumerate() {
            let check = if tree.ids.insert(node.id.clone(), NodeId(index)).is_some() {
                Validation::fail(ConfigError::DuplicateId {
                    id: node.id.clone(),
                })
            } else {
                Validation::success(())
            };
            checks.push(check);
        }

        for (node, state) in builder.sources {
            for (event, list) in &state.on {
                let trigger = Trigger::from_key(event);
                for candidate in list.candidates() {
                    checks.push(tree.add_candidate(node, &trigger, candidate));
                }
            }
            for candidate in state.always.candidates() {
                checks.push(tree.add_candidate(node, &Trigger::Always, candidate));
            }
        }

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(tree),
            Validation::Failure(errors) => Err(BuildError::new(errors.iter().cloned().collect())),
        }
    }

    fn resolve_candidate(
        &self,
        source: NodeId,
        trigger: &Trigger,
        candidate: &TransitionConfig,
    ) -> Validation<Candidate, NonEmptyVec<ConfigError>> {
        let target = match &candidate.target {
            None => None,
            Some(target) => match self.resolve_target(source, target) {
                Some(resolved) => Some(resolved),
                None => {
                    return Validation::fail(ConfigError::UnknownTarget {
                        state: self.node(source).id.clone(),
                        trigger: trigger.to_string(),
                        target: target.clone(),
                    })
                }
            },
        };
        Validation::success(Candidate {
            guard: candidate.guard.clone(),
            actions: candidate.actions.ids().to_vec(),
            target,
        })
    }

    fn add_candidate(&mut self, node: NodeId, trigger: &Trigger, config: &TransitionConfig) -> Check {
        let candidate = match self.resolve_candidate(node, trigger, config) {
            Validation::Success(candidate) => candidate,
            Validation::Failure(errors) => return Validation::Failure(errors),
        };
        let node = &mut self.nodes[node.0];
        match trigger {
            Trigger::Always => node.always.push(candidate),
            Trigger::Event(name) => node.on.entry(name.clone()).or_default().push(candidate),
        }
        Validation::success(())
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &StateNode {
        &self.nodes[id.0]
    }

    pub fn machine_id(&self) -> &str {
        &self.node(self.root()).id
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    fn child_by_key(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).key == key)
    }

    fn descend<'a>(&self, from: NodeId, segments: impl IntoIterator<Item = &'a str>) -> Option<NodeId> {
        segments
            .into_iter()
            .try_fold(from, |node, key| self.child_by_key(node, key))
    }

    /// Resolve a target string as seen from `source`.
    ///
    /// `#id.rest` is absolute (ids may contain dots, the longest matching id
    /// wins), `.rest` is relative to the source, anything else is relative to
    /// the source's parent.
    pub fn resolve_target(&self, source: NodeId, target: &str) -> Option<ResolvedTarget> {
        if let Some(absolute) = target.strip_prefix('#') {
            let segments: Vec<&str> = absolute.split('.').collect();
            (1..=segments.len()).rev().find_map(|split| {
                let base = self.by_id(&segments[..split].join("."))?;
                let node = self.descend(base, segments[split..].iter().copied())?;
                Some(ResolvedTarget {
                    node,
                    internal: false,
                })
            })
        } else if let Some(relative) = target.strip_prefix('.') {
            self.descend(source, relative.split('.'))
                .filter(|node| *node != source)
                .map(|node| ResolvedTarget {
                    node,
                    internal: true,
                })
        } else {
            let base = self.node(source).parent.unwrap_or(source);
            self.descend(base, target.split('.')).map(|node| ResolvedTarget {
                node,
                internal: false,
            })
        }
    }

    /// Whether `ancestor` is a proper ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.node(node).parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.node(parent).parent;
        }
        false
    }

    /// Nodes entered below `node` by following initial children to a leaf.
    pub fn initial_descent(&self, node: NodeId) -> Vec<NodeId> {
        let mut descent = Vec::new();
        let mut current = node;
        while let Some(initial) = self.node(current).initial {
            descent.push(initial);
            current = initial;
        }
        descent
    }

    /// The configuration a freshly started actor enters.
    pub fn initial_configuration(&self) -> Vec<NodeId> {
        let mut configuration = vec![self.root()];
        configuration.extend(self.initial_descent(self.root()));
        configuration
    }

    /// Nodes strictly below `ancestor` down to and including `node`,
    /// outermost first.
    pub fn path_between(&self, ancestor: NodeId, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                break;
            }
            path.push(id);
            current = self.node(id).parent;
        }
        path.reverse();
        path
    }

    /// The least common compound ancestor of a transition: the nearest proper
    /// ancestor of `source` that is also a proper ancestor of `target`.
    pub fn domain(&self, source: NodeId, target: NodeId) -> NodeId {
        let mut current = self.node(source).parent;
        while let Some(candidate) = current {
            if self.is_ancestor(candidate, target) {
                return candidate;
            }
            current = self.node(candidate).parent;
        }
        self.root()
    }

    /// State value of an active configuration (root excluded).
    pub fn value(&self, configuration: &[NodeId]) -> StateValue {
        configuration
            .last()
            .map(|leaf| StateValue::new(self.node(*leaf).path.clone()))
            .unwrap_or_default()
    }

    /// Active configuration for a state value, completed with initial
    /// children when the value stops at a compound state.
    pub fn configuration_for(&self, value: &StateValue) -> Option<Vec<NodeId>> {
        let mut configuration = vec![self.root()];
        let mut current = self.root();
        for key in value.path() {
            current = self.child_by_key(current, key)?;
            configuration.push(current);
        }
        configuration.extend(self.initial_descent(current));
        Some(configuration)
    }

    /// Eventless candidate lists whose last candidate is guarded: when every
    /// guard fails the actor rests in a state it was meant to leave.
    pub fn lint(&self) -> Vec<LintWarning> {
        self.nodes
            .iter()
            .filter(|node| node.always.last().is_some_and(|last| last.guard.is_some()))
            .map(|node| LintWarning {
                state: node.id.clone(),
                message: format!(
                    "eventless transitions ({} candidate(s)) end with a guarded candidate; \
                     add an unguarded fallback to guarantee progress",
                    node.always.len()
                ),
            })
            .collect()
    }
}

#[derive(Default)]
struct TreeBuilder<'a> {
    nodes: Vec<StateNode>,
    checks: Vec<Check>,
    sources: Vec<(NodeId, &'a StateConfig)>,
}

impl<'a> TreeBuilder<'a> {
    fn add_node(
        &mut self,
        parent: Option<NodeId>,
        key: String,
        machine_id: &str,
        config: &'a StateConfig,
    ) -> NodeId {
        let index = NodeId(self.nodes.len());
        let mut path = parent
            .map(|parent| self.nodes[parent.0].path.clone())
            .unwrap_or_default();
        if parent.is_some() {
            path.push(key.clone());
        }
        let id = match (&config.id, parent) {
            (Some(id), _) => id.clone(),
            (None, None) => machine_id.to_string(),
            (None, Some(_)) => format!("{machine_id}.{}", path.join(".")),
        };

        let kind = match (config.kind, config.states.is_empty()) {
            (Some(StateKind::Final), has_no_children) => {
                self.checks.push(if has_no_children {
                    Validation::success(())
                } else {
                    Validation::fail(ConfigError::FinalWithChildren { state: id.clone() })
                });
                StateKind::Final
            }
            (_, false) => StateKind::Compound,
            (_, true) => StateKind::Atomic,
        };

        self.nodes.push(StateNode {
            key,
            id: id.clone(),
            path,
            parent,
            kind,
            initial: None,
            children: Vec::new(),
            entry: config.entry.ids().to_vec(),
            exit: config.exit.ids().to_vec(),
            on: HashMap::new(),
            always: Vec::new(),
        });
        self.sources.push((index, config));

        let mut seen = HashSet::new();
        for (child_key, child_config) in &config.states {
            if child_key.is_empty() || child_key.contains(['.', '#']) {
                self.checks.push(Validation::fail(ConfigError::InvalidKey {
                    parent: id.clone(),
                    key: child_key.clone(),
                }));
                continue;
            }
            if !seen.insert(child_key.as_str()) {
                self.checks.push(Validation::fail(ConfigError::DuplicateKey {
                    parent: id.clone(),
                    key: child_key.clone(),
                }));
                continue;
            }
            let child = self.add_node(Some(index), child_key.clone(), machine_id, child_config);
            self.nodes[index.0].children.push(child);
        }

        let initial = match (&config.initial, kind == StateKind::Compound) {
            (Some(initial), true) => {
                let found = self.nodes[index.0]
                    .children
                    .iter()
                    .copied()
                    .find(|child| self.nodes[child.0].key == *initial);
                match found {
                    Some(child) => Validation::success(Some(child)),
                    None => Validation::fail(ConfigError::UnknownInitial {
                        state: id.clone(),
                        initial: initial.clone(),
                    }),
                }
            }
            (None, true) => Validation::fail(ConfigError::MissingInitial { state: id.clone() }),
            (Some(initial), false) => Validation::fail(ConfigError::InitialOnLeaf {
                state: id.clone(),
                initial: initial.clone(),
            }),
            (None, false) => Validation::success(None),
        };
        if let Validation::Success(Some(child)) = &initial {
            self.nodes[index.0].initial = Some(*child);
        }
        self.checks.push(initial.map(|_| ()));

        index
    }
}

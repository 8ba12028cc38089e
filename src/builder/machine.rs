//! Builder for constructing machines.

use crate::actor::{Actor, Runtime, RuntimeError};
use crate::builder::config::{MachineConfig, StateConfig};
use crate::builder::error::{BuildError, ConfigError, LintWarning};
use crate::builder::tree::StateTree;
use crate::core::{Event, Guard, StateValue, Trigger};
use crate::effects::transition::{self, TransitionPlan};
use crate::effects::Action;
use std::collections::HashMap;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// A built, immutable machine definition.
///
/// Cheap to clone. One machine can back any number of interpreters and
/// spawned actors.
pub struct Machine<C, E> {
    inner: Arc<MachineInner<C, E>>,
}

pub(crate) struct MachineInner<C, E> {
    pub tree: StateTree,
    pub guards: HashMap<String, Guard<C, E>>,
    pub actions: HashMap<String, Action<C, E>>,
    pub context: C,
    pub warnings: Vec<LintWarning>,
}

impl<C, E> Clone for Machine<C, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clone + 'static, E: Event> Machine<C, E> {
    /// Start building a machine from its configuration and default context.
    pub fn builder(config: MachineConfig, context: C) -> MachineBuilder<C, E> {
        MachineBuilder {
            config,
            context,
            guards: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.inner.tree.machine_id()
    }

    /// The state value a fresh actor rests in before eventless transitions.
    pub fn initial_state(&self) -> StateValue {
        self.inner
            .tree
            .value(&self.inner.tree.initial_configuration())
    }

    /// The default context.
    pub fn context(&self) -> &C {
        &self.inner.context
    }

    /// Lint findings recorded at build time.
    pub fn warnings(&self) -> &[LintWarning] {
        &self.inner.warnings
    }

    /// Resolve an event against a state value without running anything.
    ///
    /// `None` resolves the eventless trigger. Returns `Ok(None)` when nothing
    /// on the active path handles the trigger.
    pub fn transition(
        &self,
        state: &StateValue,
        context: &C,
        event: Option<&E>,
    ) -> Result<Option<TransitionPlan>, RuntimeError> {
        let configuration = self.inner.tree.configuration_for(state).ok_or_else(|| {
            RuntimeError::UnknownState {
                machine: self.id().to_string(),
                value: state.to_string(),
            }
        })?;
        let trigger = event.map_or(Trigger::Always, Trigger::of);
        transition::select(
            &self.inner.tree,
            &self.inner.guards,
            &configuration,
            context,
            event,
            &trigger,
            &mut |_| {},
        )
    }

    /// A spawnable actor running this machine with the default context.
    pub fn actor(&self) -> Box<dyn Actor<E>> {
        self.actor_with_context(self.inner.context.clone())
    }

    /// A spawnable actor running this machine with its own context.
    pub fn actor_with_context(&self, context: C) -> Box<dyn Actor<E>> {
        Box::new(Runtime::new(self.clone(), context))
    }

    pub(crate) fn inner(&self) -> &MachineInner<C, E> {
        &self.inner
    }
}

impl<C, E> std::fmt::Debug for Machine<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.inner.tree.machine_id())
            .finish()
    }
}

/// Builder binding guard and action implementations to the ids a
/// configuration refers to.
pub struct MachineBuilder<C, E> {
    config: MachineConfig,
    context: C,
    guards: HashMap<String, Guard<C, E>>,
    actions: HashMap<String, Action<C, E>>,
}

impl<C: Clone + 'static, E: Event> MachineBuilder<C, E> {
    /// Register a guard.
    pub fn guard<F>(mut self, id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> bool + Send + Sync + 'static,
    {
        self.guards.insert(id.into(), Guard::new(predicate));
        self
    }

    /// Register a guard that can fail. A failure aborts the `send` that
    /// evaluated it.
    pub fn try_guard<F>(mut self, id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.guards.insert(id.into(), Guard::try_new(predicate));
        self
    }

    /// Register an action.
    pub fn action(mut self, id: impl Into<String>, action: impl Into<Action<C, E>>) -> Self {
        self.actions.insert(id.into(), action.into());
        self
    }

    /// Build the machine, reporting every configuration problem at once.
    pub fn build(self) -> Result<Machine<C, E>, BuildError> {
        let machine_id = self
            .config
            .root()
            .id
            .clone()
            .unwrap_or_else(|| "machine".to_string());
        let mut checks = Vec::new();
        self.check_references(&machine_id, None, self.config.root(), &mut checks);

        let tree = StateTree::build(&self.config);
        let references = Validation::all_vec(checks);

        let tree = match (tree, references) {
            (Ok(tree), Validation::Success(_)) => tree,
            (tree, references) => {
                let mut errors = tree.err().map(BuildError::into_errors).unwrap_or_default();
                if let Validation::Failure(missing) = references {
                    errors.extend(missing.iter().cloned());
                }
                return Err(BuildError::new(errors));
            }
        };

        let warnings = tree.lint();
        for warning in &warnings {
            tracing::warn!(machine = %machine_id, state = %warning.state, "{}", warning.message);
        }

        Ok(Machine {
            inner: Arc::new(MachineInner {
                tree,
                guards: self.guards,
                actions: self.actions,
                context: self.context,
                warnings,
            }),
        })
    }

    fn check_references(
        &self,
        machine_id: &str,
        path: Option<&str>,
        state: &StateConfig,
        checks: &mut Vec<Validation<(), NonEmptyVec<ConfigError>>>,
    ) {
        let id = match (&state.id, path) {
            (Some(id), _) => id.clone(),
            (None, None) => machine_id.to_string(),
            (None, Some(path)) => format!("{machine_id}.{path}"),
        };

        let candidates = state
            .on
            .iter()
            .flat_map(|(_, list)| list.candidates())
            .chain(state.always.candidates());
        let mut action_ids: Vec<&String> = state.entry.ids().iter().chain(state.exit.ids()).collect();
        for candidate in candidates {
            if let Some(guard) = &candidate.guard {
                checks.push(if self.guards.contains_key(guard) {
                    Validation::success(())
                } else {
                    Validation::fail(ConfigError::UnknownGuard {
                        state: id.clone(),
                        guard: guard.clone(),
                    })
                });
            }
            action_ids.extend(candidate.actions.ids());
        }
        for action in action_ids {
            checks.push(if self.actions.contains_key(action) {
                Validation::success(())
            } else {
                Validation::fail(ConfigError::UnknownAction {
                    state: id.clone(),
                    action: action.clone(),
                })
            });
        }

        for (key, child) in &state.states {
            let child_path = match path {
                Some(path) => format!("{path}.{key}"),
                None => key.clone(),
            };
            self.check_references(machine_id, Some(&child_path), child, checks);
        }
    }
}

//! Machine actors and their macrostep.
//!
//! A macrostep is one resolver pass for a delivered event followed by the
//! eventless drain. It either commits completely or leaves the actor exactly
//! as it was: context and configuration are restored and the commands it
//! produced are discarded with the scope.

use crate::actor::diagnostics::Diagnostic;
use crate::actor::system::Scope;
use crate::actor::RuntimeError;
use crate::builder::tree::{NodeId, StateTree};
use crate::builder::Machine;
use crate::core::{ActorStatus, Event, StateHistory, StateKind, StateValue, TransitionRecord, Trigger};
use crate::effects::transition::{self, TransitionPlan};
use chrono::Utc;

/// Anything that can live in an interpreter's actor tree.
///
/// Machine actors come from [`Machine::actor`]; other implementations can be
/// spawned the same way.
pub trait Actor<E: Event> {
    /// Enter the initial configuration. Called once, by the spawning actor.
    fn start(&mut self, scope: &mut Scope<E>) -> Result<(), RuntimeError>;

    /// Process one delivered event to completion.
    fn receive(&mut self, event: E, scope: &mut Scope<E>) -> Result<(), RuntimeError>;

    /// Mark the actor stopped. Runs no actions.
    fn stop(&mut self);

    fn status(&self) -> ActorStatus;

    fn state(&self) -> StateValue;

    /// Whether the actor reached a top-level final state.
    fn is_done(&self) -> bool;
}

/// A running machine: context, active configuration and history.
pub struct Runtime<C, E> {
    machine: Machine<C, E>,
    context: C,
    configuration: Vec<NodeId>,
    status: ActorStatus,
    history: StateHistory,
    done: bool,
    changed: bool,
}

impl<C: Clone + 'static, E: Event> Runtime<C, E> {
    pub(crate) fn new(machine: Machine<C, E>, context: C) -> Self {
        Self {
            machine,
            context,
            configuration: Vec::new(),
            status: ActorStatus::NotStarted,
            history: StateHistory::default(),
            done: false,
            changed: false,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub(crate) fn set_context(&mut self, context: C) {
        self.context = context;
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Whether the last macrostep took a transition.
    pub fn changed(&self) -> bool {
        self.changed
    }

    fn tree(&self) -> &StateTree {
        &self.machine.inner().tree
    }

    fn value(&self) -> StateValue {
        self.tree().value(&self.configuration)
    }

    fn not_running(&self, scope: &Scope<E>) -> RuntimeError {
        RuntimeError::NotRunning {
            actor: scope.actor().name().to_string(),
            status: self.status,
        }
    }

    /// Run `step`, keeping its effects only if it succeeds.
    fn transact<F>(&mut self, scope: &mut Scope<E>, step: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(&mut Self, &mut Scope<E>, &mut Vec<TransitionRecord>) -> Result<(), RuntimeError>,
    {
        let context = self.context.clone();
        let configuration = self.configuration.clone();
        let done = self.done;
        let mut records = Vec::new();

        if let Err(error) = step(self, scope, &mut records) {
            self.context = context;
            self.configuration = configuration;
            self.done = done;
            self.changed = false;
            return Err(error);
        }

        for record in records {
            scope.diagnostics().emit(Diagnostic::Transitioned {
                actor: scope.actor().clone(),
                from: record.from.clone(),
                to: record.to.clone(),
                trigger: record.trigger.clone(),
            });
            self.history.record(record);
        }
        Ok(())
    }

    fn resolve(
        &self,
        trigger: &Trigger,
        event: Option<&E>,
        scope: &Scope<E>,
    ) -> Result<Option<TransitionPlan>, RuntimeError> {
        let inner = self.machine.inner();
        let diagnostics = scope.diagnostics();
        transition::select(
            &inner.tree,
            &inner.guards,
            &self.configuration,
            &self.context,
            event,
            trigger,
            &mut |check| {
                diagnostics.emit(Diagnostic::GuardEvaluated {
                    actor: scope.actor().clone(),
                    state: check.state.to_string(),
                    guard: check.guard.to_string(),
                    result: check.result,
                })
            },
        )
    }

    /// Run the plan's actions in order and adopt its configuration.
    fn execute(
        &mut self,
        plan: &TransitionPlan,
        event: Option<&E>,
        scope: &mut Scope<E>,
    ) -> Result<(), RuntimeError> {
        let inner = self.machine.inner();
        for id in plan.actions() {
            if let Some(action) = inner.actions.get(id) {
                action.execute(&mut self.context, event, scope)?;
            }
        }
        self.configuration = plan.configuration.clone();
        self.changed = true;

        let tree = &inner.tree;
        if let Some(leaf) = self.configuration.last() {
            let node = tree.node(*leaf);
            if node.kind == StateKind::Final && node.parent == Some(tree.root()) {
                self.done = true;
            }
        }
        Ok(())
    }

    fn take(
        &mut self,
        plan: TransitionPlan,
        event: Option<&E>,
        scope: &mut Scope<E>,
        records: &mut Vec<TransitionRecord>,
    ) -> Result<(), RuntimeError> {
        let from = self.value();
        self.execute(&plan, event, scope)?;
        if !plan.is_targetless() {
            records.push(TransitionRecord {
                from,
                to: plan.value().clone(),
                trigger: plan.trigger().clone(),
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    /// Take eventless transitions until none is enabled.
    fn settle(
        &mut self,
        event: Option<&E>,
        scope: &mut Scope<E>,
        records: &mut Vec<TransitionRecord>,
    ) -> Result<(), RuntimeError> {
        let limit = scope.options().max_eventless_steps;
        let mut steps = 0;
        while !self.done {
            let Some(plan) = self.resolve(&Trigger::Always, event, scope)? else {
                return Ok(());
            };
            if steps == limit {
                return Err(RuntimeError::EventlessLoop {
                    state: plan.source().to_string(),
                    limit,
                });
            }
            steps += 1;
            self.take(plan, event, scope, records)?;
        }
        Ok(())
    }
}

impl<C: Clone + 'static, E: Event> Actor<E> for Runtime<C, E> {
    fn start(&mut self, scope: &mut Scope<E>) -> Result<(), RuntimeError> {
        match self.status {
            ActorStatus::NotStarted => {}
            ActorStatus::Running => {
                return Err(RuntimeError::AlreadyStarted {
                    actor: scope.actor().name().to_string(),
                })
            }
            ActorStatus::Stopped => return Err(self.not_running(scope)),
        }

        self.history.set_limit(scope.options().history_limit);
        self.transact(scope, |runtime, scope, records| {
            let plan = transition::initial_plan(runtime.tree());
            runtime.execute(&plan, None, scope)?;
            runtime.settle(None, scope, records)
        })?;
        self.status = ActorStatus::Running;
        Ok(())
    }

    fn receive(&mut self, event: E, scope: &mut Scope<E>) -> Result<(), RuntimeError> {
        if self.status != ActorStatus::Running {
            return Err(self.not_running(scope));
        }

        self.changed = false;
        let trigger = Trigger::of(&event);
        self.transact(scope, |runtime, scope, records| {
            match runtime.resolve(&trigger, Some(&event), scope)? {
                Some(plan) => {
                    runtime.take(plan, Some(&event), scope, records)?;
                    runtime.settle(Some(&event), scope, records)
                }
                None => {
                    scope.diagnostics().emit(Diagnostic::UnhandledEvent {
                        actor: scope.actor().clone(),
                        event_type: trigger.event_type().to_string(),
                        state: runtime.value(),
                    });
                    Ok(())
                }
            }
        })
    }

    fn stop(&mut self) {
        self.status = ActorStatus::Stopped;
    }

    fn status(&self) -> ActorStatus {
        self.status
    }

    fn state(&self) -> StateValue {
        self.value()
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

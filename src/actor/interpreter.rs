//! The public handle running a machine and the actors it spawns.

use crate::actor::clock::Clock;
use crate::actor::diagnostics::Diagnostics;
use crate::actor::options::InterpreterOptions;
use crate::actor::runtime::{Actor, Runtime};
use crate::actor::system::{Address, System};
use crate::actor::RuntimeError;
use crate::builder::Machine;
use crate::core::{ActorRef, ActorStatus, Event, StateHistory, StateValue};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// The observable state of the root actor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot<C> {
    pub value: StateValue,
    pub context: C,
    pub status: ActorStatus,
    /// The root reached a top-level final state.
    pub done: bool,
    /// The last macrostep took a transition.
    pub changed: bool,
}

impl<C> Snapshot<C> {
    /// Dotted-path containment test against the active configuration.
    pub fn matches(&self, path: &str) -> bool {
        self.value.matches(path)
    }
}

/// Handle returned by [`Interpreter::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer<C> = Box<dyn FnMut(&Snapshot<C>)>;

/// Runs a machine as the root of an actor tree.
///
/// Every call runs to completion: the event is processed, eventless
/// transitions are drained, and every message the actors send each other is
/// delivered before the call returns. Delayed sends wait on the clock and are
/// fired by [`process_timers`](Self::process_timers) or
/// [`run_timers`](Self::run_timers).
///
/// # Example
///
/// ```rust
/// use harel::prelude::*;
///
/// event_enum! {
///     enum Toggle {
///         Toggle => "TOGGLE",
///     }
/// }
///
/// let config = MachineConfig::new("toggle")
///     .initial("relaxed")
///     .state("relaxed", StateConfig::new().on("TOGGLE", "toggled"))
///     .state("toggled", StateConfig::new().on("TOGGLE", "relaxed"));
/// let machine = Machine::<(), Toggle>::builder(config, ()).build().unwrap();
///
/// let mut toggle = Interpreter::new(&machine);
/// toggle.start().unwrap();
/// toggle.send(Toggle::Toggle).unwrap();
///
/// assert!(toggle.snapshot().matches("toggled"));
/// ```
pub struct Interpreter<C, E> {
    root: Runtime<C, E>,
    system: System<E>,
    observers: Vec<(SubscriptionId, Observer<C>)>,
    next_subscription: u64,
}

impl<C: Clone + 'static, E: Event> Interpreter<C, E> {
    pub fn new(machine: &Machine<C, E>) -> Self {
        Self {
            root: Runtime::new(machine.clone(), machine.context().clone()),
            system: System::new(ActorRef::new(machine.id())),
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Replace the machine's default context.
    pub fn with_context(mut self, context: C) -> Self {
        self.root.set_context(context);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.system.set_clock(Arc::new(clock));
        self
    }

    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.system.set_options(options);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.system.set_diagnostics(diagnostics);
        self
    }

    /// Reference of the root actor.
    pub fn actor_ref(&self) -> &ActorRef {
        self.system.root()
    }

    /// Enter the initial configuration and run to completion.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        let root = self.system.root().id();
        let mut scope = self.system.root_scope();
        self.root.start(&mut scope)?;
        tracing::debug!(actor = %self.system.root(), state = %self.root.state(), "started");
        let committed = self.system.commit(root, scope.into_commands());
        self.finish_root_step();
        committed?;
        self.drain()
    }

    /// Deliver an event to the root actor and run to completion.
    pub fn send(&mut self, event: E) -> Result<(), RuntimeError> {
        if event.event_type().is_empty() {
            return Err(RuntimeError::ReservedEventType);
        }
        self.ensure_running()?;
        let root = self.system.root().id();
        self.system.enqueue(root, Address::Actor(root), event);
        self.drain()
    }

    /// Stop every actor, children first, and cancel all timers.
    ///
    /// No exit actions run. Stopping twice is a no-op.
    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        match self.root.status() {
            ActorStatus::NotStarted => Err(self.not_running()),
            ActorStatus::Stopped => Ok(()),
            ActorStatus::Running => {
                self.shutdown();
                Ok(())
            }
        }
    }

    /// Register an observer, called with a snapshot after `start` and after
    /// every macrostep of the root actor. A panicking observer unwinds through
    /// the call that notified it.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&Snapshot<C>) + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns whether the observer was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    pub fn snapshot(&self) -> Snapshot<C> {
        Snapshot {
            value: self.root.state(),
            context: self.root.context().clone(),
            status: self.root.status(),
            done: self.root.is_done(),
            changed: self.root.changed(),
        }
    }

    pub fn state(&self) -> StateValue {
        self.root.state()
    }

    pub fn context(&self) -> &C {
        self.root.context()
    }

    pub fn status(&self) -> ActorStatus {
        self.root.status()
    }

    pub fn is_done(&self) -> bool {
        self.root.is_done()
    }

    pub fn history(&self) -> &StateHistory {
        self.root.history()
    }

    /// Live children of the root actor, ordered by name.
    pub fn children(&self) -> Vec<ActorRef> {
        self.system.children(self.system.root().id())
    }

    /// State of a live child of the root actor.
    pub fn child_state(&self, name: &str) -> Option<StateValue> {
        self.system.child_state(name)
    }

    pub fn child_status(&self, name: &str) -> Option<ActorStatus> {
        self.system.child_status(name)
    }

    /// Time until the earliest pending delayed send is due.
    pub fn next_timer_in(&self) -> Option<Duration> {
        self.system
            .next_due()
            .map(|due| due.saturating_duration_since(self.system.now()))
    }

    pub fn pending_timers(&self) -> usize {
        self.system.pending_timers()
    }

    /// Fire every delayed send that is due, earliest first, each run to
    /// completion. Returns how many fired.
    pub fn process_timers(&mut self) -> Result<usize, RuntimeError> {
        let mut fired = 0;
        while self.root.status() == ActorStatus::Running && self.system.fire_due() {
            fired += 1;
            self.drain()?;
        }
        Ok(fired)
    }

    /// Sleep until each pending delayed send is due and fire it, until no
    /// timers remain or the root stops. Drives timers scheduled against the
    /// tokio clock ([`SystemClock`](crate::actor::SystemClock)).
    pub async fn run_timers(&mut self) -> Result<(), RuntimeError> {
        while self.root.status() == ActorStatus::Running {
            let Some(due) = self.system.next_due() else {
                break;
            };
            tokio::time::sleep_until(due).await;
            self.process_timers()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), RuntimeError> {
        let root = self.system.root().id();
        while let Some(envelope) = self.system.next_envelope() {
            match self.system.resolve(&envelope.to) {
                Some(id) if id == root => {
                    if self.root.status() != ActorStatus::Running {
                        continue;
                    }
                    let mut scope = self.system.root_scope();
                    self.root.receive(envelope.event, &mut scope)?;
                    let committed = self.system.commit(root, scope.into_commands());
                    self.finish_root_step();
                    committed?;
                }
                Some(id) => {
                    let delivered = self.system.deliver(id, envelope.event);
                    if self.system.take_root_stop() {
                        self.shutdown();
                        self.notify();
                    }
                    delivered?;
                }
                None => {
                    self.system
                        .drop_send(envelope.from, envelope.to.to_string(), &envelope.event);
                }
            }
        }
        Ok(())
    }

    fn finish_root_step(&mut self) {
        if self.root.is_done() || self.system.take_root_stop() {
            self.shutdown();
        }
        self.notify();
    }

    fn shutdown(&mut self) {
        self.system.shutdown();
        self.root.stop();
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, observer) in &mut self.observers {
            observer(&snapshot);
        }
    }

    fn ensure_running(&self) -> Result<(), RuntimeError> {
        match self.root.status() {
            ActorStatus::Running => Ok(()),
            _ => Err(self.not_running()),
        }
    }

    fn not_running(&self) -> RuntimeError {
        RuntimeError::NotRunning {
            actor: self.system.root().name().to_string(),
            status: self.root.status(),
        }
    }
}

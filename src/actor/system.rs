//! The actor tree owned by one interpreter: registry, mailbox and timers.
//!
//! Actors never touch each other directly. An actor records commands on its
//! [`Scope`] while it processes a message; the system commits them once the
//! message has been processed successfully.

use crate::actor::clock::{Clock, SystemClock};
use crate::actor::diagnostics::{Diagnostic, Diagnostics};
use crate::actor::options::InterpreterOptions;
use crate::actor::registry::Registry;
use crate::actor::runtime::Actor;
use crate::actor::timer::{Timer, TimerQueue};
use crate::actor::RuntimeError;
use crate::core::{ActorId, ActorRef, ActorStatus, Event, StateValue, Target};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Work produced by an actor, committed after its macrostep.
pub(crate) enum Command<E> {
    Send {
        to: Target,
        event: E,
        delay: Option<Duration>,
    },
    Spawn {
        actor: ActorRef,
        instance: Box<dyn Actor<E>>,
        commands: Vec<Command<E>>,
    },
    Stop(Target),
}

impl<E: fmt::Debug> fmt::Debug for Command<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Send { to, event, delay } => f
                .debug_struct("Send")
                .field("to", to)
                .field("event", event)
                .field("delay", delay)
                .finish(),
            Command::Spawn {
                actor, commands, ..
            } => f
                .debug_struct("Spawn")
                .field("actor", actor)
                .field("commands", commands)
                .finish(),
            Command::Stop(target) => f.debug_tuple("Stop").field(target).finish(),
        }
    }
}

/// What an actor sees of the system while it processes one message.
pub struct Scope<E> {
    actor: ActorRef,
    parent: Option<ActorRef>,
    children: BTreeSet<String>,
    commands: Vec<Command<E>>,
    diagnostics: Diagnostics,
    options: InterpreterOptions,
}

impl<E: Event> Scope<E> {
    pub(crate) fn new(
        actor: ActorRef,
        parent: Option<ActorRef>,
        children: BTreeSet<String>,
        diagnostics: Diagnostics,
        options: InterpreterOptions,
    ) -> Self {
        Self {
            actor,
            parent,
            children,
            commands: Vec::new(),
            diagnostics,
            options,
        }
    }

    /// The actor processing the message.
    pub fn actor(&self) -> &ActorRef {
        &self.actor
    }

    pub fn parent(&self) -> Option<&ActorRef> {
        self.parent.as_ref()
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    /// Queue a send, delivered after the current macrostep.
    pub fn send(&mut self, to: impl Into<Target>, event: E) {
        self.send_after(to.into(), event, None);
    }

    /// Queue a send, delivered through a timer when `delay` is set.
    pub fn send_after(&mut self, to: Target, event: E, delay: Option<Duration>) {
        self.commands.push(Command::Send { to, event, delay });
    }

    /// Spawn a child under `name` and start it right away, as part of the
    /// current macrostep. A child that fails to start fails the macrostep.
    /// The child joins the tree when the macrostep is committed; the
    /// returned reference is usable right away.
    pub fn spawn(
        &mut self,
        name: &str,
        mut instance: Box<dyn Actor<E>>,
    ) -> Result<ActorRef, RuntimeError> {
        if self.children.contains(name) {
            return Err(RuntimeError::DuplicateChild {
                parent: self.actor.name().to_string(),
                name: name.to_string(),
            });
        }
        let actor = ActorRef::new(name);
        let mut scope = Scope::new(
            actor.clone(),
            Some(self.actor.clone()),
            BTreeSet::new(),
            self.diagnostics.clone(),
            self.options,
        );
        instance.start(&mut scope)?;
        self.children.insert(name.to_string());
        self.commands.push(Command::Spawn {
            actor: actor.clone(),
            instance,
            commands: scope.into_commands(),
        });
        Ok(actor)
    }

    pub fn stop(&mut self, target: Target) {
        if let Target::Child(name) = &target {
            self.children.remove(name);
        }
        self.commands.push(Command::Stop(target));
    }

    pub(crate) fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn commands(&self) -> &[Command<E>] {
        &self.commands
    }

    pub(crate) fn into_commands(self) -> Vec<Command<E>> {
        self.commands
    }
}

/// Where a queued message goes. Named children are looked up on delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Address {
    Actor(ActorId),
    Child { parent: ActorId, name: String },
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Actor(id) => write!(f, "actor {id}"),
            Address::Child { name, .. } => write!(f, "child '{name}'"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Envelope<E> {
    pub from: ActorId,
    pub to: Address,
    pub event: E,
}

pub(crate) struct System<E> {
    root: ActorRef,
    registry: Registry,
    cells: HashMap<ActorId, Box<dyn Actor<E>>>,
    mailbox: VecDeque<Envelope<E>>,
    timers: TimerQueue<E>,
    clock: Arc<dyn Clock>,
    diagnostics: Diagnostics,
    options: InterpreterOptions,
    root_stop_requested: bool,
}

impl<E: Event> System<E> {
    pub fn new(root: ActorRef) -> Self {
        let mut registry = Registry::default();
        registry.register_root(root.clone());
        Self {
            root,
            registry,
            cells: HashMap::new(),
            mailbox: VecDeque::new(),
            timers: TimerQueue::default(),
            clock: Arc::new(SystemClock),
            diagnostics: Diagnostics::default(),
            options: InterpreterOptions::default(),
            root_stop_requested: false,
        }
    }

    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    pub fn set_diagnostics(&mut self, diagnostics: Diagnostics) {
        self.diagnostics = diagnostics;
    }

    pub fn set_options(&mut self, options: InterpreterOptions) {
        self.options = options;
    }

    pub fn root(&self) -> &ActorRef {
        &self.root
    }

    pub fn root_scope(&self) -> Scope<E> {
        self.scope_for(self.root.clone())
    }

    fn scope_for(&self, actor: ActorRef) -> Scope<E> {
        let parent = self
            .registry
            .parent(actor.id())
            .and_then(|parent| self.registry.actor(parent))
            .cloned();
        let children = self
            .registry
            .children(actor.id())
            .into_iter()
            .map(|child| child.name().to_string())
            .collect();
        Scope::new(
            actor,
            parent,
            children,
            self.diagnostics.clone(),
            self.options,
        )
    }

    pub fn enqueue(&mut self, from: ActorId, to: Address, event: E) {
        self.mailbox.push_back(Envelope { from, to, event });
    }

    pub fn next_envelope(&mut self) -> Option<Envelope<E>> {
        self.mailbox.pop_front()
    }

    /// The live actor an address points at, if any.
    pub fn resolve(&self, address: &Address) -> Option<ActorId> {
        match address {
            Address::Actor(id) => self.registry.contains(*id).then_some(*id),
            Address::Child { parent, name } => self.registry.child(*parent, name),
        }
    }

    fn address(&self, origin: ActorId, target: &Target) -> Option<Address> {
        match target {
            Target::Itself => Some(Address::Actor(origin)),
            Target::Parent => self.registry.parent(origin).map(Address::Actor),
            Target::Child(name) => Some(Address::Child {
                parent: origin,
                name: name.clone(),
            }),
            Target::Actor(actor) => Some(Address::Actor(actor.id())),
        }
    }

    pub fn drop_send(&self, from: ActorId, to: String, event: &E) {
        let from = self
            .registry
            .actor(from)
            .cloned()
            .unwrap_or_else(|| self.root.clone());
        self.diagnostics.emit(Diagnostic::DroppedSend {
            from,
            to,
            event_type: event.event_type().to_string(),
        });
    }

    /// Commit the commands an actor produced, in order. Every command is
    /// committed; the first error is returned.
    pub fn commit(&mut self, origin: ActorId, commands: Vec<Command<E>>) -> Result<(), RuntimeError> {
        let mut outcome = Ok(());
        for command in commands {
            match command {
                Command::Send { to, event, delay } => {
                    let Some(address) = self.address(origin, &to) else {
                        self.drop_send(origin, to.to_string(), &event);
                        continue;
                    };
                    match delay.filter(|delay| !delay.is_zero()) {
                        Some(delay) => {
                            let Some(due) = self.clock.now().checked_add(delay) else {
                                tracing::debug!(?delay, to = %address, "delay out of clock range");
                                self.drop_send(origin, address.to_string(), &event);
                                continue;
                            };
                            self.timers.schedule(
                                due,
                                Timer {
                                    origin,
                                    to: address,
                                    event,
                                },
                            );
                        }
                        None => self.enqueue(origin, address, event),
                    }
                }
                Command::Spawn {
                    actor,
                    instance,
                    commands,
                } => outcome = outcome.and(self.spawn(origin, actor, instance, commands)),
                Command::Stop(target) => {
                    let id = self
                        .address(origin, &target)
                        .and_then(|address| self.resolve(&address));
                    match id {
                        Some(id) if id == self.root.id() => self.root_stop_requested = true,
                        Some(id) => self.stop_actor(id),
                        None => {}
                    }
                }
            }
        }
        outcome
    }

    /// Add a child started during its parent's macrostep to the tree and
    /// commit what its start produced.
    fn spawn(
        &mut self,
        parent: ActorId,
        actor: ActorRef,
        instance: Box<dyn Actor<E>>,
        commands: Vec<Command<E>>,
    ) -> Result<(), RuntimeError> {
        self.registry.register(parent, actor.clone())?;
        if let Some(parent) = self.registry.actor(parent) {
            self.diagnostics.emit(Diagnostic::Spawned {
                parent: parent.clone(),
                child: actor.clone(),
            });
        }
        let done = instance.is_done();
        self.cells.insert(actor.id(), instance);
        let committed = self.commit(actor.id(), commands);
        if done {
            self.stop_actor(actor.id());
        }
        committed
    }

    /// Deliver one message to a spawned actor and commit what it produced.
    pub fn deliver(&mut self, id: ActorId, event: E) -> Result<(), RuntimeError> {
        let (Some(mut instance), Some(actor)) =
            (self.cells.remove(&id), self.registry.actor(id).cloned())
        else {
            return Ok(());
        };
        let mut scope = self.scope_for(actor);
        let result = instance.receive(event, &mut scope);
        let done = instance.is_done();
        self.cells.insert(id, instance);
        result?;
        let committed = self.commit(id, scope.into_commands());
        if done {
            self.stop_actor(id);
        }
        committed
    }

    /// Stop a spawned actor and its descendants, children first, and cancel
    /// their timers.
    pub fn stop_actor(&mut self, id: ActorId) {
        for actor in self.registry.remove_subtree(id) {
            self.release(actor);
        }
    }

    fn release(&mut self, actor: ActorRef) {
        if let Some(mut instance) = self.cells.remove(&actor.id()) {
            instance.stop();
        }
        self.timers.cancel_from(actor.id());
        self.diagnostics.emit(Diagnostic::Stopped { actor });
    }

    /// Stop everything below the root and forget all pending work.
    pub fn shutdown(&mut self) {
        for actor in self.registry.remove_descendants(self.root.id()) {
            self.release(actor);
        }
        self.timers.clear();
        self.mailbox.clear();
        self.root_stop_requested = false;
        self.diagnostics.emit(Diagnostic::Stopped {
            actor: self.root.clone(),
        });
    }

    pub fn take_root_stop(&mut self) -> bool {
        std::mem::take(&mut self.root_stop_requested)
    }

    /// Move the earliest due timer into the mailbox.
    pub fn fire_due(&mut self) -> bool {
        match self.timers.pop_due(self.clock.now()) {
            Some(timer) => {
                self.enqueue(timer.origin, timer.to, timer.event);
                true
            }
            None => false,
        }
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn children(&self, id: ActorId) -> Vec<ActorRef> {
        self.registry.children(id)
    }

    fn child_instance(&self, name: &str) -> Option<&dyn Actor<E>> {
        let id = self.registry.child(self.root.id(), name)?;
        self.cells.get(&id).map(|instance| instance.as_ref())
    }

    pub fn child_state(&self, name: &str) -> Option<StateValue> {
        self.child_instance(name).map(|instance| instance.state())
    }

    pub fn child_status(&self, name: &str) -> Option<ActorStatus> {
        self.child_instance(name).map(|instance| instance.status())
    }
}

//! Actions run on entry, on exit and on transitions.
//!
//! Context assignments are applied immediately, so later actions in the same
//! list observe the update. Everything that reaches other actors (sends,
//! spawns, stops) is recorded on the [`Scope`] and only committed once the
//! whole macrostep has succeeded.

use crate::actor::{Actor, RuntimeError, Scope};
use crate::core::{ActorRef, Event, Target};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Reducer<C, E> = dyn Fn(&C, Option<&E>) -> C + Send + Sync;
type Payload<C, E> = dyn Fn(&C, Option<&E>) -> Option<E> + Send + Sync;
type Factory<C, E> = dyn Fn(&C, Option<&E>) -> Box<dyn Actor<E>> + Send + Sync;
type Store<C> = dyn Fn(&C, ActorRef) -> C + Send + Sync;
type Callback<C, E> = dyn Fn(&C, Option<&E>) + Send + Sync;

/// An action implementation, registered under an id on the
/// [`MachineBuilder`](crate::builder::MachineBuilder).
pub enum Action<C, E> {
    /// Replace the context with the reducer's result.
    Assign(Arc<Reducer<C, E>>),
    /// Send an event to another actor or to the actor itself.
    Send(SendAction<C, E>),
    /// Spawn a named child actor.
    Spawn(SpawnAction<C, E>),
    /// Stop an actor.
    Stop(Target),
    /// Opaque side effect. Runs once per execution.
    Effect(Arc<Callback<C, E>>),
}

impl<C, E: Event> Action<C, E> {
    /// Context assignment. Shallow merges are written with struct update
    /// syntax: `Action::assign(|ctx, _| Ctx { count: ctx.count + 1, ..ctx.clone() })`.
    pub fn assign<F>(reducer: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> C + Send + Sync + 'static,
    {
        Action::Assign(Arc::new(reducer))
    }

    /// Send an event to the actor itself, queued behind the current
    /// macrostep.
    pub fn raise<F>(event: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> E + Send + Sync + 'static,
    {
        Action::Send(SendAction::new(Target::Itself, event))
    }

    pub fn send_parent<F>(event: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> E + Send + Sync + 'static,
    {
        Action::Send(SendAction::to_parent(event))
    }

    /// Send to a live child by name. The name is resolved on delivery.
    pub fn send_to_child<F>(name: impl Into<String>, event: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> E + Send + Sync + 'static,
    {
        Action::Send(SendAction::new(Target::child(name), event))
    }

    pub fn spawn<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> Box<dyn Actor<E>> + Send + Sync + 'static,
    {
        Action::Spawn(SpawnAction::new(name, factory))
    }

    pub fn stop_child(name: impl Into<String>) -> Self {
        Action::Stop(Target::child(name))
    }

    pub fn effect<F>(callback: F) -> Self
    where
        F: Fn(&C, Option<&E>) + Send + Sync + 'static,
    {
        Action::Effect(Arc::new(callback))
    }

    /// Run the action against the context.
    pub(crate) fn execute(
        &self,
        context: &mut C,
        event: Option<&E>,
        scope: &mut Scope<E>,
    ) -> Result<(), RuntimeError> {
        match self {
            Action::Assign(reducer) => {
                *context = reducer(context, event);
            }
            Action::Send(send) => {
                if let Some(payload) = (send.event)(context, event) {
                    scope.send_after(send.to.clone(), payload, send.delay);
                }
            }
            Action::Spawn(spawn) => {
                let actor = (spawn.factory)(context, event);
                let actor_ref = scope.spawn(&spawn.name, actor)?;
                if let Some(store) = &spawn.store {
                    *context = store(context, actor_ref);
                }
            }
            Action::Stop(target) => scope.stop(target.clone()),
            Action::Effect(callback) => callback(context, event),
        }
        Ok(())
    }
}

impl<C, E> Clone for Action<C, E> {
    fn clone(&self) -> Self {
        match self {
            Action::Assign(reducer) => Action::Assign(Arc::clone(reducer)),
            Action::Send(send) => Action::Send(send.clone()),
            Action::Spawn(spawn) => Action::Spawn(spawn.clone()),
            Action::Stop(target) => Action::Stop(target.clone()),
            Action::Effect(callback) => Action::Effect(Arc::clone(callback)),
        }
    }
}

impl<C, E> fmt::Debug for Action<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Assign(_) => f.write_str("Assign"),
            Action::Send(send) => send.fmt(f),
            Action::Spawn(spawn) => spawn.fmt(f),
            Action::Stop(target) => write!(f, "Stop({target})"),
            Action::Effect(_) => f.write_str("Effect"),
        }
    }
}

/// An addressed send, optionally delayed.
///
/// The payload is computed when the action runs, from the context and the
/// triggering event at that moment.
pub struct SendAction<C, E> {
    to: Target,
    event: Arc<Payload<C, E>>,
    delay: Option<Duration>,
}

impl<C, E> SendAction<C, E> {
    pub fn new<F>(to: impl Into<Target>, event: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> E + Send + Sync + 'static,
    {
        Self {
            to: to.into(),
            event: Arc::new(move |ctx, ev| Some(event(ctx, ev))),
            delay: None,
        }
    }

    /// A send whose payload function may decline to send anything.
    pub fn optional<F>(to: impl Into<Target>, event: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> Option<E> + Send + Sync + 'static,
    {
        Self {
            to: to.into(),
            event: Arc::new(event),
            delay: None,
        }
    }

    pub fn to_parent<F>(event: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> E + Send + Sync + 'static,
    {
        Self::new(Target::Parent, event)
    }

    /// Deliver through a timer instead of the mailbox. Cancelled if the
    /// sending actor stops first.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn target(&self) -> &Target {
        &self.to
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }
}

impl<C, E> Clone for SendAction<C, E> {
    fn clone(&self) -> Self {
        Self {
            to: self.to.clone(),
            event: Arc::clone(&self.event),
            delay: self.delay,
        }
    }
}

impl<C, E> fmt::Debug for SendAction<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Send")
            .field("to", &self.to)
            .field("delay", &self.delay)
            .finish()
    }
}

impl<C, E> From<SendAction<C, E>> for Action<C, E> {
    fn from(send: SendAction<C, E>) -> Self {
        Action::Send(send)
    }
}

/// Spawn of a named child actor.
pub struct SpawnAction<C, E> {
    name: String,
    factory: Arc<Factory<C, E>>,
    store: Option<Arc<Store<C>>>,
}

impl<C, E> SpawnAction<C, E> {
    /// The factory receives the spawning actor's context; whatever the child
    /// keeps from it is its own copy.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> Box<dyn Actor<E>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
            store: None,
        }
    }

    /// Keep the new child's reference in the context.
    pub fn store<F>(mut self, store: F) -> Self
    where
        F: Fn(&C, ActorRef) -> C + Send + Sync + 'static,
    {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C, E> Clone for SpawnAction<C, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            factory: Arc::clone(&self.factory),
            store: self.store.clone(),
        }
    }
}

impl<C, E> fmt::Debug for SpawnAction<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spawn").field("name", &self.name).finish()
    }
}

impl<C, E> From<SpawnAction<C, E>> for Action<C, E> {
    fn from(spawn: SpawnAction<C, E>) -> Self {
        Action::Spawn(spawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Command, InterpreterOptions};
    use crate::actor::Diagnostics;

    #[derive(Clone, Debug, PartialEq)]
    enum Msg {
        Ping,
        Pong(u32),
    }

    impl Event for Msg {
        fn event_type(&self) -> &str {
            match self {
                Msg::Ping => "PING",
                Msg::Pong(_) => "PONG",
            }
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter {
        pongs: u32,
        label: &'static str,
    }

    fn scope() -> Scope<Msg> {
        Scope::new(
            ActorRef::new("parent"),
            None,
            Default::default(),
            Diagnostics::default(),
            InterpreterOptions::default(),
        )
    }

    #[test]
    fn assign_is_visible_to_later_actions() {
        let increment = Action::<Counter, Msg>::assign(|ctx, _| Counter {
            pongs: ctx.pongs + 1,
            ..ctx.clone()
        });
        let report = Action::send_parent(|ctx: &Counter, _| Msg::Pong(ctx.pongs));
        let mut context = Counter {
            pongs: 0,
            label: "kept",
        };
        let mut scope = scope();

        increment.execute(&mut context, None, &mut scope).unwrap();
        report.execute(&mut context, None, &mut scope).unwrap();

        assert_eq!(context.label, "kept");
        match scope.commands() {
            [Command::Send { to, event, delay }] => {
                assert_eq!(to, &Target::Parent);
                assert_eq!(event, &Msg::Pong(1));
                assert_eq!(*delay, None);
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn optional_send_can_skip() {
        let send: Action<Counter, Msg> = SendAction::optional(Target::Itself, |ctx: &Counter, _| {
            (ctx.pongs > 0).then_some(Msg::Ping)
        })
        .into();
        let mut context = Counter::default();
        let mut scope = scope();

        send.execute(&mut context, None, &mut scope).unwrap();

        assert!(scope.commands().is_empty());
    }

    #[test]
    fn delayed_send_carries_its_delay() {
        let send: Action<Counter, Msg> = SendAction::to_parent(|_: &Counter, _| Msg::Ping)
            .after(Duration::from_millis(500))
            .into();
        let mut context = Counter::default();
        let mut scope = scope();

        send.execute(&mut context, Some(&Msg::Ping), &mut scope).unwrap();

        assert!(matches!(
            scope.commands(),
            [Command::Send { delay: Some(d), .. }] if *d == Duration::from_millis(500)
        ));
    }

    #[test]
    fn effect_does_not_touch_context() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let effect = Action::<Counter, Msg>::effect(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let mut context = Counter::default();

        effect.execute(&mut context, None, &mut scope()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(context, Counter::default());
    }
}

//! Structured diagnostics.
//!
//! Every diagnostic is logged through `tracing` and, when a hook is
//! installed, handed to it synchronously.

use crate::core::{ActorRef, StateValue, Trigger};
use std::fmt;
use std::sync::Arc;

/// Something noteworthy that happened inside an interpreter.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// A guard was evaluated while resolving a trigger.
    GuardEvaluated {
        actor: ActorRef,
        state: String,
        guard: String,
        result: bool,
    },
    /// A transition was committed.
    Transitioned {
        actor: ActorRef,
        from: StateValue,
        to: StateValue,
        trigger: Trigger,
    },
    /// Nothing on the active path handled the event. It was dropped.
    UnhandledEvent {
        actor: ActorRef,
        event_type: String,
        state: StateValue,
    },
    /// An addressed send found no live recipient.
    DroppedSend {
        from: ActorRef,
        to: String,
        event_type: String,
    },
    Spawned {
        parent: ActorRef,
        child: ActorRef,
    },
    Stopped {
        actor: ActorRef,
    },
}

type Hook = dyn Fn(&Diagnostic) + Send + Sync;

/// Optional diagnostics hook.
#[derive(Clone, Default)]
pub struct Diagnostics {
    hook: Option<Arc<Hook>>,
}

impl Diagnostics {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        Self {
            hook: Some(Arc::new(hook)),
        }
    }

    pub(crate) fn emit(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::GuardEvaluated {
                actor,
                state,
                guard,
                result,
            } => tracing::trace!(%actor, %state, %guard, result, "guard evaluated"),
            Diagnostic::Transitioned {
                actor,
                from,
                to,
                trigger,
            } => tracing::debug!(%actor, %from, %to, %trigger, "transition"),
            Diagnostic::UnhandledEvent {
                actor,
                event_type,
                state,
            } => tracing::debug!(%actor, %event_type, %state, "unhandled event dropped"),
            Diagnostic::DroppedSend {
                from,
                to,
                event_type,
            } => tracing::debug!(%from, %to, %event_type, "send dropped, no live recipient"),
            Diagnostic::Spawned { parent, child } => tracing::debug!(%parent, %child, "spawned"),
            Diagnostic::Stopped { actor } => tracing::debug!(%actor, "stopped"),
        }
        if let Some(hook) = &self.hook {
            hook(&diagnostic);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn hook_receives_emitted_diagnostics() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let diagnostics = Diagnostics::new(move |d| sink.lock().unwrap().push(d.clone()));
        let actor = ActorRef::new("toggle");

        diagnostics.emit(Diagnostic::Stopped {
            actor: actor.clone(),
        });

        assert_eq!(*seen.lock().unwrap(), vec![Diagnostic::Stopped { actor }]);
    }

    #[test]
    fn default_has_no_hook() {
        let diagnostics = Diagnostics::default();

        diagnostics.emit(Diagnostic::Stopped {
            actor: ActorRef::new("quiet"),
        });
        assert_eq!(format!("{diagnostics:?}"), "Diagnostics { hook: false }");
    }
}

//! Transition resolution.
//!
//! Resolution is pure apart from the guards it evaluates: given a tree, an
//! active configuration, a context and a trigger it computes a
//! [`TransitionPlan`] without touching the actor.

use crate::actor::RuntimeError;
use crate::builder::tree::{Candidate, NodeId, StateTree};
use crate::core::{Guard, StateValue, Trigger};
use std::collections::HashMap;

/// The outcome of resolving one trigger against an active configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionPlan {
    source: String,
    trigger: Trigger,
    exit: Vec<String>,
    enter: Vec<String>,
    actions: Vec<String>,
    target: Option<StateValue>,
    value: StateValue,
    pub(crate) configuration: Vec<NodeId>,
}

impl TransitionPlan {
    /// Id of the state that declared the winning candidate.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Ids of the exited states, innermost first.
    pub fn exit(&self) -> &[String] {
        &self.exit
    }

    /// Ids of the entered states, outermost first.
    pub fn enter(&self) -> &[String] {
        &self.enter
    }

    /// Action ids in execution order: exit actions, the transition's own
    /// actions, then entry actions.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// The state value of the target, or `None` for a targetless transition.
    pub fn target(&self) -> Option<&StateValue> {
        self.target.as_ref()
    }

    /// The state value after the transition.
    pub fn value(&self) -> &StateValue {
        &self.value
    }

    pub fn is_targetless(&self) -> bool {
        self.target.is_none()
    }
}

/// A guard evaluation, reported while resolving.
pub(crate) struct GuardCheck<'a> {
    pub state: &'a str,
    pub guard: &'a str,
    pub result: bool,
}

/// Find the winning candidate for `trigger`, walking from the active leaf
/// towards the root. At each level the first candidate whose guard holds
/// wins; an unguarded candidate always holds.
pub(crate) fn select<C, E>(
    tree: &StateTree,
    guards: &HashMap<String, Guard<C, E>>,
    configuration: &[NodeId],
    context: &C,
    event: Option<&E>,
    trigger: &Trigger,
    observe: &mut dyn FnMut(GuardCheck<'_>),
) -> Result<Option<TransitionPlan>, RuntimeError> {
    for &node in configuration.iter().rev() {
        let state = tree.node(node);
        for candidate in state.candidates(trigger) {
            let enabled = match &candidate.guard {
                None => true,
                Some(id) => {
                    let result = match guards.get(id) {
                        Some(guard) => guard.check(context, event),
                        None => Err(format!("no implementation for guard '{id}'")),
                    };
                    let result = result.map_err(|message| RuntimeError::Guard {
                        state: state.id.clone(),
                        guard: id.clone(),
                        message,
                    })?;
                    observe(GuardCheck {
                        state: &state.id,
                        guard: id,
                        result,
                    });
                    result
                }
            };
            if enabled {
                return Ok(Some(plan(tree, configuration, node, trigger, candidate)));
            }
        }
    }
    Ok(None)
}

/// The plan entering the initial configuration from nothing.
pub(crate) fn initial_plan(tree: &StateTree) -> TransitionPlan {
    let configuration = tree.initial_configuration();
    let actions = configuration
        .iter()
        .flat_map(|node| tree.node(*node).entry.iter().cloned())
        .collect();
    let value = tree.value(&configuration);
    TransitionPlan {
        source: tree.machine_id().to_string(),
        trigger: Trigger::Always,
        exit: Vec::new(),
        enter: configuration.iter().map(|n| tree.node(*n).id.clone()).collect(),
        actions,
        target: Some(value.clone()),
        value,
        configuration,
    }
}

fn plan(
    tree: &StateTree,
    configuration: &[NodeId],
    source: NodeId,
    trigger: &Trigger,
    candidate: &Candidate,
) -> TransitionPlan {
    let source_id = tree.node(source).id.clone();

    let Some(target) = candidate.target else {
        return TransitionPlan {
            source: source_id,
            trigger: trigger.clone(),
            exit: Vec::new(),
            enter: Vec::new(),
            actions: candidate.actions.clone(),
            target: None,
            value: tree.value(configuration),
            configuration: configuration.to_vec(),
        };
    };

    let domain = if target.internal {
        source
    } else {
        tree.domain(source, target.node)
    };

    // the domain is an ancestor of the source, so it is always active
    let kept = configuration
        .iter()
        .position(|node| *node == domain)
        .map_or(configuration.len(), |index| index + 1);
    let exited: Vec<NodeId> = configuration[kept..].iter().rev().copied().collect();

    let mut entered = tree.path_between(domain, target.node);
    entered.extend(tree.initial_descent(target.node));

    let actions = exited
        .iter()
        .flat_map(|node| tree.node(*node).exit.iter().cloned())
        .chain(candidate.actions.iter().cloned())
        .chain(
            entered
                .iter()
                .flat_map(|node| tree.node(*node).entry.iter().cloned()),
        )
        .collect();

    let mut next = configuration[..kept].to_vec();
    next.extend(entered.iter().copied());

    TransitionPlan {
        source: source_id,
        trigger: trigger.clone(),
        exit: exited.iter().map(|n| tree.node(*n).id.clone()).collect(),
        enter: entered.iter().map(|n| tree.node(*n).id.clone()).collect(),
        actions,
        target: Some(StateValue::new(tree.node(target.node).path.clone())),
        value: tree.value(&next),
        configuration: next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MachineConfig, StateConfig, TransitionConfig};

    type Guards = HashMap<String, Guard<u32, ()>>;

    fn nested() -> StateTree {
        let config = MachineConfig::new("m")
            .initial("a")
            .state(
                "a",
                StateConfig::new()
                    .entry("enter_a")
                    .exit("exit_a")
                    .initial("b")
                    .on("JUMP", TransitionConfig::to(".d").actions("jump"))
                    .state(
                        "b",
                        StateConfig::new()
                            .entry("enter_b")
                            .exit("exit_b")
                            .initial("c")
                            .state(
                                "c",
                                StateConfig::new()
                                    .entry("enter_c")
                                    .exit("exit_c")
                                    .on("GO", TransitionConfig::to("#m.a.d").actions("go"))
                                    .on("STAY", TransitionConfig::targetless().actions("note"))
                                    .on("AGAIN", "c"),
                            ),
                    )
                    .state(
                        "d",
                        StateConfig::new()
                            .entry("enter_d")
                            .exit("exit_d")
                            .initial("e")
                            .state("e", StateConfig::new().entry("enter_e")),
                    ),
            );
        StateTree::build(&config).unwrap()
    }

    fn resolve(tree: &StateTree, event: &str) -> Option<TransitionPlan> {
        let configuration = tree.initial_configuration();
        select::<u32, ()>(
            tree,
            &Guards::new(),
            &configuration,
            &0,
            None,
            &Trigger::event(event),
            &mut |_| {},
        )
        .unwrap()
    }

    #[test]
    fn exits_innermost_first_and_enters_outermost_first() {
        let tree = nested();
        let plan = resolve(&tree, "GO").unwrap();

        assert_eq!(plan.exit(), &["m.a.b.c", "m.a.b"]);
        assert_eq!(plan.enter(), &["m.a.d", "m.a.d.e"]);
        assert_eq!(
            plan.actions(),
            &["exit_c", "exit_b", "go", "enter_d", "enter_e"]
        );
        assert_eq!(plan.value(), &StateValue::from_path("a.d.e"));
        assert_eq!(plan.source(), "m.a.b.c");
    }

    #[test]
    fn handler_on_ancestor_is_found() {
        let tree = nested();
        let plan = resolve(&tree, "JUMP").unwrap();

        // internal transition: `a` itself stays active
        assert_eq!(plan.source(), "m.a");
        assert_eq!(plan.exit(), &["m.a.b.c", "m.a.b"]);
        assert!(!plan.exit().contains(&"m.a".to_string()));
        assert_eq!(plan.value(), &StateValue::from_path("a.d.e"));
    }

    #[test]
    fn self_target_exits_and_reenters() {
        let tree = nested();
        let plan = resolve(&tree, "AGAIN").unwrap();

        assert_eq!(plan.exit(), &["m.a.b.c"]);
        assert_eq!(plan.enter(), &["m.a.b.c"]);
        assert_eq!(plan.actions(), &["exit_c", "enter_c"]);
    }

    #[test]
    fn targetless_runs_actions_only() {
        let tree = nested();
        let plan = resolve(&tree, "STAY").unwrap();

        assert!(plan.is_targetless());
        assert!(plan.exit().is_empty());
        assert!(plan.enter().is_empty());
        assert_eq!(plan.actions(), &["note"]);
        assert_eq!(plan.value(), &StateValue::from_path("a.b.c"));
    }

    #[test]
    fn unhandled_trigger_resolves_to_nothing() {
        let tree = nested();

        assert!(resolve(&tree, "NOPE").is_none());
    }

    #[test]
    fn first_enabled_candidate_wins() {
        let config = MachineConfig::new("m")
            .initial("idle")
            .state(
                "idle",
                StateConfig::new().on(
                    "GO",
                    [
                        TransitionConfig::to("x").guard("never"),
                        TransitionConfig::to("y").guard("big"),
                        TransitionConfig::to("z"),
                    ],
                ),
            )
            .state("x", StateConfig::new())
            .state("y", StateConfig::new())
            .state("z", StateConfig::new());
        let tree = StateTree::build(&config).unwrap();
        let mut guards = Guards::new();
        guards.insert("never".into(), Guard::new(|_, _| false));
        guards.insert("big".into(), Guard::new(|n: &u32, _| *n > 10));
        let configuration = tree.initial_configuration();
        let mut checks = Vec::new();

        let plan = select(
            &tree,
            &guards,
            &configuration,
            &11,
            None,
            &Trigger::event("GO"),
            &mut |check| checks.push((check.guard.to_string(), check.result)),
        )
        .unwrap()
        .unwrap();

        assert_eq!(plan.value(), &StateValue::from_path("y"));
        assert_eq!(checks, vec![("never".into(), false), ("big".into(), true)]);
    }

    #[test]
    fn failing_guard_surfaces_as_error() {
        let config = MachineConfig::new("m")
            .initial("idle")
            .state(
                "idle",
                StateConfig::new().on("GO", TransitionConfig::to("done").guard("broken")),
            )
            .state("done", StateConfig::new());
        let tree = StateTree::build(&config).unwrap();
        let mut guards = Guards::new();
        guards.insert("broken".into(), Guard::try_new(|_, _| Err("boom".into())));

        let result = select(
            &tree,
            &guards,
            &tree.initial_configuration(),
            &0,
            None,
            &Trigger::event("GO"),
            &mut |_| {},
        );

        assert_eq!(
            result,
            Err(RuntimeError::Guard {
                state: "m.idle".into(),
                guard: "broken".into(),
                message: "boom".into(),
            })
        );
    }

    #[test]
    fn initial_plan_runs_entry_actions_outermost_first() {
        let tree = nested();
        let plan = initial_plan(&tree);

        assert_eq!(plan.actions(), &["enter_a", "enter_b", "enter_c"]);
        assert_eq!(plan.value(), &StateValue::from_path("a.b.c"));
    }
}

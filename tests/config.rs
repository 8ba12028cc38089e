//! Machines built from JSON configurations, and the errors building reports.

use harel::prelude::*;

event_enum! {
    enum Turn {
        Start => "START",
        TurnMade { selected_index: usize } => "TURN_MADE",
        Continue => "CONTINUE",
        End => "END",
        Retry => "RETRY",
        Behavior => "BEHAVIOR",
        Loop => "LOOP",
    }
}

const TIC_TAC_TOE: &str = r##"{
    "id": "ticTacToeMachine",
    "initial": "init",
    "states": {
        "init": { "on": { "START": "play" } },
        "play": {
            "id": "play",
            "initial": "turn",
            "states": {
                "turn": {
                    "initial": "chooseFirst",
                    "states": {
                        "chooseFirst": {
                            "on": {
                                "": [
                                    { "target": "player1", "cond": "player1IsHuman" },
                                    { "target": "actor1" }
                                ]
                            }
                        },
                        "actor1": {
                            "on": {
                                "TURN_MADE": [
                                    { "target": "#evaluate", "cond": "cellIsFree" },
                                    { "target": "actor1" }
                                ]
                            }
                        },
                        "player1": {
                            "on": {
                                "TURN_MADE": [
                                    { "target": "#evaluate", "cond": "cellIsFree" },
                                    { "target": "player1" }
                                ]
                            }
                        }
                    }
                },
                "evaluate": {
                    "id": "evaluate",
                    "entry": "writeTurn",
                    "on": { "CONTINUE": "turn.actor1", "END": "#finale" }
                }
            }
        },
        "finale": {
            "id": "finale",
            "on": { "RETRY": { "target": "play", "actions": "cleanState" } }
        }
    },
    "on": { "BEHAVIOR": { "actions": "changeBehavior" } }
}"##;

#[derive(Clone, Debug, Default, PartialEq)]
struct Game {
    field: [Option<char>; 9],
    human: bool,
}

fn tic_tac_toe() -> Machine<Game, Turn> {
    let config = MachineConfig::from_json(TIC_TAC_TOE).unwrap();
    Machine::builder(config, Game::default())
        .guard("player1IsHuman", |game: &Game, _: Option<&Turn>| game.human)
        .guard("cellIsFree", |game: &Game, event: Option<&Turn>| match event {
            Some(Turn::TurnMade { selected_index }) => game.field[*selected_index].is_none(),
            _ => false,
        })
        .action(
            "writeTurn",
            Action::assign(|game: &Game, event: Option<&Turn>| {
                let mut next = game.clone();
                if let Some(Turn::TurnMade { selected_index }) = event {
                    next.field[*selected_index] = Some('x');
                }
                next
            }),
        )
        .action("cleanState", Action::assign(|game: &Game, _: Option<&Turn>| Game {
            field: [None; 9],
            ..game.clone()
        }))
        .action("changeBehavior", Action::assign(|game: &Game, _: Option<&Turn>| Game {
            human: !game.human,
            ..game.clone()
        }))
        .build()
        .unwrap()
}

#[test]
fn json_machine_plays_a_round() {
    let mut interpreter = Interpreter::new(&tic_tac_toe());
    interpreter.start().unwrap();

    interpreter.send(Turn::Start).unwrap();
    assert!(interpreter.snapshot().matches("play.turn.actor1"));

    interpreter.send(Turn::TurnMade { selected_index: 4 }).unwrap();
    assert!(interpreter.snapshot().matches("play.evaluate"));
    assert_eq!(interpreter.context().field[4], Some('x'));

    interpreter.send(Turn::Continue).unwrap();
    interpreter.send(Turn::TurnMade { selected_index: 4 }).unwrap();
    assert!(interpreter.snapshot().matches("play.turn.actor1"));

    interpreter.send(Turn::TurnMade { selected_index: 0 }).unwrap();
    interpreter.send(Turn::End).unwrap();
    assert!(interpreter.snapshot().matches("finale"));

    interpreter.send(Turn::Retry).unwrap();
    let snapshot = interpreter.snapshot();
    assert!(snapshot.matches("play.turn.actor1"));
    assert_eq!(snapshot.context.field, [None; 9]);
}

#[test]
fn root_handlers_apply_in_every_state() {
    let mut interpreter = Interpreter::new(&tic_tac_toe());
    interpreter.start().unwrap();

    interpreter.send(Turn::Behavior).unwrap();
    interpreter.send(Turn::Start).unwrap();

    assert!(interpreter.context().human);
    assert!(interpreter.snapshot().matches("play.turn.player1"));
}

#[test]
fn pure_transition_reports_the_plan() {
    let machine = tic_tac_toe();
    let state = StateValue::from_path("play.turn.actor1");

    let plan = machine
        .transition(&state, &Game::default(), Some(&Turn::TurnMade { selected_index: 3 }))
        .unwrap()
        .unwrap();

    assert_eq!(plan.value(), &StateValue::from_path("play.evaluate"));
    assert_eq!(plan.actions(), &["writeTurn"]);
    assert_eq!(
        plan.exit(),
        &["ticTacToeMachine.play.turn.actor1", "ticTacToeMachine.play.turn"]
    );
    assert_eq!(plan.enter(), &["evaluate"]);
}

#[test]
fn unknown_state_value_is_rejected() {
    let machine = tic_tac_toe();

    let result = machine.transition(&StateValue::from_path("nowhere"), &Game::default(), None);

    assert!(matches!(result, Err(RuntimeError::UnknownState { .. })));
}

#[test]
fn every_problem_is_reported_at_once() {
    let config = MachineConfig::from_json(
        r##"{
            "id": "broken",
            "initial": "missing",
            "states": {
                "a": {
                    "initial": "x",
                    "on": { "GO": [{ "target": "#nowhere", "cond": "ghost" }] }
                },
                "b": { "type": "final", "states": { "c": {} } },
                "d": { "entry": "phantom", "states": { "e": {} } }
            }
        }"##,
    )
    .unwrap();

    let error = Machine::<(), Turn>::builder(config, ()).build().unwrap_err();
    let errors = error.errors();

    assert!(errors.contains(&ConfigError::UnknownInitial {
        state: "broken".to_string(),
        initial: "missing".to_string(),
    }));
    assert!(errors.contains(&ConfigError::InitialOnLeaf {
        state: "broken.a".to_string(),
        initial: "x".to_string(),
    }));
    assert!(errors.contains(&ConfigError::FinalWithChildren {
        state: "broken.b".to_string(),
    }));
    assert!(errors.contains(&ConfigError::MissingInitial {
        state: "broken.d".to_string(),
    }));
    assert!(errors.iter().any(|e| matches!(e, ConfigError::UnknownTarget { target, .. } if target == "#nowhere")));
    assert!(errors.iter().any(|e| matches!(e, ConfigError::UnknownGuard { guard, .. } if guard == "ghost")));
    assert!(errors.iter().any(|e| matches!(e, ConfigError::UnknownAction { action, .. } if action == "phantom")));
    assert!(error.to_string().contains("#nowhere"));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let error = MachineConfig::from_json(r#"{ "states": [] }"#).unwrap_err();

    assert!(matches!(error.errors(), [ConfigError::Parse(_)]));
}

#[test]
fn guarded_eventless_tail_is_linted() {
    let config = MachineConfig::new("lint")
        .initial("waiting")
        .state(
            "waiting",
            StateConfig::new().always(TransitionConfig::to("ready").guard("isReady")),
        )
        .state("ready", StateConfig::new());

    let machine = Machine::<bool, Turn>::builder(config, false)
        .guard("isReady", |ready: &bool, _: Option<&Turn>| *ready)
        .build()
        .unwrap();

    assert_eq!(machine.warnings().len(), 1);
    assert_eq!(machine.warnings()[0].state, "lint.waiting");
}

#[test]
fn eventless_cycle_is_cut_off() {
    let config = MachineConfig::new("spinner")
        .initial("idle")
        .state("idle", StateConfig::new().on("LOOP", "left"))
        .state("left", StateConfig::new().always("right"))
        .state("right", StateConfig::new().always("left"));
    let machine = Machine::<(), Turn>::builder(config, ()).build().unwrap();
    let mut interpreter = Interpreter::new(&machine).with_options(InterpreterOptions {
        max_eventless_steps: 16,
        ..InterpreterOptions::default()
    });
    interpreter.start().unwrap();

    let error = interpreter.send(Turn::Loop).unwrap_err();

    assert!(matches!(error, RuntimeError::EventlessLoop { limit: 16, .. }));
    assert!(interpreter.snapshot().matches("idle"));
    assert_eq!(interpreter.status(), ActorStatus::Running);
}

#[test]
fn configuration_survives_a_json_round_trip() {
    let config = MachineConfig::from_json(TIC_TAC_TOE).unwrap();

    let back = MachineConfig::from_json(&config.to_json().unwrap()).unwrap();

    assert_eq!(back, config);
}

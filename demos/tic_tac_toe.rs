//! Tic-Tac-Toe With Actor Players
//!
//! This example demonstrates a game machine that spawns two player actors
//! and referees their turns. One player takes the first free cell. The other
//! follows an ordered list of strategy rules expressed as guarded eventless
//! transitions: the first rule whose guard holds picks the move.
//!
//! Key concepts:
//! - Nested states with `#id` targets and sibling-relative targets
//! - Ordered guarded candidates (first match wins)
//! - Raising events to the machine itself
//! - Delayed replies from child actors
//!
//! Run with: cargo run --example tic_tac_toe

use harel::prelude::*;
use std::collections::BTreeSet;
use std::time::Duration;

type Field = [Option<char>; 9];

event_enum! {
    enum Move {
        Start => "START",
        Play { role: char, field: Field } => "PLAY",
        TurnMade { selected_index: usize } => "TURN_MADE",
        Continue { turn_order: char } => "CONTINUE",
        End { win: Option<[usize; 3]> } => "END",
    }
}

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];
const CORNERS: [usize; 4] = [0, 2, 6, 8];
const EDGES: [usize; 4] = [1, 3, 5, 7];

fn opponent(role: char) -> char {
    if role == 'x' {
        'o'
    } else {
        'x'
    }
}

/// `x` moves whenever an odd number of cells is free.
fn turn_order(field: &Field) -> char {
    if field.iter().filter(|cell| cell.is_none()).count() % 2 == 0 {
        'o'
    } else {
        'x'
    }
}

fn winner(field: &Field) -> Option<[usize; 3]> {
    LINES.into_iter().find(|[a, b, c]| {
        field[*a].is_some() && field[*a] == field[*b] && field[*a] == field[*c]
    })
}

fn first_free(field: &Field, cells: &[usize]) -> Option<usize> {
    cells.iter().copied().find(|cell| field[*cell].is_none())
}

fn completing(field: &Field, role: char) -> Option<usize> {
    LINES.iter().find_map(|line| {
        let own = line.iter().filter(|cell| field[**cell] == Some(role)).count();
        (own == 2).then(|| first_free(field, line)).flatten()
    })
}

/// A cell that opens two lines at once: the intersection of the free cells
/// of two lines holding one mark of `role` each.
fn fork(field: &Field, role: char) -> Option<usize> {
    let open: Vec<BTreeSet<usize>> = LINES
        .iter()
        .filter(|line| {
            let own = line.iter().filter(|cell| field[**cell] == Some(role)).count();
            let free = line.iter().filter(|cell| field[**cell].is_none()).count();
            own == 1 && free == 2
        })
        .map(|line| line.iter().copied().filter(|cell| field[*cell].is_none()).collect())
        .collect();

    open.iter().enumerate().find_map(|(i, first)| {
        open[i + 1..]
            .iter()
            .find_map(|second| first.intersection(second).next().copied())
    })
}

fn opposite_corner(field: &Field, role: char) -> Option<usize> {
    [(0, 8), (2, 6), (6, 2), (8, 0)]
        .into_iter()
        .find(|(taken, free)| field[*taken] == Some(opponent(role)) && field[*free].is_none())
        .map(|(_, free)| free)
}

type Rule = fn(&Field, char) -> Option<usize>;

/// Strategy rules in priority order.
fn rules() -> [(&'static str, Rule); 8] {
    [
        ("win", |field, role| completing(field, role)),
        ("block", |field, role| completing(field, opponent(role))),
        ("fork", |field, role| fork(field, role)),
        ("blockFork", |field, role| fork(field, opponent(role))),
        ("center", |field, _| first_free(field, &[4])),
        ("oppositeCorner", opposite_corner),
        ("corner", |field, _| first_free(field, &CORNERS)),
        ("edge", |field, _| first_free(field, &EDGES)),
    ]
}

#[derive(Clone, Debug, Default)]
struct Player {
    field: Field,
    role: char,
    choice: Option<usize>,
}

fn reply() -> SendAction<Player, Move> {
    SendAction::optional(Target::Parent, |player: &Player, _: Option<&Move>| {
        player
            .choice
            .map(|selected_index| Move::TurnMade { selected_index })
    })
    .after(Duration::from_millis(300))
}

fn contextify() -> Action<Player, Move> {
    Action::assign(|player: &Player, event: Option<&Move>| match event {
        Some(Move::Play { role, field }) => Player {
            field: *field,
            role: *role,
            choice: None,
        },
        _ => player.clone(),
    })
}

/// Takes the first free cell.
fn simple_player() -> Result<Machine<Player, Move>, BuildError> {
    let config = MachineConfig::new("simple")
        .initial("waiting")
        .state(
            "waiting",
            StateConfig::new().on(
                "PLAY",
                TransitionConfig::targetless().actions(["contextify", "pick", "reply"]),
            ),
        );
    Machine::builder(config, Player::default())
        .action("contextify", contextify())
        .action(
            "pick",
            Action::assign(|player: &Player, _: Option<&Move>| Player {
                choice: player.field.iter().position(Option::is_none),
                ..player.clone()
            }),
        )
        .action("reply", reply())
        .build()
}

/// Picks its move with the first strategy rule that applies.
fn rule_player() -> Result<Machine<Player, Move>, BuildError> {
    let thinking = rules()
        .iter()
        .fold(StateConfig::new(), |state, (name, _)| {
            state.always(
                TransitionConfig::to("answering")
                    .guard(format!("{name}Applies"))
                    .actions(*name),
            )
        })
        .always("waiting");
    let config = MachineConfig::new("rules")
        .initial("waiting")
        .state(
            "waiting",
            StateConfig::new().on("PLAY", TransitionConfig::to("thinking").actions("contextify")),
        )
        .state("thinking", thinking)
        .state("answering", StateConfig::new().entry("reply").always("waiting"));

    let mut builder = Machine::builder(config, Player::default())
        .action("contextify", contextify())
        .action("reply", reply());
    for (name, rule) in rules() {
        builder = builder
            .guard(format!("{name}Applies"), move |player: &Player, _: Option<&Move>| {
                rule(&player.field, player.role).is_some()
            })
            .action(
                name,
                Action::assign(move |player: &Player, _: Option<&Move>| Player {
                    choice: rule(&player.field, player.role),
                    ..player.clone()
                }),
            );
    }
    builder.build()
}

#[derive(Clone, Debug, Default)]
struct Board {
    field: Field,
    win: Option<[usize; 3]>,
}

fn ask(role: char) -> Action<Board, Move> {
    Action::send_to_child(
        format!("actor{}", if role == 'x' { 1 } else { 2 }),
        move |board: &Board, _: Option<&Move>| Move::Play {
            role,
            field: board.field,
        },
    )
}

fn actor_turn(name: &str) -> StateConfig {
    StateConfig::new().entry(format!("let{}Play", capitalize(name))).on(
        "TURN_MADE",
        [
            TransitionConfig::to("#evaluate").guard("cellIsFree"),
            TransitionConfig::to(name),
        ],
    )
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars
        .next()
        .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
        .unwrap_or_default()
}

fn game(
    first: Machine<Player, Move>,
    second: Machine<Player, Move>,
) -> Result<Machine<Board, Move>, BuildError> {
    let config = MachineConfig::new("ticTacToe")
        .initial("init")
        .state(
            "init",
            StateConfig::new()
                .entry(["createActor1", "createActor2"])
                .on("START", "play"),
        )
        .state(
            "play",
            StateConfig::new()
                .initial("turn")
                .state(
                    "turn",
                    StateConfig::new()
                        .initial("actor1")
                        .state("actor1", actor_turn("actor1"))
                        .state("actor2", actor_turn("actor2")),
                )
                .state(
                    "evaluate",
                    StateConfig::new()
                        .id("evaluate")
                        .entry(["writeTurn", "continueOrEnd"])
                        .on(
                            "CONTINUE",
                            [
                                TransitionConfig::to("turn.actor1").guard("xToMove"),
                                TransitionConfig::to("turn.actor2"),
                            ],
                        )
                        .on("END", "#finale"),
                ),
        )
        .state("finale", StateConfig::new().id("finale").entry("assignWin"));

    Machine::builder(config, Board::default())
        .action(
            "createActor1",
            Action::spawn("actor1", move |_: &Board, _: Option<&Move>| first.actor()),
        )
        .action(
            "createActor2",
            Action::spawn("actor2", move |_: &Board, _: Option<&Move>| second.actor()),
        )
        .action("letActor1Play", ask('x'))
        .action("letActor2Play", ask('o'))
        .action(
            "writeTurn",
            Action::assign(|board: &Board, event: Option<&Move>| {
                let mut next = board.clone();
                if let Some(Move::TurnMade { selected_index }) = event {
                    next.field[*selected_index] = Some(turn_order(&board.field));
                }
                next
            }),
        )
        .action(
            "continueOrEnd",
            Action::raise(|board: &Board, _: Option<&Move>| {
                let win = winner(&board.field);
                if win.is_some() || board.field.iter().all(Option::is_some) {
                    Move::End { win }
                } else {
                    Move::Continue {
                        turn_order: turn_order(&board.field),
                    }
                }
            }),
        )
        .action(
            "assignWin",
            Action::assign(|board: &Board, event: Option<&Move>| match event {
                Some(Move::End { win }) => Board {
                    win: *win,
                    ..board.clone()
                },
                _ => board.clone(),
            }),
        )
        .guard("cellIsFree", |board: &Board, event: Option<&Move>| {
            matches!(event, Some(Move::TurnMade { selected_index }) if board.field[*selected_index].is_none())
        })
        .guard("xToMove", |_: &Board, event: Option<&Move>| {
            matches!(event, Some(Move::Continue { turn_order: 'x' }))
        })
        .build()
}

fn print_field(field: &Field) {
    for row in field.chunks(3) {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| cell.map_or(".".to_string(), String::from))
            .collect();
        println!("    {}", cells.join(" "));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Tic-Tac-Toe With Actor Players ===\n");

    let machine = game(simple_player()?, rule_player()?)?;
    let mut tic_tac_toe = Interpreter::new(&machine);
    tic_tac_toe.subscribe(|snapshot: &Snapshot<Board>| {
        if snapshot.matches("play.evaluate") {
            println!("  after a turn:");
            print_field(&snapshot.context.field);
        }
    });

    tic_tac_toe.start()?;
    let players: Vec<String> = tic_tac_toe
        .children()
        .iter()
        .map(|player| player.name().to_string())
        .collect();
    println!("Players: {}\n", players.join(", "));
    tic_tac_toe.send(Move::Start)?;
    tic_tac_toe.run_timers().await?;

    let board = tic_tac_toe.context();
    match board.win {
        Some(line) => println!("\n{} wins on {line:?}", board.field[line[0]].unwrap_or('?')),
        None => println!("\nDraw"),
    }
    println!("Final state: {}", tic_tac_toe.state());

    println!("\n=== Example Complete ===");
    Ok(())
}

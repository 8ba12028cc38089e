//! Ping Pong Actors
//!
//! This example demonstrates a parent machine spawning a child actor and the
//! two trading messages through delayed sends.
//!
//! Key concepts:
//! - Spawning a named child on entry
//! - Sending to a child by name and to the parent
//! - Delayed sends driven by tokio time
//! - Watching the actor tree through diagnostics
//!
//! Run with: cargo run --example ping_pong

use harel::prelude::*;
use std::time::Duration;

event_enum! {
    enum Rally {
        Ping => "PING",
        Pong => "PONG",
    }
}

const RALLIES: u32 = 5;

fn ponger() -> Result<Machine<(), Rally>, BuildError> {
    let config = MachineConfig::new("ponger")
        .initial("active")
        .state(
            "active",
            StateConfig::new().on("PING", TransitionConfig::targetless().actions("pong")),
        );
    Machine::builder(config, ())
        .action(
            "pong",
            SendAction::to_parent(|_: &(), _: Option<&Rally>| Rally::Pong)
                .after(Duration::from_millis(250)),
        )
        .build()
}

fn pinger(ponger: Machine<(), Rally>) -> Result<Machine<u32, Rally>, BuildError> {
    let config = MachineConfig::new("pinger")
        .initial("serving")
        .entry(["spawnPonger", "ping"])
        .state(
            "serving",
            StateConfig::new().on(
                "PONG",
                [
                    TransitionConfig::to("finished")
                        .guard("lastRally")
                        .actions("count"),
                    TransitionConfig::targetless().actions(["count", "ping"]),
                ],
            ),
        )
        .state("finished", StateConfig::final_state());
    Machine::builder(config, 0)
        .action(
            "spawnPonger",
            Action::spawn("ponger", move |_: &u32, _: Option<&Rally>| ponger.actor()),
        )
        .action(
            "ping",
            SendAction::new(Target::child("ponger"), |_: &u32, _: Option<&Rally>| Rally::Ping)
                .after(Duration::from_millis(250)),
        )
        .action("count", Action::assign(|hits: &u32, _: Option<&Rally>| hits + 1))
        .guard("lastRally", |hits: &u32, _: Option<&Rally>| hits + 1 >= RALLIES)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Ping Pong Actors ===\n");

    let machine = pinger(ponger()?)?;
    let diagnostics = Diagnostics::new(|diagnostic| match diagnostic {
        Diagnostic::Spawned { parent, child } => println!("  spawned {child} under {parent}"),
        Diagnostic::Transitioned {
            actor, trigger, to, ..
        } => println!("  {actor}: {} -> {to}", trigger.event_type()),
        Diagnostic::Stopped { actor } => println!("  stopped {actor}"),
        _ => {}
    });
    let mut game = Interpreter::new(&machine).with_diagnostics(diagnostics);
    game.subscribe(|snapshot: &Snapshot<u32>| {
        println!("  rallies: {}", snapshot.context);
    });

    game.start()?;
    println!("\nPlaying {RALLIES} rallies, 250ms per hit:");
    game.run_timers().await?;

    println!("\nDone: {} after {} rallies", game.is_done(), game.context());
    println!("\n=== Example Complete ===");
    Ok(())
}

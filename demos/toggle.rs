//! Toggle Machine
//!
//! This example demonstrates the smallest useful machine: two states and
//! one event flipping between them.
//!
//! Key concepts:
//! - Declaring states and transitions with the fluent configuration API
//! - Starting an interpreter and sending events
//! - Observing snapshots and the transition history
//!
//! Run with: cargo run --example toggle

use harel::prelude::*;

event_enum! {
    enum Switch {
        Toggle => "TOGGLE",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Toggle Machine ===\n");

    let config = MachineConfig::new("toggle")
        .initial("relaxed")
        .state("relaxed", StateConfig::new().on("TOGGLE", "toggled"))
        .state("toggled", StateConfig::new().on("TOGGLE", "relaxed"));

    println!("Configuration:");
    println!("{}\n", config.to_json()?);

    let machine = Machine::<(), Switch>::builder(config, ()).build()?;

    let mut toggle = Interpreter::new(&machine);
    toggle.subscribe(|snapshot: &Snapshot<()>| {
        println!("  -> {} (changed: {})", snapshot.value, snapshot.changed);
    });

    println!("Starting:");
    toggle.start()?;

    println!("\nSending TOGGLE three times:");
    for _ in 0..3 {
        toggle.send(Switch::Toggle)?;
    }

    let path: Vec<String> = toggle
        .history()
        .get_path()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    println!("\nPath taken: {}", path.join(" -> "));

    toggle.stop()?;
    println!("Final status: {}", toggle.status());

    println!("\n=== Example Complete ===");
    Ok(())
}

//! Headless run of the shipped data set.
//!
//! Loads the catalog from `data/`, switches every starting machine on, buys
//! a few machines along the way and prints the stockpile once per simulated
//! second. Pass a directory to load a different data set.
//!
//! ```sh
//! cargo run -p insitu-data --example headless_runner [DATA_DIR]
//! ```

use insitu_core::event::{Event, EventKind, ListenerPriority};
use insitu_core::GAME_TITLE;
use insitu_core::id::MachineId;
use insitu_core::scheduler::SchedulerConfig;
use insitu_core::session::Session;
use insitu_data::load_catalog;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const SECONDS: u32 = 30;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"));

    let catalog = Arc::new(load_catalog(&dir)?);
    println!(
        "{GAME_TITLE}: {} resources, {} machine types",
        catalog.resource_count(),
        catalog.machine_count()
    );
    let mut session = Session::new(Arc::clone(&catalog));

    session.event_bus.on_passive(
        EventKind::MachineBuilt,
        Box::new(|event| {
            if let Event::MachineBuilt { machine, tick, .. } = event {
                println!("  [tick {tick}] built machine #{}", machine.0);
            }
        }),
    );
    session.event_bus.on_passive(
        EventKind::MachineStalled,
        Box::new(|event| {
            if let Event::MachineStalled { machine, tick } = event {
                println!("  [tick {tick}] machine #{} stalled", machine.0);
            }
        }),
    );

    // Running total of water produced, read back after the run.
    let water_made = Arc::new(Mutex::new(0.0_f64));
    if let Some(water) = catalog.resource_id("water") {
        let total = Arc::clone(&water_made);
        session.event_bus.on_passive_filtered(
            EventKind::ResourceProduced,
            ListenerPriority::Post,
            Some(Box::new(move |event| {
                matches!(event, Event::ResourceProduced { resource, .. } if *resource == water)
            })),
            Box::new(move |event| {
                if let Event::ResourceProduced { amount, .. } = event {
                    *total.lock().unwrap_or_else(|p| p.into_inner()) += *amount;
                }
            }),
        );
    }

    for idx in 0..session.machines().len() {
        session.toggle_active(MachineId(idx as u32));
    }

    let config = SchedulerConfig::default();
    let dt = config.interval().as_secs_f64();
    let build_order = ["Solar Panel", "Ice Drill", "Ice Melter"];
    let mut next_build = 0;

    for second in 1..=SECONDS {
        for _ in 0..config.tick_rate {
            session.tick(dt);
        }

        // Crank the dynamo and scrape by hand every second.
        for (id, _) in catalog.harvests() {
            session.perform_harvest(id);
        }

        if let Some(name) = build_order.get(next_build) {
            if let Ok(machine) = session.build_by_name(name) {
                session.toggle_active(machine);
                next_build += 1;
            }
        }

        if second % 5 == 0 {
            print_stock(&session, second);
        }
    }

    let water_made = *water_made.lock().unwrap_or_else(|p| p.into_inner());
    println!("water produced over {SECONDS} s: {water_made:.2}");
    Ok(())
}

fn print_stock(session: &Session, second: u32) {
    println!("t = {second:>3} s, {} machines", session.machines().len());
    for (id, def) in session.catalog().resources() {
        println!("  {:<10} {:>14}", def.name, session.display_string(id));
    }
}

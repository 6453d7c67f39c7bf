//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::{Catalog, CatalogBuilder, ResourceAmount};
use crate::id::*;
use crate::session::Session;
use std::sync::Arc;

// ===========================================================================
// Lookup helpers (panic on missing keys; test code only)
// ===========================================================================

pub fn resource(catalog: &Catalog, key: &str) -> ResourceId {
    catalog
        .resource_id(key)
        .unwrap_or_else(|| panic!("no resource '{key}'"))
}

pub fn machine_type(catalog: &Catalog, key: &str) -> MachineTypeId {
    catalog
        .machine_id(key)
        .unwrap_or_else(|| panic!("no machine type '{key}'"))
}

pub fn recipe(catalog: &Catalog, key: &str) -> RecipeId {
    catalog
        .recipe_id(key)
        .unwrap_or_else(|| panic!("no recipe '{key}'"))
}

pub fn harvest(catalog: &Catalog, key: &str) -> HarvestId {
    catalog
        .harvest_id(key)
        .unwrap_or_else(|| panic!("no harvest action '{key}'"))
}

pub fn rate(resource: ResourceId, amount: f64) -> ResourceAmount {
    ResourceAmount::new(resource, amount)
}

// ===========================================================================
// Catalogs
// ===========================================================================

/// A small ore -> iron economy powered by generators.
///
/// | resource  | unit | start |
/// |-----------|------|-------|
/// | iron_ore  | g    | 0     |
/// | iron      | g    | 50    |
/// | energy    | J    | 100   |
///
/// Machines: `miner` (20 iron, 1 at start), `smelter` (50 iron),
/// `generator` (30 iron, 1 at start), `warehouse` (10 iron, no recipes).
pub fn sample_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let ore = b.register_resource("iron_ore", "Iron Ore", "g", 0.0);
    let iron = b.register_resource("iron", "Iron", "g", 50.0);
    let energy = b.register_resource("energy", "Energy", "J", 100.0);

    let miner = b.register_machine("miner", "Ore Miner", vec![rate(iron, 20.0)], 1);
    let smelter = b.register_machine("smelter", "Smelter", vec![rate(iron, 50.0)], 0);
    let generator = b.register_machine("generator", "Generator", vec![rate(iron, 30.0)], 1);
    b.register_machine("warehouse", "Warehouse", vec![rate(iron, 10.0)], 0);

    b.register_recipe("mine_ore", vec![miner], vec![rate(energy, 1.0)], vec![rate(ore, 5.0)]);
    b.register_recipe(
        "deep_mine",
        vec![miner],
        vec![rate(energy, 4.0)],
        vec![rate(ore, 12.0)],
    );
    b.register_recipe(
        "smelt_iron",
        vec![smelter],
        vec![rate(ore, 2.0), rate(energy, 2.0)],
        vec![rate(iron, 1.0)],
    );
    b.register_recipe("generate", vec![generator], vec![], vec![rate(energy, 10.0)]);

    b.register_harvest("mine_by_hand", "Mine ore by hand", ore, 10.0);
    b.register_harvest("crank", "Turn the crank", energy, 5.0);

    b.build().expect("sample catalog is valid")
}

/// One converter machine type turning `x` into `y` at `rate_per_sec`, with
/// `machines` instances at start and `stock` units of `x`.
pub fn converter_catalog(stock: f64, rate_per_sec: f64, machines: u32) -> Catalog {
    let mut b = CatalogBuilder::new();
    let x = b.register_resource("x", "X", "u", stock);
    let y = b.register_resource("y", "Y", "u", 0.0);
    let converter = b.register_machine("converter", "Converter", vec![], machines);
    b.register_recipe(
        "convert",
        vec![converter],
        vec![rate(x, rate_per_sec)],
        vec![rate(y, rate_per_sec)],
    );
    b.build().expect("converter catalog is valid")
}

// ===========================================================================
// Sessions
// ===========================================================================

pub fn sample_session() -> Session {
    Session::new(Arc::new(sample_catalog()))
}

pub fn session_from(catalog: Catalog) -> Session {
    Session::new(Arc::new(catalog))
}

/// Switch on every machine in the session.
pub fn activate_all(session: &mut Session) {
    for idx in 0..session.machines().len() {
        let id = MachineId(idx as u32);
        if session.machine(id).is_some_and(|m| !m.is_active()) {
            session.toggle_active(id);
        }
    }
}

/// Assert two floats are within `1e-9` of each other.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

//! The game session: owns the ledger and machine list and orchestrates the
//! tick pipeline.
//!
//! # Architecture
//!
//! A `Session` owns:
//! - A shared, immutable [`Catalog`]
//! - The resource [`Ledger`]
//! - The machine list, addressed by [`MachineId`]
//! - A [`SimState`] (tick counter, total elapsed seconds)
//! - An [`EventBus`] for typed simulation events
//!
//! # Tick pipeline
//!
//! Each `tick()` runs:
//! 1. **Process** -- active machines consume inputs and produce outputs
//! 2. **Events** -- emit production and stall events, deliver buffered events
//! 3. **Bookkeeping** -- update counters, compute state hash
//!
//! Player actions (toggle, recipe change, build, harvest) mutate the session
//! directly between ticks and deliver their events immediately.

use crate::builder::{self, BuildError};
use crate::catalog::Catalog;
use crate::event::{Event, EventBus};
use crate::format::format_amount;
use crate::id::{HarvestId, MachineId, MachineTypeId, RecipeId, ResourceId};
use crate::ledger::Ledger;
use crate::machine::{Machine, MachineState};
use crate::production::{self, TickReport};
use crate::sim::{SimState, StateHash};
use std::sync::Arc;

/// Unit shown for resources the catalog does not know.
const FALLBACK_UNIT: &str = "u";

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Session {
    catalog: Arc<Catalog>,
    ledger: Ledger,
    machines: Vec<Machine>,

    /// Simulation counters (tick count, total elapsed).
    pub sim_state: SimState,

    /// Whether the simulation is paused.
    paused: bool,

    /// Typed event bus for simulation events.
    pub event_bus: EventBus,

    /// The most recently computed state hash.
    last_state_hash: u64,
}

impl Session {
    /// Create a session seeded from the catalog: every resource starts at its
    /// starting amount, and each machine type contributes its starting count
    /// of inactive machines, in catalog order.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let mut ledger = Ledger::with_resources(catalog.resource_count());
        for (id, def) in catalog.resources() {
            ledger.set(id, def.starting_amount);
        }

        let mut machines = Vec::new();
        for (id, def) in catalog.machines() {
            for _ in 0..def.starting_count {
                machines.push(Machine::new(&catalog, id));
            }
        }

        let mut session = Self {
            catalog,
            ledger,
            machines,
            sim_state: SimState::new(),
            paused: false,
            event_bus: EventBus::default(),
            last_state_hash: 0,
        };
        session.last_state_hash = session.compute_state_hash();
        session
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// A second handle to the shared catalog.
    pub fn catalog_handle(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(id.index())
    }

    /// Current stock of a resource. Unknown resources read as 0.
    pub fn stock(&self, resource: ResourceId) -> f64 {
        self.ledger.get(resource)
    }

    /// State hash as of the last tick or action.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Pause the simulation. While paused, `tick()` is a no-op. Player
    /// actions still apply.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the simulation by `elapsed` seconds.
    ///
    /// Returns an empty report without touching any state when paused or
    /// when `elapsed` is not a positive finite number.
    pub fn tick(&mut self, elapsed: f64) -> TickReport {
        if self.paused || !elapsed.is_finite() || elapsed <= 0.0 {
            return TickReport::default();
        }

        // Phase 1: Process.
        let report =
            production::run_production(&self.catalog, &mut self.machines, &mut self.ledger, elapsed);

        // Phase 2: Events.
        self.emit_tick_events(&report);
        self.event_bus.deliver();

        // Phase 3: Bookkeeping.
        self.sim_state.tick += 1;
        self.sim_state.elapsed += elapsed;
        self.last_state_hash = self.compute_state_hash();

        report
    }

    fn emit_tick_events(&mut self, report: &TickReport) {
        let tick = self.sim_state.tick;

        for (&resource, &amount) in &report.consumed {
            self.event_bus.emit(Event::ResourceConsumed {
                resource,
                amount,
                tick,
            });
        }
        for (&resource, &amount) in &report.produced {
            self.event_bus.emit(Event::ResourceProduced {
                resource,
                amount,
                tick,
            });
        }

        for run in report.runs.iter().filter(|r| r.state_changed) {
            if run.ratio <= 0.0 {
                self.event_bus.emit(Event::MachineStalled {
                    machine: run.machine,
                    tick,
                });
            } else if run.previous == MachineState::Stalled {
                self.event_bus.emit(Event::MachineResumed {
                    machine: run.machine,
                    tick,
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Machine actions
    // -----------------------------------------------------------------------

    /// Flip a machine on or off. Returns the new active flag, or `None` if
    /// no machine has that id.
    pub fn toggle_active(&mut self, machine: MachineId) -> Option<bool> {
        let active = self.machines.get_mut(machine.index())?.toggle_active();
        self.event_bus.emit(Event::MachineToggled {
            machine,
            active,
            tick: self.sim_state.tick,
        });
        self.after_action();
        Some(active)
    }

    /// Assign a recipe to a machine. Unknown machines and ineligible recipes
    /// are ignored and `false` is returned.
    pub fn set_recipe(&mut self, machine: MachineId, recipe: RecipeId) -> bool {
        let Some(m) = self.machines.get_mut(machine.index()) else {
            return false;
        };
        if !m.set_recipe(recipe) {
            return false;
        }
        self.event_bus.emit(Event::RecipeChanged {
            machine,
            recipe,
            tick: self.sim_state.tick,
        });
        self.after_action();
        true
    }

    /// Assign the recipe at `index` in the machine's eligible list, the way a
    /// recipe dropdown does.
    pub fn set_recipe_index(&mut self, machine: MachineId, index: usize) -> bool {
        let recipe = self
            .machine(machine)
            .and_then(|m| m.recipes().get(index).copied());
        match recipe {
            Some(recipe) => self.set_recipe(machine, recipe),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    pub fn can_build(&self, machine_type: MachineTypeId) -> bool {
        builder::can_build(&self.catalog, &self.ledger, machine_type)
    }

    /// Build a machine, deducting its full cost. On error nothing changes.
    pub fn build(&mut self, machine_type: MachineTypeId) -> Result<MachineId, BuildError> {
        let machine = builder::build(
            &self.catalog,
            &mut self.ledger,
            &mut self.machines,
            machine_type,
        )?;
        self.event_bus.emit(Event::MachineBuilt {
            machine,
            machine_type,
            tick: self.sim_state.tick,
        });
        self.after_action();
        Ok(machine)
    }

    /// Build a machine picked by its display name.
    pub fn build_by_name(&mut self, name: &str) -> Result<MachineId, BuildError> {
        let machine_type = self
            .catalog
            .machine_id_by_name(name)
            .ok_or_else(|| BuildError::UnknownMachineName(name.to_string()))?;
        self.build(machine_type)
    }

    // -----------------------------------------------------------------------
    // Harvesting
    // -----------------------------------------------------------------------

    /// Add `amount` of a resource by hand. Negative amounts clamp at zero
    /// like any ledger change. Returns `false` for resources the catalog
    /// does not define.
    pub fn harvest(&mut self, resource: ResourceId, amount: f64) -> bool {
        if self.catalog.get_resource(resource).is_none() {
            return false;
        }
        self.ledger.add(resource, amount);
        self.event_bus.emit(Event::ResourceHarvested {
            resource,
            amount,
            tick: self.sim_state.tick,
        });
        self.after_action();
        true
    }

    /// Run a catalog harvest action.
    pub fn perform_harvest(&mut self, harvest: HarvestId) -> bool {
        let Some(def) = self.catalog.get_harvest(harvest) else {
            return false;
        };
        let (resource, amount) = (def.resource, def.amount);
        self.harvest(resource, amount)
    }

    // -----------------------------------------------------------------------
    // Display
    // -----------------------------------------------------------------------

    /// Current stock of a resource formatted with its unit.
    pub fn display_string(&self, resource: ResourceId) -> String {
        let unit = self
            .catalog
            .get_resource(resource)
            .map_or(FALLBACK_UNIT, |def| def.unit.as_str());
        format_amount(self.ledger.get(resource), unit)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn after_action(&mut self) {
        self.event_bus.deliver();
        self.last_state_hash = self.compute_state_hash();
    }

    fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);

        for (resource, amount) in self.ledger.iter() {
            hasher.write_u32(resource.0);
            hasher.write_f64(amount);
        }

        for machine in &self.machines {
            hasher.write_u32(machine.machine_type().0);
            hasher.write(&[machine.is_active() as u8]);
            match machine.current_recipe() {
                Some(recipe) => hasher.write_u32(recipe.0),
                None => hasher.write_u32(u32::MAX),
            }
        }

        hasher.finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

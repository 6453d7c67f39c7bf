//! Craft ratios and the per-tick production pass.
//!
//! A machine short on inputs runs at a reduced craft ratio instead of
//! stalling: the ratio is the fraction of this tick's required input that
//! the scarcest resource can cover, and both consumption and output are
//! scaled by it.
//!
//! Machines are processed in list order, each against the ledger as already
//! mutated by earlier machines in the same tick. When several machines
//! compete for one resource, earlier machines take what they need first.

use crate::catalog::{Catalog, RecipeDef};
use crate::id::{MachineId, RecipeId, ResourceId};
use crate::ledger::Ledger;
use crate::machine::{Machine, MachineState};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Craft ratio
// ---------------------------------------------------------------------------

/// Fraction in `[0, 1]` of a recipe's nominal rate the ledger can sustain
/// over `elapsed` seconds. Unknown recipes yield 0.
pub fn craft_ratio(catalog: &Catalog, ledger: &Ledger, recipe: RecipeId, elapsed: f64) -> f64 {
    match catalog.get_recipe(recipe) {
        Some(def) => recipe_ratio(def, ledger, elapsed),
        None => 0.0,
    }
}

/// Craft ratio for a recipe definition.
///
/// Inputs with a non-positive rate impose no constraint, and neither do
/// inputs whose requirement over `elapsed` is zero.
pub fn recipe_ratio(recipe: &RecipeDef, ledger: &Ledger, elapsed: f64) -> f64 {
    let mut min_ratio: Option<f64> = None;

    for input in &recipe.inputs {
        if input.amount <= 0.0 {
            continue;
        }
        let needed = input.amount * elapsed;
        if needed <= 0.0 {
            continue;
        }
        let ratio = (ledger.get(input.resource) / needed).min(1.0);
        min_ratio = Some(min_ratio.map_or(ratio, |m| m.min(ratio)));
    }

    match min_ratio {
        None => 1.0,
        Some(r) if r <= 0.0 => 0.0,
        Some(r) => r.clamp(0.0, 1.0),
    }
}

/// Craft ratio against absolute stock, ignoring elapsed time.
///
/// Compares stock to the per-second rate rather than to the amount the tick
/// actually deducts, so it disagrees with the production pass for any tick
/// length other than one second.
#[deprecated(note = "not scaled by elapsed time; use `craft_ratio`")]
pub fn instantaneous_ratio(recipe: &RecipeDef, ledger: &Ledger) -> f64 {
    recipe_ratio(recipe, ledger, 1.0)
}

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// What one machine did during a production pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineRun {
    pub machine: MachineId,
    pub recipe: RecipeId,
    /// Craft ratio applied. Zero means the machine was skipped.
    pub ratio: f64,
    /// State before this pass.
    pub previous: MachineState,
    /// Whether the machine's [`MachineState`] changed this pass.
    pub state_changed: bool,
}

/// Outcome of a production pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Seconds simulated. Zero for a skipped tick.
    pub elapsed: f64,
    /// One entry per running machine, in processing order.
    pub runs: Vec<MachineRun>,
    /// Total amount deducted per resource.
    pub consumed: BTreeMap<ResourceId, f64>,
    /// Total amount added per resource.
    pub produced: BTreeMap<ResourceId, f64>,
}

impl TickReport {
    pub fn run(&self, machine: MachineId) -> Option<&MachineRun> {
        self.runs.iter().find(|r| r.machine == machine)
    }

    pub fn consumed(&self, resource: ResourceId) -> f64 {
        self.consumed.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn produced(&self, resource: ResourceId) -> f64 {
        self.produced.get(&resource).copied().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Production pass
// ---------------------------------------------------------------------------

/// Run every active machine for `elapsed` seconds.
///
/// A non-positive or non-finite `elapsed` leaves the ledger untouched and
/// returns an empty report.
pub fn run_production(
    catalog: &Catalog,
    machines: &mut [Machine],
    ledger: &mut Ledger,
    elapsed: f64,
) -> TickReport {
    let mut report = TickReport::default();
    if !elapsed.is_finite() || elapsed <= 0.0 {
        return report;
    }
    report.elapsed = elapsed;

    for (idx, machine) in machines.iter_mut().enumerate() {
        if !machine.is_active() {
            continue;
        }
        let Some(recipe_id) = machine.current_recipe() else {
            continue;
        };

        let ratio = craft_ratio(catalog, ledger, recipe_id, elapsed);
        let new_state = if ratio > 0.0 {
            MachineState::Working { ratio }
        } else {
            MachineState::Stalled
        };
        let previous = machine.state;
        let state_changed = !same_kind(previous, new_state);
        machine.state = new_state;

        report.runs.push(MachineRun {
            machine: MachineId(idx as u32),
            recipe: recipe_id,
            ratio,
            previous,
            state_changed,
        });

        if ratio <= 0.0 {
            continue;
        }
        // ratio > 0 implies the recipe exists.
        let Some(recipe) = catalog.get_recipe(recipe_id) else {
            continue;
        };

        for input in &recipe.inputs {
            let amount = input.amount * elapsed * ratio;
            let before = ledger.get(input.resource);
            ledger.add(input.resource, -amount);
            let taken = before - ledger.get(input.resource);
            if taken != 0.0 {
                *report.consumed.entry(input.resource).or_insert(0.0) += taken;
            }
        }

        for output in &recipe.outputs {
            let amount = output.amount * elapsed * ratio;
            let before = ledger.get(output.resource);
            ledger.add(output.resource, amount);
            let added = ledger.get(output.resource) - before;
            if added != 0.0 {
                *report.produced.entry(output.resource).or_insert(0.0) += added;
            }
        }
    }

    report
}

/// Working-to-working is not a transition, whatever the ratio.
fn same_kind(a: MachineState, b: MachineState) -> bool {
    std::mem::discriminant(&a) == std::mem::discriminant(&b)
}

//! Machine construction.
//!
//! Building is all-or-nothing: the full cost is validated against the ledger
//! and then deducted in one step, or nothing changes at all.

use crate::catalog::Catalog;
use crate::id::{MachineId, MachineTypeId, ResourceId};
use crate::ledger::Ledger;
use crate::machine::Machine;

/// A cost entry the ledger cannot cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shortfall {
    pub resource: ResourceId,
    pub required: f64,
    pub available: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("unknown machine type: {0:?}")]
    UnknownMachineType(MachineTypeId),
    #[error("unknown machine name: {0}")]
    UnknownMachineName(String),
    #[error("insufficient resources to build '{machine}' ({} short)", .missing.len())]
    InsufficientResources {
        machine: String,
        missing: Vec<Shortfall>,
    },
}

/// Cost entries the ledger cannot cover. `None` for unknown machine types.
pub fn shortfalls(
    catalog: &Catalog,
    ledger: &Ledger,
    machine_type: MachineTypeId,
) -> Option<Vec<Shortfall>> {
    let def = catalog.get_machine(machine_type)?;
    Some(
        def.cost
            .iter()
            .filter(|c| !ledger.has(c.resource, c.amount))
            .map(|c| Shortfall {
                resource: c.resource,
                required: c.amount,
                available: ledger.get(c.resource),
            })
            .collect(),
    )
}

/// Whether the machine type exists and its whole cost is in stock.
pub fn can_build(catalog: &Catalog, ledger: &Ledger, machine_type: MachineTypeId) -> bool {
    shortfalls(catalog, ledger, machine_type).is_some_and(|missing| missing.is_empty())
}

/// Deduct the cost of `machine_type` and append a new inactive instance.
///
/// On error neither the ledger nor the machine list is touched.
pub fn build(
    catalog: &Catalog,
    ledger: &mut Ledger,
    machines: &mut Vec<Machine>,
    machine_type: MachineTypeId,
) -> Result<MachineId, BuildError> {
    let def = catalog
        .get_machine(machine_type)
        .ok_or(BuildError::UnknownMachineType(machine_type))?;

    let missing = shortfalls(catalog, ledger, machine_type).unwrap_or_default();
    if !missing.is_empty() {
        return Err(BuildError::InsufficientResources {
            machine: def.name.clone(),
            missing,
        });
    }

    for cost in &def.cost {
        ledger.add(cost.resource, -cost.amount);
    }

    let id = MachineId(machines.len() as u32);
    machines.push(Machine::new(catalog, machine_type));
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::test_utils::*;

    fn ledger_with(catalog: &Catalog, entries: &[(&str, f64)]) -> Ledger {
        let mut ledger = Ledger::with_resources(catalog.resource_count());
        for &(key, amount) in entries {
            ledger.set(resource(catalog, key), amount);
        }
        ledger
    }

    #[test]
    fn can_build_with_exact_stock() {
        let cat = sample_catalog();
        let ledger = ledger_with(&cat, &[("iron", 20.0)]);
        assert!(can_build(&cat, &ledger, machine_type(&cat, "miner")));
        assert!(!can_build(&cat, &ledger, machine_type(&cat, "smelter")));
    }

    #[test]
    fn can_build_unknown_type_is_false() {
        let cat = sample_catalog();
        let ledger = ledger_with(&cat, &[("iron", 1e9)]);
        assert!(!can_build(&cat, &ledger, MachineTypeId(99)));
    }

    #[test]
    fn empty_cost_is_always_buildable() {
        let mut b = CatalogBuilder::new();
        let free = b.register_machine("free", "Free", vec![], 0);
        let cat = b.build().unwrap();
        assert!(can_build(&cat, &Ledger::new(), free));
    }

    #[test]
    fn build_deducts_cost_and_appends_machine() {
        let cat = sample_catalog();
        let miner = machine_type(&cat, "miner");
        let mut ledger = ledger_with(&cat, &[("iron", 20.0)]);
        let mut machines = Vec::new();

        let id = build(&cat, &mut ledger, &mut machines, miner).unwrap();

        assert_eq!(id, MachineId(0));
        assert_eq!(machines.len(), 1);
        assert_eq!(machines[0].machine_type(), miner);
        assert!(!machines[0].is_active());
        assert_eq!(machines[0].current_recipe(), Some(recipe(&cat, "mine_ore")));
        assert_eq!(ledger.get(resource(&cat, "iron")), 0.0);
    }

    #[test]
    fn build_insufficient_leaves_state_unchanged() {
        let cat = sample_catalog();
        let smelter = machine_type(&cat, "smelter");
        let mut ledger = ledger_with(&cat, &[("iron", 49.0), ("energy", 5.0)]);
        let before = ledger.clone();
        let mut machines = Vec::new();

        let err = build(&cat, &mut ledger, &mut machines, smelter).unwrap_err();

        match err {
            BuildError::InsufficientResources { machine, missing } => {
                assert_eq!(machine, "Smelter");
                assert_eq!(
                    missing,
                    vec![Shortfall {
                        resource: resource(&cat, "iron"),
                        required: 50.0,
                        available: 49.0,
                    }]
                );
            }
            other => panic!("expected InsufficientResources, got: {other:?}"),
        }
        assert_eq!(ledger, before);
        assert!(machines.is_empty());
    }

    #[test]
    fn build_is_all_or_nothing_across_cost_entries() {
        let mut b = CatalogBuilder::new();
        let iron = b.register_resource("iron", "Iron", "g", 0.0);
        let energy = b.register_resource("energy", "Energy", "J", 0.0);
        let lab = b.register_machine("lab", "Lab", vec![rate(iron, 5.0), rate(energy, 5.0)], 0);
        let cat = b.build().unwrap();

        let mut ledger = Ledger::with_resources(2);
        ledger.set(iron, 100.0);
        ledger.set(energy, 4.0);
        let mut machines = Vec::new();

        assert!(build(&cat, &mut ledger, &mut machines, lab).is_err());
        assert_eq!(ledger.get(iron), 100.0);
        assert_eq!(ledger.get(energy), 4.0);
    }

    #[test]
    fn build_unknown_type_fails() {
        let cat = sample_catalog();
        let mut ledger = Ledger::new();
        let mut machines = Vec::new();
        assert_eq!(
            build(&cat, &mut ledger, &mut machines, MachineTypeId(42)),
            Err(BuildError::UnknownMachineType(MachineTypeId(42)))
        );
    }

    #[test]
    fn error_display_messages() {
        let e = BuildError::InsufficientResources {
            machine: "Smelter".to_string(),
            missing: vec![],
        };
        assert!(format!("{e}").contains("Smelter"));
        let e = BuildError::UnknownMachineName("Forge".to_string());
        assert!(format!("{e}").contains("Forge"));
    }
}

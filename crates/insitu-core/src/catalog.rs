use crate::id::*;
use std::collections::{HashMap, HashSet};

/// A resource type definition in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDef {
    /// Data-file key, e.g. `"iron_ore"`.
    pub key: String,
    /// Player-visible name.
    pub name: String,
    /// Unit symbol used by the formatter, e.g. `"g"`.
    pub unit: String,
    pub starting_amount: f64,
}

/// An amount of a resource: a build cost entry, or a recipe rate per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceAmount {
    pub resource: ResourceId,
    pub amount: f64,
}

impl ResourceAmount {
    pub fn new(resource: ResourceId, amount: f64) -> Self {
        Self { resource, amount }
    }
}

/// A machine type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineTypeDef {
    pub key: String,
    pub name: String,
    /// Resources deducted when one instance is built. May be empty.
    pub cost: Vec<ResourceAmount>,
    /// Instances present when a session starts.
    pub starting_count: u32,
}

/// A recipe definition. Rates are per second of simulated time.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDef {
    pub key: String,
    /// Machine types allowed to run this recipe.
    pub machines: Vec<MachineTypeId>,
    pub inputs: Vec<ResourceAmount>,
    pub outputs: Vec<ResourceAmount>,
}

/// A manual harvest action offered to the player.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestDef {
    pub key: String,
    /// Player-visible action label, e.g. `"Mine ore"`.
    pub action: String,
    pub resource: ResourceId,
    pub amount: f64,
}

/// Builder for constructing an immutable Catalog.
/// Two-phase lifecycle: registration -> finalization.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    resources: Vec<ResourceDef>,
    resource_key_to_id: HashMap<String, ResourceId>,
    machines: Vec<MachineTypeDef>,
    machine_key_to_id: HashMap<String, MachineTypeId>,
    recipes: Vec<RecipeDef>,
    recipe_key_to_id: HashMap<String, RecipeId>,
    harvests: Vec<HarvestDef>,
    harvest_key_to_id: HashMap<String, HarvestId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register a resource. Returns its ID.
    pub fn register_resource(
        &mut self,
        key: &str,
        name: &str,
        unit: &str,
        starting_amount: f64,
    ) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(ResourceDef {
            key: key.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            starting_amount,
        });
        self.resource_key_to_id.entry(key.to_string()).or_insert(id);
        id
    }

    /// Phase 1: Register a machine type. Returns its ID.
    pub fn register_machine(
        &mut self,
        key: &str,
        name: &str,
        cost: Vec<ResourceAmount>,
        starting_count: u32,
    ) -> MachineTypeId {
        let id = MachineTypeId(self.machines.len() as u32);
        self.machines.push(MachineTypeDef {
            key: key.to_string(),
            name: name.to_string(),
            cost,
            starting_count,
        });
        self.machine_key_to_id.entry(key.to_string()).or_insert(id);
        id
    }

    /// Phase 1: Register a recipe. Returns its ID.
    pub fn register_recipe(
        &mut self,
        key: &str,
        machines: Vec<MachineTypeId>,
        inputs: Vec<ResourceAmount>,
        outputs: Vec<ResourceAmount>,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(RecipeDef {
            key: key.to_string(),
            machines,
            inputs,
            outputs,
        });
        self.recipe_key_to_id.entry(key.to_string()).or_insert(id);
        id
    }

    /// Phase 1: Register a harvest action. Returns its ID.
    pub fn register_harvest(
        &mut self,
        key: &str,
        action: &str,
        resource: ResourceId,
        amount: f64,
    ) -> HarvestId {
        let id = HarvestId(self.harvests.len() as u32);
        self.harvests.push(HarvestDef {
            key: key.to_string(),
            action: action.to_string(),
            resource,
            amount,
        });
        self.harvest_key_to_id.entry(key.to_string()).or_insert(id);
        id
    }

    pub fn resource_id(&self, key: &str) -> Option<ResourceId> {
        self.resource_key_to_id.get(key).copied()
    }

    pub fn machine_id(&self, key: &str) -> Option<MachineTypeId> {
        self.machine_key_to_id.get(key).copied()
    }

    pub fn recipe_id(&self, key: &str) -> Option<RecipeId> {
        self.recipe_key_to_id.get(key).copied()
    }

    /// Phase 2: Validate and freeze into an immutable catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        check_unique_keys("resource", self.resources.iter().map(|r| r.key.as_str()))?;
        check_unique_keys("machine", self.machines.iter().map(|m| m.key.as_str()))?;
        check_unique_keys("recipe", self.recipes.iter().map(|r| r.key.as_str()))?;
        check_unique_keys("harvest", self.harvests.iter().map(|h| h.key.as_str()))?;

        let resource_count = self.resources.len();
        let check_resource = |entry: &str, resource: ResourceId| {
            if resource.0 as usize >= resource_count {
                Err(CatalogError::InvalidResourceRef {
                    entry: entry.to_string(),
                    resource,
                })
            } else {
                Ok(())
            }
        };

        for resource in &self.resources {
            check_amount(&resource.key, resource.starting_amount)?;
        }

        for machine in &self.machines {
            check_unique_resources(&machine.key, &machine.cost)?;
            for cost in &machine.cost {
                check_resource(&machine.key, cost.resource)?;
                check_amount(&machine.key, cost.amount)?;
            }
        }

        for recipe in &self.recipes {
            for &machine in &recipe.machines {
                if machine.0 as usize >= self.machines.len() {
                    return Err(CatalogError::InvalidMachineRef {
                        entry: recipe.key.clone(),
                        machine,
                    });
                }
            }
            check_unique_resources(&recipe.key, &recipe.inputs)?;
            check_unique_resources(&recipe.key, &recipe.outputs)?;
            for rate in recipe.inputs.iter().chain(recipe.outputs.iter()) {
                check_resource(&recipe.key, rate.resource)?;
                if !rate.amount.is_finite() {
                    return Err(CatalogError::InvalidAmount {
                        entry: recipe.key.clone(),
                        amount: rate.amount,
                    });
                }
            }
        }

        for harvest in &self.harvests {
            check_resource(&harvest.key, harvest.resource)?;
            check_amount(&harvest.key, harvest.amount)?;
        }

        // Eligible recipes per machine type, in registration order.
        let mut recipes_by_machine = vec![Vec::new(); self.machines.len()];
        for (idx, recipe) in self.recipes.iter().enumerate() {
            for machine in &recipe.machines {
                let list: &mut Vec<RecipeId> = &mut recipes_by_machine[machine.0 as usize];
                let id = RecipeId(idx as u32);
                if !list.contains(&id) {
                    list.push(id);
                }
            }
        }

        Ok(Catalog {
            resources: self.resources,
            resource_key_to_id: self.resource_key_to_id,
            machines: self.machines,
            machine_key_to_id: self.machine_key_to_id,
            recipes: self.recipes,
            recipe_key_to_id: self.recipe_key_to_id,
            harvests: self.harvests,
            harvest_key_to_id: self.harvest_key_to_id,
            recipes_by_machine,
        })
    }
}

fn check_unique_keys<'a>(
    kind: &'static str,
    keys: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(CatalogError::DuplicateKey {
                kind,
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

/// Each resource may appear at most once in a cost or rate list.
fn check_unique_resources(entry: &str, amounts: &[ResourceAmount]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for amount in amounts {
        if !seen.insert(amount.resource) {
            return Err(CatalogError::DuplicateResource {
                entry: entry.to_string(),
                resource: amount.resource,
            });
        }
    }
    Ok(())
}

fn check_amount(entry: &str, amount: f64) -> Result<(), CatalogError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidAmount {
            entry: entry.to_string(),
            amount,
        })
    }
}

/// Immutable catalog. Frozen after build(). Thread-safe to share.
#[derive(Debug)]
pub struct Catalog {
    resources: Vec<ResourceDef>,
    resource_key_to_id: HashMap<String, ResourceId>,
    machines: Vec<MachineTypeDef>,
    machine_key_to_id: HashMap<String, MachineTypeId>,
    recipes: Vec<RecipeDef>,
    recipe_key_to_id: HashMap<String, RecipeId>,
    harvests: Vec<HarvestDef>,
    harvest_key_to_id: HashMap<String, HarvestId>,
    recipes_by_machine: Vec<Vec<RecipeId>>,
}

impl Catalog {
    pub fn get_resource(&self, id: ResourceId) -> Option<&ResourceDef> {
        self.resources.get(id.0 as usize)
    }

    pub fn get_machine(&self, id: MachineTypeId) -> Option<&MachineTypeDef> {
        self.machines.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn get_harvest(&self, id: HarvestId) -> Option<&HarvestDef> {
        self.harvests.get(id.0 as usize)
    }

    pub fn resource_id(&self, key: &str) -> Option<ResourceId> {
        self.resource_key_to_id.get(key).copied()
    }

    pub fn machine_id(&self, key: &str) -> Option<MachineTypeId> {
        self.machine_key_to_id.get(key).copied()
    }

    pub fn recipe_id(&self, key: &str) -> Option<RecipeId> {
        self.recipe_key_to_id.get(key).copied()
    }

    pub fn harvest_id(&self, key: &str) -> Option<HarvestId> {
        self.harvest_key_to_id.get(key).copied()
    }

    /// Look up a machine type by its player-visible name.
    pub fn machine_id_by_name(&self, name: &str) -> Option<MachineTypeId> {
        self.machines
            .iter()
            .position(|m| m.name == name)
            .map(|idx| MachineTypeId(idx as u32))
    }

    /// Look up a harvest action by its player-visible label.
    pub fn harvest_id_by_action(&self, action: &str) -> Option<HarvestId> {
        self.harvests
            .iter()
            .position(|h| h.action == action)
            .map(|idx| HarvestId(idx as u32))
    }

    /// Recipes the given machine type may run, in catalog order. Empty for
    /// unknown machine types.
    pub fn eligible_recipes(&self, machine: MachineTypeId) -> &[RecipeId] {
        self.recipes_by_machine
            .get(machine.0 as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &ResourceDef)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, def)| (ResourceId(i as u32), def))
    }

    pub fn machines(&self) -> impl Iterator<Item = (MachineTypeId, &MachineTypeDef)> {
        self.machines
            .iter()
            .enumerate()
            .map(|(i, def)| (MachineTypeId(i as u32), def))
    }

    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &RecipeDef)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, def)| (RecipeId(i as u32), def))
    }

    pub fn harvests(&self) -> impl Iterator<Item = (HarvestId, &HarvestDef)> {
        self.harvests
            .iter()
            .enumerate()
            .map(|(i, def)| (HarvestId(i as u32), def))
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn harvest_count(&self) -> usize {
        self.harvests.len()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate {kind} key: {key}")]
    DuplicateKey { kind: &'static str, key: String },
    #[error("invalid resource reference {resource:?} in '{entry}'")]
    InvalidResourceRef { entry: String, resource: ResourceId },
    #[error("resource {resource:?} listed more than once in '{entry}'")]
    DuplicateResource { entry: String, resource: ResourceId },
    #[error("invalid machine reference {machine:?} in '{entry}'")]
    InvalidMachineRef { entry: String, machine: MachineTypeId },
    #[error("invalid amount {amount} in '{entry}'")]
    InvalidAmount { entry: String, amount: f64 },
}

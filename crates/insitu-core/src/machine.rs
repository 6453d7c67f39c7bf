use crate::catalog::Catalog;
use crate::id::{MachineTypeId, RecipeId};

/// Runtime production state of a machine, updated by each production pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MachineState {
    /// Inactive, or no recipe assigned.
    #[default]
    Idle,
    /// Ran last tick at the given craft ratio (0, 1].
    Working { ratio: f64 },
    /// Active with a recipe, but an input ran dry.
    Stalled,
}

/// A built machine instance.
///
/// The eligible recipe list is computed once from the catalog at
/// construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    machine_type: MachineTypeId,
    active: bool,
    current_recipe: Option<RecipeId>,
    recipes: Vec<RecipeId>,
    pub(crate) state: MachineState,
}

impl Machine {
    /// Create an inactive machine whose current recipe is the first eligible
    /// one, if any.
    pub fn new(catalog: &Catalog, machine_type: MachineTypeId) -> Self {
        let recipes = catalog.eligible_recipes(machine_type).to_vec();
        Self {
            machine_type,
            active: false,
            current_recipe: recipes.first().copied(),
            recipes,
            state: MachineState::Idle,
        }
    }

    pub fn machine_type(&self) -> MachineTypeId {
        self.machine_type
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flip the active flag. Returns the new value.
    pub fn toggle_active(&mut self) -> bool {
        self.set_active(!self.active);
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.state = MachineState::Idle;
        }
    }

    pub fn current_recipe(&self) -> Option<RecipeId> {
        self.current_recipe
    }

    /// Recipes this machine may run.
    pub fn recipes(&self) -> &[RecipeId] {
        &self.recipes
    }

    /// Assign a recipe. Recipes outside the eligible list are ignored and
    /// `false` is returned.
    pub fn set_recipe(&mut self, recipe: RecipeId) -> bool {
        if self.recipes.contains(&recipe) {
            self.current_recipe = Some(recipe);
            true
        } else {
            false
        }
    }

    /// Assign the recipe at `index` in the eligible list.
    pub fn set_recipe_index(&mut self, index: usize) -> bool {
        match self.recipes.get(index) {
            Some(&recipe) => {
                self.current_recipe = Some(recipe);
                true
            }
            None => false,
        }
    }

    /// Active with a recipe assigned, i.e. considered by the production pass.
    pub fn is_running(&self) -> bool {
        self.active && self.current_recipe.is_some()
    }

    pub fn state(&self) -> MachineState {
        self.state
    }
}

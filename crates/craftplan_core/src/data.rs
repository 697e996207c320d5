//! The crafting dataset: items, machines, and recipes.
//!
//! Datasets are data-driven definitions owned by the surrounding
//! application and read (never mutated) by the planning engines. All
//! amounts are fixed-point; see [`crate::math`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::math::{fixed_serde, Fixed, SECONDS_PER_MINUTE};

/// Unique identifier for items.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey(String);

impl ItemKey {
    /// Create a new item key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ItemKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Unique identifier for machines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineKey(String);

impl MachineKey {
    /// Create a new machine key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MachineKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for MachineKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Unique identifier for recipes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(String);

impl RecipeId {
    /// Create a new recipe id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecipeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An item definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique key; referenced everywhere else.
    pub key: ItemKey,
    /// Display name of the item.
    pub display_name: String,
    /// Whether the item is treated as externally supplied. Raw inputs
    /// are never resolved through a recipe, even if one produces them.
    pub is_raw_input: bool,
    /// Relative value score used only by the supply optimizer.
    /// Zero means unvalued.
    pub value: u32,
}

impl Item {
    /// Create a new item definition.
    #[must_use]
    pub fn new(key: impl Into<ItemKey>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            is_raw_input: false,
            value: 0,
        }
    }

    /// Mark the item as a raw input.
    #[must_use]
    pub fn raw(mut self) -> Self {
        self.is_raw_input = true;
        self
    }

    /// Set the optimizer value score.
    #[must_use]
    pub fn with_value(mut self, value: u32) -> Self {
        self.value = value;
        self
    }
}

/// A machine definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique key.
    pub key: MachineKey,
    /// Display name of the machine.
    pub display_name: String,
    /// Time for one recipe execution, in seconds. A machine with
    /// `cycle_seconds <= 0` yields zero throughput and its recipes are
    /// treated as infeasible.
    pub cycle_seconds: i32,
    /// Declared input slot count (validation concern, unused here).
    pub input_slots: u32,
    /// Declared output slot count (validation concern, unused here).
    pub output_slots: u32,
}

impl Machine {
    /// Create a new machine definition.
    #[must_use]
    pub fn new(
        key: impl Into<MachineKey>,
        display_name: impl Into<String>,
        cycle_seconds: i32,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            cycle_seconds,
            input_slots: 0,
            output_slots: 0,
        }
    }

    /// Set declared slot counts.
    #[must_use]
    pub fn with_slots(mut self, input_slots: u32, output_slots: u32) -> Self {
        self.input_slots = input_slots;
        self.output_slots = output_slots;
        self
    }

    /// Recipe executions per minute, or zero for a degenerate cycle time.
    #[must_use]
    pub fn runs_per_minute(&self) -> Fixed {
        if self.cycle_seconds <= 0 {
            return Fixed::ZERO;
        }
        Fixed::from_num(SECONDS_PER_MINUTE) / Fixed::from_num(self.cycle_seconds)
    }
}

/// A quantity of one item, used for recipe inputs/outputs and demands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item.
    pub item: ItemKey,
    /// The amount. Positive for all well-formed recipe entries.
    #[serde(with = "fixed_serde")]
    pub amount: Fixed,
}

impl ItemStack {
    /// Create a new stack.
    #[must_use]
    pub fn new(item: impl Into<ItemKey>, amount: Fixed) -> Self {
        Self {
            item: item.into(),
            amount,
        }
    }

    /// Sum stacks sharing an item key, returning one stack per key in
    /// key order.
    #[must_use]
    pub fn combine_same_keys<I>(stacks: I) -> Vec<ItemStack>
    where
        I: IntoIterator<Item = ItemStack>,
    {
        let mut map: BTreeMap<ItemKey, Fixed> = BTreeMap::new();
        for stack in stacks {
            *map.entry(stack.item).or_insert(Fixed::ZERO) += stack.amount;
        }
        map.into_iter()
            .map(|(item, amount)| ItemStack { item, amount })
            .collect()
    }
}

/// A recipe: one machine cycle converting inputs to outputs.
///
/// A recipe may produce more than one output item; outputs other than
/// the one being resolved for a given branch are byproducts. Multiple
/// recipes may produce the same item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique id.
    pub id: RecipeId,
    /// Display name of the recipe.
    pub display_name: String,
    /// The machine that executes this recipe.
    pub machine: MachineKey,
    /// Ordered input stacks.
    pub inputs: Vec<ItemStack>,
    /// Ordered output stacks.
    pub outputs: Vec<ItemStack>,
}

impl Recipe {
    /// Create a new recipe with no inputs or outputs.
    #[must_use]
    pub fn new(
        id: impl Into<RecipeId>,
        display_name: impl Into<String>,
        machine: impl Into<MachineKey>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            machine: machine.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the input stacks.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<ItemStack>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the output stacks.
    #[must_use]
    pub fn with_outputs(mut self, outputs: Vec<ItemStack>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Amount of `item` produced per run, from the first matching
    /// output stack. `None` if this recipe does not produce the item.
    #[must_use]
    pub fn output_amount(&self, item: &ItemKey) -> Option<Fixed> {
        self.outputs
            .iter()
            .find(|stack| stack.item == *item)
            .map(|stack| stack.amount)
    }

    /// Whether this recipe lists `item` among its outputs.
    #[must_use]
    pub fn produces(&self, item: &ItemKey) -> bool {
        self.outputs.iter().any(|stack| stack.item == *item)
    }
}

/// Registry containing all items, machines, and recipes.
///
/// Provides lookup by key for planning. Removal is blocked while the
/// entry is referenced by a recipe; demands are session-owned, so the
/// caller clears any pending demand referencing the entry first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Items indexed by key.
    items: BTreeMap<ItemKey, Item>,
    /// Machines indexed by key.
    machines: BTreeMap<MachineKey, Machine>,
    /// Recipes in registration order. Order matters: the demand engine
    /// enumerates alternatives in recipe-index order.
    recipes: Vec<Recipe>,
}

impl Dataset {
    /// Create an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an item.
    pub fn register_item(&mut self, item: Item) {
        self.items.insert(item.key.clone(), item);
    }

    /// Register (or replace) a machine.
    pub fn register_machine(&mut self, machine: Machine) {
        self.machines.insert(machine.key.clone(), machine);
    }

    /// Register a recipe.
    ///
    /// Returns `Err` if a recipe with the same id already exists.
    pub fn register_recipe(&mut self, recipe: Recipe) -> Result<()> {
        if self.recipes.iter().any(|r| r.id == recipe.id) {
            return Err(PlanError::DuplicateKey(recipe.id.to_string()));
        }
        self.recipes.push(recipe);
        Ok(())
    }

    /// Get an item by key.
    #[must_use]
    pub fn item(&self, key: &ItemKey) -> Option<&Item> {
        self.items.get(key)
    }

    /// Get a machine by key.
    #[must_use]
    pub fn machine(&self, key: &MachineKey) -> Option<&Machine> {
        self.machines.get(key)
    }

    /// Get a recipe by id.
    #[must_use]
    pub fn recipe(&self, id: &RecipeId) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == *id)
    }

    /// All recipes, in registration order.
    #[must_use]
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// All registered items.
    pub fn all_items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// All registered machines.
    pub fn all_machines(&self) -> impl Iterator<Item = &Machine> {
        self.machines.values()
    }

    /// Whether `key` refers to a raw-input item.
    #[must_use]
    pub fn is_raw_input(&self, key: &ItemKey) -> bool {
        self.items.get(key).is_some_and(|item| item.is_raw_input)
    }

    /// Optimizer value score for an item, zero if unknown.
    #[must_use]
    pub fn item_value(&self, key: &ItemKey) -> Fixed {
        Fixed::from_num(self.items.get(key).map_or(0, |item| item.value))
    }

    /// Recipe executions per minute for a machine key; zero when the
    /// machine is missing or its cycle time is degenerate.
    #[must_use]
    pub fn runs_per_minute(&self, key: &MachineKey) -> Fixed {
        self.machines
            .get(key)
            .map_or(Fixed::ZERO, Machine::runs_per_minute)
    }

    /// Remove an item.
    ///
    /// Returns `Err` if any recipe references the item as an input or
    /// output, leaving the dataset unchanged.
    pub fn remove_item(&mut self, key: &ItemKey) -> Result<Item> {
        if let Some(recipe) = self.recipes.iter().find(|r| {
            r.inputs.iter().any(|s| s.item == *key) || r.outputs.iter().any(|s| s.item == *key)
        }) {
            return Err(PlanError::ItemInUse(key.clone(), recipe.id.clone()));
        }
        self.items
            .remove(key)
            .ok_or_else(|| PlanError::UnknownItem(key.clone()))
    }

    /// Remove a machine.
    ///
    /// Returns `Err` if any recipe runs on the machine, leaving the
    /// dataset unchanged.
    pub fn remove_machine(&mut self, key: &MachineKey) -> Result<Machine> {
        if let Some(recipe) = self.recipes.iter().find(|r| r.machine == *key) {
            return Err(PlanError::MachineInUse(key.clone(), recipe.id.clone()));
        }
        self.machines
            .remove(key)
            .ok_or_else(|| PlanError::UnknownMachine(key.clone()))
    }

    /// Remove a recipe by id.
    pub fn remove_recipe(&mut self, id: &RecipeId) -> Result<Recipe> {
        let index = self
            .recipes
            .iter()
            .position(|r| r.id == *id)
            .ok_or_else(|| PlanError::UnknownRecipe(id.clone()))?;
        Ok(self.recipes.remove(index))
    }
}

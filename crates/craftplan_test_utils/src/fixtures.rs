//! Test fixtures and helpers.
//!
//! Pre-built datasets for consistent testing across crates.

use craftplan_core::data::{Dataset, Item, ItemStack, Machine, Recipe};
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real planning code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Two raw inputs feeding a single plate recipe.
///
/// `2 iron + 1 copper -> 1 plate` on a 10 second press.
#[must_use]
pub fn plate_chain() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.register_item(Item::new("iron", "Iron").raw());
    dataset.register_item(Item::new("copper", "Copper").raw());
    dataset.register_item(Item::new("plate", "Plate").with_value(5));
    dataset.register_machine(Machine::new("press", "Press", 10));
    dataset
        .register_recipe(
            Recipe::new("press_plate", "Press Plate", "press")
                .with_inputs(vec![
                    ItemStack::new("iron", fixed(2)),
                    ItemStack::new("copper", fixed(1)),
                ])
                .with_outputs(vec![ItemStack::new("plate", fixed(1))]),
        )
        .expect("fixture recipe ids are unique");
    dataset
}

/// One item producible by `count` alternative recipes (`alt0`, `alt1`, ...),
/// each consuming a distinct raw input on its own machine.
#[must_use]
pub fn alternatives(count: usize) -> Dataset {
    let mut dataset = Dataset::new();
    dataset.register_item(Item::new("gadget", "Gadget").with_value(3));
    for i in 0..count {
        let ore = format!("ore{i}");
        let machine = format!("mach{i}");
        dataset.register_item(Item::new(ore.clone(), format!("Ore {i}")).raw());
        dataset.register_machine(Machine::new(machine.clone(), format!("Machine {i}"), 5));
        dataset
            .register_recipe(
                Recipe::new(format!("alt{i}"), format!("Alt {i}"), machine)
                    .with_inputs(vec![ItemStack::new(ore, fixed(1))])
                    .with_outputs(vec![ItemStack::new("gadget", fixed(1))]),
            )
            .expect("fixture recipe ids are unique");
    }
    dataset
}

/// Two recipes that each require the other's output. No raw escape
/// route, so every expansion path is blocked.
#[must_use]
pub fn cyclic_pair() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.register_item(Item::new("a", "Alpha"));
    dataset.register_item(Item::new("b", "Beta"));
    dataset.register_machine(Machine::new("loop", "Loop", 5));
    dataset
        .register_recipe(
            Recipe::new("a_from_b", "A from B", "loop")
                .with_inputs(vec![ItemStack::new("b", fixed(1))])
                .with_outputs(vec![ItemStack::new("a", fixed(1))]),
        )
        .expect("fixture recipe ids are unique");
    dataset
        .register_recipe(
            Recipe::new("b_from_a", "B from A", "loop")
                .with_inputs(vec![ItemStack::new("a", fixed(1))])
                .with_outputs(vec![ItemStack::new("b", fixed(1))]),
        )
        .expect("fixture recipe ids are unique");
    dataset
}

/// A smelting chain with a byproduct: `3 ore -> 1 metal + 2 slag`.
#[must_use]
pub fn smelting_with_byproduct() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.register_item(Item::new("ore", "Ore").raw());
    dataset.register_item(Item::new("metal", "Metal").with_value(4));
    dataset.register_item(Item::new("slag", "Slag").with_value(1));
    dataset.register_machine(Machine::new("furnace", "Furnace", 5));
    dataset
        .register_recipe(
            Recipe::new("smelt", "Smelt", "furnace")
                .with_inputs(vec![ItemStack::new("ore", fixed(3))])
                .with_outputs(vec![
                    ItemStack::new("metal", fixed(1)),
                    ItemStack::new("slag", fixed(2)),
                ]),
        )
        .expect("fixture recipe ids are unique");
    dataset
}

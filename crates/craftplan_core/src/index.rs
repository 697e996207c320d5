//! Recipe index: produced item to producing recipes.
//!
//! Pure and stateless; rebuilt on every solve. Datasets are small
//! enough that re-indexing cost is immaterial.

use std::collections::BTreeMap;

use crate::data::{Dataset, ItemKey, Recipe};

/// Mapping from produced item key to the recipes that produce it.
///
/// A recipe with N output items appears under N keys. Within a key,
/// recipes keep dataset registration order; the demand engine relies on
/// that order for deterministic alternative enumeration.
#[derive(Debug, Clone, Default)]
pub struct RecipeIndex {
    by_output: BTreeMap<ItemKey, Vec<usize>>,
}

impl RecipeIndex {
    /// Build the index for a dataset.
    #[must_use]
    pub fn build(dataset: &Dataset) -> Self {
        let mut by_output: BTreeMap<ItemKey, Vec<usize>> = BTreeMap::new();
        for (index, recipe) in dataset.recipes().iter().enumerate() {
            for output in &recipe.outputs {
                let entries = by_output.entry(output.item.clone()).or_default();
                // A recipe listing the same output twice is one producer
                if !entries.contains(&index) {
                    entries.push(index);
                }
            }
        }
        Self { by_output }
    }

    /// Indices (into the dataset recipe list) of recipes producing `item`.
    #[must_use]
    pub fn producers(&self, item: &ItemKey) -> &[usize] {
        self.by_output.get(item).map_or(&[], Vec::as_slice)
    }

    /// Iterate the recipes producing `item`, in index order.
    pub fn producing_recipes<'a>(
        &'a self,
        dataset: &'a Dataset,
        item: &ItemKey,
    ) -> impl Iterator<Item = &'a Recipe> {
        self.producers(item)
            .iter()
            .map(move |&index| &dataset.recipes()[index])
    }

    /// Whether any recipe produces `item`.
    #[must_use]
    pub fn is_producible(&self, item: &ItemKey) -> bool {
        !self.producers(item).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Item, ItemStack, Machine, Recipe};
    use crate::math::Fixed;

    fn fx(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn multi_output_dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.register_item(Item::new("ore", "Ore").raw());
        dataset.register_item(Item::new("metal", "Metal"));
        dataset.register_item(Item::new("slag", "Slag"));
        dataset.register_machine(Machine::new("furnace", "Furnace", 5));
        dataset
            .register_recipe(
                Recipe::new("smelt", "Smelt", "furnace")
                    .with_inputs(vec![ItemStack::new("ore", fx(3))])
                    .with_outputs(vec![
                        ItemStack::new("metal", fx(1)),
                        ItemStack::new("slag", fx(2)),
                    ]),
            )
            .unwrap();
        dataset
            .register_recipe(
                Recipe::new("resmelt", "Re-smelt", "furnace")
                    .with_inputs(vec![ItemStack::new("slag", fx(4))])
                    .with_outputs(vec![ItemStack::new("metal", fx(1))]),
            )
            .unwrap();
        dataset
    }

    #[test]
    fn test_multi_output_recipe_indexed_under_every_output() {
        let dataset = multi_output_dataset();
        let index = RecipeIndex::build(&dataset);

        assert_eq!(index.producers(&"metal".into()), &[0, 1]);
        assert_eq!(index.producers(&"slag".into()), &[0]);
        assert!(index.producers(&"ore".into()).is_empty());
    }

    #[test]
    fn test_producers_keep_registration_order() {
        let dataset = multi_output_dataset();
        let index = RecipeIndex::build(&dataset);

        let ids: Vec<_> = index
            .producing_recipes(&dataset, &"metal".into())
            .map(|r| r.id.as_str().to_owned())
            .collect();
        assert_eq!(ids, vec!["smelt", "resmelt"]);
    }

    #[test]
    fn test_is_producible() {
        let dataset = multi_output_dataset();
        let index = RecipeIndex::build(&dataset);
        assert!(index.is_producible(&"metal".into()));
        assert!(!index.is_producible(&"ore".into()));
        assert!(!index.is_producible(&"unknown".into()));
    }

    #[test]
    fn test_duplicate_output_listed_once() {
        let mut dataset = Dataset::new();
        dataset.register_machine(Machine::new("m", "M", 5));
        dataset
            .register_recipe(Recipe::new("r", "R", "m").with_outputs(vec![
                ItemStack::new("x", fx(1)),
                ItemStack::new("x", fx(1)),
            ]))
            .unwrap();
        let index = RecipeIndex::build(&dataset);
        assert_eq!(index.producers(&"x".into()), &[0]);
    }
}

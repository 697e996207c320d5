//! Demand resolution engine.
//!
//! Expands a set of desired item quantities into trees of recipe
//! applications down to raw inputs, enumerating up to `max_patterns`
//! alternative solutions. Alternatives arise wherever more than one
//! recipe produces an item; the engine combines per-input alternatives
//! by cartesian product, truncating against the pattern budget as it
//! goes so intermediate sets never outgrow the cap.
//!
//! Cyclic recipe references are blocked per branch: an item already on
//! the current expansion path contributes zero expansions, so a fully
//! cyclic dependency yields "no solution" rather than infinite descent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::clamp_patterns;
use crate::data::{Dataset, ItemKey, ItemStack, RecipeId};
use crate::error::{PlanError, Result};
use crate::index::RecipeIndex;
use crate::math::{add_to, fixed_map_serde, fixed_serde, merge_into, Fixed};

/// A requested quantity of a finished item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    /// The demanded item.
    pub item: ItemKey,
    /// Desired absolute amount. Must be positive.
    #[serde(with = "fixed_serde")]
    pub amount: Fixed,
}

impl Demand {
    /// Create a new demand.
    #[must_use]
    pub fn new(item: impl Into<ItemKey>, amount: Fixed) -> Self {
        Self {
            item: item.into(),
            amount,
        }
    }
}

/// Produced/consumed ledger entry for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemBalance {
    /// Total amount produced across the solution.
    #[serde(with = "fixed_serde")]
    pub produced: Fixed,
    /// Total amount consumed across the solution.
    #[serde(with = "fixed_serde")]
    pub consumed: Fixed,
}

impl ItemBalance {
    /// Net surplus (positive) or external intake (negative).
    #[must_use]
    pub fn net(&self) -> Fixed {
        self.produced - self.consumed
    }
}

/// Aggregated report for one solution.
///
/// Built fresh per solve; only [`NeedResult::merge`] combines partial
/// results while composing patterns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NeedResult {
    /// Raw-input totals: item to required external amount.
    #[serde(with = "fixed_map_serde")]
    pub inputs: BTreeMap<ItemKey, Fixed>,
    /// Byproduct totals: non-primary outputs accumulated tree-wide.
    #[serde(with = "fixed_map_serde")]
    pub byproducts: BTreeMap<ItemKey, Fixed>,
    /// Recipe id to total run count.
    #[serde(with = "fixed_map_serde")]
    pub recipe_runs: BTreeMap<RecipeId, Fixed>,
    /// Per-item produced/consumed ledger.
    pub balance: BTreeMap<ItemKey, ItemBalance>,
}

impl NeedResult {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw-input requirement: the amount enters both the raw
    /// totals and the consumed side of the ledger.
    pub fn add_raw_input(&mut self, item: ItemKey, amount: Fixed) {
        add_to(&mut self.inputs, item.clone(), amount);
        self.add_consumed(item, amount);
    }

    /// Record recipe runs.
    pub fn add_recipe_runs(&mut self, recipe: RecipeId, runs: Fixed) {
        add_to(&mut self.recipe_runs, recipe, runs);
    }

    /// Record a byproduct amount.
    pub fn add_byproduct(&mut self, item: ItemKey, amount: Fixed) {
        add_to(&mut self.byproducts, item, amount);
    }

    /// Record production of an item.
    pub fn add_produced(&mut self, item: ItemKey, amount: Fixed) {
        self.balance.entry(item).or_default().produced += amount;
    }

    /// Record consumption of an item.
    pub fn add_consumed(&mut self, item: ItemKey, amount: Fixed) {
        self.balance.entry(item).or_default().consumed += amount;
    }

    /// Additively merge two reports into a new one.
    #[must_use]
    pub fn merge(&self, other: &NeedResult) -> NeedResult {
        let mut merged = self.clone();
        merge_into(&mut merged.inputs, &other.inputs);
        merge_into(&mut merged.byproducts, &other.byproducts);
        merge_into(&mut merged.recipe_runs, &other.recipe_runs);
        for (item, balance) in &other.balance {
            let entry = merged.balance.entry(item.clone()).or_default();
            entry.produced += balance.produced;
            entry.consumed += balance.consumed;
        }
        merged
    }

    /// Total recipe runs across all recipes.
    #[must_use]
    pub fn total_runs(&self) -> Fixed {
        self.recipe_runs
            .values()
            .fold(Fixed::ZERO, |acc, runs| acc + *runs)
    }

    /// Total machine-seconds: runs times each recipe's cycle time.
    /// Recipes missing from the dataset contribute zero.
    #[must_use]
    pub fn total_machine_seconds(&self, dataset: &Dataset) -> Fixed {
        self.recipe_runs
            .iter()
            .fold(Fixed::ZERO, |acc, (id, runs)| {
                let seconds = dataset
                    .recipe(id)
                    .and_then(|r| dataset.machine(&r.machine))
                    .map_or(0, |m| m.cycle_seconds.max(0));
                acc + *runs * Fixed::from_num(seconds)
            })
    }

    /// Count of distinct machines referenced by the recipe-run map.
    #[must_use]
    pub fn distinct_machines(&self, dataset: &Dataset) -> usize {
        let machines: BTreeSet<_> = self
            .recipe_runs
            .keys()
            .filter_map(|id| dataset.recipe(id))
            .map(|recipe| recipe.machine.clone())
            .collect();
        machines.len()
    }
}

/// One node of a solution tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeedNode {
    /// A raw-input leaf: the branch terminates at external supply.
    Raw {
        /// The raw item.
        item: ItemKey,
        /// Amount required from external supply.
        #[serde(with = "fixed_serde")]
        required: Fixed,
    },
    /// A recipe application with one child per recipe input.
    Recipe {
        /// The item this node produces for its parent.
        item: ItemKey,
        /// Amount required by the parent.
        #[serde(with = "fixed_serde")]
        required: Fixed,
        /// The applied recipe.
        recipe: RecipeId,
        /// Number of recipe runs.
        #[serde(with = "fixed_serde")]
        runs: Fixed,
        /// Non-primary outputs of this application.
        #[serde(with = "fixed_map_serde")]
        byproducts: BTreeMap<ItemKey, Fixed>,
        /// Ordered children, one per recipe input.
        children: Vec<NeedNode>,
    },
}

impl NeedNode {
    /// The item this node resolves.
    #[must_use]
    pub fn item(&self) -> &ItemKey {
        match self {
            NeedNode::Raw { item, .. } | NeedNode::Recipe { item, .. } => item,
        }
    }

    /// The amount required of this node's item.
    #[must_use]
    pub fn required(&self) -> Fixed {
        match self {
            NeedNode::Raw { required, .. } | NeedNode::Recipe { required, .. } => *required,
        }
    }

    /// Whether this is a raw-input leaf.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self, NeedNode::Raw { .. })
    }
}

/// One complete, internally consistent way of satisfying a demand set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Aggregated report.
    pub result: NeedResult,
    /// One tree root per demand, in demand order.
    pub roots: Vec<NeedNode>,
}

impl Solution {
    fn empty() -> Self {
        Self {
            result: NeedResult::new(),
            roots: Vec::new(),
        }
    }
}

/// One expansion of a single (item, amount) requirement.
struct Expansion {
    result: NeedResult,
    root: NeedNode,
}

/// The demand resolution engine.
///
/// Borrows the dataset read-only and rebuilds the recipe index on
/// construction; side-effect-free with respect to the dataset.
pub struct DemandSolver<'a> {
    dataset: &'a Dataset,
    index: RecipeIndex,
}

impl<'a> DemandSolver<'a> {
    /// Create a solver for a dataset.
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            index: RecipeIndex::build(dataset),
        }
    }

    /// Expand `demands` into up to `max_patterns` alternative solutions.
    ///
    /// Demands for the same item are summed before solving. The cap is
    /// clamped to the supported range. An empty return value means the
    /// demand set is unsatisfiable, not an error.
    pub fn solve(&self, demands: &[Demand], max_patterns: usize) -> Result<Vec<Solution>> {
        if demands.is_empty() {
            return Err(PlanError::NoDemands);
        }
        for demand in demands {
            if self.dataset.item(&demand.item).is_none() {
                return Err(PlanError::UnknownItem(demand.item.clone()));
            }
            if demand.amount <= Fixed::ZERO {
                return Err(PlanError::NonPositiveDemand(demand.item.clone()));
            }
        }
        let max_patterns = clamp_patterns(max_patterns);

        let combined = ItemStack::combine_same_keys(
            demands
                .iter()
                .map(|d| ItemStack::new(d.item.clone(), d.amount)),
        );

        // Start from a single empty pattern and fold each demand in,
        // cartesian-combining existing patterns with the demand's
        // expansions under the shared cap.
        let mut patterns = vec![Solution::empty()];
        for demand in &combined {
            let mut next: Vec<Solution> = Vec::new();
            'patterns: for pattern in &patterns {
                let mut path = BTreeSet::new();
                let expansions = self.expand_one(
                    &demand.item,
                    demand.amount,
                    max_patterns - next.len(),
                    &mut path,
                );
                for expansion in expansions {
                    let mut roots = pattern.roots.clone();
                    roots.push(expansion.root);
                    next.push(Solution {
                        result: pattern.result.merge(&expansion.result),
                        roots,
                    });
                    if next.len() >= max_patterns {
                        break 'patterns;
                    }
                }
            }
            patterns = next;
            if patterns.is_empty() {
                break;
            }
        }

        // Keep only the solutions touching the fewest distinct machine
        // types, preserving discovery order.
        if let Some(min_machines) = patterns
            .iter()
            .map(|s| s.result.distinct_machines(self.dataset))
            .min()
        {
            patterns.retain(|s| s.result.distinct_machines(self.dataset) == min_machines);
        }

        tracing::debug!(
            demands = combined.len(),
            patterns = patterns.len(),
            "Demand solve complete"
        );
        Ok(patterns)
    }

    /// Expand one (item, amount) requirement into up to `limit`
    /// alternative expansions. `path` holds the items currently being
    /// expanded on this branch; entries are rolled back on return.
    fn expand_one(
        &self,
        item: &ItemKey,
        amount: Fixed,
        limit: usize,
        path: &mut BTreeSet<ItemKey>,
    ) -> Vec<Expansion> {
        let mut results = Vec::new();
        if limit == 0 {
            return results;
        }

        // Raw inputs terminate the branch with exactly one leaf, even
        // if recipes also claim to produce them.
        if self.dataset.is_raw_input(item) {
            let mut result = NeedResult::new();
            result.add_raw_input(item.clone(), amount);
            results.push(Expansion {
                result,
                root: NeedNode::Raw {
                    item: item.clone(),
                    required: amount,
                },
            });
            return results;
        }

        // Cycle: this branch contributes nothing, which makes the
        // enclosing recipe choice fail.
        if path.contains(item) {
            return results;
        }

        if !self.index.is_producible(item) {
            return results;
        }

        path.insert(item.clone());

        for recipe in self.index.producing_recipes(self.dataset, item) {
            if results.len() >= limit {
                break;
            }
            let Some(output_amount) = recipe.output_amount(item) else {
                continue;
            };
            if output_amount <= Fixed::ZERO {
                continue;
            }

            let runs = amount / output_amount;

            // Seed report for this recipe choice before descending.
            let mut seed = NeedResult::new();
            seed.add_recipe_runs(recipe.id.clone(), runs);
            for output in &recipe.outputs {
                seed.add_produced(output.item.clone(), output.amount * runs);
            }
            for input in &recipe.inputs {
                seed.add_consumed(input.item.clone(), input.amount * runs);
            }

            let mut byproducts = BTreeMap::new();
            for output in &recipe.outputs {
                if output.item == *item {
                    continue;
                }
                let produced = output.amount * runs;
                if produced > Fixed::ZERO {
                    seed.add_byproduct(output.item.clone(), produced);
                    add_to(&mut byproducts, output.item.clone(), produced);
                }
            }

            let node = NeedNode::Recipe {
                item: item.clone(),
                required: amount,
                recipe: recipe.id.clone(),
                runs,
                byproducts,
                children: Vec::new(),
            };

            // Expand every input in sequence, combining successive
            // inputs by cartesian product under the remaining budget.
            let mut partials = vec![Expansion { result: seed, root: node }];
            for input in &recipe.inputs {
                let required = input.amount * runs;
                let mut next: Vec<Expansion> = Vec::new();
                'partials: for partial in &partials {
                    let expansions =
                        self.expand_one(&input.item, required, limit - next.len(), path);
                    for child in expansions {
                        let merged = partial.result.merge(&child.result);
                        let mut root = partial.root.clone();
                        if let NeedNode::Recipe { children, .. } = &mut root {
                            children.push(child.root);
                        }
                        next.push(Expansion {
                            result: merged,
                            root,
                        });
                        if next.len() >= limit {
                            break 'partials;
                        }
                    }
                }
                partials = next;
                if partials.is_empty() {
                    // An input with zero expansions sinks this recipe choice
                    break;
                }
            }

            for partial in partials {
                if results.len() >= limit {
                    break;
                }
                results.push(partial);
            }
        }

        path.remove(item);
        results
    }
}

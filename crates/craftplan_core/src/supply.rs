//! Supply allocation optimizer.
//!
//! Given a capped per-minute supply of raw items, chooses how many
//! machine-equivalents of which recipes to run to maximize total output
//! value. Multi-start greedy: several heuristic orderings of the
//! feasible recipe set are each allocated greedily, then the resulting
//! candidates are deduplicated and ranked. No backtracking within an
//! ordering, and no optimality guarantee.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{Dataset, ItemKey, MachineKey, RecipeId};
use crate::error::{PlanError, Result};
use crate::math::{add_to, fixed_map_serde, fixed_serde, Fixed};

/// How many ranked candidates an optimizer run returns at most.
pub const MAX_CANDIDATES: usize = 5;

/// An available amount of one raw item per minute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyEntry {
    /// The supplied item.
    pub item: ItemKey,
    /// Available amount per minute. Non-positive entries are discarded.
    #[serde(with = "fixed_serde")]
    pub amount_per_min: Fixed,
}

impl SupplyEntry {
    /// Create a new supply entry.
    #[must_use]
    pub fn new(item: impl Into<ItemKey>, amount_per_min: Fixed) -> Self {
        Self {
            item: item.into(),
            amount_per_min,
        }
    }
}

/// One committed allocation: a recipe at a machine count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeAllocation {
    /// The allocated recipe.
    pub recipe: RecipeId,
    /// The machine the recipe runs on.
    pub machine: MachineKey,
    /// Machine-equivalents committed. Fractional counts represent
    /// continuous throughput.
    #[serde(with = "fixed_serde")]
    pub machine_count: Fixed,
    /// Per-item input flow at one machine-equivalent.
    #[serde(with = "fixed_map_serde")]
    pub input_flows: BTreeMap<ItemKey, Fixed>,
    /// Per-item output flow at one machine-equivalent.
    #[serde(with = "fixed_map_serde")]
    pub output_flows: BTreeMap<ItemKey, Fixed>,
}

/// A named allocation plan produced by one greedy ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationCandidate {
    /// Sequential display name assigned after ranking.
    pub name: String,
    /// Total output value per minute across all allocations.
    #[serde(with = "fixed_serde")]
    pub total_output_value: Fixed,
    /// Per-item supply consumed.
    #[serde(with = "fixed_map_serde")]
    pub input_used: BTreeMap<ItemKey, Fixed>,
    /// Per-item supply left over.
    #[serde(with = "fixed_map_serde")]
    pub input_left: BTreeMap<ItemKey, Fixed>,
    /// Per-item output produced.
    #[serde(with = "fixed_map_serde")]
    pub output_produced: BTreeMap<ItemKey, Fixed>,
    /// Committed allocations, in greedy order.
    pub allocations: Vec<RecipeAllocation>,
}

/// Flow profile of one feasible recipe at one machine-equivalent.
struct RecipeProfile {
    recipe_index: usize,
    input_flows: BTreeMap<ItemKey, Fixed>,
    output_flows: BTreeMap<ItemKey, Fixed>,
    output_value: Fixed,
}

impl RecipeProfile {
    fn total_input_flow(&self) -> Fixed {
        self.input_flows
            .values()
            .fold(Fixed::ZERO, |acc, flow| acc + *flow)
    }

    fn max_input_flow(&self) -> Fixed {
        self.input_flows
            .values()
            .copied()
            .max()
            .unwrap_or(Fixed::ZERO)
    }
}

/// The supply allocation optimizer.
pub struct SupplyOptimizer<'a> {
    dataset: &'a Dataset,
}

impl<'a> SupplyOptimizer<'a> {
    /// Create an optimizer for a dataset.
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Allocate `supplies` across feasible recipes.
    ///
    /// Duplicate entries per item are summed and non-positive entries
    /// discarded before solving. Returns at most [`MAX_CANDIDATES`]
    /// candidates sorted by descending total output value; an empty
    /// list means no valid allocation exists.
    pub fn optimize(&self, supplies: &[SupplyEntry]) -> Result<Vec<OptimizationCandidate>> {
        for entry in supplies {
            if self.dataset.item(&entry.item).is_none() {
                return Err(PlanError::UnknownItem(entry.item.clone()));
            }
        }

        let mut supply: BTreeMap<ItemKey, Fixed> = BTreeMap::new();
        for entry in supplies {
            if entry.amount_per_min > Fixed::ZERO {
                add_to(&mut supply, entry.item.clone(), entry.amount_per_min);
            }
        }
        if supply.is_empty() {
            return Ok(Vec::new());
        }

        let profiles = self.feasible_profiles(&supply);
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<OptimizationCandidate> = Vec::new();
        for ordering in build_orderings(&profiles, self.dataset) {
            if let Some(candidate) = self.build_candidate(&supply, &profiles, &ordering) {
                candidates.push(candidate);
            }
        }

        let mut deduped = deduplicate(candidates);
        deduped.sort_by(|a, b| b.total_output_value.cmp(&a.total_output_value));
        deduped.truncate(MAX_CANDIDATES);
        for (index, candidate) in deduped.iter_mut().enumerate() {
            candidate.name = format!("plan {}", index + 1);
        }

        tracing::debug!(
            supplies = supply.len(),
            candidates = deduped.len(),
            "Supply optimization complete"
        );
        Ok(deduped)
    }

    /// Flow profiles for every feasible recipe, in dataset order.
    ///
    /// A recipe is feasible only if its machine has positive cycle time
    /// and every input item is present in the supply map.
    fn feasible_profiles(&self, supply: &BTreeMap<ItemKey, Fixed>) -> Vec<RecipeProfile> {
        let mut profiles = Vec::new();
        for (recipe_index, recipe) in self.dataset.recipes().iter().enumerate() {
            let runs_per_min = self.dataset.runs_per_minute(&recipe.machine);
            if runs_per_min <= Fixed::ZERO {
                continue;
            }
            if recipe
                .inputs
                .iter()
                .any(|stack| !supply.contains_key(&stack.item))
            {
                continue;
            }

            let mut input_flows = BTreeMap::new();
            for stack in &recipe.inputs {
                add_to(&mut input_flows, stack.item.clone(), runs_per_min * stack.amount);
            }
            let mut output_flows = BTreeMap::new();
            for stack in &recipe.outputs {
                add_to(&mut output_flows, stack.item.clone(), runs_per_min * stack.amount);
            }
            let output_value = output_flows
                .iter()
                .fold(Fixed::ZERO, |acc, (item, flow)| {
                    acc + self.dataset.item_value(item) * *flow
                });

            profiles.push(RecipeProfile {
                recipe_index,
                input_flows,
                output_flows,
                output_value,
            });
        }
        profiles
    }

    /// Greedily allocate supply along one ordering of the profiles.
    ///
    /// Returns `None` when the ordering commits no allocation at all.
    fn build_candidate(
        &self,
        supply: &BTreeMap<ItemKey, Fixed>,
        profiles: &[RecipeProfile],
        ordering: &[usize],
    ) -> Option<OptimizationCandidate> {
        let mut remaining = supply.clone();
        let mut input_used: BTreeMap<ItemKey, Fixed> = BTreeMap::new();
        let mut output_produced: BTreeMap<ItemKey, Fixed> = BTreeMap::new();
        let mut allocations = Vec::new();

        for &profile_index in ordering {
            let profile = &profiles[profile_index];
            let machine_count = max_machine_count(&profile.input_flows, &remaining);
            if machine_count <= Fixed::ZERO {
                continue;
            }

            for (item, flow) in &profile.input_flows {
                let consumed = *flow * machine_count;
                if let Some(left) = remaining.get_mut(item) {
                    *left -= consumed;
                }
                add_to(&mut input_used, item.clone(), consumed);
            }
            for (item, flow) in &profile.output_flows {
                add_to(&mut output_produced, item.clone(), *flow * machine_count);
            }

            let recipe = &self.dataset.recipes()[profile.recipe_index];
            allocations.push(RecipeAllocation {
                recipe: recipe.id.clone(),
                machine: recipe.machine.clone(),
                machine_count,
                input_flows: profile.input_flows.clone(),
                output_flows: profile.output_flows.clone(),
            });
        }

        if allocations.is_empty() {
            return None;
        }

        let total_output_value = output_produced
            .iter()
            .fold(Fixed::ZERO, |acc, (item, flow)| {
                acc + self.dataset.item_value(item) * *flow
            });

        Some(OptimizationCandidate {
            name: String::new(),
            total_output_value,
            input_used,
            input_left: remaining,
            output_produced,
            allocations,
        })
    }
}

/// Maximum machine-equivalents allocatable from the remaining supply:
/// the scarcest input bounds the count.
fn max_machine_count(
    input_flows: &BTreeMap<ItemKey, Fixed>,
    remaining: &BTreeMap<ItemKey, Fixed>,
) -> Fixed {
    let mut bound: Option<Fixed> = None;
    for (item, flow) in input_flows {
        let Some(available) = remaining.get(item) else {
            return Fixed::ZERO;
        };
        if *flow <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        let count = *available / *flow;
        bound = Some(match bound {
            Some(current) => current.min(count),
            None => count,
        });
    }
    bound.unwrap_or(Fixed::ZERO)
}

/// The four greedy orderings, as index lists into `profiles`.
///
/// Stable descending sorts, so recipes tying on a heuristic keep their
/// dataset order and results stay deterministic.
fn build_orderings(profiles: &[RecipeProfile], dataset: &Dataset) -> Vec<Vec<usize>> {
    let base: Vec<usize> = (0..profiles.len()).collect();
    let one = Fixed::from_num(1);

    // (i) raw output value
    let mut by_value = base.clone();
    by_value.sort_by(|&a, &b| profiles[b].output_value.cmp(&profiles[a].output_value));

    // (ii) value per unit of total input flow
    let mut by_density = base.clone();
    by_density.sort_by(|&a, &b| {
        let density = |p: &RecipeProfile| p.output_value / p.total_input_flow().max(one);
        density(&profiles[b]).cmp(&density(&profiles[a]))
    });

    // (iii) value per unit of scarcest (largest) input flow
    let mut by_bottleneck = base.clone();
    by_bottleneck.sort_by(|&a, &b| {
        let ratio = |p: &RecipeProfile| p.output_value / p.max_input_flow().max(one);
        ratio(&profiles[b]).cmp(&ratio(&profiles[a]))
    });

    // (iv) highest single output value, tie-broken by raw output value
    let highest = |p: &RecipeProfile| {
        p.output_flows
            .keys()
            .map(|item| dataset.item_value(item))
            .max()
            .unwrap_or(Fixed::ZERO)
    };
    let mut by_peak = base;
    by_peak.sort_by(|&a, &b| {
        (highest(&profiles[b]), profiles[b].output_value)
            .cmp(&(highest(&profiles[a]), profiles[a].output_value))
    });

    vec![by_value, by_density, by_bottleneck, by_peak]
}

/// Drop candidates whose normalized allocation signature repeats,
/// keeping the higher-valued one.
fn deduplicate(candidates: Vec<OptimizationCandidate>) -> Vec<OptimizationCandidate> {
    let signature = |c: &OptimizationCandidate| {
        let mut sig: Vec<(MachineKey, i64, RecipeId)> = c
            .allocations
            .iter()
            .map(|a| (a.machine.clone(), a.machine_count.to_bits(), a.recipe.clone()))
            .collect();
        sig.sort();
        sig
    };

    let mut kept: Vec<(Vec<(MachineKey, i64, RecipeId)>, OptimizationCandidate)> = Vec::new();
    for candidate in candidates {
        let sig = signature(&candidate);
        match kept.iter_mut().find(|(existing, _)| *existing == sig) {
            Some((_, existing)) => {
                if candidate.total_output_value > existing.total_output_value {
                    *existing = candidate;
                }
            }
            None => kept.push((sig, candidate)),
        }
    }
    kept.into_iter().map(|(_, candidate)| candidate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Item, ItemStack, Machine, Recipe};

    fn fx(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    /// 2 iron + 1 copper -> 1 plate on a 10s machine (6 runs/min).
    fn plate_dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.register_item(Item::new("iron", "Iron").raw());
        dataset.register_item(Item::new("copper", "Copper").raw());
        dataset.register_item(Item::new("plate", "Plate").with_value(5));
        dataset.register_machine(Machine::new("m1", "Press", 10));
        dataset
            .register_recipe(
                Recipe::new("r1", "Press Plate", "m1")
                    .with_inputs(vec![
                        ItemStack::new("iron", fx(2)),
                        ItemStack::new("copper", fx(1)),
                    ])
                    .with_outputs(vec![ItemStack::new("plate", fx(1))]),
            )
            .unwrap();
        dataset
    }

    #[test]
    fn test_exact_saturation_scenario() {
        // iron flow 12/min and copper flow 6/min per machine; the
        // supply allows exactly one machine-equivalent.
        let dataset = plate_dataset();
        let optimizer = SupplyOptimizer::new(&dataset);
        let candidates = optimizer
            .optimize(&[
                SupplyEntry::new("iron", fx(12)),
                SupplyEntry::new("copper", fx(6)),
            ])
            .unwrap();

        assert_eq!(candidates.len(), 1);
        let best = &candidates[0];
        assert_eq!(best.allocations.len(), 1);
        assert_eq!(best.allocations[0].machine_count, fx(1));
        assert!(best.total_output_value > Fixed::ZERO);
        assert_eq!(best.input_left[&"iron".into()], Fixed::ZERO);
        assert_eq!(best.input_left[&"copper".into()], Fixed::ZERO);
        assert_eq!(best.name, "plan 1");
    }

    #[test]
    fn test_missing_input_makes_recipe_infeasible() {
        let dataset = plate_dataset();
        let optimizer = SupplyOptimizer::new(&dataset);
        // copper missing entirely, however abundant iron is
        let candidates = optimizer
            .optimize(&[SupplyEntry::new("iron", fx(1000))])
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_degenerate_machine_excluded() {
        let mut dataset = plate_dataset();
        dataset.register_machine(Machine::new("m0", "Stalled", 0));
        dataset
            .register_recipe(
                Recipe::new("r0", "Stalled Plate", "m0")
                    .with_inputs(vec![ItemStack::new("iron", fx(1))])
                    .with_outputs(vec![ItemStack::new("plate", fx(10))]),
            )
            .unwrap();

        let optimizer = SupplyOptimizer::new(&dataset);
        let candidates = optimizer
            .optimize(&[
                SupplyEntry::new("iron", fx(12)),
                SupplyEntry::new("copper", fx(6)),
            ])
            .unwrap();
        // Only r1 allocates; the zero-cycle-time recipe never appears
        for candidate in &candidates {
            assert!(candidate
                .allocations
                .iter()
                .all(|a| a.recipe == "r1".into()));
        }
    }

    #[test]
    fn test_usage_never_exceeds_supply() {
        let mut dataset = plate_dataset();
        dataset.register_item(Item::new("wire", "Wire").with_value(2));
        dataset
            .register_recipe(
                Recipe::new("r2", "Draw Wire", "m1")
                    .with_inputs(vec![ItemStack::new("copper", fx(1))])
                    .with_outputs(vec![ItemStack::new("wire", fx(3))]),
            )
            .unwrap();

        let supply = [
            SupplyEntry::new("iron", fx(30)),
            SupplyEntry::new("copper", fx(10)),
        ];
        let optimizer = SupplyOptimizer::new(&dataset);
        let candidates = optimizer.optimize(&supply).unwrap();
        assert!(!candidates.is_empty());

        for candidate in &candidates {
            for entry in &supply {
                let used = candidate
                    .input_used
                    .get(&entry.item)
                    .copied()
                    .unwrap_or(Fixed::ZERO);
                assert!(used <= entry.amount_per_min);
                let left = candidate.input_left[&entry.item];
                assert_eq!(used + left, entry.amount_per_min);
            }
        }
    }

    #[test]
    fn test_candidates_ranked_and_named() {
        let mut dataset = plate_dataset();
        dataset.register_item(Item::new("wire", "Wire").with_value(1));
        dataset
            .register_recipe(
                Recipe::new("r2", "Draw Wire", "m1")
                    .with_inputs(vec![ItemStack::new("copper", fx(1))])
                    .with_outputs(vec![ItemStack::new("wire", fx(1))]),
            )
            .unwrap();

        let optimizer = SupplyOptimizer::new(&dataset);
        let candidates = optimizer
            .optimize(&[
                SupplyEntry::new("iron", fx(12)),
                SupplyEntry::new("copper", fx(12)),
            ])
            .unwrap();

        assert!(!candidates.is_empty());
        assert!(candidates.len() <= MAX_CANDIDATES);
        for window in candidates.windows(2) {
            assert!(window[0].total_output_value >= window[1].total_output_value);
        }
        for (index, candidate) in candidates.iter().enumerate() {
            assert_eq!(candidate.name, format!("plan {}", index + 1));
        }
    }

    #[test]
    fn test_identical_orderings_deduplicated() {
        // One recipe: all four orderings produce the same allocation,
        // so exactly one candidate survives.
        let dataset = plate_dataset();
        let optimizer = SupplyOptimizer::new(&dataset);
        let candidates = optimizer
            .optimize(&[
                SupplyEntry::new("iron", fx(24)),
                SupplyEntry::new("copper", fx(24)),
            ])
            .unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_duplicate_supply_entries_summed() {
        let dataset = plate_dataset();
        let optimizer = SupplyOptimizer::new(&dataset);
        let split = optimizer
            .optimize(&[
                SupplyEntry::new("iron", fx(6)),
                SupplyEntry::new("iron", fx(6)),
                SupplyEntry::new("copper", fx(6)),
            ])
            .unwrap();
        let whole = optimizer
            .optimize(&[
                SupplyEntry::new("iron", fx(12)),
                SupplyEntry::new("copper", fx(6)),
            ])
            .unwrap();
        assert_eq!(split, whole);
    }

    #[test]
    fn test_non_positive_supply_discarded() {
        let dataset = plate_dataset();
        let optimizer = SupplyOptimizer::new(&dataset);
        let candidates = optimizer
            .optimize(&[
                SupplyEntry::new("iron", Fixed::ZERO),
                SupplyEntry::new("copper", fx(-3)),
            ])
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_unknown_supply_item_rejected() {
        let dataset = plate_dataset();
        let optimizer = SupplyOptimizer::new(&dataset);
        let result = optimizer.optimize(&[SupplyEntry::new("mystery", fx(5))]);
        assert_eq!(result, Err(PlanError::UnknownItem("mystery".into())));
    }

    #[test]
    fn test_empty_supply_yields_no_candidates() {
        let dataset = plate_dataset();
        let optimizer = SupplyOptimizer::new(&dataset);
        assert!(optimizer.optimize(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_higher_value_recipe_wins_contested_input() {
        // Both recipes consume copper; plate is worth far more than
        // wire, so the best candidate spends copper on plates first.
        let mut dataset = plate_dataset();
        dataset.register_item(Item::new("wire", "Wire").with_value(1));
        dataset
            .register_recipe(
                Recipe::new("r2", "Draw Wire", "m1")
                    .with_inputs(vec![ItemStack::new("copper", fx(1))])
                    .with_outputs(vec![ItemStack::new("wire", fx(1))]),
            )
            .unwrap();

        let optimizer = SupplyOptimizer::new(&dataset);
        let candidates = optimizer
            .optimize(&[
                SupplyEntry::new("iron", fx(12)),
                SupplyEntry::new("copper", fx(6)),
            ])
            .unwrap();

        let best = &candidates[0];
        assert_eq!(best.allocations[0].recipe, "r1".into());
        // plate flow 6/min at value 5 = 30/min
        assert_eq!(best.total_output_value, fx(30));
    }
}

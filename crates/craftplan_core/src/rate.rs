//! Rate-based line planning.
//!
//! The counterpart of the demand engine for steady-state reporting:
//! instead of expanding an absolute quantity into alternative recipe
//! trees, each target names a line count (machine-equivalents of one
//! production line) and the solver commits to the single best recipe
//! per item, chosen by output throughput. The result is one per-minute
//! flow tree per target plus a raw-input intake summary.
//!
//! Cycles do not fail a rate solve: a repeated item on the branch marks
//! the node cyclic and stops descent, leaving the flows above it valid.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::{Dataset, ItemKey, MachineKey, Recipe, RecipeId};
use crate::error::{PlanError, Result};
use crate::index::RecipeIndex;
use crate::math::{add_to, fixed_map_serde, fixed_serde, merge_into, Fixed};

/// A production-line target: run `line_count` lines of the best recipe
/// producing an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTarget {
    /// The targeted item.
    pub item: ItemKey,
    /// Machine-equivalents of the chosen recipe to run.
    #[serde(with = "fixed_serde")]
    pub line_count: Fixed,
}

impl RateTarget {
    /// Create a new rate target.
    #[must_use]
    pub fn new(item: impl Into<ItemKey>, line_count: Fixed) -> Self {
        Self {
            item: item.into(),
            line_count,
        }
    }
}

/// Per-target output summary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateOutput {
    /// The targeted item.
    pub item: ItemKey,
    /// Line count the target asked for.
    #[serde(with = "fixed_serde")]
    pub line_count: Fixed,
    /// Resulting output flow per minute; zero when no usable recipe
    /// exists for the item.
    #[serde(with = "fixed_serde")]
    pub flow_per_min: Fixed,
}

/// One node of a per-minute flow tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    /// The recipe running on this node.
    pub recipe: RecipeId,
    /// The machine the recipe runs on.
    pub machine: MachineKey,
    /// Machine-equivalents committed to this node.
    #[serde(with = "fixed_serde")]
    pub machine_count: Fixed,
    /// Recipe runs per minute across the committed machines.
    #[serde(with = "fixed_serde")]
    pub runs_per_min: Fixed,
    /// Whether this node's item reappeared on its own branch. A cyclic
    /// node carries no flows and no children.
    pub cyclic: bool,
    /// Per-item input flow per minute.
    #[serde(with = "fixed_map_serde")]
    pub inputs: BTreeMap<ItemKey, Fixed>,
    /// Per-item output flow per minute.
    #[serde(with = "fixed_map_serde")]
    pub outputs: BTreeMap<ItemKey, Fixed>,
    /// Child nodes, one per non-raw input with a usable producer.
    pub children: Vec<FlowNode>,
}

impl FlowNode {
    /// Merge nodes sharing a recipe id and machine key: counts and
    /// flows add, cyclic flags combine, and the pooled children are
    /// merged recursively. The result is ordered by machine key, then
    /// by descending machine count.
    #[must_use]
    pub fn merge_equivalent(nodes: Vec<FlowNode>) -> Vec<FlowNode> {
        let mut merged: Vec<FlowNode> = Vec::new();
        for node in nodes {
            match merged
                .iter_mut()
                .find(|m| m.recipe == node.recipe && m.machine == node.machine)
            {
                Some(existing) => {
                    existing.machine_count += node.machine_count;
                    existing.runs_per_min += node.runs_per_min;
                    existing.cyclic |= node.cyclic;
                    merge_into(&mut existing.inputs, &node.inputs);
                    merge_into(&mut existing.outputs, &node.outputs);
                    existing.children.extend(node.children);
                }
                None => merged.push(node),
            }
        }
        for node in &mut merged {
            if !node.children.is_empty() {
                node.children = Self::merge_equivalent(std::mem::take(&mut node.children));
            }
        }
        merged.sort_by(|a, b| {
            a.machine
                .cmp(&b.machine)
                .then_with(|| b.machine_count.cmp(&a.machine_count))
        });
        merged
    }
}

/// Report of a rate-based solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateReport {
    /// Output summary, one entry per target in target order.
    pub outputs: Vec<RateOutput>,
    /// Raw-input intake per minute, summed across all trees.
    #[serde(with = "fixed_map_serde")]
    pub raw_inputs: BTreeMap<ItemKey, Fixed>,
    /// Flow trees after merging equivalent nodes.
    pub roots: Vec<FlowNode>,
}

/// The rate-based line solver.
///
/// Borrows the dataset read-only and rebuilds the recipe index on
/// construction, like [`crate::demand::DemandSolver`].
pub struct RateSolver<'a> {
    dataset: &'a Dataset,
    index: RecipeIndex,
}

impl<'a> RateSolver<'a> {
    /// Create a solver for a dataset.
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            index: RecipeIndex::build(dataset),
        }
    }

    /// Resolve `targets` into per-minute flow trees.
    ///
    /// Targets without a usable recipe still appear in the output
    /// summary with zero flow; only invalid input is an error.
    pub fn solve(&self, targets: &[RateTarget]) -> Result<RateReport> {
        if targets.is_empty() {
            return Err(PlanError::NoDemands);
        }
        for target in targets {
            if self.dataset.item(&target.item).is_none() {
                return Err(PlanError::UnknownItem(target.item.clone()));
            }
        }

        let mut report = RateReport {
            outputs: Vec::new(),
            raw_inputs: BTreeMap::new(),
            roots: Vec::new(),
        };

        for target in targets {
            let Some(recipe) = self.best_recipe(&target.item) else {
                report.outputs.push(RateOutput {
                    item: target.item.clone(),
                    line_count: target.line_count,
                    flow_per_min: Fixed::ZERO,
                });
                add_to(&mut report.raw_inputs, target.item.clone(), Fixed::ZERO);
                continue;
            };
            let out_amount = recipe.output_amount(&target.item).unwrap_or(Fixed::ZERO);
            if out_amount <= Fixed::ZERO {
                report.outputs.push(RateOutput {
                    item: target.item.clone(),
                    line_count: target.line_count,
                    flow_per_min: Fixed::ZERO,
                });
                continue;
            }

            let out_per_min = self.dataset.runs_per_minute(&recipe.machine) * out_amount;
            report.outputs.push(RateOutput {
                item: target.item.clone(),
                line_count: target.line_count,
                flow_per_min: target.line_count * out_per_min,
            });

            let mut path = BTreeSet::new();
            let node = self.build_node(
                recipe,
                &target.item,
                target.line_count,
                &mut path,
                &mut report.raw_inputs,
            );
            report.roots.push(node);
        }

        report.roots = FlowNode::merge_equivalent(std::mem::take(&mut report.roots));

        tracing::debug!(
            targets = targets.len(),
            roots = report.roots.len(),
            "Rate solve complete"
        );
        Ok(report)
    }

    /// The single best producer for an item: recipes on live machines
    /// first, then highest output flow per minute, then machine key and
    /// recipe id as stable tie-breaks.
    fn best_recipe(&self, item: &ItemKey) -> Option<&Recipe> {
        let mut best: Option<(&Recipe, (bool, Fixed))> = None;
        for recipe in self.index.producing_recipes(self.dataset, item) {
            let runs_per_min = self.dataset.runs_per_minute(&recipe.machine);
            let out_amount = recipe.output_amount(item).unwrap_or(Fixed::ZERO);
            let throughput = if runs_per_min > Fixed::ZERO && out_amount > Fixed::ZERO {
                runs_per_min * out_amount
            } else {
                Fixed::ZERO
            };
            let rank = (runs_per_min > Fixed::ZERO, throughput);

            let better = match best {
                None => true,
                Some((current, current_rank)) => {
                    rank > current_rank
                        || (rank == current_rank
                            && (&recipe.machine, &recipe.id) < (&current.machine, &current.id))
                }
            };
            if better {
                best = Some((recipe, rank));
            }
        }
        best.map(|(recipe, _)| recipe)
    }

    /// Build one flow tree node. `path` holds the items on this branch;
    /// a repeat marks the node cyclic and stops descent. Raw inputs and
    /// inputs without a usable producer accumulate into `raw_inputs`.
    fn build_node(
        &self,
        recipe: &Recipe,
        item: &ItemKey,
        line_count: Fixed,
        path: &mut BTreeSet<ItemKey>,
        raw_inputs: &mut BTreeMap<ItemKey, Fixed>,
    ) -> FlowNode {
        let runs_per_min = self.dataset.runs_per_minute(&recipe.machine);
        let mut node = FlowNode {
            recipe: recipe.id.clone(),
            machine: recipe.machine.clone(),
            machine_count: line_count,
            runs_per_min: line_count * runs_per_min,
            cyclic: false,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            children: Vec::new(),
        };

        if path.contains(item) {
            node.cyclic = true;
            return node;
        }

        let out_per_run = recipe.output_amount(item).unwrap_or(Fixed::ZERO);
        if out_per_run <= Fixed::ZERO {
            return node;
        }
        let rate_factor = node.runs_per_min;
        if rate_factor <= Fixed::ZERO {
            return node;
        }

        path.insert(item.clone());

        for output in &recipe.outputs {
            add_to(&mut node.outputs, output.item.clone(), rate_factor * output.amount);
        }

        for input in &recipe.inputs {
            let flow = rate_factor * input.amount;
            add_to(&mut node.inputs, input.item.clone(), flow);

            if self.dataset.is_raw_input(&input.item) || !self.index.is_producible(&input.item) {
                add_to(raw_inputs, input.item.clone(), flow);
                continue;
            }
            let Some(child_recipe) = self.best_recipe(&input.item) else {
                add_to(raw_inputs, input.item.clone(), flow);
                continue;
            };
            let child_out = child_recipe.output_amount(&input.item).unwrap_or(Fixed::ZERO);
            let child_out_per_min =
                self.dataset.runs_per_minute(&child_recipe.machine) * child_out;
            if child_out_per_min <= Fixed::ZERO {
                add_to(raw_inputs, input.item.clone(), flow);
                continue;
            }

            let child_lines = flow / child_out_per_min;
            let child = self.build_node(child_recipe, &input.item, child_lines, path, raw_inputs);
            node.children.push(child);
        }

        path.remove(item);
        node
    }
}

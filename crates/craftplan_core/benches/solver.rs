//! Solver benchmarks for craftplan_core.
//!
//! Run with: `cargo bench -p craftplan_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use craftplan_core::data::{Dataset, Item, ItemStack, Machine, Recipe};
use craftplan_core::demand::{Demand, DemandSolver};
use craftplan_core::math::Fixed;
use craftplan_core::supply::{SupplyEntry, SupplyOptimizer};

fn fx(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// A dataset with `alternatives` producers per tier over `depth` tiers.
/// Tier 0 items are raw; each tier consumes two items from the tier
/// below, so solution counts grow combinatorially with `alternatives`.
fn layered_dataset(depth: usize, alternatives: usize) -> Dataset {
    let mut dataset = Dataset::new();
    dataset.register_machine(Machine::new("mach", "Machine", 10));
    for tier in 0..=depth {
        let key = format!("t{tier}");
        let mut item = Item::new(key.clone(), format!("Tier {tier}"));
        if tier == 0 {
            item = item.raw();
        }
        dataset.register_item(item.with_value(u32::try_from(tier).unwrap_or(0) + 1));
        if tier == 0 {
            continue;
        }
        for alt in 0..alternatives {
            dataset
                .register_recipe(
                    Recipe::new(format!("t{tier}_alt{alt}"), format!("T{tier} Alt {alt}"), "mach")
                        .with_inputs(vec![ItemStack::new(format!("t{}", tier - 1), fx(2))])
                        .with_outputs(vec![ItemStack::new(key.clone(), fx(1))]),
                )
                .expect("bench recipe ids are unique");
        }
    }
    dataset
}

pub fn demand_solve_benchmark(c: &mut Criterion) {
    let dataset = layered_dataset(6, 3);
    let solver = DemandSolver::new(&dataset);
    let demands = [Demand::new("t6", fx(100))];

    c.bench_function("demand_solve_layered_6x3_cap10", |b| {
        b.iter(|| black_box(solver.solve(black_box(&demands), 10).unwrap()))
    });

    c.bench_function("demand_solve_layered_6x3_cap100", |b| {
        b.iter(|| black_box(solver.solve(black_box(&demands), 100).unwrap()))
    });
}

pub fn supply_optimize_benchmark(c: &mut Criterion) {
    let dataset = layered_dataset(6, 3);
    let optimizer = SupplyOptimizer::new(&dataset);
    let supply: Vec<SupplyEntry> = (0..=6)
        .map(|tier| SupplyEntry::new(format!("t{tier}"), fx(1000)))
        .collect();

    c.bench_function("supply_optimize_layered_6x3", |b| {
        b.iter(|| black_box(optimizer.optimize(black_box(&supply)).unwrap()))
    });
}

criterion_group!(benches, demand_solve_benchmark, supply_optimize_benchmark);
criterion_main!(benches);

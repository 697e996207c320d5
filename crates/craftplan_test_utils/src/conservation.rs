//! Conservation checks for solver results.
//!
//! Every solution's ledger must balance: for each item, net flow
//! (produced minus consumed) equals demanded amount plus byproduct
//! surplus minus raw inputs drawn from outside the plan.

use std::collections::BTreeMap;

use craftplan_core::data::ItemKey;
use craftplan_core::demand::{Demand, Solution};
use craftplan_core::math::{add_to, Fixed};

/// Assert the conservation identity for one solution against the
/// demands that produced it.
///
/// # Panics
///
/// Panics with a per-item diagnostic when the ledger does not balance.
pub fn assert_conserved(solution: &Solution, demands: &[Demand]) {
    let mut demanded: BTreeMap<ItemKey, Fixed> = BTreeMap::new();
    for demand in demands {
        add_to(&mut demanded, demand.item.clone(), demand.amount);
    }

    let result = &solution.result;
    let mut items: Vec<&ItemKey> = result.balance.keys().collect();
    for key in demanded.keys() {
        if !result.balance.contains_key(key) {
            items.push(key);
        }
    }

    for item in items {
        let net = result
            .balance
            .get(item)
            .map_or(Fixed::ZERO, craftplan_core::demand::ItemBalance::net);
        let expected = demanded.get(item).copied().unwrap_or(Fixed::ZERO)
            + result.byproducts.get(item).copied().unwrap_or(Fixed::ZERO)
            - result.inputs.get(item).copied().unwrap_or(Fixed::ZERO);
        assert_eq!(
            net, expected,
            "conservation violated for {item}: net {net} != demanded + byproduct - raw {expected}"
        );
    }
}

/// Assert conservation for every solution in a solve result.
pub fn assert_all_conserved(solutions: &[Solution], demands: &[Demand]) {
    for solution in solutions {
        assert_conserved(solution, demands);
    }
}

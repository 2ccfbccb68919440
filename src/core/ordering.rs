use std::cmp::Ordering;

use super::types::{Debt, PayoffStrategy, PriorityMap};

/// Debts that take part in the simulation. Once any priority is set, only
/// ranked debts are kept, whatever the strategy.
pub fn active_debts(debts: &[Debt], priorities: &PriorityMap) -> Vec<Debt> {
    if priorities.is_empty() {
        return debts.to_vec();
    }
    debts
        .iter()
        .filter(|debt| priorities.contains_key(&debt.name))
        .cloned()
        .collect()
}

/// Debts left out of the active set by the priority map.
pub fn excluded_debts<'a>(debts: &'a [Debt], priorities: &PriorityMap) -> Vec<&'a Debt> {
    if priorities.is_empty() {
        return Vec::new();
    }
    debts
        .iter()
        .filter(|debt| !priorities.contains_key(&debt.name))
        .collect()
}

/// Sorts debts into the payment-allocation sequence. The order is fixed for
/// the whole simulation.
pub fn order_debts(debts: &mut [Debt], strategy: PayoffStrategy, priorities: &PriorityMap) {
    match strategy {
        PayoffStrategy::Avalanche => debts.sort_by(avalanche_cmp),
        PayoffStrategy::Snowball => debts.sort_by(snowball_cmp),
        PayoffStrategy::Custom => debts.sort_by(|a, b| {
            rank_cmp(priorities.get(&a.name), priorities.get(&b.name))
                .then_with(|| avalanche_cmp(a, b))
        }),
    }
}

fn avalanche_cmp(a: &Debt, b: &Debt) -> Ordering {
    b.apr
        .total_cmp(&a.apr)
        .then_with(|| b.balance.total_cmp(&a.balance))
}

fn snowball_cmp(a: &Debt, b: &Debt) -> Ordering {
    a.balance
        .total_cmp(&b.balance)
        .then_with(|| a.apr.total_cmp(&b.apr))
}

// Unranked debts sort after every ranked one.
fn rank_cmp(a: Option<&i64>, b: Option<&i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

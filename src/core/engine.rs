use std::collections::HashMap;

use super::types::{Debt, DebtId, MAX_SIMULATION_MONTHS, PayoffPlanEntry, Simulation};

#[derive(Debug)]
struct ActiveDebt {
    id: DebtId,
    name: String,
    apr: f64,
    monthly_rate: f64,
    balance: f64,
}

#[derive(Debug, Clone, Copy)]
struct MonthOutcome {
    opening_balance: f64,
    interest: f64,
    payment: f64,
    closing_balance: f64,
}

/// Runs the month-by-month payoff simulation over debts that are already in
/// allocation order. Returns `None` when there is nothing to simulate.
///
/// Each month the whole `monthly_payment` pool is offered to the debts in
/// order; a debt takes what it needs to clear balance plus interest and the
/// remainder flows on. The loop stops once every balance is zero or after
/// `MAX_SIMULATION_MONTHS`, in which case the unfinished entries keep a
/// positive `final_balance`.
pub fn simulate_payoff(ordered_debts: &[Debt], monthly_payment: f64) -> Option<Simulation> {
    if ordered_debts.is_empty() {
        return None;
    }

    let mut remaining: Vec<ActiveDebt> = ordered_debts
        .iter()
        .map(|debt| ActiveDebt {
            id: debt.id,
            name: debt.name.clone(),
            apr: debt.apr,
            monthly_rate: debt.monthly_rate(),
            balance: debt.balance,
        })
        .collect();

    let mut entries: Vec<PayoffPlanEntry> = Vec::with_capacity(remaining.len());
    let mut entry_index: HashMap<DebtId, usize> = HashMap::with_capacity(remaining.len());
    let mut month = 0;

    while !remaining.is_empty() && month < MAX_SIMULATION_MONTHS {
        month += 1;
        let mut available = monthly_payment;

        for debt in remaining.iter_mut() {
            let outcome = apply_month(debt, &mut available);
            match entry_index.get(&debt.id) {
                Some(&idx) => update_entry(&mut entries[idx], outcome, month),
                None => {
                    entry_index.insert(debt.id, entries.len());
                    entries.push(new_entry(debt, outcome, month));
                }
            }
        }

        remaining.retain(|debt| debt.balance > 0.0);
    }

    let reached_month_cap = !remaining.is_empty();
    if reached_month_cap {
        tracing::warn!(
            months = month,
            unpaid_debts = remaining.len(),
            "payoff simulation stopped at the month cap"
        );
    }
    tracing::debug!(months = month, "payoff simulation finished");

    Some(Simulation {
        entries,
        months_simulated: month,
        reached_month_cap,
    })
}

fn apply_month(debt: &mut ActiveDebt, available: &mut f64) -> MonthOutcome {
    let opening_balance = debt.balance;
    let interest = opening_balance * debt.monthly_rate;
    let due = opening_balance + interest;

    let payment = if *available >= due {
        *available -= due;
        debt.balance = 0.0;
        due
    } else {
        // Partial payments may not even cover interest; the balance grows.
        let payment = *available;
        debt.balance = due - payment;
        *available = 0.0;
        payment
    };

    MonthOutcome {
        opening_balance,
        interest,
        payment,
        closing_balance: debt.balance,
    }
}

fn new_entry(debt: &ActiveDebt, outcome: MonthOutcome, month: u32) -> PayoffPlanEntry {
    PayoffPlanEntry {
        debt_id: debt.id,
        name: debt.name.clone(),
        starting_balance: outcome.opening_balance,
        interest_rate: debt.apr,
        monthly_payment: outcome.payment - outcome.interest,
        months: month,
        total_interest: outcome.interest,
        total_paid: outcome.payment,
        final_balance: outcome.closing_balance,
    }
}

fn update_entry(entry: &mut PayoffPlanEntry, outcome: MonthOutcome, month: u32) {
    entry.total_interest += outcome.interest;
    entry.total_paid += outcome.payment;
    entry.months = month;
    entry.monthly_payment = entry
        .monthly_payment
        .max(outcome.payment - outcome.interest);
    entry.final_balance = outcome.closing_balance;
}

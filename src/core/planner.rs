use std::collections::HashSet;

use chrono::NaiveDate;

use super::engine::simulate_payoff;
use super::error::{PlanError, Result};
use super::ordering::{active_debts, excluded_debts, order_debts};
use super::solver::solve_target_payment;
use super::types::{
    PaymentAdjustment, PayoffPlan, PlanOutcome, PlanRequest, PlanTotals,
};

/// Builds a payoff plan for `request` as of `today`.
///
/// Returns `PlanOutcome::NoDebts` when there are no debts, or when the
/// priority map filters every debt out. A plan that cannot finish within the
/// month cap is still `Planned`; check `PayoffPlan::is_paid_off`.
pub fn generate_plan(request: &PlanRequest, today: NaiveDate) -> Result<PlanOutcome> {
    validate_request(request)?;

    if request.debts.is_empty() {
        tracing::info!("no debts found for payoff plan");
        return Ok(PlanOutcome::NoDebts);
    }

    let mut debts = active_debts(&request.debts, &request.priorities);
    if debts.is_empty() {
        tracing::info!("priority map excludes every debt; nothing to plan");
        return Ok(PlanOutcome::NoDebts);
    }

    tracing::debug!(
        strategy = request.strategy.label(),
        debts = debts.len(),
        monthly_payment = request.monthly_payment,
        target_date = ?request.target_date,
        "generating payoff plan"
    );

    order_debts(&mut debts, request.strategy, &request.priorities);

    let mut payment_used = request.monthly_payment;
    let mut adjustment = None;
    if let Some(target_date) = request.target_date {
        let excluded = excluded_debts(&request.debts, &request.priorities);
        let target = solve_target_payment(&debts, &excluded, target_date, today)?;
        if target.required_payment > request.monthly_payment {
            tracing::info!(
                requested = request.monthly_payment,
                required = target.required_payment,
                "increased monthly payment to meet target date"
            );
            adjustment = Some(PaymentAdjustment {
                requested: request.monthly_payment,
                required: target.required_payment,
            });
            payment_used = target.required_payment;
        }
    }

    let simulation = simulate_payoff(&debts, payment_used).ok_or_else(|| {
        PlanError::Computation("active debt set emptied before simulation".to_string())
    })?;

    Ok(PlanOutcome::Planned(PayoffPlan {
        strategy: request.strategy,
        totals: PlanTotals::from_entries(&simulation.entries),
        entries: simulation.entries,
        payment_used,
        adjustment,
        months_simulated: simulation.months_simulated,
        reached_month_cap: simulation.reached_month_cap,
    }))
}

fn validate_request(request: &PlanRequest) -> Result<()> {
    if !request.monthly_payment.is_finite() || request.monthly_payment <= 0.0 {
        return Err(PlanError::invalid("monthly_payment", "must be > 0"));
    }

    let mut seen = HashSet::with_capacity(request.debts.len());
    for (i, debt) in request.debts.iter().enumerate() {
        if !debt.balance.is_finite() || debt.balance < 0.0 {
            return Err(PlanError::invalid(format!("debts[{i}].balance"), "must be >= 0"));
        }
        if !debt.apr.is_finite() || debt.apr < 0.0 {
            return Err(PlanError::invalid(format!("debts[{i}].apr"), "must be >= 0"));
        }
        if !seen.insert(debt.id) {
            return Err(PlanError::invalid(
                format!("debts[{i}].id"),
                format!("duplicate id {}", debt.id.0),
            ));
        }
    }
    Ok(())
}

mod engine;
mod error;
mod ordering;
mod planner;
mod solver;
mod types;

pub use engine::simulate_payoff;
pub use error::{PlanError, Result};
pub use ordering::{active_debts, excluded_debts, order_debts};
pub use planner::generate_plan;
pub use solver::{
    AVERAGE_DAYS_PER_MONTH, EXCLUDED_MINIMUM_CAP, TargetPayment, months_until,
    solve_target_payment,
};
pub use types::{
    Debt, DebtId, MAX_SIMULATION_MONTHS, PaymentAdjustment, PayoffPlan, PayoffPlanEntry,
    PayoffStrategy, PlanOutcome, PlanRequest, PlanTotals, PriorityMap, Simulation,
};

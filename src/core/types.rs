use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Longest horizon the simulator will run before giving up (100 years).
pub const MAX_SIMULATION_MONTHS: u32 = 1200;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebtId(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: DebtId,
    pub name: String,
    pub balance: f64,
    /// Annual rate in percent, e.g. `19.99`.
    pub apr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_balance: Option<f64>,
}

impl Debt {
    pub fn new(id: i64, name: impl Into<String>, balance: f64, apr: f64) -> Self {
        Self {
            id: DebtId(id),
            name: name.into(),
            balance,
            apr,
            original_balance: None,
        }
    }

    pub fn monthly_rate(&self) -> f64 {
        self.apr / 100.0 / 12.0
    }

    /// Share of the original balance already repaid, in percent.
    pub fn repayment_progress(&self) -> f64 {
        match self.original_balance {
            Some(original) if original > 0.0 => (original - self.balance) / original * 100.0,
            _ => 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum PayoffStrategy {
    #[default]
    Avalanche,
    Snowball,
    Custom,
}

impl PayoffStrategy {
    pub fn label(self) -> &'static str {
        match self {
            PayoffStrategy::Avalanche => "Debt Avalanche",
            PayoffStrategy::Snowball => "Debt Snowball",
            PayoffStrategy::Custom => "Custom Priority",
        }
    }
}

/// Debt name to rank; lower ranks are paid first.
pub type PriorityMap = HashMap<String, i64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffPlanEntry {
    #[serde(rename = "id")]
    pub debt_id: DebtId,
    pub name: String,
    pub starting_balance: f64,
    pub interest_rate: f64,
    /// Largest principal amount paid in any single month.
    pub monthly_payment: f64,
    pub months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    pub final_balance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTotals {
    pub starting_balance: f64,
    pub monthly_payment: f64,
    pub months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    pub final_balance: f64,
}

impl PlanTotals {
    pub fn from_entries(entries: &[PayoffPlanEntry]) -> Self {
        entries.iter().fold(Self::default(), |acc, entry| Self {
            starting_balance: acc.starting_balance + entry.starting_balance,
            monthly_payment: acc.monthly_payment + entry.monthly_payment,
            months: acc.months.max(entry.months),
            total_interest: acc.total_interest + entry.total_interest,
            total_paid: acc.total_paid + entry.total_paid,
            final_balance: acc.final_balance + entry.final_balance,
        })
    }
}

/// Raw simulator output, before the planner attaches request context.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub entries: Vec<PayoffPlanEntry>,
    pub months_simulated: u32,
    pub reached_month_cap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAdjustment {
    pub requested: f64,
    pub required: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayoffPlan {
    pub strategy: PayoffStrategy,
    pub entries: Vec<PayoffPlanEntry>,
    pub totals: PlanTotals,
    pub payment_used: f64,
    pub adjustment: Option<PaymentAdjustment>,
    pub months_simulated: u32,
    pub reached_month_cap: bool,
}

impl PayoffPlan {
    pub fn is_paid_off(&self) -> bool {
        self.entries.iter().all(|entry| entry.final_balance <= 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    NoDebts,
    Planned(PayoffPlan),
}

#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub debts: Vec<Debt>,
    pub monthly_payment: f64,
    pub strategy: PayoffStrategy,
    pub target_date: Option<chrono::NaiveDate>,
    pub priorities: PriorityMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, months: u32, final_balance: f64) -> PayoffPlanEntry {
        PayoffPlanEntry {
            debt_id: DebtId(1),
            name: name.to_string(),
            starting_balance: 1000.0,
            interest_rate: 10.0,
            monthly_payment: 150.0,
            months,
            total_interest: 40.0,
            total_paid: 1040.0 - final_balance,
            final_balance,
        }
    }

    #[test]
    fn repayment_progress_uses_original_balance() {
        let mut debt = Debt::new(1, "Card", 250.0, 19.99);
        assert_eq!(debt.repayment_progress(), 0.0);

        debt.original_balance = Some(1000.0);
        assert!((debt.repayment_progress() - 75.0).abs() < 1e-12);

        debt.original_balance = Some(0.0);
        assert_eq!(debt.repayment_progress(), 0.0);
    }

    #[test]
    fn totals_sum_amounts_and_take_longest_horizon() {
        let totals = PlanTotals::from_entries(&[entry("A", 4, 0.0), entry("B", 11, 25.0)]);
        assert_eq!(totals.months, 11);
        assert!((totals.starting_balance - 2000.0).abs() < 1e-12);
        assert!((totals.monthly_payment - 300.0).abs() < 1e-12);
        assert!((totals.total_interest - 80.0).abs() < 1e-12);
        assert!((totals.final_balance - 25.0).abs() < 1e-12);
    }

    #[test]
    fn debt_records_deserialize_from_store_json() {
        let json = r#"[{"id": 3, "name": "Car loan", "balance": 7250.5, "apr": 6.9}]"#;
        let debts: Vec<Debt> = serde_json::from_str(json).expect("valid debts");
        assert_eq!(debts[0].id, DebtId(3));
        assert_eq!(debts[0].original_balance, None);
        assert!((debts[0].monthly_rate() - 0.00575).abs() < 1e-12);
    }
}

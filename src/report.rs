//! Text rendering of payoff plans. The currency is always passed in; the
//! engine itself never formats amounts.

use std::fmt::{self, Write};
use std::str::FromStr;

use crate::core::{PayoffPlan, PlanOutcome};

pub const NO_DEBTS_MESSAGE: &str = "There are no debts to create a payoff plan for.";

const HEADERS: [&str; 7] = [
    "Debt",
    "Initial Balance",
    "Interest Rate",
    "Monthly Payment",
    "Months to Payoff",
    "Total Interest Paid",
    "Final Balance",
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Currency {
    #[default]
    Gbp,
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Usd, Currency::Eur];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Gbp => "£",
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Currency::Gbp => "British Pound",
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
        }
    }

    pub fn format_amount(self, amount: f64) -> String {
        if amount < 0.0 {
            format!("-{}{:.2}", self.symbol(), -amount)
        } else {
            format!("{}{:.2}", self.symbol(), amount)
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.symbol())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported currency '{s}'"))
    }
}

pub fn render_outcome(outcome: &PlanOutcome, currency: Currency) -> String {
    match outcome {
        PlanOutcome::NoDebts => format!("{NO_DEBTS_MESSAGE}\n"),
        PlanOutcome::Planned(plan) => render_plan(plan, currency),
    }
}

pub fn render_plan(plan: &PayoffPlan, currency: Currency) -> String {
    let mut rows: Vec<[String; 7]> = plan
        .entries
        .iter()
        .map(|entry| {
            [
                entry.name.clone(),
                currency.format_amount(entry.starting_balance),
                format!("{}%", entry.interest_rate),
                currency.format_amount(entry.monthly_payment),
                entry.months.to_string(),
                currency.format_amount(entry.total_interest),
                currency.format_amount(entry.final_balance),
            ]
        })
        .collect();
    rows.push([
        "Total".to_string(),
        currency.format_amount(plan.totals.starting_balance),
        "-".to_string(),
        currency.format_amount(plan.totals.monthly_payment),
        plan.totals.months.to_string(),
        currency.format_amount(plan.totals.total_interest),
        currency.format_amount(plan.totals.final_balance),
    ]);

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    if let Some(adjustment) = plan.adjustment {
        let _ = writeln!(
            out,
            "To meet the target date, the monthly payment has been increased from {} to {}.",
            currency.format_amount(adjustment.requested),
            currency.format_amount(adjustment.required)
        );
    }
    let _ = writeln!(
        out,
        "{} with {} per month",
        plan.strategy.label(),
        currency.format_amount(plan.payment_used)
    );

    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    if !plan.is_paid_off() {
        let _ = writeln!(
            out,
            "Warning: this payment does not pay off every debt within {} months.",
            plan.months_simulated
        );
    }
    out
}

// Width is counted in chars so currency symbols pad correctly.
fn push_row(out: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

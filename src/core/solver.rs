use chrono::NaiveDate;

use super::error::{PlanError, Result};
use super::types::Debt;

pub const AVERAGE_DAYS_PER_MONTH: f64 = 30.44;

/// Flat ceiling on the per-month servicing estimate for a debt left out of
/// the prioritized set.
pub const EXCLUDED_MINIMUM_CAP: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPayment {
    pub months_until_target: f64,
    /// Active principal spread evenly over the months left.
    pub principal_share: f64,
    pub excluded_minimums: f64,
    pub required_payment: f64,
}

/// Estimates the monthly payment needed to clear `active_debts` by
/// `target_date`.
///
/// The estimate is linear: principal divided by the (fractional) months
/// remaining, with no allowance for interest. Debts in `excluded_debts` add
/// `min(monthly interest, EXCLUDED_MINIMUM_CAP)` each.
pub fn solve_target_payment(
    active_debts: &[Debt],
    excluded_debts: &[&Debt],
    target_date: NaiveDate,
    today: NaiveDate,
) -> Result<TargetPayment> {
    let months_until_target = months_until(target_date, today)?;

    let total_principal: f64 = active_debts.iter().map(|debt| debt.balance).sum();
    let principal_share = total_principal / months_until_target;
    let excluded_minimums: f64 = excluded_debts
        .iter()
        .map(|debt| excluded_minimum_payment(debt))
        .sum();

    Ok(TargetPayment {
        months_until_target,
        principal_share,
        excluded_minimums,
        required_payment: principal_share + excluded_minimums,
    })
}

pub fn months_until(target_date: NaiveDate, today: NaiveDate) -> Result<f64> {
    let days = (target_date - today).num_days();
    if days <= 0 {
        return Err(PlanError::invalid(
            "target_date",
            format!("{target_date} must be after {today}"),
        ));
    }
    Ok(days as f64 / AVERAGE_DAYS_PER_MONTH)
}

fn excluded_minimum_payment(debt: &Debt) -> f64 {
    (debt.balance * debt.monthly_rate()).min(EXCLUDED_MINIMUM_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn one_year_target_spreads_principal_over_average_months() {
        let debts = vec![
            Debt::new(1, "Car", 8000.0, 6.5),
            Debt::new(2, "Card", 4000.0, 21.0),
        ];
        let result = solve_target_payment(&debts, &[], date(2026, 1, 1), date(2025, 1, 1))
            .expect("future target");

        assert_close(result.months_until_target, 365.0 / 30.44, 1e-12);
        assert_close(result.required_payment, 12_000.0 * 30.44 / 365.0, 1e-9);
        assert_close(result.required_payment, 1000.8, 0.05);
        assert_close(result.excluded_minimums, 0.0, 0.0);
    }

    #[test]
    fn target_equal_to_today_is_rejected() {
        let debts = vec![Debt::new(1, "Card", 1000.0, 20.0)];
        let today = date(2025, 6, 1);
        let err = solve_target_payment(&debts, &[], today, today).expect_err("must reject");
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("target_date"));
    }

    #[test]
    fn target_in_the_past_is_rejected() {
        let err = months_until(date(2024, 12, 31), date(2025, 1, 1)).expect_err("must reject");
        assert!(matches!(err, PlanError::InvalidInput { ref field, .. } if field == "target_date"));
    }

    #[test]
    fn excluded_debts_add_interest_capped_minimums() {
        let active = vec![Debt::new(1, "Card", 3044.0, 20.0)];
        let cheap = Debt::new(2, "Store", 1200.0, 12.0);
        let large = Debt::new(3, "Loan", 20_000.0, 9.0);
        let excluded = vec![&cheap, &large];

        // 100 days ahead is 100 / 30.44 months.
        let result = solve_target_payment(&active, &excluded, date(2025, 4, 11), date(2025, 1, 1))
            .expect("future target");

        assert_close(result.principal_share, 3044.0 / (100.0 / 30.44), 1e-9);
        // 1200 * 1% = 12, 20000 * 0.75% = 150 capped to 50.
        assert_close(result.excluded_minimums, 62.0, 1e-9);
        assert_close(
            result.required_payment,
            result.principal_share + result.excluded_minimums,
            1e-12,
        );
    }
}

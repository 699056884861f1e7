use crate::monthly_columns::calculate_monthly_columns;
use crate::rounding::round_currency;
use crate::schema::MonthlyPlanData;
use serde::{Deserialize, Serialize};

/// Per-employee-per-month amount over an aggregation window.
///
/// `subscriber_months` is the sum of monthly subscriber counts across the window, so the
/// average enrollment is `subscriber_months / number_of_months`, and the result is
/// `total_amount` over that average. Pass a monthly (or average monthly) amount to get a
/// per-month figure. Returns 0 when there is no enrollment data.
pub fn calculate_pepm(total_amount: f64, subscriber_months: f64, number_of_months: u32) -> f64 {
    if number_of_months == 0 || subscriber_months == 0.0 {
        return 0.0;
    }

    let average_subscribers = subscriber_months / number_of_months as f64;
    total_amount / average_subscribers
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split24<'a, T> {
    pub current_12: &'a [T],
    pub prior_12: &'a [T],
}

/// Splits a 24-month series into "current" (first 12 entries) and "prior" (entries
/// 13-24). With fewer than 24 entries everything is treated as current.
///
/// The slice is used in the order given; callers must supply it so that the first twelve
/// entries are the current period.
pub fn split_24_months<T>(data: &[T]) -> Split24<'_, T> {
    if data.len() < 24 {
        return Split24 {
            current_12: data,
            prior_12: &[],
        };
    }

    Split24 {
        current_12: &data[..12],
        prior_12: &data[12..24],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PepmComparison {
    pub current_pepm: f64,
    pub prior_pepm: f64,
    pub change_percent: f64,
    pub current_months: usize,
    pub prior_months: usize,
}

/// Total-cost PEPM for the current and prior periods of a 24-month series. Months are
/// ordered most recent first before splitting, so the current period is the latest
/// twelve whatever order they arrive in.
pub fn compare_pepm_periods(months: &[MonthlyPlanData]) -> PepmComparison {
    let mut newest_first: Vec<&MonthlyPlanData> = months.iter().collect();
    newest_first.sort_by(|a, b| b.month.cmp(&a.month));

    let split = split_24_months(&newest_first);

    let current_pepm = total_cost_pepm(split.current_12);
    let prior_pepm = total_cost_pepm(split.prior_12);

    let change_percent = if prior_pepm == 0.0 {
        0.0
    } else {
        (current_pepm - prior_pepm) / prior_pepm * 100.0
    };

    PepmComparison {
        current_pepm: round_currency(current_pepm),
        prior_pepm: round_currency(prior_pepm),
        change_percent: round_currency(change_percent),
        current_months: split.current_12.len(),
        prior_months: split.prior_12.len(),
    }
}

fn total_cost_pepm(months: &[&MonthlyPlanData]) -> f64 {
    if months.is_empty() {
        return 0.0;
    }

    let total_cost: f64 = months
        .iter()
        .map(|m| calculate_monthly_columns(m).total_cost)
        .sum();
    let subscriber_months: f64 = months.iter().map(|m| m.subscribers as f64).sum();

    let number_of_months = months.len() as u32;
    calculate_pepm(
        total_cost / number_of_months as f64,
        subscriber_months,
        number_of_months,
    )
}

use crate::schema::{FeeUnitType, FeeWindow, MonthlyActuals};
use crate::utils::days_in_month;
use chrono::{Datelike, NaiveDate};

/// Inclusive day count of the overlap between a fee window and a month.
/// Returns 0 when they do not overlap.
pub fn get_effective_days(
    window_start: NaiveDate,
    window_end: NaiveDate,
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> i64 {
    let effective_start = window_start.max(month_start);
    let effective_end = window_end.min(month_end);

    if effective_start > effective_end {
        return 0;
    }

    (effective_end - effective_start).num_days() + 1
}

/// The fee's contribution to one month, prorated by the days the window is effective.
pub fn calculate_prorated_fee(
    fee: &FeeWindow,
    month_start: NaiveDate,
    month_end: NaiveDate,
    actuals: &MonthlyActuals,
) -> f64 {
    let effective_days = get_effective_days(
        fee.effective_start,
        fee.effective_end,
        month_start,
        month_end,
    );

    if effective_days == 0 {
        return 0.0;
    }

    let month_days = days_in_month(month_start.year(), month_start.month()) as f64;
    let proration_factor = effective_days as f64 / month_days;

    match fee.unit_type {
        FeeUnitType::Annual => (fee.rate / 12.0) * proration_factor,
        FeeUnitType::Monthly => fee.rate * proration_factor,
        FeeUnitType::Pepm => fee.rate * actuals.member_count as f64 * proration_factor,
        FeeUnitType::PerEmployeePerMonth => {
            fee.rate * actuals.employee_count as f64 * proration_factor
        }
        FeeUnitType::PercentOfClaims => {
            (fee.rate / 100.0) * actuals.total_claims() * proration_factor
        }
        FeeUnitType::Flat => {
            let covers_full_month =
                fee.effective_start <= month_start && fee.effective_end >= month_end;
            if covers_full_month {
                fee.rate
            } else {
                fee.rate * proration_factor
            }
        }
    }
}

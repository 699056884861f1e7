use crate::error::{BenefitsError, Result};
use chrono::{Datelike, NaiveDate};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of calendar days in the given month (28-31).
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(days_in_month(date.year(), date.month()))
        .unwrap_or(date)
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)).ok_or_else(|| {
        BenefitsError::DateError(format!("Invalid year/month: {}-{:02}", year, month))
    })
}

/// Parses an uploaded date cell. Accepts "YYYY-MM-DD", "MM/DD/YYYY" and "YYYY-MM";
/// the month-only form resolves to the first day of that month.
pub fn parse_date_value(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();

    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    // "YYYY-MM"
    let start_str = format!("{}-01", trimmed);
    NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
        BenefitsError::DateError(format!(
            "Invalid date: '{}'. Expected YYYY-MM-DD, MM/DD/YYYY or YYYY-MM",
            value
        ))
    })
}

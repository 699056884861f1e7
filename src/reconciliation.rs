use crate::rounding::{from_decimal, to_decimal};
use crate::validation::ParsedRow;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Largest per-column difference, in dollars, that still counts as reconciled.
pub const RECONCILIATION_TOLERANCE: f64 = 0.01;

const DEFAULT_TOLERANCE: Decimal = dec!(0.01);

pub const DEFAULT_RECONCILIATION_COLUMNS: [&str; 2] = ["medicalPaid", "rxPaid"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    Passed,
    Failed,
    NotDetected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDifference {
    pub column: String,
    pub expected: f64,
    pub calculated: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub status: ReconciliationStatus,
    pub passed: bool,
    pub sum_detected: bool,
    pub tolerance: f64,
    /// Sum of the reconciled columns on the All Plans row.
    pub expected_total: f64,
    /// Sum of the reconciled columns over every other row.
    pub calculated_total: f64,
    pub differences: Vec<ColumnDifference>,
    pub message: String,
}

/// Plan names such as "All Plans" or "ALL PLANS" mark the pre-summed aggregate row.
pub fn is_all_plans_row(plan_name: &str) -> bool {
    let lower = plan_name.to_lowercase();
    lower.contains("all") && lower.contains("plan")
}

/// Checks a file's aggregate row against the plans beneath it.
pub struct AllPlansReconciler<'a> {
    plan_column: &'a str,
    value_columns: &'a [&'a str],
    tolerance: f64,
}

impl<'a> AllPlansReconciler<'a> {
    pub fn new(plan_column: &'a str, value_columns: &'a [&'a str]) -> Self {
        Self {
            plan_column,
            value_columns,
            tolerance: RECONCILIATION_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn find_aggregate_row(&self, rows: &[ParsedRow]) -> Option<usize> {
        rows.iter().position(|row| {
            row.get(self.plan_column)
                .map(is_all_plans_row)
                .unwrap_or(false)
        })
    }

    pub fn reconcile(&self, rows: &[ParsedRow]) -> ReconciliationResult {
        let Some(aggregate_index) = self.find_aggregate_row(rows) else {
            debug!("No All Plans row in {} rows; reconciliation skipped", rows.len());
            return ReconciliationResult {
                status: ReconciliationStatus::NotDetected,
                passed: false,
                sum_detected: false,
                tolerance: self.tolerance,
                expected_total: 0.0,
                calculated_total: 0.0,
                differences: Vec::new(),
                message: "No All Plans row found; reconciliation skipped".to_string(),
            };
        };

        let aggregate = &rows[aggregate_index];
        let tolerance = to_decimal(self.tolerance).unwrap_or(DEFAULT_TOLERANCE);

        let mut expected_total = Decimal::ZERO;
        let mut calculated_total = Decimal::ZERO;
        let mut out_of_balance = Vec::new();

        let differences: Vec<ColumnDifference> = self
            .value_columns
            .iter()
            .map(|column| {
                let expected = aggregate.get_decimal(column).unwrap_or_default();
                let calculated: Decimal = rows
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != aggregate_index)
                    .map(|(_, row)| row.get_decimal(column).unwrap_or_default())
                    .sum();
                let difference = calculated - expected;

                expected_total += expected;
                calculated_total += calculated;
                if difference.abs() > tolerance {
                    out_of_balance.push(format!("{} off by {:.2}", column, difference));
                }

                ColumnDifference {
                    column: column.to_string(),
                    expected: from_decimal(expected),
                    calculated: from_decimal(calculated),
                    difference: from_decimal(difference),
                }
            })
            .collect();

        let expected_total = from_decimal(expected_total);
        let calculated_total = from_decimal(calculated_total);
        let passed = out_of_balance.is_empty();

        let message = if passed {
            format!(
                "All Plans row reconciles: expected {:.2}, calculated {:.2}",
                expected_total, calculated_total
            )
        } else {
            let detail = out_of_balance.join(", ");
            warn!(
                "All Plans row (data row {}) does not reconcile: {}",
                aggregate.row_number, detail
            );
            format!("All Plans row does not reconcile: {}", detail)
        };

        ReconciliationResult {
            status: if passed {
                ReconciliationStatus::Passed
            } else {
                ReconciliationStatus::Failed
            },
            passed,
            sum_detected: true,
            tolerance: self.tolerance,
            expected_total,
            calculated_total,
            differences,
            message,
        }
    }
}

pub fn reconcile_all_plans(
    rows: &[ParsedRow],
    plan_column: &str,
    value_columns: &[&str],
) -> ReconciliationResult {
    AllPlansReconciler::new(plan_column, value_columns).reconcile(rows)
}

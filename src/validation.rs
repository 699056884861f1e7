//! Header and cell rules for uploaded monthly-stats and high-claimant files.
//!
//! File parsing happens upstream; these rules work on rows already split into
//! header/value text. Problems are collected and returned, never raised.

use crate::reconciliation::{reconcile_all_plans, ReconciliationResult, DEFAULT_RECONCILIATION_COLUMNS};
use crate::rounding::to_decimal;
use crate::utils::parse_date_value;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    MonthlyStats,
    HighClaimants,
}

impl FileType {
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            FileType::MonthlyStats => &["month", "plan", "medicalPaid", "rxPaid"],
            FileType::HighClaimants => &["claimantKey", "plan", "medicalPaid", "rxPaid", "totalPaid"],
        }
    }

    pub fn numeric_columns(&self) -> &'static [&'static str] {
        match self {
            FileType::MonthlyStats => &[
                "subscribers",
                "medicalPaid",
                "rxPaid",
                "specStopLossReimbursement",
                "estRxRebates",
                "adminFees",
                "stopLossFees",
                "budgetedPremium",
            ],
            FileType::HighClaimants => &["medicalPaid", "rxPaid", "totalPaid"],
        }
    }

    pub fn date_columns(&self) -> &'static [&'static str] {
        match self {
            FileType::MonthlyStats => &["month"],
            FileType::HighClaimants => &[],
        }
    }
}

/// One data row, keyed by the header text exactly as uploaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedRow {
    /// 1-based data row number (row 0 is the header line).
    pub row_number: usize,
    pub values: BTreeMap<String, String>,
}

impl ParsedRow {
    pub fn new(row_number: usize, values: BTreeMap<String, String>) -> Self {
        Self { row_number, values }
    }

    /// Looks up a cell by column name, ignoring case and separators.
    pub fn get(&self, column: &str) -> Option<&str> {
        let wanted = normalize_column_name(column);
        self.values
            .iter()
            .find(|(key, _)| normalize_column_name(key) == wanted)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_numeric(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(parse_numeric)
    }

    pub fn get_decimal(&self, column: &str) -> Option<Decimal> {
        self.get(column).and_then(parse_decimal)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub column: String,
    pub value: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub errors: Vec<ValidationError>,
    pub row_count: usize,
    pub reconciliation: Option<ReconciliationResult>,
}

/// "Medical Paid", "medical_paid" and "medicalPaid" all normalize to "medicalpaid".
pub fn normalize_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn clean_numeric(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect()
}

/// Parses a currency cell such as "$1,234.50". Returns `None` for anything that is not a
/// finite number once `$`, `,` and whitespace are removed.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let cleaned = clean_numeric(value);
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Like [`parse_numeric`], but keeps the cell's exact decimal digits.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let cleaned = clean_numeric(value);
    if cleaned.is_empty() {
        return None;
    }

    cleaned
        .parse::<Decimal>()
        .ok()
        .or_else(|| parse_numeric(&cleaned).and_then(to_decimal))
}

/// Credit columns (rebates, reimbursements, adjustments) may carry negative values.
pub fn allows_negative(column: &str) -> bool {
    let lower = column.to_lowercase();
    ["rebate", "reimbursement", "adjustment"]
        .iter()
        .any(|word| lower.contains(word))
}

pub fn validate_headers(headers: &[String], file_type: FileType) -> Vec<ValidationError> {
    let present: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();

    file_type
        .required_columns()
        .iter()
        .filter(|required| !present.contains(&normalize_column_name(required)))
        .map(|required| ValidationError {
            row: 0,
            column: required.to_string(),
            value: None,
            message: format!("Missing required column '{}'", required),
        })
        .collect()
}

pub fn validate_data_types(rows: &[ParsedRow], file_type: FileType) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for row in rows {
        for column in file_type.numeric_columns() {
            let Some(raw) = row.get(column) else { continue };
            if raw.trim().is_empty() {
                continue;
            }

            match parse_numeric(raw) {
                None => errors.push(ValidationError {
                    row: row.row_number,
                    column: column.to_string(),
                    value: Some(raw.to_string()),
                    message: format!("'{}' is not a valid number", raw),
                }),
                Some(value) if value < 0.0 && !allows_negative(column) => {
                    errors.push(ValidationError {
                        row: row.row_number,
                        column: column.to_string(),
                        value: Some(raw.to_string()),
                        message: format!("Negative values are not allowed in '{}'", column),
                    })
                }
                Some(_) => {}
            }
        }

        for column in file_type.date_columns() {
            let Some(raw) = row.get(column) else { continue };
            if raw.trim().is_empty() {
                continue;
            }

            if parse_date_value(raw).is_err() {
                errors.push(ValidationError {
                    row: row.row_number,
                    column: column.to_string(),
                    value: Some(raw.to_string()),
                    message: format!("'{}' is not a valid date", raw),
                });
            }
        }
    }

    errors
}

/// Runs header and cell checks, plus the All Plans reconciliation for monthly stats.
/// A failed reconciliation is reported but does not fail validation.
pub fn validate_file(file: &ParsedFile, file_type: FileType) -> ValidationResult {
    let mut errors = validate_headers(&file.headers, file_type);
    errors.extend(validate_data_types(&file.rows, file_type));

    let reconciliation = match file_type {
        FileType::MonthlyStats => Some(reconcile_all_plans(
            &file.rows,
            "plan",
            &DEFAULT_RECONCILIATION_COLUMNS,
        )),
        FileType::HighClaimants => None,
    };

    if !errors.is_empty() {
        warn!(
            "{:?} upload failed validation with {} errors",
            file_type,
            errors.len()
        );
    }
    debug!("Validated {} rows as {:?}", file.rows.len(), file_type);

    ValidationResult {
        success: errors.is_empty(),
        errors,
        row_count: file.rows.len(),
        reconciliation,
    }
}

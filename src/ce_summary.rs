//! The Claims & Expenses (C&E) statement.
//!
//! The statement is a fixed sequence of 29 lines (9 section headers, 20 value lines).
//! Line positions double as item numbers, so downstream renderers can key off them;
//! headers report item number 0.
//!
//! Cumulative columns are produced by running the same calculation over a
//! pre-aggregated input (see [`aggregate_ce_summary`]) rather than by summing monthly
//! lines, which would be wrong for ratios such as PEPM and variance percent.

use crate::error::{BenefitsError, Result};
use crate::rounding::round_currency;
use crate::schema::CeSummaryInput;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const CE_ROW_COUNT: usize = 29;

const DECLARED_TOTAL_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowType {
    Header,
    Data,
    Subtotal,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowColor {
    Adjustment,
    Total,
    /// Under budget (favorable).
    VariancePositive,
    /// At or over budget (unfavorable).
    VarianceNegative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    Currency,
    Number,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CeSummaryRow {
    pub item_number: u32,
    pub name: String,
    pub monthly_value: f64,
    pub cumulative_value: Option<f64>,
    pub row_type: RowType,
    pub formula: Option<String>,
    pub is_editable: bool,
    pub color: Option<RowColor>,
    pub format: DisplayFormat,
}

impl CeSummaryRow {
    fn header(name: &str) -> Self {
        Self {
            item_number: 0,
            name: name.to_string(),
            monthly_value: 0.0,
            cumulative_value: None,
            row_type: RowType::Header,
            formula: None,
            is_editable: false,
            color: None,
            format: DisplayFormat::Currency,
        }
    }

    fn value(name: &str, value: f64, row_type: RowType, format: DisplayFormat) -> Self {
        let monthly_value = match format {
            DisplayFormat::Number => value,
            DisplayFormat::Currency | DisplayFormat::Percent => round_currency(value),
        };
        let color = match row_type {
            RowType::Subtotal | RowType::Total => Some(RowColor::Total),
            _ => None,
        };

        Self {
            item_number: 0,
            name: name.to_string(),
            monthly_value,
            cumulative_value: None,
            row_type,
            formula: None,
            is_editable: false,
            color,
            format,
        }
    }

    fn data(name: &str, value: f64) -> Self {
        Self::value(name, value, RowType::Data, DisplayFormat::Currency)
    }

    fn with_formula(mut self, formula: &str) -> Self {
        self.formula = Some(formula.to_string());
        self
    }

    fn adjustment(mut self) -> Self {
        self.is_editable = true;
        self.color = Some(RowColor::Adjustment);
        self
    }

    /// Colour follows the sign of the unrounded variance.
    fn variance(mut self, raw: f64) -> Self {
        self.color = Some(variance_color(raw));
        self
    }
}

/// Overspend (a non-negative variance) is unfavorable.
pub fn variance_color(value: f64) -> RowColor {
    if value >= 0.0 {
        RowColor::VarianceNegative
    } else {
        RowColor::VariancePositive
    }
}

/// Key figures derived from one input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CeMetrics {
    pub medical_subtotal: f64,
    pub medical_total: f64,
    pub admin_total: f64,
    pub monthly_ce: f64,
    pub pepm_actual: f64,
    pub pepm_budget: f64,
    pub variance_dollars: f64,
    pub variance_percent: f64,
}

impl CeMetrics {
    pub fn from_input(input: &CeSummaryInput) -> Self {
        let medical_subtotal =
            input.domestic_facility + input.non_domestic_facility + input.non_hospital_medical;
        let medical_total = medical_subtotal + input.medical_adjustment;
        let admin_total = input.admin_fees + input.other_admin_fees;

        let monthly_ce = medical_total
            + input.rx_claims
            + input.rx_rebates
            + input.stop_loss_premiums
            + input.stop_loss_reimbursements
            + admin_total;

        let members = input.member_count as f64;
        let (pepm_actual, pepm_budget) = if input.member_count > 0 {
            (monthly_ce / members, input.total_budget / members)
        } else {
            (0.0, 0.0)
        };

        let variance_dollars = monthly_ce - input.total_budget;
        let variance_percent = if input.total_budget != 0.0 {
            variance_dollars / input.total_budget * 100.0
        } else {
            0.0
        };

        Self {
            medical_subtotal,
            medical_total,
            admin_total,
            monthly_ce,
            pepm_actual,
            pepm_budget,
            variance_dollars,
            variance_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CeSummaryResult {
    pub rows: Vec<CeSummaryRow>,
    pub metrics: CeMetrics,
    pub cumulative_metrics: Option<CeMetrics>,
}

impl CeSummaryResult {
    pub fn monthly_ce(&self) -> f64 {
        self.metrics.monthly_ce
    }

    pub fn cumulative_ce(&self) -> Option<f64> {
        self.cumulative_metrics.as_ref().map(|m| m.monthly_ce)
    }

    pub fn row(&self, item_number: u32) -> Option<&CeSummaryRow> {
        if item_number == 0 {
            return None;
        }
        self.rows.iter().find(|r| r.item_number == item_number)
    }
}

/// Builds the statement for `input`. When `cumulative_input` is given, the same
/// calculation is run on it and each line's result becomes that line's cumulative value.
pub fn calculate_ce_summary(
    input: &CeSummaryInput,
    cumulative_input: Option<&CeSummaryInput>,
) -> CeSummaryResult {
    let metrics = CeMetrics::from_input(input);
    check_declared_totals(input, &metrics);

    let cumulative = cumulative_input.map(|c| calculate_ce_summary(c, None));

    let mut rows = assemble_rows(input, &metrics);
    if let Some(cumulative) = &cumulative {
        for (row, cumulative_row) in rows.iter_mut().zip(&cumulative.rows) {
            if row.row_type != RowType::Header {
                row.cumulative_value = Some(cumulative_row.monthly_value);
            }
        }
    }

    CeSummaryResult {
        rows,
        metrics,
        cumulative_metrics: cumulative.map(|c| c.metrics),
    }
}

fn assemble_rows(input: &CeSummaryInput, m: &CeMetrics) -> Vec<CeSummaryRow> {
    use DisplayFormat::{Currency, Number, Percent};

    let mut rows = vec![
        CeSummaryRow::header("MEDICAL CLAIMS"),
        CeSummaryRow::data("Domestic Facility Claims", input.domestic_facility),
        CeSummaryRow::data("Non-Domestic Facility Claims", input.non_domestic_facility),
        CeSummaryRow::data("Non-Hospital Medical Claims", input.non_hospital_medical),
        CeSummaryRow::value("Medical Subtotal", m.medical_subtotal, RowType::Subtotal, Currency)
            .with_formula("#1 + #2 + #3"),
        CeSummaryRow::data("Medical Adjustment", input.medical_adjustment).adjustment(),
        CeSummaryRow::value("Total Medical Claims", m.medical_total, RowType::Total, Currency)
            .with_formula("#4 + #5"),
        CeSummaryRow::header("PHARMACY"),
        CeSummaryRow::data("Pharmacy Claims", input.rx_claims),
        CeSummaryRow::data("Pharmacy Rebates", input.rx_rebates).adjustment(),
        CeSummaryRow::header("STOP LOSS"),
        CeSummaryRow::data("Stop Loss Premiums", input.stop_loss_premiums),
        CeSummaryRow::data("Stop Loss Reimbursements", input.stop_loss_reimbursements)
            .adjustment(),
        CeSummaryRow::header("ADMINISTRATIVE FEES"),
        CeSummaryRow::data("Administrative Fees", input.admin_fees),
        CeSummaryRow::data("Other Administrative Fees", input.other_admin_fees),
        CeSummaryRow::header("CLAIMS & EXPENSES"),
        CeSummaryRow::value("Monthly C&E", m.monthly_ce, RowType::Total, Currency)
            .with_formula("#6 + #8 + #9 + #11 + #12 + #14 + #15"),
        CeSummaryRow::header("ENROLLMENT"),
        CeSummaryRow::value("Employees", input.employee_count as f64, RowType::Data, Number),
        CeSummaryRow::value("Members", input.member_count as f64, RowType::Data, Number),
        CeSummaryRow::header("PER EMPLOYEE PER MONTH"),
        CeSummaryRow::value("PEPM Actual", m.pepm_actual, RowType::Data, Currency)
            .with_formula("#17 / #20"),
        CeSummaryRow::value("PEPM Budget", m.pepm_budget, RowType::Data, Currency)
            .with_formula("#25 / #20"),
        CeSummaryRow::header("BUDGET"),
        CeSummaryRow::value("Total Budget", input.total_budget, RowType::Total, Currency),
        CeSummaryRow::header("VARIANCE"),
        CeSummaryRow::value("Variance $", m.variance_dollars, RowType::Data, Currency)
            .with_formula("#17 - #25")
            .variance(m.variance_dollars),
        CeSummaryRow::value("Variance %", m.variance_percent, RowType::Data, Percent)
            .with_formula("#27 / #25")
            .variance(m.variance_percent),
    ];

    for (position, row) in rows.iter_mut().enumerate() {
        if row.row_type != RowType::Header {
            row.item_number = position as u32;
        }
    }

    debug_assert_eq!(rows.len(), CE_ROW_COUNT);
    rows
}

/// Declared subtotals are informational only; flag the ones that disagree with their parts.
fn check_declared_totals(input: &CeSummaryInput, metrics: &CeMetrics) {
    let declared = [
        ("medical_subtotal", input.medical_subtotal, metrics.medical_subtotal),
        ("medical_total", input.medical_total, metrics.medical_total),
        ("admin_total", input.admin_total, metrics.admin_total),
    ];

    for (field, declared, computed) in declared {
        if declared == 0.0 {
            continue;
        }
        if (declared - computed).abs() > DECLARED_TOTAL_TOLERANCE {
            warn!(
                "Declared {} {:.2} differs from recomputed {:.2}; using recomputed value",
                field, declared, computed
            );
        }
    }
}

/// Combines several months into one period input. Monetary fields are summed;
/// enrollment counts are point-in-time and come from the last month.
pub fn aggregate_ce_summary(inputs: &[CeSummaryInput]) -> Result<CeSummaryInput> {
    let latest = inputs.last().ok_or(BenefitsError::EmptyAggregation)?;

    debug!("Aggregating {} C&E inputs", inputs.len());

    let mut total = inputs.iter().fold(CeSummaryInput::default(), |mut acc, i| {
        acc.domestic_facility += i.domestic_facility;
        acc.non_domestic_facility += i.non_domestic_facility;
        acc.non_hospital_medical += i.non_hospital_medical;
        acc.medical_subtotal += i.medical_subtotal;
        acc.medical_adjustment += i.medical_adjustment;
        acc.medical_total += i.medical_total;
        acc.rx_claims += i.rx_claims;
        acc.rx_rebates += i.rx_rebates;
        acc.stop_loss_premiums += i.stop_loss_premiums;
        acc.stop_loss_reimbursements += i.stop_loss_reimbursements;
        acc.admin_fees += i.admin_fees;
        acc.other_admin_fees += i.other_admin_fees;
        acc.admin_total += i.admin_total;
        acc.budgeted_claims += i.budgeted_claims;
        acc.budgeted_fixed_costs += i.budgeted_fixed_costs;
        acc.total_budget += i.total_budget;
        acc
    });

    total.employee_count = latest.employee_count;
    total.member_count = latest.member_count;

    Ok(total)
}

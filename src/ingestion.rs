use crate::error::{BenefitsError, Result};
use crate::reconciliation::is_all_plans_row;
use crate::schema::{ClaimantStatus, HighClaimantInput, MonthlyPlanData};
use crate::utils::{month_start, parse_date_value};
use crate::validation::{parse_numeric, ParsedRow};
use log::debug;

fn required_text<'r>(row: &'r ParsedRow, column: &str) -> Result<&'r str> {
    row.get(column)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BenefitsError::Ingestion {
            row: row.row_number,
            details: format!("missing value for '{}'", column),
        })
}

/// Empty or absent cells read as zero; anything else must parse.
fn amount(row: &ParsedRow, column: &str) -> Result<f64> {
    match row.get(column).map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(raw) => parse_numeric(raw).ok_or_else(|| BenefitsError::Ingestion {
            row: row.row_number,
            details: format!("'{}' in '{}' is not a number", raw, column),
        }),
    }
}

fn parse_status(row: &ParsedRow) -> Result<ClaimantStatus> {
    let Some(raw) = row.get("status").map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(ClaimantStatus::default());
    };

    match raw.to_lowercase().as_str() {
        "active" | "a" => Ok(ClaimantStatus::Active),
        "terminated" | "termed" | "term" | "t" => Ok(ClaimantStatus::Terminated),
        "cobra" | "c" => Ok(ClaimantStatus::Cobra),
        other => Err(BenefitsError::Ingestion {
            row: row.row_number,
            details: format!("unknown claimant status '{}'", other),
        }),
    }
}

/// Converts validated monthly-stats rows into per-plan monthly records. The All Plans
/// aggregate row is skipped so downstream sums are not doubled. Months normalize to the
/// first day of the month.
pub fn monthly_plan_data_from_rows(rows: &[ParsedRow]) -> Result<Vec<MonthlyPlanData>> {
    let mut months = Vec::with_capacity(rows.len());

    for row in rows {
        let plan_name = required_text(row, "plan")?;
        if is_all_plans_row(plan_name) {
            continue;
        }

        let month = parse_date_value(required_text(row, "month")?).map_err(|e| {
            BenefitsError::Ingestion {
                row: row.row_number,
                details: e.to_string(),
            }
        })?;

        let subscribers = amount(row, "subscribers")?;
        if subscribers < 0.0 {
            return Err(BenefitsError::Ingestion {
                row: row.row_number,
                details: format!("negative subscriber count {}", subscribers),
            });
        }
        if subscribers.fract() != 0.0 {
            return Err(BenefitsError::Ingestion {
                row: row.row_number,
                details: format!("subscriber count {} is not a whole number", subscribers),
            });
        }
        let subscribers =
            u32::try_from(subscribers as u64).map_err(|_| BenefitsError::Ingestion {
                row: row.row_number,
                details: format!("subscriber count {} is out of range", subscribers),
            })?;

        months.push(MonthlyPlanData {
            month: month_start(month),
            plan_name: plan_name.to_string(),
            subscribers,
            medical_paid: amount(row, "medicalPaid")?,
            rx_paid: amount(row, "rxPaid")?,
            spec_stop_loss_reimb: amount(row, "specStopLossReimbursement")?,
            est_rx_rebates: amount(row, "estRxRebates")?,
            admin_fees: amount(row, "adminFees")?,
            stop_loss_fees: amount(row, "stopLossFees")?,
            budgeted_premium: amount(row, "budgetedPremium")?,
        });
    }

    debug!(
        "Ingested {} monthly plan records from {} rows",
        months.len(),
        rows.len()
    );
    Ok(months)
}

pub fn high_claimants_from_rows(rows: &[ParsedRow]) -> Result<Vec<HighClaimantInput>> {
    rows.iter()
        .filter(|row| {
            row.get("plan")
                .map(|plan| !is_all_plans_row(plan))
                .unwrap_or(true)
        })
        .map(|row| {
            Ok(HighClaimantInput {
                claimant_key: required_text(row, "claimantKey")?.to_string(),
                plan_name: required_text(row, "plan")?.to_string(),
                status: parse_status(row)?,
                medical_paid: amount(row, "medicalPaid")?,
                rx_paid: amount(row, "rxPaid")?,
                total_paid: amount(row, "totalPaid")?,
            })
        })
        .collect()
}

use crate::monthly_columns::calculate_monthly_columns;
use crate::pepm::calculate_pepm;
use crate::rounding::round_currency;
use crate::schema::{HighClaimantInput, MonthlyPlanData};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelGaugeStatus {
    Green,
    Yellow,
    Red,
}

/// Below 95% of budget is green, 95-105% (inclusive) yellow, above 105% red.
pub fn calculate_fuel_gauge_status(percent_of_budget: f64) -> FuelGaugeStatus {
    if percent_of_budget < 95.0 {
        FuelGaugeStatus::Green
    } else if percent_of_budget <= 105.0 {
        FuelGaugeStatus::Yellow
    } else {
        FuelGaugeStatus::Red
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveYtdTotals {
    pub month_count: usize,
    pub subscriber_months: u64,
    pub medical_paid: f64,
    pub rx_paid: f64,
    pub spec_stop_loss_reimb: f64,
    pub est_rx_rebates: f64,
    pub admin_fees: f64,
    pub stop_loss_fees: f64,
    pub budgeted_premium: f64,
    pub total_paid: f64,
    pub net_paid: f64,
    pub total_cost: f64,
    pub surplus: f64,
    pub percent_of_budget: f64,
    pub total_cost_pepm: f64,
    pub fuel_gauge: FuelGaugeStatus,
}

/// Sums the raw monthly inputs, then derives totals from the sums. Deriving per month
/// and summing would accumulate per-month rounding.
pub fn calculate_executive_ytd(months: &[MonthlyPlanData]) -> ExecutiveYtdTotals {
    let subscriber_months: u64 = months.iter().map(|m| m.subscribers as u64).sum();
    let sum = |field: fn(&MonthlyPlanData) -> f64| -> f64 { months.iter().map(field).sum() };

    let summed = MonthlyPlanData {
        month: months.first().map(|m| m.month).unwrap_or(NaiveDate::MIN),
        plan_name: String::new(),
        subscribers: 0,
        medical_paid: sum(|m| m.medical_paid),
        rx_paid: sum(|m| m.rx_paid),
        spec_stop_loss_reimb: sum(|m| m.spec_stop_loss_reimb),
        est_rx_rebates: sum(|m| m.est_rx_rebates),
        admin_fees: sum(|m| m.admin_fees),
        stop_loss_fees: sum(|m| m.stop_loss_fees),
        budgeted_premium: sum(|m| m.budgeted_premium),
    };
    let derived = calculate_monthly_columns(&summed);

    let month_count = months.len();
    let total_cost_pepm = if month_count == 0 {
        0.0
    } else {
        calculate_pepm(
            derived.total_cost / month_count as f64,
            subscriber_months as f64,
            month_count as u32,
        )
    };

    ExecutiveYtdTotals {
        month_count,
        subscriber_months,
        medical_paid: round_currency(summed.medical_paid),
        rx_paid: round_currency(summed.rx_paid),
        spec_stop_loss_reimb: round_currency(summed.spec_stop_loss_reimb),
        est_rx_rebates: round_currency(summed.est_rx_rebates),
        admin_fees: round_currency(summed.admin_fees),
        stop_loss_fees: round_currency(summed.stop_loss_fees),
        budgeted_premium: round_currency(summed.budgeted_premium),
        total_paid: derived.total_paid,
        net_paid: derived.net_paid,
        total_cost: derived.total_cost,
        surplus: derived.surplus,
        percent_of_budget: derived.percent_of_budget,
        total_cost_pepm: round_currency(total_cost_pepm),
        fuel_gauge: calculate_fuel_gauge_status(derived.percent_of_budget),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCost {
    pub plan_name: String,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMixEntry {
    pub plan_name: String,
    pub total_cost: f64,
    pub percent: f64,
}

pub fn calculate_plan_mix(plans: &[PlanCost]) -> Vec<PlanMixEntry> {
    let total: f64 = plans.iter().map(|p| p.total_cost).sum();

    plans
        .iter()
        .map(|p| PlanMixEntry {
            plan_name: p.plan_name.clone(),
            total_cost: round_currency(p.total_cost),
            percent: if total == 0.0 {
                0.0
            } else {
                p.total_cost / total * 100.0
            },
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MedicalRxSplit {
    pub medical_percent: f64,
    pub rx_percent: f64,
}

pub fn calculate_medical_rx_split(medical_paid: f64, rx_paid: f64) -> MedicalRxSplit {
    let total = medical_paid + rx_paid;
    if total == 0.0 {
        return MedicalRxSplit {
            medical_percent: 0.0,
            rx_percent: 0.0,
        };
    }

    MedicalRxSplit {
        medical_percent: medical_paid / total * 100.0,
        rx_percent: rx_paid / total * 100.0,
    }
}

pub const BUCKET_200K_PLUS: &str = "$200K+";
pub const BUCKET_100K_200K: &str = "$100–200K";
pub const BUCKET_OTHER: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimantBucket {
    pub label: String,
    pub color: String,
    pub claimant_count: usize,
    pub total_paid: f64,
    pub percent_of_total: f64,
}

/// Cost concentration across three fixed bands: $200K+, $100-200K and everything else.
pub fn calculate_claimant_buckets(claimants: &[HighClaimantInput]) -> Vec<ClaimantBucket> {
    let bands = [
        (BUCKET_200K_PLUS, "#DC2626"),
        (BUCKET_100K_200K, "#F59E0B"),
        (BUCKET_OTHER, "#3B82F6"),
    ];
    let mut counts = [0usize; 3];
    let mut totals = [0.0f64; 3];

    for claimant in claimants {
        let index = if claimant.total_paid >= 200_000.0 {
            0
        } else if claimant.total_paid >= 100_000.0 {
            1
        } else {
            2
        };
        counts[index] += 1;
        totals[index] += claimant.total_paid;
    }

    let grand_total: f64 = totals.iter().sum();

    bands
        .iter()
        .enumerate()
        .map(|(i, (label, color))| ClaimantBucket {
            label: label.to_string(),
            color: color.to_string(),
            claimant_count: counts[i],
            total_paid: round_currency(totals[i]),
            percent_of_total: if grand_total == 0.0 {
                0.0
            } else {
                totals[i] / grand_total * 100.0
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub ytd: ExecutiveYtdTotals,
    pub plan_mix: Vec<PlanMixEntry>,
    pub medical_rx_split: MedicalRxSplit,
    pub claimant_buckets: Vec<ClaimantBucket>,
}

/// Rolls plan-month rows (any number of plans) into the executive dashboard figures.
/// Plan mix groups by `plan_name` in alphabetical order.
pub fn build_executive_summary(
    months: &[MonthlyPlanData],
    claimants: &[HighClaimantInput],
) -> ExecutiveSummary {
    info!(
        "Building executive summary from {} plan-months and {} claimants",
        months.len(),
        claimants.len()
    );

    let ytd = calculate_executive_ytd(months);

    let mut by_plan: BTreeMap<&str, f64> = BTreeMap::new();
    for month in months {
        *by_plan.entry(month.plan_name.as_str()).or_default() +=
            calculate_monthly_columns(month).total_cost;
    }
    let plans: Vec<PlanCost> = by_plan
        .into_iter()
        .map(|(plan_name, total_cost)| PlanCost {
            plan_name: plan_name.to_string(),
            total_cost,
        })
        .collect();

    ExecutiveSummary {
        medical_rx_split: calculate_medical_rx_split(ytd.medical_paid, ytd.rx_paid),
        plan_mix: calculate_plan_mix(&plans),
        claimant_buckets: calculate_claimant_buckets(claimants),
        ytd,
    }
}

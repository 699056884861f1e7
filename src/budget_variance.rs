//! Budget-vs-actual variance with fee proration.
//!
//! Each service month is compared against its budget configuration. Fixed costs are the
//! prorated contributions of every fee window effective during the month; the budget side
//! prorates the same windows against a synthetic claims breakdown derived from the
//! month's expected claims.

use crate::error::{BenefitsError, Result};
use crate::proration::calculate_prorated_fee;
use crate::rounding::{round_number, RoundingMode};
use crate::schema::{FeeWindow, MonthlyActuals, MonthlyConfig};
use crate::utils::{month_end, month_start};
use chrono::NaiveDate;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Share of expected claims assigned to each category when building the budget-side
/// claims breakdown: domestic facility, non-domestic facility, non-hospital medical, Rx.
pub const BUDGET_CLAIMS_SPLIT: [f64; 4] = [0.40, 0.10, 0.30, 0.20];

pub const TRAILING_MONTHS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct VarianceOptions {
    #[schemars(description = "Decimal places for monetary outputs (variance percent is always 1)")]
    pub precision: u32,

    pub rounding_mode: RoundingMode,
}

impl Default for VarianceOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            rounding_mode: RoundingMode::Bankers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeAllocation {
    pub name: String,
    pub actual: f64,
    pub budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyVariance {
    pub service_month: NaiveDate,
    pub actual_claims: f64,
    pub fixed_costs: f64,
    pub stop_loss_reimbursement: f64,
    pub rx_rebates: f64,
    pub actual_total: f64,
    pub budget_claims: f64,
    pub budget_fixed_costs: f64,
    pub budget_total: f64,
    pub variance: f64,
    pub variance_percent: f64,
    pub employee_count: u32,
    pub member_count: u32,
    pub actual_pepm: f64,
    pub budget_pepm: f64,
    pub fee_allocations: Vec<FeeAllocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceRollup {
    pub months: usize,
    pub actual_total: f64,
    pub budget_total: f64,
    pub variance: f64,
    pub variance_percent: f64,
    pub member_months: u64,
    pub actual_pepm: f64,
    pub budget_pepm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetVarianceReport {
    pub months: Vec<MonthlyVariance>,
    pub ytd: VarianceRollup,
    pub trailing_3: VarianceRollup,
}

pub struct BudgetVarianceCalculator {
    options: VarianceOptions,
}

impl BudgetVarianceCalculator {
    pub fn new(options: VarianceOptions) -> Self {
        Self { options }
    }

    /// Builds the variance report. Every actual month must have a config with the same
    /// `service_month`; a missing one aborts the whole calculation.
    pub fn calculate(
        &self,
        actuals: &[MonthlyActuals],
        configs: &[MonthlyConfig],
        fees: &[FeeWindow],
    ) -> Result<BudgetVarianceReport> {
        let mut sorted: Vec<&MonthlyActuals> = actuals.iter().collect();
        sorted.sort_by_key(|a| a.service_month);

        info!(
            "Calculating budget variance for {} months against {} fee windows",
            sorted.len(),
            fees.len()
        );

        let months = sorted
            .into_iter()
            .map(|actual| -> Result<MonthlyVariance> {
                let config = configs
                    .iter()
                    .find(|c| c.service_month == actual.service_month)
                    .ok_or(BenefitsError::MissingMonthlyConfig(actual.service_month))?;
                Ok(self.calculate_month(actual, config, fees))
            })
            .collect::<Result<Vec<_>>>()?;

        let ytd = self.rollup(&months);
        let trailing_start = months.len().saturating_sub(TRAILING_MONTHS);
        let trailing_3 = self.rollup(&months[trailing_start..]);

        Ok(BudgetVarianceReport {
            months,
            ytd,
            trailing_3,
        })
    }

    fn calculate_month(
        &self,
        actual: &MonthlyActuals,
        config: &MonthlyConfig,
        fees: &[FeeWindow],
    ) -> MonthlyVariance {
        let start = month_start(actual.service_month);
        let end = month_end(actual.service_month);
        let budget_actuals = synthetic_budget_actuals(actual, config.expected_claims);

        let fee_allocations: Vec<FeeAllocation> = fees
            .iter()
            .map(|fee| FeeAllocation {
                name: fee.name.clone(),
                actual: self.round(calculate_prorated_fee(fee, start, end, actual)),
                budget: self.round(calculate_prorated_fee(fee, start, end, &budget_actuals)),
            })
            .collect();

        let actual_claims = actual.total_claims();
        let fixed_costs: f64 = fee_allocations.iter().map(|f| f.actual).sum();
        let budget_fixed_costs: f64 = fee_allocations.iter().map(|f| f.budget).sum();

        let actual_total = actual_claims
            + fixed_costs
            + config.stop_loss_reimbursement
            + config.rx_rebates;
        let budget_total = config.expected_claims + budget_fixed_costs;
        let variance = actual_total - budget_total;

        debug!(
            "{}: actual {:.2} vs budget {:.2} (fixed {:.2} / {:.2})",
            actual.service_month, actual_total, budget_total, fixed_costs, budget_fixed_costs
        );

        MonthlyVariance {
            service_month: actual.service_month,
            actual_claims: self.round(actual_claims),
            fixed_costs: self.round(fixed_costs),
            stop_loss_reimbursement: self.round(config.stop_loss_reimbursement),
            rx_rebates: self.round(config.rx_rebates),
            actual_total: self.round(actual_total),
            budget_claims: self.round(config.expected_claims),
            budget_fixed_costs: self.round(budget_fixed_costs),
            budget_total: self.round(budget_total),
            variance: self.round(variance),
            variance_percent: self.percent(variance, budget_total),
            employee_count: actual.employee_count,
            member_count: actual.member_count,
            actual_pepm: self.round(per_member(actual_total, actual.member_count as f64)),
            budget_pepm: self.round(per_member(budget_total, actual.member_count as f64)),
            fee_allocations,
        }
    }

    fn rollup(&self, months: &[MonthlyVariance]) -> VarianceRollup {
        let actual_total: f64 = months.iter().map(|m| m.actual_total).sum();
        let budget_total: f64 = months.iter().map(|m| m.budget_total).sum();
        let variance: f64 = months.iter().map(|m| m.variance).sum();
        let member_months: u64 = months.iter().map(|m| m.member_count as u64).sum();

        VarianceRollup {
            months: months.len(),
            actual_total: self.round(actual_total),
            budget_total: self.round(budget_total),
            variance: self.round(variance),
            variance_percent: self.percent(variance, budget_total),
            member_months,
            actual_pepm: self.round(per_member(actual_total, member_months as f64)),
            budget_pepm: self.round(per_member(budget_total, member_months as f64)),
        }
    }

    fn round(&self, value: f64) -> f64 {
        round_number(value, self.options.precision, self.options.rounding_mode)
    }

    fn percent(&self, variance: f64, budget: f64) -> f64 {
        if budget == 0.0 {
            return 0.0;
        }
        round_number(variance / budget * 100.0, 1, self.options.rounding_mode)
    }
}

impl Default for BudgetVarianceCalculator {
    fn default() -> Self {
        Self::new(VarianceOptions::default())
    }
}

pub fn calculate_budget_variance(
    actuals: &[MonthlyActuals],
    configs: &[MonthlyConfig],
    fees: &[FeeWindow],
    options: VarianceOptions,
) -> Result<BudgetVarianceReport> {
    BudgetVarianceCalculator::new(options).calculate(actuals, configs, fees)
}

/// Budgets are set in aggregate, so percent-of-claims fees are priced against expected
/// claims split by `BUDGET_CLAIMS_SPLIT`. Enrollment is taken from the actual month.
fn synthetic_budget_actuals(actual: &MonthlyActuals, expected_claims: f64) -> MonthlyActuals {
    let [domestic, non_domestic, non_hospital, rx] = BUDGET_CLAIMS_SPLIT;

    MonthlyActuals {
        service_month: actual.service_month,
        domestic_facility_claims: expected_claims * domestic,
        non_domestic_facility_claims: expected_claims * non_domestic,
        non_hospital_medical_claims: expected_claims * non_hospital,
        rx_claims: expected_claims * rx,
        employee_count: actual.employee_count,
        member_count: actual.member_count,
    }
}

fn per_member(total: f64, members: f64) -> f64 {
    if members == 0.0 {
        0.0
    } else {
        total / members
    }
}

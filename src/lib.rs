//! # Benefits Reporting
//!
//! Calculation engine for self-funded health plan reporting: turns monthly plan statistics,
//! claims decompositions and fee schedules into dashboard-ready figures with consistent
//! rounding.
//!
//! ## Core Concepts
//!
//! - **Monthly Columns**: The A-N statement line for one plan-month (total cost, surplus, % of budget)
//! - **PEPM**: Per-employee-per-month cost, averaged over subscriber-months
//! - **C&E Statement**: The fixed 29-row Claims & Expenses statement with monthly and cumulative values
//! - **Budget Variance**: Actual vs. budget per service month, with prorated fees and YTD / trailing-3 rollups
//! - **High-Cost Claimants**: Claimants near or above the individual stop-loss attachment point
//! - **Upload Checks**: Header, cell and All Plans reconciliation rules for uploaded files
//!
//! ## Example
//!
//! ```rust,ignore
//! use benefits_reporting::*;
//! use chrono::NaiveDate;
//!
//! let month = MonthlyPlanData {
//!     month: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     plan_name: "PPO".to_string(),
//!     subscribers: 500,
//!     medical_paid: 375_000.0,
//!     rx_paid: 56_500.0,
//!     spec_stop_loss_reimb: -46_960.0,
//!     est_rx_rebates: -35_300.0,
//!     admin_fees: 21_760.0,
//!     stop_loss_fees: 67_980.0,
//!     budgeted_premium: 465_471.0,
//! };
//!
//! let columns = calculate_monthly_columns(&month);
//! assert_eq!(columns.total_cost, 438_980.0);
//!
//! let summary = build_executive_summary(&[month], &[]);
//! println!("Fuel gauge: {:?}", summary.ytd.fuel_gauge);
//! ```

pub mod budget_variance;
pub mod ce_summary;
pub mod error;
pub mod executive_summary;
pub mod high_claimants;
pub mod ingestion;
pub mod monthly_columns;
pub mod pepm;
pub mod proration;
pub mod reconciliation;
pub mod rounding;
pub mod schema;
pub mod utils;
pub mod validation;

pub use budget_variance::{
    calculate_budget_variance, BudgetVarianceCalculator, BudgetVarianceReport, MonthlyVariance,
    VarianceOptions, VarianceRollup,
};
pub use ce_summary::{
    aggregate_ce_summary, calculate_ce_summary, CeMetrics, CeSummaryResult, CeSummaryRow,
    DisplayFormat, RowColor, RowType, CE_ROW_COUNT,
};
pub use error::{BenefitsError, Result};
pub use executive_summary::*;
pub use high_claimants::*;
pub use ingestion::*;
pub use monthly_columns::*;
pub use pepm::*;
pub use proration::*;
pub use reconciliation::*;
pub use rounding::*;
pub use schema::*;
pub use utils::*;
pub use validation::*;

use log::{debug, info};

/// Runs the reporting engines under one [`ReportingConfig`].
pub struct BenefitsReportProcessor {
    config: ReportingConfig,
}

impl BenefitsReportProcessor {
    pub fn new(config: ReportingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    /// Statement for the last month in `months`, with the whole slice as the cumulative period.
    pub fn ce_statement(&self, months: &[CeSummaryInput]) -> Result<CeSummaryResult> {
        let cumulative = aggregate_ce_summary(months)?;
        let latest = months.last().ok_or(BenefitsError::EmptyAggregation)?;

        info!("Building C&E statement over {} months", months.len());

        let result = calculate_ce_summary(latest, Some(&cumulative));
        debug!(
            "Monthly C&E {:.2}, cumulative C&E {:.2}",
            result.monthly_ce(),
            result.cumulative_ce().unwrap_or_default()
        );

        Ok(result)
    }

    pub fn budget_variance(
        &self,
        actuals: &[MonthlyActuals],
        configs: &[MonthlyConfig],
        fees: &[FeeWindow],
    ) -> Result<BudgetVarianceReport> {
        BudgetVarianceCalculator::new(self.config.variance).calculate(actuals, configs, fees)
    }

    pub fn high_claimants(&self, claimants: &[HighClaimantInput]) -> Vec<HighClaimantResult> {
        let results = self.config.high_claimants.apply(claimants);
        debug!(
            "{} of {} claimants at or above {:.0}",
            results.len(),
            claimants.len(),
            self.config.high_claimants.isl_threshold * self.config.high_claimants.min_percent_threshold
        );
        results
    }

    pub fn executive_summary(
        &self,
        months: &[MonthlyPlanData],
        claimants: &[HighClaimantInput],
    ) -> ExecutiveSummary {
        build_executive_summary(months, claimants)
    }
}

impl Default for BenefitsReportProcessor {
    fn default() -> Self {
        Self::new(ReportingConfig::default())
    }
}

pub fn build_ce_statement(months: &[CeSummaryInput]) -> Result<CeSummaryResult> {
    BenefitsReportProcessor::default().ce_statement(months)
}

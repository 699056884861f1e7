use crate::budget_variance::VarianceOptions;
use crate::error::Result;
use crate::high_claimants::HighClaimantCriteria;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One plan's statistics for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyPlanData {
    #[schemars(description = "First day of the reporting month")]
    pub month: NaiveDate,

    #[schemars(description = "Plan name as reported by the carrier (e.g. 'PPO', 'HDHP')")]
    pub plan_name: String,

    pub subscribers: u32,
    pub medical_paid: f64,
    pub rx_paid: f64,

    #[schemars(description = "Specific stop-loss reimbursement. Negative values are credits to the plan.")]
    pub spec_stop_loss_reimb: f64,

    #[schemars(description = "Estimated pharmacy rebates. Negative values are credits to the plan.")]
    pub est_rx_rebates: f64,

    pub admin_fees: f64,
    pub stop_loss_fees: f64,
    pub budgeted_premium: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeUnitType {
    #[schemars(description = "Annual amount, spread evenly across 12 months")]
    Annual,

    #[schemars(description = "Fixed amount per month")]
    Monthly,

    #[schemars(description = "Rate multiplied by the month's member count")]
    Pepm,

    #[schemars(description = "Rate multiplied by the month's enrolled employee count")]
    PerEmployeePerMonth,

    #[schemars(description = "Percentage (e.g. 2.5 for 2.5%) of the month's total claims")]
    PercentOfClaims,

    #[schemars(description = "Flat monthly charge, prorated only for partial months")]
    Flat,
}

/// A fee definition effective over an inclusive date range. Several windows can describe
/// the same fee across a rate change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeeWindow {
    #[schemars(description = "Fee label (e.g. 'TPA Admin', 'Specific Stop Loss')")]
    pub name: String,

    pub unit_type: FeeUnitType,

    pub rate: f64,

    #[schemars(description = "First day the fee applies (inclusive)")]
    pub effective_start: NaiveDate,

    #[schemars(description = "Last day the fee applies (inclusive)")]
    pub effective_end: NaiveDate,
}

/// Actual claims decomposition and enrollment for one service month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyActuals {
    pub service_month: NaiveDate,
    pub domestic_facility_claims: f64,
    pub non_domestic_facility_claims: f64,
    pub non_hospital_medical_claims: f64,
    pub rx_claims: f64,
    pub employee_count: u32,
    pub member_count: u32,
}

impl MonthlyActuals {
    pub fn total_claims(&self) -> f64 {
        self.domestic_facility_claims
            + self.non_domestic_facility_claims
            + self.non_hospital_medical_claims
            + self.rx_claims
    }
}

/// Budget configuration for one service month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyConfig {
    pub service_month: NaiveDate,
    pub expected_claims: f64,

    #[schemars(description = "Expected stop-loss reimbursement (negative = credit)")]
    pub stop_loss_reimbursement: f64,

    #[schemars(description = "Expected pharmacy rebates (negative = credit)")]
    pub rx_rebates: f64,
}

/// Inputs to the Claims & Expenses statement for one month or one pre-aggregated period.
///
/// `medical_subtotal`, `medical_total` and `admin_total` are carried as declared by the
/// caller; the statement recomputes them from their parts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CeSummaryInput {
    pub domestic_facility: f64,
    pub non_domestic_facility: f64,
    pub non_hospital_medical: f64,
    pub medical_subtotal: f64,

    #[schemars(description = "User-entered medical adjustment (may be negative)")]
    pub medical_adjustment: f64,

    pub medical_total: f64,

    pub rx_claims: f64,

    #[schemars(description = "Pharmacy rebates (negative = credit)")]
    pub rx_rebates: f64,

    pub stop_loss_premiums: f64,

    #[schemars(description = "Stop-loss reimbursements (negative = credit)")]
    pub stop_loss_reimbursements: f64,

    pub admin_fees: f64,
    pub other_admin_fees: f64,
    pub admin_total: f64,

    #[schemars(description = "Enrolled employees at the end of the period")]
    pub employee_count: u32,

    #[schemars(description = "Covered members at the end of the period")]
    pub member_count: u32,

    pub budgeted_claims: f64,
    pub budgeted_fixed_costs: f64,
    pub total_budget: f64,
}

impl CeSummaryInput {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CeSummaryInput)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimantStatus {
    #[default]
    Active,
    Terminated,
    Cobra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HighClaimantInput {
    #[schemars(description = "De-identified claimant key")]
    pub claimant_key: String,

    pub plan_name: String,

    #[serde(default)]
    pub status: ClaimantStatus,

    pub medical_paid: f64,
    pub rx_paid: f64,
    pub total_paid: f64,
}

/// Tunable settings for the calculation engines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReportingConfig {
    #[serde(default)]
    pub variance: VarianceOptions,

    #[serde(default)]
    pub high_claimants: HighClaimantCriteria,
}

impl ReportingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(ReportingConfig);
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounding::RoundingMode;

    #[test]
    fn test_schema_generation() {
        let schema_json = CeSummaryInput::schema_as_json().unwrap();
        assert!(schema_json.contains("domestic_facility"));
        assert!(schema_json.contains("stop_loss_reimbursements"));
        assert!(schema_json.contains("total_budget"));
    }

    #[test]
    fn test_fee_unit_type_wire_names() {
        let json = serde_json::to_string(&FeeUnitType::PerEmployeePerMonth).unwrap();
        assert_eq!(json, "\"PER_EMPLOYEE_PER_MONTH\"");

        let parsed: FeeUnitType = serde_json::from_str("\"PERCENT_OF_CLAIMS\"").unwrap();
        assert_eq!(parsed, FeeUnitType::PercentOfClaims);
    }

    #[test]
    fn test_reporting_config_defaults_and_overrides() {
        let config = ReportingConfig::from_json("{}").unwrap();
        assert_eq!(config, ReportingConfig::default());
        assert_eq!(config.high_claimants.isl_threshold, 200_000.0);

        let config = ReportingConfig::from_json(
            r#"{
                "variance": { "precision": 0, "rounding_mode": "HALF_UP" },
                "high_claimants": { "isl_threshold": 150000.0, "min_percent_threshold": 0.75 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.variance.precision, 0);
        assert_eq!(config.variance.rounding_mode, RoundingMode::HalfUp);
        assert_eq!(config.high_claimants.isl_threshold, 150_000.0);

        assert!(ReportingConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_claimant_status_defaults_to_active() {
        let claimant: HighClaimantInput = serde_json::from_str(
            r#"{
                "claimant_key": "C-001",
                "plan_name": "PPO",
                "medical_paid": 1.0,
                "rx_paid": 2.0,
                "total_paid": 3.0
            }"#,
        )
        .unwrap();
        assert_eq!(claimant.status, ClaimantStatus::Active);
    }
}

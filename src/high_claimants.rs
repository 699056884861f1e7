use crate::rounding::round_currency;
use crate::schema::{ClaimantStatus, HighClaimantInput};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Individual stop-loss (ISL) attachment point.
pub const DEFAULT_ISL_THRESHOLD: f64 = 200_000.0;

/// Claimants at or above this fraction of the ISL are reported.
pub const DEFAULT_MIN_PERCENT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HighClaimantCriteria {
    pub isl_threshold: f64,
    pub min_percent_threshold: f64,
}

impl Default for HighClaimantCriteria {
    fn default() -> Self {
        Self {
            isl_threshold: DEFAULT_ISL_THRESHOLD,
            min_percent_threshold: DEFAULT_MIN_PERCENT_THRESHOLD,
        }
    }
}

impl HighClaimantCriteria {
    pub fn apply(&self, claimants: &[HighClaimantInput]) -> Vec<HighClaimantResult> {
        filter_high_claimants(claimants, self.isl_threshold, self.min_percent_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighClaimantResult {
    pub claimant_key: String,
    pub plan_name: String,
    pub status: ClaimantStatus,
    pub medical_paid: f64,
    pub rx_paid: f64,
    pub total_paid: f64,
    pub percent_of_isl: f64,
    /// Portion retained by the employer, up to the attachment point.
    pub employer_share: f64,
    /// Excess over the attachment point, reimbursed by the stop-loss carrier.
    pub stop_loss_share: f64,
}

/// Keeps claimants whose total paid reaches `isl_threshold * min_percent_threshold`,
/// splits their cost between employer and carrier, and orders them by total paid
/// (highest first).
pub fn filter_high_claimants(
    claimants: &[HighClaimantInput],
    isl_threshold: f64,
    min_percent_threshold: f64,
) -> Vec<HighClaimantResult> {
    let floor = isl_threshold * min_percent_threshold;

    let mut results: Vec<HighClaimantResult> = claimants
        .iter()
        .filter(|c| c.total_paid >= floor)
        .map(|c| {
            let percent_of_isl = if isl_threshold == 0.0 {
                0.0
            } else {
                c.total_paid / isl_threshold * 100.0
            };

            HighClaimantResult {
                claimant_key: c.claimant_key.clone(),
                plan_name: c.plan_name.clone(),
                status: c.status,
                medical_paid: round_currency(c.medical_paid),
                rx_paid: round_currency(c.rx_paid),
                total_paid: round_currency(c.total_paid),
                percent_of_isl,
                employer_share: round_currency(c.total_paid.min(isl_threshold)),
                stop_loss_share: round_currency((c.total_paid - isl_threshold).max(0.0)),
            }
        })
        .collect();

    results.sort_by(|a, b| b.total_paid.total_cmp(&a.total_paid));
    results
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HighClaimantSummary {
    pub claimant_count: usize,
    pub total_paid: f64,
    pub total_employer_share: f64,
    pub total_stop_loss_share: f64,
    pub average_paid: f64,
}

pub fn calculate_high_claimant_summary(results: &[HighClaimantResult]) -> HighClaimantSummary {
    if results.is_empty() {
        return HighClaimantSummary::default();
    }

    let total_paid: f64 = results.iter().map(|r| r.total_paid).sum();
    let total_employer_share: f64 = results.iter().map(|r| r.employer_share).sum();
    let total_stop_loss_share: f64 = results.iter().map(|r| r.stop_loss_share).sum();

    HighClaimantSummary {
        claimant_count: results.len(),
        total_paid: round_currency(total_paid),
        total_employer_share: round_currency(total_employer_share),
        total_stop_loss_share: round_currency(total_stop_loss_share),
        average_paid: round_currency(total_paid / results.len() as f64),
    }
}

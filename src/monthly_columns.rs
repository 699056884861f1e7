use crate::pepm::calculate_pepm;
use crate::rounding::round_currency;
use crate::schema::MonthlyPlanData;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyColumnsResult {
    pub total_paid: f64,
    pub net_paid: f64,
    pub total_cost: f64,
    pub surplus: f64,
    pub percent_of_budget: f64,
}

pub fn calculate_monthly_columns(data: &MonthlyPlanData) -> MonthlyColumnsResult {
    let total_paid = data.medical_paid + data.rx_paid;
    let net_paid = total_paid + data.spec_stop_loss_reimb + data.est_rx_rebates;
    let total_cost = net_paid + data.admin_fees + data.stop_loss_fees;
    let surplus = data.budgeted_premium - total_cost;
    let percent_of_budget = if data.budgeted_premium > 0.0 {
        total_cost / data.budgeted_premium * 100.0
    } else {
        0.0
    };

    MonthlyColumnsResult {
        total_paid: round_currency(total_paid),
        net_paid: round_currency(net_paid),
        total_cost: round_currency(total_cost),
        surplus: round_currency(surplus),
        percent_of_budget: round_currency(percent_of_budget),
    }
}

/// One lettered column of the monthly plan statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementColumn {
    pub letter: char,
    pub label: String,
    pub value: f64,
}

/// The A-N column layout of a plan-month as it appears on the monthly statement.
pub fn statement_columns(data: &MonthlyPlanData) -> Vec<StatementColumn> {
    let derived = calculate_monthly_columns(data);
    let pepm = round_currency(calculate_pepm(
        derived.total_cost,
        data.subscribers as f64,
        1,
    ));

    let columns = [
        ('A', "Subscribers", data.subscribers as f64),
        ('B', "Medical Paid", round_currency(data.medical_paid)),
        ('C', "Pharmacy Paid", round_currency(data.rx_paid)),
        ('D', "Total Paid", derived.total_paid),
        (
            'E',
            "Spec Stop Loss Reimbursement",
            round_currency(data.spec_stop_loss_reimb),
        ),
        ('F', "Est. Rx Rebates", round_currency(data.est_rx_rebates)),
        ('G', "Net Paid", derived.net_paid),
        ('H', "Admin Fees", round_currency(data.admin_fees)),
        ('I', "Stop Loss Fees", round_currency(data.stop_loss_fees)),
        ('J', "Total Cost", derived.total_cost),
        ('K', "Budgeted Premium", round_currency(data.budgeted_premium)),
        ('L', "Surplus", derived.surplus),
        ('M', "% of Budget", derived.percent_of_budget),
        ('N', "Total Cost PEPM", pepm),
    ];

    columns
        .into_iter()
        .map(|(letter, label, value)| StatementColumn {
            letter,
            label: label.to_string(),
            value,
        })
        .collect()
}

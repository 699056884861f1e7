use anyhow::Result;
use benefits_reporting::*;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Reads inline CSV into the row form the upload checks expect.
fn parse_csv(data: &str) -> Result<ParsedFile> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let values: BTreeMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(ParsedRow::new(index + 1, values));
    }

    Ok(ParsedFile { headers, rows })
}

const MONTHLY_HEADER: &str = "Month,Plan,Subscribers,Medical Paid,Rx Paid,Spec Stop Loss Reimbursement,Est Rx Rebates,Admin Fees,Stop Loss Fees,Budgeted Premium";

fn twelve_month_csv() -> String {
    let mut csv = String::from(MONTHLY_HEADER);
    for month in 1..=12 {
        csv.push_str(&format!(
            "\n2024-{:02},PPO,500,\"$375,000.00\",\"56,500\",\"-46,960\",\"-35,300\",\"21,760\",\"67,980\",\"465,471\"",
            month
        ));
    }
    csv
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_twelve_month_upload_to_executive_summary() -> Result<()> {
    let file = parse_csv(&twelve_month_csv())?;

    let validation = validate_file(&file, FileType::MonthlyStats);
    assert!(validation.success, "errors: {:?}", validation.errors);
    assert_eq!(validation.row_count, 12);
    assert_eq!(
        validation.reconciliation.as_ref().map(|r| r.status),
        Some(ReconciliationStatus::NotDetected)
    );

    let months = monthly_plan_data_from_rows(&file.rows)?;
    assert_eq!(months.len(), 12);
    assert_eq!(months[11].month, date(2024, 12, 1));

    let summary = build_executive_summary(&months, &[]);
    let ytd = &summary.ytd;

    assert!((ytd.total_cost - 5_267_760.0).abs() < 0.01, "total cost {}", ytd.total_cost);
    assert!((ytd.budgeted_premium - 5_585_652.0).abs() < 0.01);
    assert!((ytd.surplus - 317_892.0).abs() < 0.01, "surplus {}", ytd.surplus);
    assert_eq!(ytd.percent_of_budget, 94.31);
    assert_eq!(ytd.fuel_gauge, FuelGaugeStatus::Green);
    assert_eq!(ytd.subscriber_months, 6_000);
    assert!((ytd.total_cost_pepm - 877.96).abs() < 0.001, "pepm {}", ytd.total_cost_pepm);

    assert_eq!(summary.plan_mix.len(), 1);
    assert_eq!(summary.plan_mix[0].percent, 100.0);

    Ok(())
}

#[test]
fn test_single_month_matches_monthly_columns() -> Result<()> {
    let file = parse_csv(&twelve_month_csv())?;
    let months = monthly_plan_data_from_rows(&file.rows)?;

    let columns = calculate_monthly_columns(&months[0]);
    assert_eq!(columns.total_paid, 431_500.0);
    assert_eq!(columns.net_paid, 349_240.0);
    assert_eq!(columns.total_cost, 438_980.0);
    assert_eq!(columns.surplus, 26_491.0);
    assert_eq!(columns.percent_of_budget, 94.31);

    let letters: String = statement_columns(&months[0]).iter().map(|c| c.letter).collect();
    assert_eq!(letters, "ABCDEFGHIJKLMN");

    Ok(())
}

#[test]
fn test_all_plans_row_reconciles_and_is_skipped() -> Result<()> {
    let data = format!(
        "{}\n{}\n{}\n{}",
        MONTHLY_HEADER,
        "2024-01,PPO,300,250000,40000,0,0,0,0,300000",
        "2024-01,HDHP,200,125000,16500,0,0,0,0,165471",
        "2024-01,All Plans,500,375000,56500,0,0,0,0,465471",
    );
    let file = parse_csv(&data)?;

    let validation = validate_file(&file, FileType::MonthlyStats);
    assert!(validation.success);
    let reconciliation = validation.reconciliation.expect("monthly stats reconcile");
    assert_eq!(reconciliation.status, ReconciliationStatus::Passed);
    assert_eq!(reconciliation.expected_total, 431_500.0);

    let months = monthly_plan_data_from_rows(&file.rows)?;
    assert_eq!(months.len(), 2);
    assert!(months.iter().all(|m| m.plan_name != "All Plans"));

    let summary = build_executive_summary(&months, &[]);
    let plans: Vec<&str> = summary.plan_mix.iter().map(|p| p.plan_name.as_str()).collect();
    assert_eq!(plans, vec!["HDHP", "PPO"]);

    let share: f64 = summary.plan_mix.iter().map(|p| p.percent).sum();
    assert!((share - 100.0).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_reconciliation_failure_does_not_fail_validation() -> Result<()> {
    let data = format!(
        "{}\n{}\n{}",
        MONTHLY_HEADER,
        "2024-01,PPO,300,250000.02,40000,0,0,0,0,300000",
        "2024-01,All Plans,300,250000,40000,0,0,0,0,300000",
    );
    let file = parse_csv(&data)?;

    let validation = validate_file(&file, FileType::MonthlyStats);
    assert!(validation.success);

    let reconciliation = validation.reconciliation.expect("monthly stats reconcile");
    assert_eq!(reconciliation.status, ReconciliationStatus::Failed);
    assert!(reconciliation.sum_detected);
    assert!(!reconciliation.passed);

    Ok(())
}

#[test]
fn test_bad_upload_reports_every_problem() -> Result<()> {
    let data = "month,plan,medicalPaid\n2024-13-40,PPO,-10\n2024-02,HDHP,abc";
    let file = parse_csv(data)?;

    let validation = validate_file(&file, FileType::MonthlyStats);
    assert!(!validation.success);

    let summary: Vec<(usize, &str)> = validation
        .errors
        .iter()
        .map(|e| (e.row, e.column.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![(0, "rxPaid"), (1, "medicalPaid"), (1, "month"), (2, "medicalPaid")]
    );

    Ok(())
}

#[test]
fn test_high_claimant_upload_pipeline() -> Result<()> {
    let data = "\
Claimant Key,Plan,Status,Medical Paid,Rx Paid,Total Paid
C-001,PPO,Active,\"310,000\",\"40,000\",\"350,000\"
C-002,PPO,COBRA,\"150,000\",\"30,000\",\"180,000\"
C-003,HDHP,Terminated,\"80,000\",\"25,000\",\"105,000\"
C-004,HDHP,,\"60,000\",\"5,000\",\"65,000\"";
    let file = parse_csv(data)?;

    let validation = validate_file(&file, FileType::HighClaimants);
    assert!(validation.success, "errors: {:?}", validation.errors);
    assert!(validation.reconciliation.is_none());

    let claimants = high_claimants_from_rows(&file.rows)?;
    assert_eq!(claimants.len(), 4);
    assert_eq!(claimants[3].status, ClaimantStatus::Active);

    let processor = BenefitsReportProcessor::default();
    let flagged = processor.high_claimants(&claimants);
    let keys: Vec<&str> = flagged.iter().map(|c| c.claimant_key.as_str()).collect();
    assert_eq!(keys, vec!["C-001", "C-002", "C-003"]);
    assert_eq!(flagged[0].stop_loss_share, 150_000.0);

    let totals = calculate_high_claimant_summary(&flagged);
    assert_eq!(totals.total_paid, 635_000.0);
    assert_eq!(totals.total_stop_loss_share, 150_000.0);
    assert_eq!(totals.total_employer_share, 485_000.0);

    let buckets = calculate_claimant_buckets(&claimants);
    let counts: Vec<usize> = buckets.iter().map(|b| b.claimant_count).collect();
    assert_eq!(counts, vec![1, 2, 1]);

    Ok(())
}

#[test]
fn test_ce_statement_over_a_quarter() -> Result<()> {
    let month = |members: u32| CeSummaryInput {
        domestic_facility: 150_000.0,
        non_domestic_facility: 25_000.0,
        non_hospital_medical: 200_000.0,
        medical_adjustment: -5_000.0,
        rx_claims: 56_500.0,
        rx_rebates: -35_300.0,
        stop_loss_premiums: 68_165.0,
        stop_loss_reimbursements: -46_960.0,
        admin_fees: 18_000.0,
        other_admin_fees: 3_575.0,
        employee_count: members / 2,
        member_count: members,
        total_budget: 465_471.0,
        ..Default::default()
    };
    let quarter = vec![month(980), month(990), month(1_000)];

    let statement = build_ce_statement(&quarter)?;
    assert_eq!(statement.rows.len(), CE_ROW_COUNT);
    assert_eq!(statement.monthly_ce(), 433_980.0);
    assert!((statement.cumulative_ce().unwrap_or_default() - 1_301_940.0).abs() < 0.01);

    let variance = statement.row(27).expect("variance row");
    assert_eq!(variance.monthly_value, -31_491.0);
    assert_eq!(variance.cumulative_value, Some(-94_473.0));
    assert_eq!(variance.color, Some(RowColor::VariancePositive));

    let members = statement.row(20).expect("members row");
    assert_eq!(members.cumulative_value, Some(1_000.0));

    assert!(statement
        .rows
        .iter()
        .filter(|r| r.row_type == RowType::Header)
        .all(|r| r.cumulative_value.is_none()));

    Ok(())
}

#[test]
fn test_budget_variance_with_mid_year_rate_change() -> Result<()> {
    let actuals: Vec<MonthlyActuals> = (5..=7)
        .map(|m| MonthlyActuals {
            service_month: date(2024, m, 1),
            domestic_facility_claims: 40_000.0,
            non_domestic_facility_claims: 10_000.0,
            non_hospital_medical_claims: 30_000.0,
            rx_claims: 20_000.0,
            employee_count: 100,
            member_count: 200,
        })
        .collect();
    let configs: Vec<MonthlyConfig> = (5..=7)
        .map(|m| MonthlyConfig {
            service_month: date(2024, m, 1),
            expected_claims: 100_000.0,
            stop_loss_reimbursement: 0.0,
            rx_rebates: 0.0,
        })
        .collect();
    let fees = vec![
        FeeWindow {
            name: "TPA Admin".to_string(),
            unit_type: FeeUnitType::PerEmployeePerMonth,
            rate: 30.0,
            effective_start: date(2024, 1, 1),
            effective_end: date(2024, 6, 15),
        },
        FeeWindow {
            name: "TPA Admin".to_string(),
            unit_type: FeeUnitType::PerEmployeePerMonth,
            rate: 36.0,
            effective_start: date(2024, 6, 16),
            effective_end: date(2024, 12, 31),
        },
    ];

    let config = ReportingConfig::from_json(r#"{ "variance": { "rounding_mode": "HALF_UP" } }"#)?;
    let report = BenefitsReportProcessor::new(config).budget_variance(&actuals, &configs, &fees)?;

    // May: 3,000. June: 15/30 * 3,000 + 15/30 * 3,600 = 3,300. July: 3,600.
    let fixed: Vec<f64> = report.months.iter().map(|m| m.fixed_costs).collect();
    assert_eq!(fixed, vec![3_000.0, 3_300.0, 3_600.0]);

    assert_eq!(report.ytd.actual_total, 309_900.0);
    assert_eq!(report.ytd.budget_total, 309_900.0);
    assert_eq!(report.ytd.variance, 0.0);
    assert_eq!(report.trailing_3.months, 3);
    assert_eq!(report.ytd.member_months, 600);

    Ok(())
}

#[test]
fn test_pepm_comparison_across_24_months() -> Result<()> {
    let mut data = String::from(MONTHLY_HEADER);
    for i in 0..24 {
        let (year, month) = (2023 + i / 12, (i % 12) + 1);
        let medical = if i < 12 { 100_000 } else { 80_000 };
        data.push_str(&format!(
            "\n{}-{:02},PPO,100,{},0,0,0,0,0,120000",
            year, month, medical
        ));
    }
    let months = monthly_plan_data_from_rows(&parse_csv(&data)?.rows)?;

    assert_eq!(months[0].month, date(2023, 1, 1));

    let split = split_24_months(&months);
    assert_eq!(split.current_12.len(), 12);
    assert_eq!(split.prior_12.len(), 12);

    // Uploads arrive oldest first; 2024 is the current year and costs dropped 20%.
    let comparison = compare_pepm_periods(&months);
    assert!((comparison.current_pepm - 800.0).abs() < 0.01, "current {}", comparison.current_pepm);
    assert!((comparison.prior_pepm - 1_000.0).abs() < 0.01, "prior {}", comparison.prior_pepm);
    assert!((comparison.change_percent + 20.0).abs() < 0.01, "change {}", comparison.change_percent);

    Ok(())
}

#[test]
fn test_reporting_config_schema_is_published() -> Result<()> {
    let schema = ReportingConfig::schema_as_json()?;
    assert!(schema.contains("isl_threshold"));
    assert!(schema.contains("rounding_mode"));
    Ok(())
}

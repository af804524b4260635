//! Integration tests for siaga-core
//!
//! These tests exercise the full records → report workflow and the
//! documented numeric properties of each pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use siaga_core::{
    analysis::{
        calculate_risk_score, monitor_compliance, AlertKind, AlertSeverity, ComplianceLevel,
        RiskInputs,
    },
    analyze_sentiment, build_report, classify,
    config::{ComplianceConfig, ScenarioConfig},
    detect_iqr,
    forecast::holt_forecast,
    kmeans,
    models::points_from_values,
    simulate_scenario, AIClient, AnalysisConfig, AttendanceRecord, AttendanceStatus, ClusterPoint,
    Direction, KMeansConfig, MockBackend, NaiveBayesModel, ReportGenerator, ReportInput,
    ScenarioModifiers, TfIdfIndex, TrainingExample, Transaction, TrendDirection,
};

fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn as_of() -> NaiveDateTime {
    at(6, 30, 23)
}

fn transaction(
    id: &str,
    member: &str,
    direction: Direction,
    amount: f64,
    date: NaiveDateTime,
    notes: &str,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        member_id: member.to_string(),
        member_name: Some(format!("Member {}", member)),
        amount,
        direction,
        category: "kas".to_string(),
        date,
        notes: Some(notes.to_string()),
        verification: None,
    }
}

/// Twenty ordinary dues payments over six months, a short history for m9,
/// and one very large expense by m9
fn organization_transactions() -> Vec<Transaction> {
    let mut txs: Vec<Transaction> = (0..20u32)
        .map(|i| {
            transaction(
                &format!("t{:02}", i),
                &format!("m{}", i % 4),
                Direction::In,
                150_000.0 + i as f64 * 1_337.0,
                at(i % 6 + 1, i / 6 + 2, 10),
                "iuran bulanan anggota",
            )
        })
        .collect();

    for (i, amount) in [160_000.0, 165_000.0, 170_000.0].iter().enumerate() {
        txs.push(transaction(
            &format!("h{}", i),
            "m9",
            Direction::Out,
            *amount,
            at(i as u32 + 1, 20, 9),
            "beli konsumsi rapat",
        ));
    }

    txs.push(transaction(
        "big",
        "m9",
        Direction::Out,
        25_000_000.0,
        at(6, 25, 14),
        "pembelian peralatan",
    ));
    txs
}

fn organization_attendance() -> Vec<AttendanceRecord> {
    let mut records = Vec::new();
    for member in ["m0", "m1", "m2"] {
        for day in 10..18 {
            records.push(AttendanceRecord {
                id: format!("{}-{}", member, day),
                member_id: member.to_string(),
                member_name: None,
                date: at(6, day, 19),
                status: AttendanceStatus::Present,
            });
        }
    }
    for day in 10..20 {
        records.push(AttendanceRecord {
            id: format!("m3-{}", day),
            member_id: "m3".to_string(),
            member_name: None,
            date: at(6, day, 19),
            status: if day < 15 {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::UnexcusedAbsence
            },
        });
    }
    records
}

// =============================================================================
// Full workflow
// =============================================================================

#[test]
fn test_full_report_workflow() {
    let txs = organization_transactions();
    let attendance = organization_attendance();
    let input = ReportInput::new(&txs, &attendance, as_of());

    let report = build_report(&input, &AnalysisConfig::default());

    // Fraud: the large expense leads the list
    assert!(!report.fraud_indicators.is_empty());
    let top = &report.fraud_indicators[0];
    assert_eq!(top.transaction_id, "big");
    assert!(top.risk_score >= 90);
    assert!(top.signals.len() >= 3);

    // Compliance: m3 attended half of the meetings
    assert_eq!(report.compliance.len(), 4);
    assert_eq!(report.compliance[0].member_id, "m3");
    assert_eq!(report.compliance[0].status, ComplianceLevel::NonCompliant);

    // Alerts: critical fraud alert first, compliance alert present
    assert_eq!(report.alerts[0].kind, AlertKind::Fraud);
    assert_eq!(report.alerts[0].severity, AlertSeverity::Critical);
    assert_eq!(report.alerts[0].related_id.as_deref(), Some("big"));
    assert!(report.alerts.iter().any(|a| a.kind == AlertKind::Compliance));
    assert!(report
        .alerts
        .windows(2)
        .all(|w| w[0].severity.priority() >= w[1].severity.priority()));

    // Risk score bounded and consistent with the detail strings
    let risk = &report.risk_score;
    for score in [risk.overall, risk.financial, risk.compliance, risk.operational] {
        assert!((0.0..=100.0).contains(&score));
    }
    assert!(risk.details.compliance.starts_with("1 non-compliant"));

    assert!(report.financial_forecast.is_sufficient());
    assert!(!report.recommendations.is_empty());
    assert!(!report.habit_insights.is_empty());
    assert!(!report.budget_suggestion.is_empty());
    assert_eq!(report.counts.members, 5);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["as_of"], "2024-06-30T23:00:00");
    assert!(json["risk_score"]["overall"].is_number());
}

#[tokio::test]
async fn test_report_generator_enriches_and_falls_back() {
    let txs = organization_transactions();
    let attendance = organization_attendance();
    let input = ReportInput::new(&txs, &attendance, as_of()).with_member_count(12);

    let enriched = ReportGenerator::new(AnalysisConfig::default())
        .with_ai(AIClient::mock())
        .generate(&input)
        .await;
    assert!(enriched.ai_enriched);
    assert_eq!(enriched.budget_suggestion, "Mock budget suggestion.");
    assert_eq!(enriched.counts.members, 12);

    let fallback = ReportGenerator::new(AnalysisConfig::default())
        .with_ai(AIClient::Mock(MockBackend::unhealthy()))
        .generate(&input)
        .await;
    let plain = build_report(&input, &AnalysisConfig::default());
    assert!(!fallback.ai_enriched);
    assert_eq!(fallback.budget_suggestion, plain.budget_suggestion);
    assert_eq!(fallback.risk_score.overall, enriched.risk_score.overall);
    assert_eq!(fallback.fraud_indicators.len(), plain.fraud_indicators.len());
}

#[test]
fn test_empty_records_produce_valid_report() {
    let input = ReportInput::new(&[], &[], as_of());
    let report = build_report(&input, &AnalysisConfig::default());
    assert!(report.fraud_indicators.is_empty());
    assert!(report.financial_forecast.reason.is_some());
    assert_eq!(report.risk_score.overall, 0.0);
}

// =============================================================================
// Pipeline properties
// =============================================================================

#[test]
fn test_fraud_indicators_sorted_and_bounded() {
    let mut txs = organization_transactions();
    // A burst of round-number payments by one member within an hour
    for i in 0..3 {
        txs.push(transaction(
            &format!("burst{}", i),
            "m7",
            Direction::Out,
            1_000_000.0,
            at(5, 12, 10) + chrono::Duration::minutes(i * 10),
            "transfer",
        ));
    }

    let report = build_report(
        &ReportInput::new(&txs, &[], as_of()),
        &AnalysisConfig::default(),
    );
    let scores: Vec<u32> = report.fraud_indicators.iter().map(|f| f.risk_score).collect();
    assert!(scores.len() >= 4);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(scores.iter().all(|s| *s <= 100));
}

#[test]
fn test_iqr_outlier_properties() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let flagged = detect_iqr(&points_from_values(&[10.0, 12.0, 11.0, 13.0, 100.0], start));
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].value, 100.0);

    let quiet = detect_iqr(&points_from_values(&[10.0, 11.0, 12.0, 13.0, 14.0], start));
    assert!(quiet.is_empty());
}

#[test]
fn test_sentiment_intensity_ordering() {
    let boosted = analyze_sentiment("sangat bagus sekali").score;
    let plain = analyze_sentiment("bagus").score;
    let negated = analyze_sentiment("tidak bagus").score;
    assert!(boosted > plain);
    assert!(plain > 0.0);
    assert!(0.0 > negated);
}

#[test]
fn test_holt_continues_trend() {
    let fc = holt_forecast(&[100.0, 110.0, 120.0, 130.0], 0.5, 0.3, 5);
    assert_eq!(fc.len(), 5);
    assert!(fc.windows(2).all(|w| w[1] > w[0]));
    for step in fc.windows(2) {
        assert!((step[1] - step[0] - 10.0).abs() < 1.0);
    }
}

#[test]
fn test_risk_score_monotonic() {
    let base = RiskInputs {
        max_fraud_score: 20.0,
        fraud_count: 1,
        non_compliant: 0,
        warning: 1,
        total_members: 10,
        pending_verifications: 1,
        forecast_trend: TrendDirection::Stable,
        volatile: false,
    };

    let mut last = calculate_risk_score(&base);
    for fraud in [30.0, 50.0, 80.0, 100.0] {
        let score = calculate_risk_score(&RiskInputs {
            max_fraud_score: fraud,
            ..base.clone()
        });
        assert!(score.financial >= last.financial);
        last = score;
    }

    let mut last = calculate_risk_score(&base);
    for nc in 1..=10 {
        let score = calculate_risk_score(&RiskInputs {
            non_compliant: nc,
            ..base.clone()
        });
        assert!(score.compliance >= last.compliance);
        last = score;
    }

    let mut last = calculate_risk_score(&base);
    for pending in 2..=20 {
        let score = calculate_risk_score(&RiskInputs {
            pending_verifications: pending,
            ..base.clone()
        });
        assert!(score.operational >= last.operational);
        last = score;
    }
}

#[test]
fn test_half_attendance_is_non_compliant() {
    let records: Vec<AttendanceRecord> = organization_attendance()
        .into_iter()
        .filter(|r| r.member_id == "m3")
        .collect();
    assert_eq!(records.len(), 10);

    let statuses = monitor_compliance(&records, as_of(), &ComplianceConfig::default());
    assert_eq!(statuses.len(), 1);
    assert!((statuses[0].attendance_rate - 0.5).abs() < 1e-12);
    assert_eq!(statuses[0].status, ComplianceLevel::NonCompliant);
}

#[test]
fn test_kmeans_two_groups_independent_of_seed() {
    let offsets = [0.0, 0.01, -0.01, 0.02, -0.02];
    let mut points = Vec::new();
    for (i, d) in offsets.iter().enumerate() {
        points.push(ClusterPoint::new(format!("high{}", i), vec![0.9 + d, 0.9 - d]));
        points.push(ClusterPoint::new(format!("low{}", i), vec![0.1 + d, 0.1 + d]));
    }

    for seed in [1, 7, 42, 1234, 98765] {
        let result = kmeans(&points, &KMeansConfig::new(2).with_seed(seed)).unwrap();
        assert!(result.converged);

        let high = result.members(result.points[0].cluster.unwrap());
        let low = result.members(result.points[1].cluster.unwrap());
        assert_eq!(high.len(), 5);
        assert_eq!(low.len(), 5);
        assert!(high.iter().all(|id| id.starts_with("high")));
        assert!(low.iter().all(|id| id.starts_with("low")));
    }
}

// =============================================================================
// Scenario simulation
// =============================================================================

fn balance_history() -> Vec<f64> {
    vec![
        2_500_000.0,
        2_600_000.0,
        2_550_000.0,
        2_800_000.0,
        3_000_000.0,
        3_200_000.0,
    ]
}

#[test]
fn test_scenario_zero_modifiers_match_baseline() {
    let result = simulate_scenario(
        &balance_history(),
        &ScenarioModifiers::default(),
        6,
        &ScenarioConfig::default(),
    );
    assert_eq!(result.projected, result.baseline);
}

#[test]
fn test_scenario_one_time_cost_lowers_balance() {
    let config = ScenarioConfig::default();
    let base = simulate_scenario(&balance_history(), &ScenarioModifiers::default(), 6, &config);
    let cost = simulate_scenario(
        &balance_history(),
        &ScenarioModifiers {
            one_time_cost: 750_000.0,
            ..ScenarioModifiers::default()
        },
        6,
        &config,
    );
    assert!(cost.final_balance < base.final_balance);
}

#[test]
fn test_scenario_income_growth_end_to_end() {
    let result = simulate_scenario(
        &balance_history(),
        &ScenarioModifiers {
            income_change_percent: 25.0,
            ..ScenarioModifiers::default()
        },
        6,
        &ScenarioConfig::default(),
    );
    assert_eq!(result.projected.len(), 6);
    assert!(result.projected[5] > result.baseline[5]);
    assert!(result.insights[0].contains("surplus of Rp "));
    assert!(result.delta > 0.0);
}

// =============================================================================
// Text analytics over transaction notes
// =============================================================================

#[test]
fn test_notes_classification_and_search() {
    let examples = vec![
        TrainingExample::new("iuran bulanan anggota", "iuran"),
        TrainingExample::new("iuran kas warga", "iuran"),
        TrainingExample::new("beli konsumsi rapat", "konsumsi"),
        TrainingExample::new("snack dan minuman rapat", "konsumsi"),
        TrainingExample::new("pembelian peralatan kantor", "peralatan"),
    ];
    let model = NaiveBayesModel::train(&examples).unwrap();

    let notes: Vec<String> = organization_transactions()
        .into_iter()
        .filter_map(|t| t.notes)
        .collect();
    let labels: Vec<String> = notes.iter().map(|n| classify(&model, n).label).collect();
    assert_eq!(labels.first().map(String::as_str), Some("iuran"));
    assert_eq!(labels.last().map(String::as_str), Some("peralatan"));

    let index = TfIdfIndex::fit(&notes);
    let hits = index.search("peralatan", 3);
    assert_eq!(hits.len(), 1);
    assert_eq!(notes[hits[0].index], "pembelian peralatan");
}

#[test]
fn test_config_roundtrip() {
    let config = AnalysisConfig::default();
    let rendered = config.to_toml().unwrap();
    let parsed = AnalysisConfig::from_toml(&rendered).unwrap();
    assert_eq!(parsed.fraud.static_threshold, 10_000_000.0);
    assert_eq!(parsed.compliance.window_days, 30);
    assert_eq!(parsed.scenario.turnover_ratio, 0.2);
}

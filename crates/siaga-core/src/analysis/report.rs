//! Risk report assembly
//!
//! `build_report` runs every pipeline over one snapshot of records and is
//! pure. `ReportGenerator` wraps it and, when an AI backend is configured,
//! replaces the forecast action plan and the budget suggestion with
//! generated text. Any AI failure keeps the deterministic values.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ai::{AIClient, NarrativeBackend};
use crate::config::AnalysisConfig;
use crate::models::{flexible_datetime, AttendanceRecord, Transaction};
use crate::pattern::TrendDirection;
use crate::prompts::{Prompt, PromptId};
use crate::stats::{mean, percent_change};

use super::alerts::generate_alerts;
use super::compliance::monitor_compliance;
use super::financial::{note_unusual_months, predict_financial_trend};
use super::fraud::detect_fraud;
use super::habits::{HabitContext, HabitEngine};
use super::risk::{calculate_risk_score, RiskInputs};
use super::types::{
    format_rupiah, Alert, ComplianceLevel, ComplianceStatus, FinancialForecast, FinancialMetric,
    FraudIndicator, HabitInsight, RiskScore, RiskTrend,
};

const ACTION_PLAN_STEPS: usize = 3;
/// Overall risk at or above this keeps the budget suggestion defensive
const CAUTIOUS_RISK_SCORE: f64 = 50.0;

/// Records for one analysis run
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub transactions: &'a [Transaction],
    pub attendance: &'a [AttendanceRecord],
    /// Active member count from the records provider; distinct member ids otherwise
    pub active_member_count: Option<usize>,
    pub as_of: NaiveDateTime,
}

impl<'a> ReportInput<'a> {
    pub fn new(
        transactions: &'a [Transaction],
        attendance: &'a [AttendanceRecord],
        as_of: NaiveDateTime,
    ) -> Self {
        Self {
            transactions,
            attendance,
            active_member_count: None,
            as_of,
        }
    }

    pub fn with_member_count(mut self, count: usize) -> Self {
        self.active_member_count = Some(count);
        self
    }

    /// Provider count, else members seen in the records
    pub fn member_count(&self) -> usize {
        self.active_member_count.unwrap_or_else(|| {
            self.transactions
                .iter()
                .map(|t| t.member_id.as_str())
                .chain(self.attendance.iter().map(|a| a.member_id.as_str()))
                .collect::<HashSet<_>>()
                .len()
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportCounts {
    pub transactions: usize,
    pub attendance_records: usize,
    pub members: usize,
    pub pending_verifications: usize,
}

/// Everything produced by one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    #[serde(with = "flexible_datetime")]
    pub as_of: NaiveDateTime,
    pub fraud_indicators: Vec<FraudIndicator>,
    pub compliance: Vec<ComplianceStatus>,
    /// Monthly net balance forecast
    pub financial_forecast: FinancialForecast,
    pub risk_score: RiskScore,
    pub alerts: Vec<Alert>,
    pub habit_insights: Vec<HabitInsight>,
    /// Deduplicated, most urgent first
    pub recommendations: Vec<String>,
    pub budget_suggestion: String,
    pub counts: ReportCounts,
    /// Whether any narrative field came from the AI backend
    pub ai_enriched: bool,
}

/// Run every pipeline and assemble the report
pub fn build_report(input: &ReportInput<'_>, config: &AnalysisConfig) -> RiskReport {
    let fraud_indicators = detect_fraud(input.transactions, &config.fraud);
    let compliance = monitor_compliance(input.attendance, input.as_of, &config.compliance);
    let mut financial_forecast = predict_financial_trend(
        input.transactions,
        FinancialMetric::Net,
        config.forecast.periods,
        &config.forecast,
    );
    note_unusual_months(&mut financial_forecast, config.anomaly.z_threshold);

    let counts = ReportCounts {
        transactions: input.transactions.len(),
        attendance_records: input.attendance.len(),
        members: input.member_count(),
        pending_verifications: input.transactions.iter().filter(|t| t.is_pending()).count(),
    };

    let count_level = |level: ComplianceLevel| compliance.iter().filter(|c| c.status == level).count();
    let risk_score = calculate_risk_score(&RiskInputs {
        max_fraud_score: fraud_indicators
            .iter()
            .map(|f| f.risk_score)
            .max()
            .unwrap_or(0) as f64,
        fraud_count: fraud_indicators.len(),
        non_compliant: count_level(ComplianceLevel::NonCompliant),
        warning: count_level(ComplianceLevel::Warning),
        total_members: counts.members,
        pending_verifications: counts.pending_verifications,
        forecast_trend: financial_forecast.trend,
        volatile: financial_forecast.volatile,
    });

    let alerts = generate_alerts(&fraud_indicators, &compliance, &risk_score);

    let habit_insights = HabitEngine::new().analyze_all(&HabitContext {
        transactions: input.transactions,
        attendance: input.attendance,
        as_of: input.as_of,
        habits: &config.habits,
        clustering: &config.clustering,
    });

    let recommendations = recommendations(&alerts, &risk_score, &financial_forecast);
    let budget_suggestion = default_budget_suggestion(&financial_forecast, &risk_score);

    RiskReport {
        as_of: input.as_of,
        fraud_indicators,
        compliance,
        financial_forecast,
        risk_score,
        alerts,
        habit_insights,
        recommendations,
        budget_suggestion,
        counts,
        ai_enriched: false,
    }
}

fn recommendations(
    alerts: &[Alert],
    risk: &RiskScore,
    forecast: &FinancialForecast,
) -> Vec<String> {
    let mut candidates: Vec<String> = alerts.iter().map(|a| a.recommendation.clone()).collect();

    if risk.trend == RiskTrend::Worsening {
        candidates.push(
            "Review this report with the committee every week until the risk trend improves"
                .to_string(),
        );
    }
    if forecast.is_sufficient() && forecast.trend == TrendDirection::Decreasing {
        candidates.extend(forecast.action_plan.first().cloned());
    }
    if candidates.is_empty() {
        candidates.push("No urgent issues detected; keep the current controls in place".to_string());
    }

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));
    candidates
}

/// One-sentence budget suggestion from the net forecast and overall risk
pub fn default_budget_suggestion(forecast: &FinancialForecast, risk: &RiskScore) -> String {
    let Some(&projected) = forecast.forecast.last() else {
        return "Not enough monthly history for a budget projection; keep recording every transaction"
            .to_string();
    };

    if projected < 0.0 {
        format!(
            "The monthly net balance is projected at {}; cut non-essential spending until income covers expenses",
            format_rupiah(projected)
        )
    } else if risk.overall >= CAUTIOUS_RISK_SCORE {
        format!(
            "The monthly net balance is projected at {}, but overall risk is {:.0}/100; hold at least one month of expenses in reserve",
            format_rupiah(projected),
            risk.overall
        )
    } else {
        format!(
            "The monthly net balance is projected at {}; set part of the surplus aside as a reserve",
            format_rupiah(projected)
        )
    }
}

#[derive(Debug, Deserialize)]
struct ActionPlanResponse {
    steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BudgetResponse {
    suggestion: String,
}

/// Builds reports and optionally enriches their narrative fields
pub struct ReportGenerator {
    config: AnalysisConfig,
    ai: Option<AIClient>,
    language: String,
}

impl ReportGenerator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ai: None,
            language: "English".to_string(),
        }
    }

    /// Attach an AI backend (ignored when `ai.enabled` is false)
    pub fn with_ai(mut self, ai: AIClient) -> Self {
        self.ai = Some(ai.with_timeout(self.config.ai.timeout()));
        self
    }

    /// Language for generated text
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub async fn generate(&self, input: &ReportInput<'_>) -> RiskReport {
        let mut report = build_report(input, &self.config);

        if let Some(ai) = self.ai.as_ref().filter(|_| self.config.ai.enabled) {
            if ai.is_available().await {
                self.enrich(ai, &mut report).await;
            } else {
                tracing::warn!(
                    host = ai.host(),
                    "AI backend unavailable, using deterministic narrative"
                );
            }
        }

        tracing::info!(
            transactions = report.counts.transactions,
            members = report.counts.members,
            fraud = report.fraud_indicators.len(),
            alerts = report.alerts.len(),
            risk = report.risk_score.overall,
            ai_enriched = report.ai_enriched,
            "Risk report generated"
        );
        report
    }

    async fn enrich(&self, ai: &AIClient, report: &mut RiskReport) {
        if report.financial_forecast.is_sufficient() {
            let prompt = action_plan_prompt(&report.financial_forecast, &self.language);
            match ai.generate_json::<ActionPlanResponse>(&prompt).await {
                Ok(Some(plan)) if plan.steps.len() >= ACTION_PLAN_STEPS => {
                    report.financial_forecast.action_plan =
                        plan.steps.into_iter().take(ACTION_PLAN_STEPS).collect();
                    report.ai_enriched = true;
                }
                Ok(_) => {
                    tracing::warn!("AI action plan missing or incomplete, keeping default plan");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "AI action plan failed, keeping default plan");
                }
            }
        }

        let prompt = budget_prompt(report, &self.language);
        match ai.generate_json::<BudgetResponse>(&prompt).await {
            Ok(Some(budget)) if !budget.suggestion.trim().is_empty() => {
                report.budget_suggestion = budget.suggestion.trim().to_string();
                report.ai_enriched = true;
            }
            Ok(_) => {
                tracing::warn!("AI budget suggestion empty, keeping default suggestion");
            }
            Err(e) => {
                tracing::warn!(error = %e, "AI budget suggestion failed, keeping default suggestion");
            }
        }
    }
}

fn action_plan_prompt(forecast: &FinancialForecast, language: &str) -> String {
    let history: Vec<f64> = forecast.history.iter().map(|m| m.total).collect();
    let last = history.last().copied().unwrap_or(0.0);
    let projected = forecast.forecast.last().copied().unwrap_or(last);

    let vars: HashMap<&str, String> = HashMap::from([
        ("metric", forecast.metric.to_string()),
        ("trend", forecast.trend.as_str().to_string()),
        ("periods", forecast.forecast.len().to_string()),
        ("mean", format!("{:.0}", mean(&history))),
        ("change", format!("{:.1}", percent_change(last, projected))),
        ("volatility", forecast.volatility.as_str().to_string()),
        ("language", language.to_string()),
    ]);
    Prompt::get(PromptId::ActionPlan).render(&vars)
}

fn budget_prompt(report: &RiskReport, language: &str) -> String {
    let projected = report
        .financial_forecast
        .forecast
        .last()
        .copied()
        .unwrap_or(0.0);
    let non_compliant = report
        .compliance
        .iter()
        .filter(|c| c.status == ComplianceLevel::NonCompliant)
        .count();

    let vars: HashMap<&str, String> = HashMap::from([
        ("risk_score", format!("{:.0}", report.risk_score.overall)),
        ("risk_trend", report.risk_score.trend.to_string()),
        ("projected_net", format!("{:.0}", projected)),
        ("fraud_count", report.fraud_indicators.len().to_string()),
        ("non_compliant", non_compliant.to_string()),
        ("language", language.to_string()),
    ]);
    Prompt::get(PromptId::BudgetSuggestion).render(&vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::{AttendanceStatus, Direction};
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn tx(id: &str, member: &str, direction: Direction, amount: f64, date: NaiveDateTime) -> Transaction {
        Transaction {
            id: id.to_string(),
            member_id: member.to_string(),
            member_name: None,
            amount,
            direction,
            category: "iuran".to_string(),
            date,
            notes: None,
            verification: None,
        }
    }

    fn records() -> (Vec<Transaction>, Vec<AttendanceRecord>) {
        let mut txs = Vec::new();
        for month in 1..=6 {
            txs.push(tx(
                &format!("in{}", month),
                "m1",
                Direction::In,
                2_012_345.0 + month as f64 * 100_000.0,
                at(month, 5),
            ));
            txs.push(tx(
                &format!("out{}", month),
                "m2",
                Direction::Out,
                1_003_210.0,
                at(month, 20),
            ));
        }
        let attendance = (10..20)
            .map(|day| AttendanceRecord {
                id: format!("a{}", day),
                member_id: if day % 2 == 0 { "m1" } else { "m2" }.to_string(),
                member_name: None,
                date: at(6, day),
                status: AttendanceStatus::Present,
            })
            .collect();
        (txs, attendance)
    }

    #[test]
    fn test_build_report_on_empty_input() {
        let input = ReportInput::new(&[], &[], at(6, 30));
        let report = build_report(&input, &AnalysisConfig::default());
        assert!(report.fraud_indicators.is_empty());
        assert!(report.compliance.is_empty());
        assert!(!report.financial_forecast.is_sufficient());
        assert_eq!(report.risk_score.overall, 0.0);
        assert!(report.alerts.is_empty());
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.budget_suggestion.starts_with("Not enough monthly history"));
    }

    #[test]
    fn test_build_report_counts_and_forecast() {
        let (txs, attendance) = records();
        let input = ReportInput::new(&txs, &attendance, at(6, 30));
        let report = build_report(&input, &AnalysisConfig::default());

        assert_eq!(report.counts.transactions, 12);
        assert_eq!(report.counts.members, 2);
        assert!(report.financial_forecast.is_sufficient());
        assert_eq!(report.financial_forecast.trend, TrendDirection::Increasing);
        assert_eq!(report.compliance.len(), 2);
        assert!(report.budget_suggestion.contains("set part of the surplus aside"));
        assert!(!report.ai_enriched);

        let with_count = input.with_member_count(40);
        assert_eq!(build_report(&with_count, &AnalysisConfig::default()).counts.members, 40);
    }

    #[test]
    fn test_unusual_month_uses_anomaly_threshold() {
        let mut txs: Vec<Transaction> = (1..=9)
            .map(|m| tx(&format!("d{}", m), "m1", Direction::In, 1_012_345.0, at(m, 5)))
            .collect();
        txs.push(tx("loss", "m2", Direction::Out, 8_012_345.0, at(10, 5)));
        let input = ReportInput::new(&txs, &[], at(10, 31));

        let report = build_report(&input, &AnalysisConfig::default());
        let flagged: Vec<&String> = report
            .financial_forecast
            .insights
            .iter()
            .filter(|i| i.contains("is unusual"))
            .collect();
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].starts_with("2024-10"));

        let mut strict = AnalysisConfig::default();
        strict.anomaly.z_threshold = 3.5;
        let report = build_report(&input, &strict);
        assert!(!report
            .financial_forecast
            .insights
            .iter()
            .any(|i| i.contains("is unusual")));
    }

    #[test]
    fn test_recommendations_deduplicated() {
        let (mut txs, attendance) = records();
        for i in 0..3 {
            txs.push(tx(&format!("big{}", i), "m3", Direction::Out, 50_000_000.0, at(6, 1 + i)));
        }
        let input = ReportInput::new(&txs, &attendance, at(6, 30));
        let report = build_report(&input, &AnalysisConfig::default());

        let unique: HashSet<&String> = report.recommendations.iter().collect();
        assert_eq!(unique.len(), report.recommendations.len());
    }

    #[tokio::test]
    async fn test_generator_uses_ai_text() {
        let (txs, attendance) = records();
        let input = ReportInput::new(&txs, &attendance, at(6, 30));
        let generator = ReportGenerator::new(AnalysisConfig::default()).with_ai(AIClient::mock());

        let report = generator.generate(&input).await;
        assert!(report.ai_enriched);
        assert_eq!(report.financial_forecast.action_plan[0], "Mock step one");
        assert_eq!(report.budget_suggestion, "Mock budget suggestion.");
    }

    #[tokio::test]
    async fn test_generator_falls_back_when_unavailable() {
        let (txs, attendance) = records();
        let input = ReportInput::new(&txs, &attendance, at(6, 30));
        let expected = build_report(&input, &AnalysisConfig::default());

        let generator = ReportGenerator::new(AnalysisConfig::default())
            .with_ai(AIClient::Mock(MockBackend::unhealthy()));
        let report = generator.generate(&input).await;

        assert!(!report.ai_enriched);
        assert_eq!(report.financial_forecast.action_plan, expected.financial_forecast.action_plan);
        assert_eq!(report.budget_suggestion, expected.budget_suggestion);
    }

    #[tokio::test]
    async fn test_generator_ignores_malformed_json() {
        let (txs, attendance) = records();
        let input = ReportInput::new(&txs, &attendance, at(6, 30));
        let expected = build_report(&input, &AnalysisConfig::default());

        let mock = MockBackend::new().with_json(json!({"steps": ["only one"], "note": "x"}));
        let generator = ReportGenerator::new(AnalysisConfig::default()).with_ai(AIClient::Mock(mock));
        let report = generator.generate(&input).await;

        assert!(!report.ai_enriched);
        assert_eq!(report.financial_forecast.action_plan, expected.financial_forecast.action_plan);
        assert_eq!(report.budget_suggestion, expected.budget_suggestion);
    }

    #[tokio::test]
    async fn test_generator_respects_disabled_ai() {
        let (txs, attendance) = records();
        let input = ReportInput::new(&txs, &attendance, at(6, 30));
        let mut config = AnalysisConfig::default();
        config.ai.enabled = false;

        let report = ReportGenerator::new(config)
            .with_ai(AIClient::mock())
            .generate(&input)
            .await;
        assert!(!report.ai_enriched);
    }
}

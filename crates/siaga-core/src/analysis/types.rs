//! Core types for the analysis pipelines

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pattern::{TrendDirection, VolatilityLevel};

/// A transaction flagged by the fraud pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudIndicator {
    pub transaction_id: String,
    pub member_id: String,
    pub amount: f64,
    /// Sum of triggered signal weights, capped at 100
    pub risk_score: u32,
    /// Triggered signal descriptions, in evaluation order
    pub signals: Vec<String>,
    pub explanation: String,
}

/// Attendance compliance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceLevel {
    Compliant,
    Warning,
    NonCompliant,
}

impl ComplianceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceLevel::Compliant => "compliant",
            ComplianceLevel::Warning => "warning",
            ComplianceLevel::NonCompliant => "non_compliant",
        }
    }

    /// Sort rank (worst first)
    pub fn rank(&self) -> u8 {
        match self {
            ComplianceLevel::NonCompliant => 0,
            ComplianceLevel::Warning => 1,
            ComplianceLevel::Compliant => 2,
        }
    }
}

impl fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComplianceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compliant" => Ok(ComplianceLevel::Compliant),
            "warning" => Ok(ComplianceLevel::Warning),
            "non_compliant" => Ok(ComplianceLevel::NonCompliant),
            _ => Err(format!("Unknown compliance level: {}", s)),
        }
    }
}

/// Attendance compliance of one member over the trailing window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceStatus {
    pub member_id: String,
    pub member_name: Option<String>,
    /// (present + 0.5 * excused) / records, in [0, 1]
    pub attendance_rate: f64,
    /// Records in the window that were not `present`
    pub missed_days: usize,
    pub total_records: usize,
    pub status: ComplianceLevel,
    pub issues: Vec<String>,
}

/// Direction of the overall risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTrend {
    Improving,
    Stable,
    Worsening,
}

impl RiskTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTrend::Improving => "improving",
            RiskTrend::Stable => "stable",
            RiskTrend::Worsening => "worsening",
        }
    }
}

impl fmt::Display for RiskTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-readable explanation of each sub-score, built from the same counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskDetails {
    pub financial: String,
    pub compliance: String,
    pub operational: String,
}

/// Aggregate organizational risk, every score in [0, 100]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub overall: f64,
    pub financial: f64,
    pub compliance: f64,
    pub operational: f64,
    pub trend: RiskTrend,
    pub details: RiskDetails,
}

/// Severity level of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            AlertSeverity::Low => 1,
            AlertSeverity::Medium => 2,
            AlertSeverity::High => 3,
            AlertSeverity::Critical => 4,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(AlertSeverity::Low),
            "medium" => Ok(AlertSeverity::Medium),
            "high" => Ok(AlertSeverity::High),
            "critical" => Ok(AlertSeverity::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Fraud,
    Financial,
    Compliance,
    Operational,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Fraud => "fraud",
            AlertKind::Financial => "financial",
            AlertKind::Compliance => "compliance",
            AlertKind::Operational => "operational",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub recommendation: String,
    /// Transaction id for fraud alerts
    pub related_id: Option<String>,
}

/// Category of a behavioral insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitCategory {
    Meeting,
    Spending,
    Activity,
}

impl HabitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitCategory::Meeting => "meeting",
            HabitCategory::Spending => "spending",
            HabitCategory::Activity => "activity",
        }
    }
}

impl fmt::Display for HabitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A behavioral or persona insight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitInsight {
    pub category: HabitCategory,
    pub title: String,
    pub description: String,
    /// Short metric label (e.g. "42% of meetings")
    pub metric: String,
    /// In [0, 1]
    pub confidence: f64,
    pub recommendation: String,
    pub action_plan: Option<Vec<String>>,
}

impl HabitInsight {
    pub fn new(
        category: HabitCategory,
        title: impl Into<String>,
        description: impl Into<String>,
        metric: impl Into<String>,
        confidence: f64,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            category,
            title: title.into(),
            description: description.into(),
            metric: metric.into(),
            confidence: confidence.clamp(0.0, 1.0),
            recommendation: recommendation.into(),
            action_plan: None,
        }
    }

    pub fn with_action_plan(mut self, steps: Vec<String>) -> Self {
        self.action_plan = Some(steps);
        self
    }
}

/// Which money flow a financial forecast covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialMetric {
    Income,
    Expense,
    /// Income minus expense
    Net,
}

impl FinancialMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialMetric::Income => "income",
            FinancialMetric::Expense => "expense",
            FinancialMetric::Net => "net",
        }
    }
}

impl fmt::Display for FinancialMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FinancialMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" | "in" => Ok(FinancialMetric::Income),
            "expense" | "out" => Ok(FinancialMetric::Expense),
            "net" | "balance" => Ok(FinancialMetric::Net),
            _ => Err(format!("Unknown financial metric: {}", s)),
        }
    }
}

/// Total for one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// First day of the month
    pub month: NaiveDate,
    pub total: f64,
}

/// Forecast of a monthly money flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialForecast {
    pub metric: FinancialMetric,
    pub history: Vec<MonthlyTotal>,
    /// Projected monthly totals, one per period
    pub forecast: Vec<f64>,
    pub trend: TrendDirection,
    pub volatility: VolatilityLevel,
    /// High volatility flag fed to the risk score
    pub volatile: bool,
    /// clamp(1 - cv, 0.3, 0.95); 0 when there was not enough history
    pub confidence: f64,
    pub insights: Vec<String>,
    pub action_plan: Vec<String>,
    /// Why the forecast is empty, when it is
    pub reason: Option<String>,
}

impl FinancialForecast {
    pub fn is_sufficient(&self) -> bool {
        self.reason.is_none()
    }
}

/// Format an amount as Rupiah with dot thousand separators (e.g. "Rp 1.250.000")
pub fn format_rupiah(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_level_serialization() {
        let json = serde_json::to_string(&ComplianceLevel::NonCompliant).unwrap();
        assert_eq!(json, "\"non_compliant\"");
        assert_eq!(
            "non_compliant".parse::<ComplianceLevel>().unwrap(),
            ComplianceLevel::NonCompliant
        );
        assert!(ComplianceLevel::NonCompliant.rank() < ComplianceLevel::Warning.rank());
    }

    #[test]
    fn test_alert_severity_priority() {
        assert!(AlertSeverity::Critical.priority() > AlertSeverity::High.priority());
        assert!(AlertSeverity::High.priority() > AlertSeverity::Medium.priority());
        assert_eq!("critical".parse::<AlertSeverity>().unwrap(), AlertSeverity::Critical);
    }

    #[test]
    fn test_habit_insight_builder() {
        let insight = HabitInsight::new(
            HabitCategory::Meeting,
            "Peak day",
            "Most meetings happen on Friday",
            "40%",
            1.4,
            "Keep Friday",
        )
        .with_action_plan(vec!["a".into()]);
        assert_eq!(insight.confidence, 1.0);
        assert_eq!(insight.action_plan.unwrap().len(), 1);
    }

    #[test]
    fn test_format_rupiah() {
        assert_eq!(format_rupiah(1_250_000.0), "Rp 1.250.000");
        assert_eq!(format_rupiah(999.4), "Rp 999");
        assert_eq!(format_rupiah(1000.0), "Rp 1.000");
        assert_eq!(format_rupiah(-45_500.0), "-Rp 45.500");
        assert_eq!(format_rupiah(0.0), "Rp 0");
    }
}

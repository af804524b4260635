//! Alert generation from fraud, compliance and risk results

use super::types::{
    Alert, AlertKind, AlertSeverity, ComplianceLevel, ComplianceStatus, FraudIndicator, RiskScore,
};

/// Fraud indicators at or above this score raise a critical alert each
pub const FRAUD_ALERT_SCORE: u32 = 70;
pub const FINANCIAL_ALERT_SCORE: f64 = 70.0;
pub const OPERATIONAL_ALERT_SCORE: f64 = 60.0;
/// More non-compliant members than this escalates the compliance alert
pub const COMPLIANCE_ESCALATION_COUNT: usize = 3;

const FRAUD_RECOMMENDATION: &str =
    "Verify the receipt and confirm the transaction with the member before approving it";
const FINANCIAL_RECOMMENDATION: &str =
    "Hold a treasury review and freeze non-essential spending until the causes are understood";
const COMPLIANCE_RECOMMENDATION: &str =
    "Contact the affected members personally and agree on an attendance plan";
const OPERATIONAL_RECOMMENDATION: &str =
    "Clear the verification backlog and assign a second reviewer for pending transactions";

/// Alerts ordered by severity (critical first), fraud alerts by score
pub fn generate_alerts(
    fraud: &[FraudIndicator],
    compliance: &[ComplianceStatus],
    risk: &RiskScore,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = fraud
        .iter()
        .filter(|f| f.risk_score >= FRAUD_ALERT_SCORE)
        .map(|f| Alert {
            kind: AlertKind::Fraud,
            severity: AlertSeverity::Critical,
            title: format!("Suspicious transaction {}", f.transaction_id),
            message: f.explanation.clone(),
            recommendation: FRAUD_RECOMMENDATION.to_string(),
            related_id: Some(f.transaction_id.clone()),
        })
        .collect();

    if risk.financial >= FINANCIAL_ALERT_SCORE {
        alerts.push(Alert {
            kind: AlertKind::Financial,
            severity: AlertSeverity::High,
            title: "High financial risk".to_string(),
            message: format!(
                "Financial risk score {:.0}/100: {}",
                risk.financial, risk.details.financial
            ),
            recommendation: FINANCIAL_RECOMMENDATION.to_string(),
            related_id: None,
        });
    }

    let non_compliant = compliance
        .iter()
        .filter(|c| c.status == ComplianceLevel::NonCompliant)
        .count();
    if non_compliant > 0 {
        let severity = if non_compliant > COMPLIANCE_ESCALATION_COUNT {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        };
        alerts.push(Alert {
            kind: AlertKind::Compliance,
            severity,
            title: format!("{} member(s) below attendance minimum", non_compliant),
            message: format!("Compliance risk score {:.0}/100: {}", risk.compliance, risk.details.compliance),
            recommendation: COMPLIANCE_RECOMMENDATION.to_string(),
            related_id: None,
        });
    }

    if risk.operational >= OPERATIONAL_ALERT_SCORE {
        alerts.push(Alert {
            kind: AlertKind::Operational,
            severity: AlertSeverity::High,
            title: "Operational risk elevated".to_string(),
            message: format!(
                "Operational risk score {:.0}/100: {}",
                risk.operational, risk.details.operational
            ),
            recommendation: OPERATIONAL_RECOMMENDATION.to_string(),
            related_id: None,
        });
    }

    alerts.sort_by(|a, b| b.severity.priority().cmp(&a.severity.priority()));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::risk::{calculate_risk_score, RiskInputs};
    use crate::pattern::TrendDirection;

    fn indicator(id: &str, score: u32) -> FraudIndicator {
        FraudIndicator {
            transaction_id: id.to_string(),
            member_id: "m1".to_string(),
            amount: 1.0,
            risk_score: score,
            signals: vec!["x".into()],
            explanation: format!("score {}", score),
        }
    }

    fn status(id: &str, level: ComplianceLevel) -> ComplianceStatus {
        ComplianceStatus {
            member_id: id.to_string(),
            member_name: None,
            attendance_rate: 0.5,
            missed_days: 5,
            total_records: 10,
            status: level,
            issues: vec![],
        }
    }

    #[test]
    fn test_fraud_alerts_only_above_threshold() {
        let risk = calculate_risk_score(&RiskInputs::default());
        let alerts = generate_alerts(
            &[indicator("a", 85), indicator("b", 70), indicator("c", 69)],
            &[],
            &risk,
        );
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.kind == AlertKind::Fraud));
        assert!(alerts.iter().all(|a| a.severity == AlertSeverity::Critical));
        assert_eq!(alerts[0].related_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_compliance_alert_escalates() {
        let risk = calculate_risk_score(&RiskInputs::default());
        let few: Vec<_> = (0..3)
            .map(|i| status(&format!("m{}", i), ComplianceLevel::NonCompliant))
            .collect();
        let alerts = generate_alerts(&[], &few, &risk);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);

        let many: Vec<_> = (0..4)
            .map(|i| status(&format!("m{}", i), ComplianceLevel::NonCompliant))
            .collect();
        let alerts = generate_alerts(&[], &many, &risk);
        assert_eq!(alerts[0].severity, AlertSeverity::High);

        let warnings = vec![status("w", ComplianceLevel::Warning)];
        assert!(generate_alerts(&[], &warnings, &risk).is_empty());
    }

    #[test]
    fn test_financial_and_operational_alerts() {
        let risk = calculate_risk_score(&RiskInputs {
            max_fraud_score: 90.0,
            fraud_count: 4,
            total_members: 10,
            pending_verifications: 10,
            forecast_trend: TrendDirection::Decreasing,
            ..RiskInputs::default()
        });
        // financial = 54 + 20 + 30 = 100 (capped), operational = 50 + 25 = 75
        let alerts = generate_alerts(&[], &[], &risk);
        let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::Financial, AlertKind::Operational]);
        assert!(alerts[0].message.contains("4 flagged transaction(s)"));
    }
}

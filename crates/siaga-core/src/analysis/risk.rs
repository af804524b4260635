//! Aggregate risk score
//!
//! ```text
//! financial   = min(100, 0.6 * max_fraud + 5 * fraud_count + 30 [decreasing] + 15 [volatile])
//! compliance  = min(100, (100 * non_compliant + 50 * warning) / max(members, 1))
//! operational = min(100, min(50, 5 * pending) + 25 [compliance > 40] + 25 [financial > 60])
//! overall     = round(0.45 * financial + 0.30 * compliance + 0.25 * operational)
//! ```
//!
//! Detail strings are built from the same counts as the numbers.

use serde::{Deserialize, Serialize};

use crate::pattern::TrendDirection;

use super::types::{RiskDetails, RiskScore, RiskTrend};

const FINANCIAL_WEIGHT: f64 = 0.45;
const COMPLIANCE_WEIGHT: f64 = 0.30;
const OPERATIONAL_WEIGHT: f64 = 0.25;

/// Counts feeding the risk score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskInputs {
    /// Highest fraud indicator score, 0 when none
    pub max_fraud_score: f64,
    pub fraud_count: usize,
    pub non_compliant: usize,
    pub warning: usize,
    pub total_members: usize,
    pub pending_verifications: usize,
    pub forecast_trend: TrendDirection,
    pub volatile: bool,
}

impl Default for RiskInputs {
    fn default() -> Self {
        Self {
            max_fraud_score: 0.0,
            fraud_count: 0,
            non_compliant: 0,
            warning: 0,
            total_members: 0,
            pending_verifications: 0,
            forecast_trend: TrendDirection::Stable,
            volatile: false,
        }
    }
}

pub fn calculate_risk_score(inputs: &RiskInputs) -> RiskScore {
    let decreasing = inputs.forecast_trend == TrendDirection::Decreasing;

    let mut financial = 0.6 * inputs.max_fraud_score.max(0.0) + 5.0 * inputs.fraud_count as f64;
    if decreasing {
        financial += 30.0;
    }
    if inputs.volatile {
        financial += 15.0;
    }
    let financial = financial.min(100.0);

    let members = inputs.total_members.max(1) as f64;
    let compliance = ((100.0 * inputs.non_compliant as f64 + 50.0 * inputs.warning as f64)
        / members)
        .min(100.0);

    let mut operational = (5.0 * inputs.pending_verifications as f64).min(50.0);
    if compliance > 40.0 {
        operational += 25.0;
    }
    if financial > 60.0 {
        operational += 25.0;
    }
    let operational = operational.min(100.0);

    let overall = (FINANCIAL_WEIGHT * financial
        + COMPLIANCE_WEIGHT * compliance
        + OPERATIONAL_WEIGHT * operational)
        .round();

    let trend = if overall < 20.0 {
        RiskTrend::Stable
    } else if inputs.forecast_trend == TrendDirection::Increasing && inputs.non_compliant == 0 {
        RiskTrend::Improving
    } else if decreasing || compliance > 40.0 {
        RiskTrend::Worsening
    } else {
        RiskTrend::Stable
    };

    RiskScore {
        overall,
        financial,
        compliance,
        operational,
        trend,
        details: details(inputs, compliance, financial),
    }
}

fn details(inputs: &RiskInputs, compliance: f64, financial: f64) -> RiskDetails {
    let mut financial_parts = vec![format!(
        "{} flagged transaction(s), highest fraud score {:.0}",
        inputs.fraud_count, inputs.max_fraud_score
    )];
    match inputs.forecast_trend {
        TrendDirection::Decreasing => financial_parts.push("cash flow forecast decreasing".into()),
        TrendDirection::Increasing => financial_parts.push("cash flow forecast increasing".into()),
        TrendDirection::Stable => financial_parts.push("cash flow forecast stable".into()),
    }
    if inputs.volatile {
        financial_parts.push("high volatility".into());
    }

    let compliance_detail = format!(
        "{} non-compliant and {} warning out of {} member(s)",
        inputs.non_compliant, inputs.warning, inputs.total_members
    );

    let mut operational_parts = vec![format!(
        "{} transaction(s) pending verification",
        inputs.pending_verifications
    )];
    if compliance > 40.0 {
        operational_parts.push("compliance risk above 40".into());
    }
    if financial > 60.0 {
        operational_parts.push("financial risk above 60".into());
    }

    RiskDetails {
        financial: financial_parts.join("; "),
        compliance: compliance_detail,
        operational: operational_parts.join("; "),
    }
}

//! "What-if" balance scenarios
//!
//! The baseline is Holt's projection of the unmodified balance history. The
//! projected series starts from the last balance adjusted by one-time
//! items, follows the baseline's period-over-period movement and adds a
//! per-period flow adjustment:
//!
//! - `simulate_scenario` estimates flows as `turnover_ratio` of the running
//!   balance, scaled by (income % - expense %).
//! - `simulate_scenario_with_flows` uses forecast income and expense series,
//!   which makes the adjustment exact.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::forecast::{holt_forecast, DEFAULT_ALPHA, DEFAULT_BETA};
use crate::stats::mean;

use super::types::format_rupiah;

/// Changes applied on top of the status quo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioModifiers {
    pub income_change_percent: f64,
    pub expense_change_percent: f64,
    pub one_time_income: f64,
    pub one_time_cost: f64,
}

impl ScenarioModifiers {
    pub fn is_neutral(&self) -> bool {
        self.income_change_percent == 0.0
            && self.expense_change_percent == 0.0
            && self.one_time_income == 0.0
            && self.one_time_cost == 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub baseline: Vec<f64>,
    pub projected: Vec<f64>,
    /// Final projected minus final baseline
    pub delta: f64,
    pub final_balance: f64,
    /// True when driven by separate income/expense series
    pub exact: bool,
    /// The first entry frames the outcome as a surplus or deficit
    pub insights: Vec<String>,
}

/// Simulate with the turnover heuristic over a single balance series
pub fn simulate_scenario(
    history: &[f64],
    modifiers: &ScenarioModifiers,
    periods: usize,
    config: &ScenarioConfig,
) -> ScenarioResult {
    let rate = (modifiers.income_change_percent - modifiers.expense_change_percent) / 100.0;
    let turnover = config.turnover_ratio;
    project(history, modifiers, periods, false, |_, current| {
        turnover * current * rate
    })
}

/// Simulate with separate income and expense histories
///
/// Each period's adjustment is forecast income times the income change
/// minus forecast expense times the expense change.
pub fn simulate_scenario_with_flows(
    history: &[f64],
    income: &[f64],
    expense: &[f64],
    modifiers: &ScenarioModifiers,
    periods: usize,
) -> ScenarioResult {
    let income_forecast = holt_forecast(income, DEFAULT_ALPHA, DEFAULT_BETA, periods);
    let expense_forecast = holt_forecast(expense, DEFAULT_ALPHA, DEFAULT_BETA, periods);
    let income_rate = modifiers.income_change_percent / 100.0;
    let expense_rate = modifiers.expense_change_percent / 100.0;

    project(history, modifiers, periods, true, |period, _| {
        let income = income_forecast.get(period).copied().unwrap_or(0.0).max(0.0);
        let expense = expense_forecast.get(period).copied().unwrap_or(0.0).max(0.0);
        income * income_rate - expense * expense_rate
    })
}

/// `adjustment(period, current_balance)` is the flow change for one period
fn project<F>(
    history: &[f64],
    modifiers: &ScenarioModifiers,
    periods: usize,
    exact: bool,
    mut adjustment: F,
) -> ScenarioResult
where
    F: FnMut(usize, f64) -> f64,
{
    let Some(&last) = history.last() else {
        return ScenarioResult {
            baseline: Vec::new(),
            projected: Vec::new(),
            delta: 0.0,
            final_balance: 0.0,
            exact,
            insights: vec!["No balance history to simulate".to_string()],
        };
    };

    let baseline = holt_forecast(history, DEFAULT_ALPHA, DEFAULT_BETA, periods);

    let mut current = last;
    let mut adjustments = vec![0.0; baseline.len()];
    let projected = if modifiers.is_neutral() {
        baseline.clone()
    } else {
        // Offset of the projected path from the baseline
        let mut offset = modifiers.one_time_income - modifiers.one_time_cost;
        current += offset;
        let mut projected = Vec::with_capacity(periods);
        for (period, &base) in baseline.iter().enumerate() {
            let change = adjustment(period, current);
            adjustments[period] = change;
            offset += change;
            current = base + offset;
            projected.push(current);
        }
        projected
    };

    let final_baseline = baseline.last().copied().unwrap_or(last);
    let final_balance = projected.last().copied().unwrap_or(current);
    let delta = final_balance - final_baseline;

    let insights = insights(
        modifiers,
        &projected,
        &adjustments,
        delta,
        final_balance,
    );

    tracing::debug!(
        periods,
        exact,
        delta,
        final_balance,
        "Scenario simulated"
    );

    ScenarioResult {
        baseline,
        projected,
        delta,
        final_balance,
        exact,
        insights,
    }
}

fn insights(
    modifiers: &ScenarioModifiers,
    projected: &[f64],
    adjustments: &[f64],
    delta: f64,
    final_balance: f64,
) -> Vec<String> {
    let periods = projected.len();
    let mut insights = Vec::new();

    if delta >= 0.0 {
        insights.push(format!(
            "This scenario ends with a surplus of {} versus the status quo after {} periods",
            format_rupiah(delta),
            periods
        ));
    } else {
        insights.push(format!(
            "This scenario ends with a deficit of {} versus the status quo after {} periods",
            format_rupiah(delta.abs()),
            periods
        ));
    }

    insights.push(format!("Projected final balance: {}", format_rupiah(final_balance)));

    if let Some(period) = projected.iter().position(|v| *v < 0.0) {
        insights.push(format!(
            "The balance turns negative in period {}; plan a reserve before then",
            period + 1
        ));
    }

    let average_improvement = mean(adjustments);
    if modifiers.one_time_cost > 0.0 && average_improvement > 0.0 {
        let payback = (modifiers.one_time_cost / average_improvement).ceil();
        insights.push(format!(
            "The one-time cost of {} pays back in about {:.0} periods",
            format_rupiah(modifiers.one_time_cost),
            payback
        ));
    }

    insights
}

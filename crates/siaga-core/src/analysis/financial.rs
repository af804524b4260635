//! Monthly financial trend prediction
//!
//! Transactions are bucketed per calendar month (gaps filled with zero) and
//! projected with the Holt / moving-average blend.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::anomaly::{detect_zscore, Anomaly};
use crate::config::ForecastConfig;
use crate::forecast::{blend, holt_forecast, moving_average_forecast};
use crate::models::{DataPoint, Direction, Transaction};
use crate::pattern::{detect_pattern_values, TrendDirection, VolatilityLevel};
use crate::stats::{mean, percent_change};

use super::types::{format_rupiah, FinancialForecast, FinancialMetric, MonthlyTotal};

/// Projected change (percent) below which the outlook counts as stable
const STABLE_CHANGE_PERCENT: f64 = 2.0;
const MIN_CONFIDENCE: f64 = 0.3;
const MAX_CONFIDENCE: f64 = 0.95;

/// Monthly totals for `metric`, oldest first, with empty months as zero
pub fn aggregate_monthly(transactions: &[Transaction], metric: FinancialMetric) -> Vec<MonthlyTotal> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for tx in transactions {
        let value = match (metric, tx.direction) {
            (FinancialMetric::Income, Direction::In) => tx.amount,
            (FinancialMetric::Expense, Direction::Out) => tx.amount,
            (FinancialMetric::Net, _) => tx.signed_amount(),
            _ => continue,
        };
        let Some(month) = month_start(tx.date.date()) else {
            continue;
        };
        *buckets.entry(month).or_insert(0.0) += value;
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut totals = Vec::with_capacity(buckets.len());
    let mut month = Some(first);
    while let Some(current) = month.filter(|m| *m <= last) {
        totals.push(MonthlyTotal {
            month: current,
            total: buckets.get(&current).copied().unwrap_or(0.0),
        });
        month = next_month(current);
    }
    totals
}

fn month_start(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

fn next_month(month: NaiveDate) -> Option<NaiveDate> {
    if month.month() == 12 {
        NaiveDate::from_ymd_opt(month.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month.year(), month.month() + 1, 1)
    }
}

/// Forecast `metric` for `periods` months ahead
///
/// With fewer than `config.min_months` months of history the result has no
/// forecast, zero confidence and a `reason`.
pub fn predict_financial_trend(
    transactions: &[Transaction],
    metric: FinancialMetric,
    periods: usize,
    config: &ForecastConfig,
) -> FinancialForecast {
    let history = aggregate_monthly(transactions, metric);

    if history.len() < config.min_months {
        let reason = format!(
            "Need at least {} months of {} data to forecast, found {}",
            config.min_months,
            metric,
            history.len()
        );
        tracing::debug!(metric = metric.as_str(), months = history.len(), "Forecast skipped");
        return FinancialForecast {
            metric,
            history,
            forecast: Vec::new(),
            trend: TrendDirection::Stable,
            volatility: VolatilityLevel::Low,
            volatile: false,
            confidence: 0.0,
            insights: vec![reason.clone()],
            action_plan: Vec::new(),
            reason: Some(reason),
        };
    }

    let values: Vec<f64> = history.iter().map(|m| m.total).collect();
    let forecast = blend(
        &holt_forecast(&values, config.alpha, config.beta, periods),
        &moving_average_forecast(&values, config.window, periods),
        config.holt_weight,
    );

    let pattern = detect_pattern_values(&values);
    let confidence = (1.0 - pattern.volatility).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    let volatile = pattern.volatility_level == VolatilityLevel::High;

    let mut insights = Vec::new();
    let last = values.last().copied().unwrap_or(0.0);
    if let Some(&projected) = forecast.last() {
        let change = percent_change(last, projected);
        let label = metric_label(metric);
        if change > STABLE_CHANGE_PERCENT {
            insights.push(format!(
                "{} is projected to rise by {:.1}% over the next {} months",
                label, change, periods
            ));
        } else if change < -STABLE_CHANGE_PERCENT {
            insights.push(format!(
                "{} is projected to fall by {:.1}% over the next {} months",
                label,
                change.abs(),
                periods
            ));
        } else {
            insights.push(format!(
                "{} is projected to stay stable ({:+.1}%) over the next {} months",
                label, change, periods
            ));
        }
    }
    if volatile {
        insights.push(format!(
            "Monthly {} is highly volatile (CV {:.2}); treat the projection with caution",
            metric, pattern.volatility
        ));
    }
    insights.push(format!(
        "Historical monthly average: {}",
        format_rupiah(mean(&values))
    ));

    tracing::debug!(
        metric = metric.as_str(),
        months = values.len(),
        trend = pattern.trend.as_str(),
        confidence,
        "Financial forecast complete"
    );

    FinancialForecast {
        metric,
        history,
        forecast,
        trend: pattern.trend,
        volatility: pattern.volatility_level,
        volatile,
        confidence,
        insights,
        action_plan: default_action_plan(pattern.trend, metric),
        reason: None,
    }
}

/// Months whose total is a Z-score outlier against the rest of the history
///
/// Each anomaly's `id` is the month as `YYYY-MM`.
pub fn unusual_months(history: &[MonthlyTotal], z_threshold: f64) -> Vec<Anomaly> {
    let points: Vec<DataPoint> = history
        .iter()
        .map(|m| {
            DataPoint::new(m.total, m.month.and_time(chrono::NaiveTime::MIN))
                .with_id(m.month.format("%Y-%m").to_string())
        })
        .collect();
    detect_zscore(&points, z_threshold)
}

/// Append one insight per unusual month to the forecast
pub fn note_unusual_months(forecast: &mut FinancialForecast, z_threshold: f64) {
    let unusual = unusual_months(&forecast.history, z_threshold);
    if !unusual.is_empty() {
        tracing::debug!(
            metric = forecast.metric.as_str(),
            count = unusual.len(),
            z_threshold,
            "Unusual months flagged"
        );
    }
    for anomaly in unusual {
        forecast.insights.push(format!(
            "{} {} of {} is unusual for this history (z-score {:.1})",
            anomaly.id.as_deref().unwrap_or("A month's"),
            forecast.metric,
            format_rupiah(anomaly.value),
            anomaly.score
        ));
    }
}

fn metric_label(metric: FinancialMetric) -> &'static str {
    match metric {
        FinancialMetric::Income => "Income",
        FinancialMetric::Expense => "Spending",
        FinancialMetric::Net => "Net balance",
    }
}

/// Deterministic three-step plan keyed on trend and metric
pub fn default_action_plan(trend: TrendDirection, metric: FinancialMetric) -> Vec<String> {
    use FinancialMetric::{Expense, Income, Net};
    use TrendDirection::{Decreasing, Increasing, Stable};

    let steps: [&str; 3] = match (trend, metric) {
        (Increasing, Income) => [
            "Set aside part of the extra income as an emergency reserve",
            "Record which activities or donors drove the increase",
            "Plan one member program funded from the surplus",
        ],
        (Decreasing, Income) => [
            "Remind members of outstanding dues this month",
            "Review which income sources dropped and contact them",
            "Postpone non-essential spending until income recovers",
        ],
        (Stable, Income) => [
            "Keep the current dues collection schedule",
            "Explore one new fundraising activity",
            "Review the income target at the next meeting",
        ],
        (Increasing, Expense) => [
            "Review the largest expense categories with the treasurer",
            "Require receipts for every expense above the usual amount",
            "Agree on a monthly spending cap at the next meeting",
        ],
        (Decreasing, Expense) => [
            "Keep the cost controls that reduced spending",
            "Move part of the savings into the reserve fund",
            "Share the spending report with members",
        ],
        (Stable, Expense) => [
            "Keep recording every expense with a receipt",
            "Compare spending against the annual budget each month",
            "Look for recurring costs that can be renegotiated",
        ],
        (Increasing, Net) => [
            "Allocate part of the growing balance to the reserve fund",
            "Publish the cash position to members for transparency",
            "Plan investments in programs members asked for",
        ],
        (Decreasing, Net) => [
            "Hold an urgent treasury review of income and spending",
            "Freeze non-essential spending until the balance stabilizes",
            "Collect outstanding dues and verify pending transactions",
        ],
        (Stable, Net) => [
            "Maintain the current balance between income and spending",
            "Build a reserve equal to three months of expenses",
            "Review the budget quarterly with the committee",
        ],
    };
    steps.iter().map(|s| s.to_string()).collect()
}

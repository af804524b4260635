//! Forecasting over data-point series
//!
//! Three interchangeable methods:
//! - **Moving-average hybrid**: a least-squares line over the trailing window,
//!   extrapolated. Stable for short horizons.
//! - **Single exponential smoothing**: level only, so the forecast is flat.
//! - **Holt's linear trend** (double exponential smoothing): level and trend
//!   states; the only method that extrapolates a trend.
//!
//! The financial predictor blends Holt (0.7) with the moving average (0.3).

use serde::{Deserialize, Serialize};

use crate::models::DataPoint;
use crate::stats::linear_fit;

pub const DEFAULT_ALPHA: f64 = 0.5;
pub const DEFAULT_BETA: f64 = 0.3;
pub const DEFAULT_WINDOW: usize = 3;
pub const HOLT_WEIGHT: f64 = 0.7;
pub const MOVING_AVERAGE_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ForecastMethod {
    MovingAverage { window: usize },
    SingleExponential { alpha: f64 },
    Holt { alpha: f64, beta: f64 },
}

impl Default for ForecastMethod {
    fn default() -> Self {
        Self::Holt {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

/// Forecast a data-point series `periods` steps ahead
pub fn forecast(points: &[DataPoint], method: ForecastMethod, periods: usize) -> Vec<f64> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    match method {
        ForecastMethod::MovingAverage { window } => {
            moving_average_forecast(&values, window, periods)
        }
        ForecastMethod::SingleExponential { alpha } => {
            single_exponential_forecast(&values, alpha, periods)
        }
        ForecastMethod::Holt { alpha, beta } => holt_forecast(&values, alpha, beta, periods),
    }
}

/// Windowed linear regression over the trailing `min(n, window)` points
pub fn moving_average_forecast(values: &[f64], window: usize, periods: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let w = window.clamp(1, values.len());
    let tail = &values[values.len() - w..];
    let (slope, intercept) = linear_fit(tail);
    let last_x = (w - 1) as f64;

    (1..=periods)
        .map(|h| intercept + slope * (last_x + h as f64))
        .collect()
}

/// Level-only smoothing; every future period equals the final level
pub fn single_exponential_forecast(values: &[f64], alpha: f64, periods: usize) -> Vec<f64> {
    let Some((&first, rest)) = values.split_first() else {
        return Vec::new();
    };
    let level = rest
        .iter()
        .fold(first, |level, &v| alpha * v + (1.0 - alpha) * level);
    vec![level; periods]
}

/// Final (level, trend) state of Holt's method
pub fn holt_state(values: &[f64], alpha: f64, beta: f64) -> Option<(f64, f64)> {
    match values {
        [] => None,
        [only] => Some((*only, 0.0)),
        [first, second, ..] => {
            let mut level = *first;
            let mut trend = second - first;
            for &v in &values[1..] {
                let previous = level;
                level = alpha * v + (1.0 - alpha) * (level + trend);
                trend = beta * (level - previous) + (1.0 - beta) * trend;
            }
            Some((level, trend))
        }
    }
}

/// Holt's linear trend: forecast at horizon h is level + h * trend
pub fn holt_forecast(values: &[f64], alpha: f64, beta: f64, periods: usize) -> Vec<f64> {
    let Some((level, trend)) = holt_state(values, alpha, beta) else {
        return Vec::new();
    };
    (1..=periods).map(|h| level + h as f64 * trend).collect()
}

/// Fixed 0.7 Holt / 0.3 moving-average blend
pub fn blended_forecast(
    values: &[f64],
    alpha: f64,
    beta: f64,
    window: usize,
    periods: usize,
) -> Vec<f64> {
    blend(
        &holt_forecast(values, alpha, beta, periods),
        &moving_average_forecast(values, window, periods),
        HOLT_WEIGHT,
    )
}

/// Weighted element-wise blend; `weight` applies to `primary`
pub fn blend(primary: &[f64], secondary: &[f64], weight: f64) -> Vec<f64> {
    primary
        .iter()
        .zip(secondary)
        .map(|(p, s)| weight * p + (1.0 - weight) * s)
        .collect()
}

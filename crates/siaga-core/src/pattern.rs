//! Trend and volatility detection
//!
//! The trend indicator is the OLS slope scaled to the whole series and divided
//! by |mean|, which makes it scale-free: 0.05 means the fitted line moves about
//! 5% of the average level across the window.
//!
//! Seasonality here is a placeholder heuristic (enough points and some
//! volatility), not a seasonal decomposition.

use serde::{Deserialize, Serialize};

use crate::models::DataPoint;
use crate::stats::{coefficient_of_variation, linear_regression_slope, mean, EPSILON};

pub const TREND_THRESHOLD: f64 = 0.05;
pub const HIGH_VOLATILITY: f64 = 0.5;
pub const MEDIUM_VOLATILITY: f64 = 0.2;
pub const SEASONAL_MIN_POINTS: usize = 7;
pub const SEASONAL_MIN_VOLATILITY: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

impl VolatilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_cv(cv: f64) -> Self {
        if cv > HIGH_VOLATILITY {
            Self::High
        } else if cv > MEDIUM_VOLATILITY {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for VolatilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of a series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub trend: TrendDirection,
    /// Scale-free trend indicator: slope * n / |mean|
    pub trend_strength: f64,
    pub slope: f64,
    /// Coefficient of variation
    pub volatility: f64,
    pub volatility_level: VolatilityLevel,
    pub seasonal: bool,
}

/// Detect the trend, volatility and (heuristic) seasonality of a series
pub fn detect_pattern(points: &[DataPoint]) -> Pattern {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    detect_pattern_values(&values)
}

pub fn detect_pattern_values(values: &[f64]) -> Pattern {
    let n = values.len();
    let slope = linear_regression_slope(values);
    let m = mean(values);

    let trend_strength = if m.abs() < EPSILON {
        0.0
    } else {
        slope * n as f64 / m.abs()
    };

    let trend = if trend_strength > TREND_THRESHOLD {
        TrendDirection::Increasing
    } else if trend_strength < -TREND_THRESHOLD {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    let volatility = coefficient_of_variation(values);

    Pattern {
        trend,
        trend_strength,
        slope,
        volatility,
        volatility_level: VolatilityLevel::from_cv(volatility),
        seasonal: n >= SEASONAL_MIN_POINTS && volatility > SEASONAL_MIN_VOLATILITY,
    }
}

//! Anomaly detection over data-point series
//!
//! Two methods:
//! - **Z-score**: |value - mean| / std above a threshold. Sensitive to the very
//!   outliers it hunts for, since they inflate the std it divides by.
//! - **IQR**: values outside [Q1 - 1.5 IQR, Q3 + 1.5 IQR]. Robust to the
//!   anomaly itself; preferred for fraud screening.

use serde::{Deserialize, Serialize};

use crate::models::DataPoint;
use crate::stats::{mean_std, quantile, sorted, EPSILON};

/// General-purpose Z-score threshold
pub const DEFAULT_Z_THRESHOLD: f64 = 2.5;

/// IQR fence multiplier
pub const IQR_MULTIPLIER: f64 = 1.5;

/// IQR needs at least this many points for quartiles to mean anything
pub const IQR_MIN_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMethod {
    ZScore,
    Iqr,
}

/// A flagged point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    /// Position in the input sequence
    pub index: usize,
    pub id: Option<String>,
    pub value: f64,
    pub method: AnomalyMethod,
    /// Z-score for the Z method; distance beyond the nearest fence (in IQRs) for IQR
    pub score: f64,
}

/// Bounds computed by the IQR method
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Compute IQR fences; `None` when fewer than [`IQR_MIN_POINTS`] values
pub fn iqr_bounds(values: &[f64]) -> Option<IqrBounds> {
    if values.len() < IQR_MIN_POINTS {
        return None;
    }
    let s = sorted(values);
    let q1 = quantile(&s, 0.25);
    let q3 = quantile(&s, 0.75);
    let iqr = q3 - q1;
    Some(IqrBounds {
        q1,
        q3,
        lower: q1 - IQR_MULTIPLIER * iqr,
        upper: q3 + IQR_MULTIPLIER * iqr,
    })
}

/// Flag points whose Z-score exceeds `threshold`
///
/// A constant series (std ~ 0) has no anomalies.
pub fn detect_zscore(points: &[DataPoint], threshold: f64) -> Vec<Anomaly> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let (m, sd) = mean_std(&values);
    if sd < EPSILON {
        return Vec::new();
    }

    points
        .iter()
        .enumerate()
        .filter_map(|(index, p)| {
            let z = (p.value - m).abs() / sd;
            (z > threshold).then(|| Anomaly {
                index,
                id: p.id.clone(),
                value: p.value,
                method: AnomalyMethod::ZScore,
                score: z,
            })
        })
        .collect()
}

/// Flag points outside the IQR fences
pub fn detect_iqr(points: &[DataPoint]) -> Vec<Anomaly> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let Some(bounds) = iqr_bounds(&values) else {
        return Vec::new();
    };
    let spread = bounds.iqr().max(EPSILON);

    points
        .iter()
        .enumerate()
        .filter(|(_, p)| !bounds.contains(p.value))
        .map(|(index, p)| {
            let distance = if p.value > bounds.upper {
                p.value - bounds.upper
            } else {
                bounds.lower - p.value
            };
            Anomaly {
                index,
                id: p.id.clone(),
                value: p.value,
                method: AnomalyMethod::Iqr,
                score: distance / spread,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::points_from_values;
    use chrono::NaiveDate;

    fn points(values: &[f64]) -> Vec<DataPoint> {
        points_from_values(values, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn test_iqr_flags_clear_outlier() {
        let anomalies = detect_iqr(&points(&[10.0, 12.0, 11.0, 13.0, 100.0]));
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].value, 100.0);
        assert_eq!(anomalies[0].index, 4);
    }

    #[test]
    fn test_iqr_quiet_on_uniform_series() {
        assert!(detect_iqr(&points(&[10.0, 11.0, 12.0, 13.0, 14.0])).is_empty());
    }

    #[test]
    fn test_iqr_requires_four_points() {
        assert!(detect_iqr(&points(&[1.0, 2.0, 1000.0])).is_empty());
        assert!(iqr_bounds(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_iqr_flags_low_outlier() {
        let anomalies = detect_iqr(&points(&[100.0, 101.0, 99.0, 100.0, 1.0]));
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].value, 1.0);
    }

    #[test]
    fn test_zscore_threshold() {
        let mut values = vec![10.0; 20];
        values.push(100.0);
        let anomalies = detect_zscore(&points(&values), DEFAULT_Z_THRESHOLD);
        assert_eq!(anomalies.len(), 1);
        assert!(anomalies[0].score > DEFAULT_Z_THRESHOLD);
    }

    #[test]
    fn test_zscore_masked_by_small_sample() {
        // With 5 points one outlier can't exceed z = 2 because it inflates the std
        let anomalies = detect_zscore(&points(&[10.0, 12.0, 11.0, 13.0, 100.0]), 2.5);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_zscore_constant_series() {
        assert!(detect_zscore(&points(&[5.0, 5.0, 5.0]), 1.0).is_empty());
        assert!(detect_zscore(&[], 1.0).is_empty());
    }
}

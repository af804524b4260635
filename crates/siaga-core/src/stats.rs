//! Statistics primitives
//!
//! All functions are total: empty input yields 0.0 rather than NaN so callers
//! can compose them without guarding every call.

/// Below this magnitude a mean is treated as zero when used as a divisor
pub const EPSILON: f64 = 1e-9;

/// Upper bound for the coefficient of variation when the mean is ~0
pub const MAX_CV: f64 = 10.0;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Mean and standard deviation in one call
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    (mean(values), std_dev(values))
}

/// Ordinary least-squares fit of value against index: returns (slope, intercept)
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (0.0, values[0]);
    }

    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    let slope = if den > 0.0 { num / den } else { 0.0 };
    (slope, y_mean - slope * x_mean)
}

/// Least-squares slope of value vs. index
pub fn linear_regression_slope(values: &[f64]) -> f64 {
    linear_fit(values).0
}

/// Standard deviation divided by |mean|, capped at [`MAX_CV`]
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let (m, sd) = mean_std(values);
    if sd < EPSILON {
        return 0.0;
    }
    if m.abs() < EPSILON {
        return MAX_CV;
    }
    (sd / m.abs()).min(MAX_CV)
}

/// Quantile with linear interpolation at position p * (n - 1) over sorted input
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Sorted copy of the input (NaN-safe total ordering)
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Percentage change from `from` to `to`; zero when `from` is ~0
pub fn percent_change(from: f64, to: f64) -> f64 {
    if from.abs() < EPSILON {
        return 0.0;
    }
    (to - from) / from.abs() * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
        // Population std of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
        assert_eq!(std_dev(&[5.0]), 0.0);
    }

    #[test]
    fn test_linear_fit() {
        let (slope, intercept) = linear_fit(&[1.0, 3.0, 5.0, 7.0]);
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);

        assert_eq!(linear_regression_slope(&[4.0, 4.0, 4.0]), 0.0);
        assert_eq!(linear_fit(&[9.0]), (0.0, 9.0));
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[10.0, 10.0, 10.0]), 0.0);
        let cv = coefficient_of_variation(&[5.0, 15.0]);
        assert!((cv - 0.5).abs() < 1e-12);
        assert_eq!(coefficient_of_variation(&[-1.0, 1.0]), MAX_CV);
    }

    #[test]
    fn test_quantile_interpolates() {
        let s = sorted(&[10.0, 12.0, 11.0, 13.0, 100.0]);
        assert_eq!(quantile(&s, 0.25), 11.0);
        assert_eq!(quantile(&s, 0.75), 13.0);
        assert_eq!(quantile(&sorted(&[1.0, 2.0, 3.0, 4.0]), 0.5), 2.5);
    }

    #[test]
    fn test_percent_change() {
        assert!((percent_change(100.0, 110.0) - 10.0).abs() < 1e-12);
        assert!((percent_change(-100.0, -50.0) - 50.0).abs() < 1e-12);
        assert_eq!(percent_change(0.0, 10.0), 0.0);
    }
}

//! Small statistics helpers shared by the analysis passes
//!
//! All helpers are total: empty or degenerate input yields a neutral value
//! instead of NaN.

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0.0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Coefficient of variation (std dev / mean), 0.0 when the mean is 0
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(values) / m.abs()
}

/// `1 - min(1, cv)`: 1.0 for perfectly even values, 1.0 when the mean is 0
pub fn consistency(values: &[f64]) -> f64 {
    if mean(values) == 0.0 {
        return 1.0;
    }
    1.0 - coefficient_of_variation(values).min(1.0)
}

/// Gini coefficient of a distribution of non-negative values.
///
/// 0.0 means perfectly equal; a single non-zero entry among `n` approaches
/// `(n - 1) / n`. Empty, single-element or all-zero input yields 0.0.
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.iter().map(|v| v.max(0.0)).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let n_f = n as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (2.0 * (i as f64 + 1.0) - n_f - 1.0) * x)
        .sum();
    (weighted / (n_f * total)).clamp(0.0, 1.0)
}

/// Least-squares slope of `values` against x = 0, 1, 2, ...
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = mean(values);

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    if den == 0.0 { 0.0 } else { num / den }
}

/// `log10(value + 1) / scale`, clamped to [0, 1]
pub fn log_scaled(value: f64, scale: f64) -> f64 {
    ((value.max(0.0) + 1.0).log10() / scale).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gini_equal_values() {
        assert_eq!(gini(&[5.0, 5.0, 5.0]), 0.0);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
        assert_eq!(gini(&[42.0]), 0.0);
        assert_eq!(gini(&[]), 0.0);
    }

    #[test]
    fn test_gini_concentration() {
        assert!((gini(&[100.0, 900.0]) - 0.4).abs() < 1e-9);
        let g = gini(&[0.0, 0.0, 0.0, 1_000_000.0]);
        assert!((g - 0.75).abs() < 1e-9, "got {}", g);
    }

    #[test]
    fn test_std_dev_and_cv() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-9);
        assert!((coefficient_of_variation(&values) - 0.4).abs() < 1e-9);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_consistency_bounds() {
        assert_eq!(consistency(&[0.0, 0.0, 0.0]), 1.0);
        assert_eq!(consistency(&[3.0, 3.0]), 1.0);
        assert_eq!(consistency(&[0.0, 0.0, 0.0, 100.0]), 0.0);
    }

    #[test]
    fn test_linear_slope() {
        assert!((linear_slope(&[1.0, 2.0, 3.0, 4.0]) - 1.0).abs() < 1e-9);
        assert!((linear_slope(&[10.0, 8.0, 6.0]) + 2.0).abs() < 1e-9);
        assert_eq!(linear_slope(&[7.0]), 0.0);
    }

    #[test]
    fn test_log_scaled() {
        assert_eq!(log_scaled(0.0, 6.0), 0.0);
        assert!((log_scaled(999.0, 6.0) - 0.5).abs() < 1e-9);
        assert_eq!(log_scaled(1e12, 6.0), 1.0);
    }
}

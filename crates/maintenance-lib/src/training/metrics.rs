//! Regression accuracy metrics
//!
//! All functions return NaN when the slices differ in length or are empty.

use serde::{Deserialize, Serialize};

/// Mean absolute error
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();

    sum / actual.len() as f64
}

/// Mean squared error
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    sum / actual.len() as f64
}

/// Root mean squared error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Coefficient of determination
///
/// For a constant target, 1.0 on a perfect fit and 0.0 otherwise.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Held-out accuracy of a fitted pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl EvaluationReport {
    pub fn compute(actual: &[f64], predicted: &[f64], train_rows: usize) -> Self {
        Self {
            mae: mae(actual, predicted),
            rmse: rmse(actual, predicted),
            r2: r2(actual, predicted),
            train_rows,
            test_rows: actual.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_prediction() {
        let actual = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(mae(&actual, &actual), 0.0);
        assert_eq!(rmse(&actual, &actual), 0.0);
        assert_eq!(r2(&actual, &actual), 1.0);
    }

    #[test]
    fn test_known_values() {
        let actual = vec![3.0, -0.5, 2.0, 7.0];
        let predicted = vec![2.5, 0.0, 2.0, 8.0];
        assert!((mae(&actual, &predicted) - 0.5).abs() < 1e-12);
        assert!((mse(&actual, &predicted) - 0.375).abs() < 1e-12);
        assert!((r2(&actual, &predicted) - 0.948_608_137).abs() < 1e-6);
    }

    #[test]
    fn test_mean_predictor_scores_zero_r2() {
        let actual = vec![1.0, 2.0, 3.0];
        let predicted = vec![2.0, 2.0, 2.0];
        assert!(r2(&actual, &predicted).abs() < 1e-12);
    }

    #[test]
    fn test_constant_target() {
        assert_eq!(r2(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
    }

    #[test]
    fn test_length_mismatch_is_nan() {
        assert!(mae(&[1.0], &[1.0, 2.0]).is_nan());
        assert!(rmse(&[], &[]).is_nan());
        assert!(r2(&[1.0, 2.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_report() {
        let report = EvaluationReport::compute(&[1.0, 3.0], &[2.0, 3.0], 8);
        assert_eq!(report.train_rows, 8);
        assert_eq!(report.test_rows, 2);
        assert!((report.mae - 0.5).abs() < 1e-12);
    }
}

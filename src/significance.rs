// 3rd party imports
use statrs::distribution::{ContinuousCDF, StudentsT};

// internal imports
use crate::errors::significance_error::SignificanceError;

/// Result of a significance test
///
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TestResult {
    /// Test statistic
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

/// Two-sided paired t-test of `a` against `b`, pairing the i-th elements.
///
/// If the differences have zero variance the statistic is `±inf` with `p = 0`,
/// or NaN for both if all differences are zero.
///
/// # Arguments
/// * `a` - First group
/// * `b` - Second group, same length as `a`
///
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Result<TestResult, SignificanceError> {
    if a.len() != b.len() {
        return Err(SignificanceError::UnequalGroupSizes(a.len(), b.len()));
    }
    if a.len() < 2 {
        return Err(SignificanceError::InsufficientPairs(a.len()));
    }
    let n = a.len() as f64;
    let differences: Vec<f64> = a.iter().zip(b.iter()).map(|(x, y)| x - y).collect();
    let mean = differences.iter().sum::<f64>() / n;
    let variance = differences
        .iter()
        .map(|d| (d - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let statistic = mean / (variance / n).sqrt();

    Ok(TestResult {
        statistic,
        p_value: two_sided_p_value(statistic, n - 1.0),
    })
}

/// Two-sided p-value of a t statistic
///
/// # Arguments
/// * `statistic` - t statistic
/// * `degrees_of_freedom` - Degrees of freedom, greater than zero
///
fn two_sided_p_value(statistic: f64, degrees_of_freedom: f64) -> f64 {
    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic.is_infinite() {
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, degrees_of_freedom) {
        // sf(|t|) instead of 1 - cdf(|t|) keeps precision for large statistics
        Ok(distribution) => (2.0 * distribution.sf(statistic.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

// internal imports
use super::ParameterEstimate;
use crate::constants::MIN_SAMPLES_FOR_ESTIMATION;
use crate::errors::estimation_error::EstimationError;

/// Central sample moments
///
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampleMoments {
    /// Sample mean
    pub mean: f64,
    /// Population variance (ddof = 0)
    pub variance: f64,
    /// Biased sample skewness
    pub skewness: f64,
}

impl SampleMoments {
    /// Computes mean, variance and skewness of the samples
    ///
    /// # Arguments
    /// * `samples` - Samples, at least 3
    ///
    pub fn from_samples(samples: &[f64]) -> Result<Self, EstimationError> {
        if samples.len() < MIN_SAMPLES_FOR_ESTIMATION {
            return Err(EstimationError::InsufficientData {
                required: MIN_SAMPLES_FOR_ESTIMATION,
                actual: samples.len(),
            });
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let (m2, m3) = samples.iter().fold((0.0, 0.0), |(m2, m3), x| {
            let deviation = x - mean;
            let squared = deviation * deviation;
            (m2 + squared, m3 + squared * deviation)
        });
        let variance = m2 / n;
        let skewness = (m3 / n) / variance.powf(1.5);
        Ok(Self {
            mean,
            variance,
            skewness,
        })
    }

    /// Standard deviation (ddof = 0)
    ///
    pub fn sd(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Estimates the ExGaussian parameters by matching mean, variance and skewness.
///
/// `tau` is the real cube root of `skewness * variance^1.5 / 2` and becomes negative
/// for negatively skewed samples. `sigma` is NaN if the variance is smaller than `tau²`.
///
/// # Arguments
/// * `samples` - Samples, at least 3
///
pub fn moments(samples: &[f64]) -> Result<ParameterEstimate, EstimationError> {
    Ok(from_moments(&SampleMoments::from_samples(samples)?))
}

/// Estimates the ExGaussian parameters from precomputed moments
///
/// # Arguments
/// * `moments` - Sample moments
///
pub fn from_moments(moments: &SampleMoments) -> ParameterEstimate {
    let tau = (moments.skewness * moments.variance.powf(1.5) / 2.0).cbrt();
    // sqrt of a negative number is NaN
    let sigma = (moments.variance - tau * tau).sqrt();
    ParameterEstimate::new(moments.mean - tau, sigma, tau)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-3;

    #[test]
    fn test_positive_skew() {
        let estimate = moments(&[1.0, 2.0, 3.0, 4.0, 10.0]).unwrap();
        assert!((estimate.tau - 2.6207).abs() < TOLERANCE);
        assert!((estimate.sigma - 1.7697).abs() < TOLERANCE);
        assert!((estimate.mu - 1.3793).abs() < TOLERANCE);
    }

    #[test]
    fn test_negative_skew() {
        let estimate = moments(&[1.0, 7.0, 8.0, 9.0, 10.0]).unwrap();
        assert!((estimate.tau + 2.6207).abs() < TOLERANCE);
        assert!((estimate.sigma - 1.7697).abs() < TOLERANCE);
        assert!((estimate.mu - 9.6207).abs() < TOLERANCE);
    }

    #[test]
    fn test_degenerate_sigma_is_nan() {
        let mut samples = vec![0.0; 9];
        samples.push(10.0);
        let estimate = moments(&samples).unwrap();
        assert!((estimate.tau - 36.0_f64.cbrt()).abs() < TOLERANCE);
        assert!(estimate.sigma.is_nan());
        assert!(!estimate.is_proper());
    }

    #[test]
    fn test_insufficient_data() {
        assert_eq!(
            moments(&[1.0, 2.0]).unwrap_err(),
            EstimationError::InsufficientData {
                required: 3,
                actual: 2
            }
        );
        assert!(moments(&[]).is_err());
    }

    #[test]
    fn test_is_pure() {
        let samples = [310.0, 420.5, 298.1, 650.2, 333.3, 512.0, 287.9];
        let first = moments(&samples).unwrap();
        let second = moments(&samples).unwrap();
        assert_eq!(first.mu.to_bits(), second.mu.to_bits());
        assert_eq!(first.sigma.to_bits(), second.sigma.to_bits());
        assert_eq!(first.tau.to_bits(), second.tau.to_bits());
    }
}

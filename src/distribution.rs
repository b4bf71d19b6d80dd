// std imports
use std::f64::consts::{LN_2, PI, SQRT_2};

// 3rd party imports
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};
use statrs::function::erf::erfc;

// internal imports
use crate::errors::sampling_error::SamplingError;
use crate::estimation::ParameterEstimate;

/// Below this value of `z` the log of the normal CDF is computed by its
/// asymptotic expansion and merged with the exponential term.
///
const LN_PHI_ASYMPTOTIC_LIMIT: f64 = -8.0;

/// Parameters of an ExGaussian distribution
///
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DistributionSpec {
    /// ID of the distribution within the experiment
    pub id: u32,
    /// Mean of the Gaussian component
    pub mu: f64,
    /// Standard deviation of the Gaussian component
    pub sigma: f64,
    /// Mean of the exponential component
    pub tau: f64,
}

impl DistributionSpec {
    /// Creates a new distribution specification
    ///
    pub fn new(id: u32, mu: f64, sigma: f64, tau: f64) -> Self {
        Self { id, mu, sigma, tau }
    }

    /// Returns the theoretical mean `mu + tau`
    ///
    pub fn mean(&self) -> f64 {
        self.mu + self.tau
    }

    /// Checks the parameters without creating a sampler
    ///
    pub fn validate(&self) -> Result<(), SamplingError> {
        if !self.mu.is_finite() {
            return Err(SamplingError::InvalidMu(self.mu));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(SamplingError::InvalidSigma(self.sigma));
        }
        if !self.tau.is_finite() || self.tau <= 0.0 {
            return Err(SamplingError::InvalidTau(self.tau));
        }
        Ok(())
    }

    /// Returns the parameters as estimate, e.g. for computing the likelihood of the true parameters
    ///
    pub fn as_estimate(&self) -> ParameterEstimate {
        ParameterEstimate::new(self.mu, self.sigma, self.tau)
    }
}

/// Sampler for the ExGaussian distribution.
/// Each draw is the sum of independent draws from `Normal(mu, sigma)` and `Exp(1 / tau)`.
///
#[derive(Debug, Clone)]
pub struct ExGaussian {
    normal: Normal<f64>,
    exponential: Exp<f64>,
}

impl ExGaussian {
    /// Creates a new sampler
    ///
    /// # Arguments
    /// * `spec` - Distribution parameters
    ///
    pub fn new(spec: &DistributionSpec) -> Result<Self, SamplingError> {
        spec.validate()?;
        let normal =
            Normal::new(spec.mu, spec.sigma).map_err(|_| SamplingError::InvalidSigma(spec.sigma))?;
        let exponential =
            Exp::new(1.0 / spec.tau).map_err(|_| SamplingError::InvalidTau(spec.tau))?;
        Ok(Self {
            normal,
            exponential,
        })
    }

    /// Draws `n` samples
    ///
    /// # Arguments
    /// * `rng` - Random number generator
    /// * `n` - Number of samples
    ///
    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}

impl Distribution<f64> for ExGaussian {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.normal.sample(rng) + self.exponential.sample(rng)
    }
}

/// Natural log of the standard normal CDF for `z >= LN_PHI_ASYMPTOTIC_LIMIT`
///
fn ln_phi(z: f64) -> f64 {
    (0.5 * erfc(-z / SQRT_2)).ln()
}

/// Log of the asymptotic series `1 - 1/z² + 3/z⁴ - 15/z⁶ + ...` of the normal
/// tail, i.e. `ln(Φ(z) · (-z) · sqrt(2π) · exp(z²/2))` for large negative `z`.
///
fn ln_mills_series(z: f64) -> f64 {
    let z2_inv = 1.0 / (z * z);
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..=5 {
        term *= -((2 * k - 1) as f64) * z2_inv;
        sum += term;
    }
    sum.ln()
}

/// Log density of the ExGaussian distribution at `x`.
/// Returns `-inf` for non-positive or non-finite sigma or tau.
///
/// # Arguments
/// * `x` - Value
/// * `mu` - Mean of the Gaussian component
/// * `sigma` - Standard deviation of the Gaussian component
/// * `tau` - Mean of the exponential component
///
pub fn ln_pdf(x: f64, mu: f64, sigma: f64, tau: f64) -> f64 {
    if !(sigma > 0.0 && tau > 0.0 && sigma.is_finite() && tau.is_finite() && mu.is_finite()) {
        return f64::NEG_INFINITY;
    }
    let z = (x - mu) / sigma - sigma / tau;
    if z >= LN_PHI_ASYMPTOTIC_LIMIT {
        -tau.ln() + (mu - x) / tau + sigma * sigma / (2.0 * tau * tau) + ln_phi(z)
    } else {
        // exponential term and -z²/2 cancel to the Gaussian kernel
        let deviation = (x - mu) / sigma;
        -tau.ln() - 0.5 * deviation * deviation - (-z).ln() - 0.5 * (LN_2 + PI.ln())
            + ln_mills_series(z)
    }
}

/// Log-likelihood of the samples under the given parameters
///
/// # Arguments
/// * `estimate` - Parameters
/// * `samples` - Samples
///
pub fn log_likelihood(estimate: &ParameterEstimate, samples: &[f64]) -> f64 {
    samples
        .iter()
        .map(|x| ln_pdf(*x, estimate.mu, estimate.sigma, estimate.tau))
        .sum()
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_invalid_parameters_are_rejected() {
        assert_eq!(
            ExGaussian::new(&DistributionSpec::new(1, 300.0, 20.0, 0.0)).unwrap_err(),
            SamplingError::InvalidTau(0.0)
        );
        assert_eq!(
            ExGaussian::new(&DistributionSpec::new(1, 300.0, 20.0, -5.0)).unwrap_err(),
            SamplingError::InvalidTau(-5.0)
        );
        assert_eq!(
            ExGaussian::new(&DistributionSpec::new(1, 300.0, -1.0, 100.0)).unwrap_err(),
            SamplingError::InvalidSigma(-1.0)
        );
        assert!(ExGaussian::new(&DistributionSpec::new(1, 300.0, 0.0, 100.0)).is_ok());
    }

    #[test]
    fn test_sample_mean_converges() {
        let mut rng = SmallRng::seed_from_u64(7);
        for spec in [
            DistributionSpec::new(1, 300.0, 20.0, 100.0),
            DistributionSpec::new(2, 500.0, 50.0, 200.0),
            DistributionSpec::new(3, 0.0, 1.0, 1.0),
        ] {
            let samples = ExGaussian::new(&spec).unwrap().sample_n(&mut rng, 20_000);
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            let sd = (spec.sigma.powi(2) + spec.tau.powi(2)).sqrt();
            // 5 standard errors
            let tolerance = 5.0 * sd / (samples.len() as f64).sqrt();
            assert!(
                (mean - spec.mean()).abs() < tolerance,
                "mean {} expected {} +- {}",
                mean,
                spec.mean(),
                tolerance
            );
        }
    }

    #[test]
    fn test_large_sample_mean() {
        let mut rng = SmallRng::seed_from_u64(42);
        let spec = DistributionSpec::new(3, 300.0, 20.0, 300.0);
        let samples = ExGaussian::new(&spec).unwrap().sample_n(&mut rng, 100_000);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 600.0).abs() < 5.0, "mean was {}", mean);
    }

    #[test]
    fn test_pdf_integrates_to_one() {
        let (mu, sigma, tau) = (300.0, 20.0, 100.0);
        let step = 0.5;
        let integral: f64 = (0..8000)
            .map(|i| 100.0 + i as f64 * step)
            .map(|x| ln_pdf(x, mu, sigma, tau).exp() * step)
            .sum();
        assert!((integral - 1.0).abs() < 1e-3, "integral was {}", integral);
    }

    #[test]
    fn test_pdf_is_continuous_at_asymptotic_switch() {
        let (mu, sigma, tau) = (0.0, 1.0, 0.1);
        // z = x - 10, switch at x = 2
        let below = ln_pdf(2.0 - 1e-9, mu, sigma, tau);
        let above = ln_pdf(2.0 + 1e-9, mu, sigma, tau);
        assert!((below - above).abs() < 1e-5, "{} vs {}", below, above);
        assert!(ln_pdf(-30.0, mu, sigma, 0.001).is_finite());
    }

    #[test]
    fn test_pdf_invalid_parameters() {
        assert_eq!(ln_pdf(1.0, 0.0, 0.0, 1.0), f64::NEG_INFINITY);
        assert_eq!(ln_pdf(1.0, 0.0, 1.0, -1.0), f64::NEG_INFINITY);
        assert_eq!(ln_pdf(1.0, 0.0, f64::NAN, 1.0), f64::NEG_INFINITY);
    }
}

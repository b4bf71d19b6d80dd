/// Maximum likelihood estimation starting at the moment estimate
pub mod maximum_likelihood;
/// Method of moments estimation
pub mod moments;

/// Estimated parameters of an ExGaussian distribution.
/// Estimates are noisy by nature, each value might be out of range or NaN.
///
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParameterEstimate {
    pub mu: f64,
    pub sigma: f64,
    pub tau: f64,
}

impl ParameterEstimate {
    pub fn new(mu: f64, sigma: f64, tau: f64) -> Self {
        Self { mu, sigma, tau }
    }

    /// Returns true if the estimate describes a proper distribution,
    /// i.e. finite mu and finite, positive sigma and tau
    ///
    pub fn is_proper(&self) -> bool {
        self.mu.is_finite()
            && self.sigma.is_finite()
            && self.tau.is_finite()
            && self.sigma > 0.0
            && self.tau > 0.0
    }
}

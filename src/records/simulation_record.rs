// std imports
use std::fmt;

// internal imports
use crate::estimation::ParameterEstimate;

/// Method used to estimate the ExGaussian parameters
///
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimationMethod {
    Moments,
    Mle,
}

impl EstimationMethod {
    /// Returns the name as used in the result files
    ///
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moments => "moments",
            Self::Mle => "mle",
        }
    }
}

impl fmt::Display for EstimationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record for one fitted parameter triple
///
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulationRecord {
    /// Estimated mu
    pub mu: f64,
    /// Estimated sigma, NaN if the moment estimate is degenerate
    pub sigma: f64,
    /// Estimated tau
    pub tau: f64,
    /// Number of samples the estimate was fitted on
    pub sample_size: usize,
    /// ID of the generating distribution
    pub distribution: u32,
    /// Estimation method
    pub method: EstimationMethod,
}

impl SimulationRecord {
    /// Creates a new record
    ///
    /// # Arguments
    /// * `estimate` - Fitted parameters
    /// * `sample_size` - Number of samples the estimate was fitted on
    /// * `distribution` - ID of the generating distribution
    /// * `method` - Estimation method
    ///
    pub fn new(
        estimate: &ParameterEstimate,
        sample_size: usize,
        distribution: u32,
        method: EstimationMethod,
    ) -> Self {
        Self {
            mu: estimate.mu,
            sigma: estimate.sigma,
            tau: estimate.tau,
            sample_size,
            distribution,
            method,
        }
    }

    /// Returns true if all parameters are numbers within `[-threshold, threshold]`.
    ///
    /// # Arguments
    /// * `threshold` - Largest accepted absolute value
    ///
    pub fn is_valid(&self, threshold: f64) -> bool {
        [self.mu, self.sigma, self.tau]
            .iter()
            .all(|value| !value.is_nan() && value.abs() <= threshold)
    }
}

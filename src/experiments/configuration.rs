// std imports
use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;

// internal imports
use crate::constants::{
    DEFAULT_ALPHA, DEFAULT_DISTRIBUTIONS, DEFAULT_GROUP_SIZE, DEFAULT_IMBALANCE_DISTRIBUTION,
    DEFAULT_INVALID_ESTIMATE_THRESHOLD, DEFAULT_NUM_TRIALS, DEFAULT_N_SIMULATIONS,
    DEFAULT_PAIRINGS, DEFAULT_SAMPLE_SIZES, DEFAULT_SEED, MIN_SAMPLES_FOR_ESTIMATION,
};
use crate::distribution::DistributionSpec;
use crate::errors::configuration_error::ConfigurationError;
use crate::estimation::maximum_likelihood::OptimizerConfiguration;

/// Which results to compute and which to reuse
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentVariant {
    /// Recompute everything, existing results are overwritten
    Simulate,
    /// Reuse completed cells of an existing checkpoint and compute the rest
    Resume,
    /// Only load existing results, fail if they are missing
    Cached,
}

/// Pair of sample sizes whose estimates are compared
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SampleSizePairing {
    pub a: usize,
    pub b: usize,
}

impl SampleSizePairing {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// Returns the ID used in the result files, e.g. `20_vs_500`
    ///
    pub fn id(&self) -> String {
        format!("{}_vs_{}", self.a, self.b)
    }
}

/// Parameter recovery experiment
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct RecoveryConfiguration {
    /// Number of trials per distribution and sample size
    pub num_trials: usize,
    /// Number of samples drawn per trial
    pub sample_sizes: Vec<usize>,
    /// Generating distributions
    pub distributions: Vec<DistributionSpec>,
}

impl Default for RecoveryConfiguration {
    fn default() -> Self {
        Self {
            num_trials: DEFAULT_NUM_TRIALS,
            sample_sizes: DEFAULT_SAMPLE_SIZES.to_vec(),
            distributions: DEFAULT_DISTRIBUTIONS
                .iter()
                .map(|(id, mu, sigma, tau)| DistributionSpec::new(*id, *mu, *sigma, *tau))
                .collect(),
        }
    }
}

/// Imbalanced sample size experiment
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ImbalanceConfiguration {
    /// Number of simulated comparisons per pairing
    pub n_simulations: usize,
    /// Number of estimates per group
    pub group_size: usize,
    /// ID of the distribution whose MLE estimates are compared
    pub distribution: u32,
    /// Significance level
    pub alpha: f64,
    /// Compared sample sizes
    pub pairings: Vec<SampleSizePairing>,
}

impl Default for ImbalanceConfiguration {
    fn default() -> Self {
        Self {
            n_simulations: DEFAULT_N_SIMULATIONS,
            group_size: DEFAULT_GROUP_SIZE,
            distribution: DEFAULT_IMBALANCE_DISTRIBUTION,
            alpha: DEFAULT_ALPHA,
            pairings: DEFAULT_PAIRINGS
                .iter()
                .map(|(a, b)| SampleSizePairing::new(*a, *b))
                .collect(),
        }
    }
}

/// Configuration of both experiments
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ExperimentConfiguration {
    /// Seed for all random number generators
    pub seed: u64,
    /// Estimates with an absolute value above are discarded before analysis
    pub invalid_estimate_threshold: f64,
    /// Which results to compute and which to reuse
    pub variant: ExperimentVariant,
    /// Recovery experiment
    pub recovery: RecoveryConfiguration,
    /// Imbalance experiment
    pub imbalance: ImbalanceConfiguration,
    /// Optimizer of the maximum likelihood estimation
    pub optimizer: OptimizerConfiguration,
}

impl ExperimentConfiguration {
    /// Create a new default configuration
    ///
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and validates the configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let path_str = path.to_string_lossy().to_string();
        let content = read_to_string(path)
            .map_err(|err| ConfigurationError::FileReadError(path_str.clone(), err))?;
        let configuration: Self = toml::from_str(&content)
            .map_err(|err| ConfigurationError::DeserializationError(path_str, err))?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Serializes the configuration to TOML
    ///
    pub fn to_toml(&self) -> Result<String, ConfigurationError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the distribution with the given ID
    ///
    /// # Arguments
    /// * `id` - Distribution ID
    ///
    pub fn get_distribution(&self, id: u32) -> Option<&DistributionSpec> {
        self.recovery
            .distributions
            .iter()
            .find(|distribution| distribution.id == id)
    }

    /// Checks all constraints, returns the first violation
    ///
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.recovery.num_trials == 0 {
            return Err(ConfigurationError::EmptyCount("recovery.num_trials"));
        }
        if self.imbalance.n_simulations == 0 {
            return Err(ConfigurationError::EmptyCount("imbalance.n_simulations"));
        }
        if self.optimizer.max_iterations == 0 {
            return Err(ConfigurationError::EmptyCount("optimizer.max_iterations"));
        }
        if !(self.optimizer.sd_tolerance.is_finite() && self.optimizer.sd_tolerance > 0.0) {
            return Err(ConfigurationError::InvalidTolerance(
                self.optimizer.sd_tolerance,
            ));
        }

        let mut ids = HashSet::new();
        for distribution in self.recovery.distributions.iter() {
            distribution
                .validate()
                .map_err(|err| ConfigurationError::InvalidDistribution(distribution.id, err))?;
            if !ids.insert(distribution.id) {
                return Err(ConfigurationError::DuplicateDistribution(distribution.id));
            }
        }

        for sample_size in self.recovery.sample_sizes.iter() {
            if *sample_size < MIN_SAMPLES_FOR_ESTIMATION {
                return Err(ConfigurationError::SampleSizeTooSmall(
                    *sample_size,
                    MIN_SAMPLES_FOR_ESTIMATION,
                ));
            }
        }

        if self.get_distribution(self.imbalance.distribution).is_none() {
            return Err(ConfigurationError::UnknownDistribution(
                self.imbalance.distribution,
            ));
        }
        if self.imbalance.group_size < 2 {
            return Err(ConfigurationError::GroupSizeTooSmall(
                self.imbalance.group_size,
            ));
        }
        if !(self.imbalance.alpha > 0.0 && self.imbalance.alpha < 1.0) {
            return Err(ConfigurationError::InvalidAlpha(self.imbalance.alpha));
        }
        for pairing in self.imbalance.pairings.iter() {
            for sample_size in [pairing.a, pairing.b] {
                if !self.recovery.sample_sizes.contains(&sample_size) {
                    return Err(ConfigurationError::UnknownPairingSampleSize(
                        pairing.id(),
                        sample_size,
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for ExperimentConfiguration {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            invalid_estimate_threshold: DEFAULT_INVALID_ESTIMATE_THRESHOLD,
            variant: ExperimentVariant::Resume,
            recovery: RecoveryConfiguration::default(),
            imbalance: ImbalanceConfiguration::default(),
            optimizer: OptimizerConfiguration::default(),
        }
    }
}

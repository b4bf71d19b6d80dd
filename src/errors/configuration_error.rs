use thiserror::Error;

use super::sampling_error::SamplingError;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Distribution {0} is invalid:\n\t{1}")]
    InvalidDistribution(u32, SamplingError),
    #[error("Distribution id {0} is used more than once")]
    DuplicateDistribution(u32),
    #[error("Sample size {0} is too small, the estimators need at least {1} samples")]
    SampleSizeTooSmall(usize, usize),
    #[error("Pairing `{0}` references sample size {1} which is not simulated")]
    UnknownPairingSampleSize(String, usize),
    #[error("Distribution {0} is selected for the imbalance experiment but not configured")]
    UnknownDistribution(u32),
    #[error("Group size must be at least 2, got {0}")]
    GroupSizeTooSmall(usize),
    #[error("Alpha must be within (0, 1), got {0}")]
    InvalidAlpha(f64),
    #[error("Optimizer tolerance must be finite and greater than zero, got {0}")]
    InvalidTolerance(f64),
    #[error("The number of `{0}` must be greater than zero")]
    EmptyCount(&'static str),
    #[error("Unable to read configuration file `{0}`:\n\t{1}")]
    FileReadError(String, std::io::Error),
    #[error("Unable to parse configuration file `{0}`:\n\t{1}")]
    DeserializationError(String, toml::de::Error),
    #[error("Unable to serialize configuration:\n\t{0}")]
    SerializationError(#[from] toml::ser::Error),
}

use polars::error::PolarsError;
use thiserror::Error;

use super::{
    configuration_error::ConfigurationError, estimation_error::EstimationError,
    sampling_error::SamplingError, significance_error::SignificanceError,
};

/// Merges the errors of all experiment stages into a single error type
/// including some shared errors
///
#[derive(Error, Debug)]
pub enum ExperimentError {
    // Stage errors
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    #[error("Sampling error: {0}")]
    SamplingError(#[from] SamplingError),
    #[error("Estimation error: {0}")]
    EstimationError(#[from] EstimationError),
    #[error("Significance test error: {0}")]
    SignificanceError(#[from] SignificanceError),
    // Imbalance errors
    #[error(
        "Only {available} valid records at sample size {sample_size}, \
        but groups of {required} are drawn"
    )]
    InsufficientRecords {
        sample_size: usize,
        available: usize,
        required: usize,
    },
    // Checkpoint errors
    #[error("Existing results in `{0}` were created with a different configuration")]
    ManifestMismatch(String),
    #[error(
        "Results `{0}` have no manifest and cannot be matched to the configuration, \
        use variant `simulate` to overwrite them"
    )]
    MissingManifest(String),
    #[error("Checkpoint writer is unusable after a panic in another cell")]
    CheckpointPoisoned,
    #[error("Missing or incomplete results: {0}")]
    MissingResults(String),
    #[error("Interrupted, {0} cells are checkpointed and will be skipped when resuming")]
    Interrupted(usize),
    // Common errors
    #[error("Unable to create directory `{0}`:\n\t{1}")]
    DirectoryCreationError(String, std::io::Error),
    #[error("Unable to access file `{0}`:\n\t{1}")]
    FileError(String, std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Data frame error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Unable to register signal handler: {0}")]
    SignalHandlerError(std::io::Error),
}

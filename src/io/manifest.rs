// std imports
use std::fs::{read_to_string, write as write_file};
use std::path::Path;

// internal imports
use crate::errors::experiment_error::ExperimentError;
use crate::estimation::maximum_likelihood::OptimizerConfiguration;
use crate::experiments::configuration::{ExperimentConfiguration, RecoveryConfiguration};

/// Everything the recovery records depend on. Stored next to the results
/// so a checkpoint is only resumed with the configuration it was created with.
///
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct RunManifest {
    /// Crate version which created the results
    pub version: String,
    /// Seed
    pub seed: u64,
    /// Recovery experiment configuration
    pub recovery: RecoveryConfiguration,
    /// Optimizer of the maximum likelihood estimation
    pub optimizer: OptimizerConfiguration,
}

impl RunManifest {
    /// Creates the manifest for the given configuration
    ///
    /// # Arguments
    /// * `configuration` - Experiment configuration
    ///
    pub fn new(configuration: &ExperimentConfiguration) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            seed: configuration.seed,
            recovery: configuration.recovery.clone(),
            optimizer: configuration.optimizer,
        }
    }

    /// Returns true if records created under this manifest are reproducible with the configuration.
    /// The version is informative only.
    ///
    /// # Arguments
    /// * `configuration` - Experiment configuration
    ///
    pub fn is_compatible(&self, configuration: &ExperimentConfiguration) -> bool {
        self.seed == configuration.seed
            && self.recovery == configuration.recovery
            && self.optimizer == configuration.optimizer
    }

    /// Reads the manifest, returns `None` if the file does not exist
    ///
    /// # Arguments
    /// * `path` - Path to the manifest
    ///
    pub fn read(path: &Path) -> Result<Option<Self>, ExperimentError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = read_to_string(path)
            .map_err(|err| ExperimentError::FileError(path.to_string_lossy().to_string(), err))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes the manifest as pretty JSON
    ///
    /// # Arguments
    /// * `path` - Path to the manifest
    ///
    pub fn write(&self, path: &Path) -> Result<(), ExperimentError> {
        write_file(path, serde_json::to_string_pretty(self)?)
            .map_err(|err| ExperimentError::FileError(path.to_string_lossy().to_string(), err))
    }
}

// std imports
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

// 3rd party imports
use signal_hook::{consts::SIGINT, iterator::Signals};
use tracing::{info, warn};

// internal imports
use super::configuration::{ExperimentConfiguration, ExperimentVariant};
use super::imbalance::run_imbalance;
use super::recovery::{cells, run_recovery};
use super::summary::{false_positive_summary, recovery_summary};
use crate::constants::{
    FALSE_POSITIVE_FILE_NAME, FALSE_POSITIVE_SUMMARY_FILE_NAME, MANIFEST_FILE_NAME,
    RECOVERY_FILE_NAME, RECOVERY_SUMMARY_FILE_NAME,
};
use crate::errors::experiment_error::ExperimentError;
use crate::io::dataframe::write_csv;
use crate::io::manifest::RunManifest;
use crate::io::records_csv::{read_records, write_records};
use crate::records::false_positive_record::FalsePositiveRecord;
use crate::records::simulation_record::SimulationRecord;

/// Registers a SIGINT handler which sets the returned flag.
/// The experiments stop starting new work once it is set.
///
pub fn register_stop_signal() -> Result<Arc<AtomicBool>, ExperimentError> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new([SIGINT]).map_err(ExperimentError::SignalHandlerError)?;
    let signal_stop_flag = stop_flag.clone();
    thread::spawn(move || {
        for sig in signals.forever() {
            if sig == SIGINT {
                warn!("Received SIGINT, finishing running cells. Send again to abort immediately.");
                if signal_stop_flag.swap(true, Ordering::Relaxed) {
                    std::process::exit(130);
                }
            }
        }
    });
    Ok(stop_flag)
}

/// Both experiments on one configuration with their results in one output directory
///
pub struct Study {
    configuration: ExperimentConfiguration,
    output_dir: PathBuf,
}

impl Study {
    /// Creates a new study and the output directory if necessary
    ///
    /// # Arguments
    /// * `configuration` - Experiment configuration
    /// * `output_dir` - Directory for results, checkpoint and manifest
    ///
    pub fn new(
        configuration: ExperimentConfiguration,
        output_dir: &Path,
    ) -> Result<Self, ExperimentError> {
        configuration.validate()?;
        create_dir_all(output_dir).map_err(|err| {
            ExperimentError::DirectoryCreationError(output_dir.to_string_lossy().to_string(), err)
        })?;
        Ok(Self {
            configuration,
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn configuration(&self) -> &ExperimentConfiguration {
        &self.configuration
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Checks the manifest of the output directory against the configuration
    /// and writes the current one if results are going to be computed.
    ///
    fn prepare_manifest(&self) -> Result<(), ExperimentError> {
        let path = self.path(MANIFEST_FILE_NAME);
        let existing = RunManifest::read(&path)?;
        match (self.configuration.variant, existing) {
            (ExperimentVariant::Simulate, _) => {}
            (_, Some(manifest)) if !manifest.is_compatible(&self.configuration) => {
                return Err(ExperimentError::ManifestMismatch(
                    path.to_string_lossy().to_string(),
                ));
            }
            (ExperimentVariant::Cached, None) => {
                return Err(ExperimentError::MissingResults(
                    path.to_string_lossy().to_string(),
                ));
            }
            (ExperimentVariant::Cached, Some(_)) => return Ok(()),
            (ExperimentVariant::Resume, None) => self.check_unmanaged_results()?,
            (ExperimentVariant::Resume, Some(_)) => {}
        }
        RunManifest::new(&self.configuration).write(&path)
    }

    /// Loads the complete recovery records from the output directory
    ///
    fn load_recovery(&self) -> Result<Vec<SimulationRecord>, ExperimentError> {
        let path = self.path(RECOVERY_FILE_NAME);
        if !path.exists() {
            return Err(ExperimentError::MissingResults(
                path.to_string_lossy().to_string(),
            ));
        }
        let records: Vec<SimulationRecord> = read_records(&path)?;
        let expected =
            cells(&self.configuration.recovery).len() * 2 * self.configuration.recovery.num_trials;
        if records.len() != expected {
            return Err(ExperimentError::MissingResults(format!(
                "{} contains {} of {} records, resume the recovery experiment",
                path.display(),
                records.len(),
                expected
            )));
        }
        info!("Loaded {} recovery records", records.len());
        Ok(records)
    }

    /// Runs or, for the cached variant, loads the recovery experiment and writes its summary
    ///
    /// # Arguments
    /// * `stop_flag` - Flag to stop starting new cells
    ///
    pub fn recovery(
        &self,
        stop_flag: &AtomicBool,
    ) -> Result<Vec<SimulationRecord>, ExperimentError> {
        self.prepare_manifest()?;
        let records = match self.configuration.variant {
            ExperimentVariant::Cached => self.load_recovery()?,
            _ => run_recovery(
                &self.configuration,
                Some(&self.path(RECOVERY_FILE_NAME)),
                stop_flag,
            )?,
        };
        self.write_recovery_summary(&records)?;
        Ok(records)
    }

    /// Runs the imbalance experiment on the stored recovery records.
    /// For the cached variant stored results are loaded instead.
    ///
    pub fn imbalance(&self) -> Result<Vec<FalsePositiveRecord>, ExperimentError> {
        self.check_manifest()?;
        if self.configuration.variant == ExperimentVariant::Cached {
            let records = self.load_false_positives()?;
            self.write_false_positive_summary(&records)?;
            return Ok(records);
        }
        let recovery_records = self.load_recovery()?;
        self.imbalance_on(&recovery_records)
    }

    /// Runs the imbalance experiment on the given recovery records and stores the results
    ///
    fn imbalance_on(
        &self,
        recovery_records: &[SimulationRecord],
    ) -> Result<Vec<FalsePositiveRecord>, ExperimentError> {
        let records = run_imbalance(&self.configuration, recovery_records)?;
        write_records(&self.path(FALSE_POSITIVE_FILE_NAME), &records)?;
        self.write_false_positive_summary(&records)?;
        Ok(records)
    }

    /// Runs both experiments
    ///
    /// # Arguments
    /// * `stop_flag` - Flag to stop starting new cells
    ///
    pub fn run(
        &self,
        stop_flag: &AtomicBool,
    ) -> Result<(Vec<SimulationRecord>, Vec<FalsePositiveRecord>), ExperimentError> {
        let recovery_records = self.recovery(stop_flag)?;
        let false_positives = match self.configuration.variant {
            ExperimentVariant::Cached => {
                let records = self.load_false_positives()?;
                self.write_false_positive_summary(&records)?;
                records
            }
            _ => self.imbalance_on(&recovery_records)?,
        };
        Ok((recovery_records, false_positives))
    }

    /// Recreates the summaries from the stored results. A missing false positive file is skipped.
    ///
    pub fn summarize(&self) -> Result<(), ExperimentError> {
        self.check_manifest()?;
        self.write_recovery_summary(&self.load_recovery()?)?;
        match self.load_false_positives() {
            Ok(records) => self.write_false_positive_summary(&records),
            Err(ExperimentError::MissingResults(path)) => {
                warn!("No false positive results at `{}`, skipping summary", path);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Fails if stored results were created with an incompatible configuration
    ///
    fn check_manifest(&self) -> Result<(), ExperimentError> {
        let path = self.path(MANIFEST_FILE_NAME);
        match RunManifest::read(&path)? {
            Some(manifest) if !manifest.is_compatible(&self.configuration) => Err(
                ExperimentError::ManifestMismatch(path.to_string_lossy().to_string()),
            ),
            Some(_) => Ok(()),
            None => self.check_unmanaged_results(),
        }
    }

    /// Fails if recovery results exist without a manifest, their seed and optimizer are unknown
    ///
    fn check_unmanaged_results(&self) -> Result<(), ExperimentError> {
        let recovery_path = self.path(RECOVERY_FILE_NAME);
        if recovery_path.exists() {
            return Err(ExperimentError::MissingManifest(
                recovery_path.to_string_lossy().to_string(),
            ));
        }
        Ok(())
    }

    fn load_false_positives(&self) -> Result<Vec<FalsePositiveRecord>, ExperimentError> {
        let path = self.path(FALSE_POSITIVE_FILE_NAME);
        if !path.exists() {
            return Err(ExperimentError::MissingResults(
                path.to_string_lossy().to_string(),
            ));
        }
        read_records(&path)
    }

    fn write_recovery_summary(&self, records: &[SimulationRecord]) -> Result<(), ExperimentError> {
        let mut summary = recovery_summary(
            records,
            &self.configuration.recovery.distributions,
            self.configuration.invalid_estimate_threshold,
        )?;
        write_csv(&mut summary, &self.path(RECOVERY_SUMMARY_FILE_NAME))
    }

    fn write_false_positive_summary(
        &self,
        records: &[FalsePositiveRecord],
    ) -> Result<(), ExperimentError> {
        let mut summary = false_positive_summary(records, self.configuration.imbalance.alpha)?;
        write_csv(&mut summary, &self.path(FALSE_POSITIVE_SUMMARY_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionSpec;
    use crate::experiments::configuration::{RecoveryConfiguration, SampleSizePairing};

    fn small_configuration(variant: ExperimentVariant) -> ExperimentConfiguration {
        let mut configuration = ExperimentConfiguration::new();
        configuration.variant = variant;
        configuration.recovery = RecoveryConfiguration {
            num_trials: 40,
            sample_sizes: vec![10, 50],
            distributions: vec![DistributionSpec::new(3, 300.0, 20.0, 300.0)],
        };
        configuration.imbalance.distribution = 3;
        configuration.imbalance.n_simulations = 50;
        configuration.imbalance.pairings = vec![SampleSizePairing::new(10, 50)];
        configuration
    }

    fn mu_bits(records: &[SimulationRecord]) -> Vec<u64> {
        records.iter().map(|r| r.mu.to_bits()).collect()
    }

    #[test]
    fn test_run_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let study =
            Study::new(small_configuration(ExperimentVariant::Simulate), dir.path()).unwrap();
        let (recovery, false_positives) = study.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(recovery.len(), 2 * 2 * 40);
        assert_eq!(false_positives.len(), 2 * 50);

        for file_name in [
            RECOVERY_FILE_NAME,
            FALSE_POSITIVE_FILE_NAME,
            RECOVERY_SUMMARY_FILE_NAME,
            FALSE_POSITIVE_SUMMARY_FILE_NAME,
            MANIFEST_FILE_NAME,
        ] {
            assert!(dir.path().join(file_name).exists(), "{}", file_name);
        }
        let stored: Vec<FalsePositiveRecord> =
            read_records(&dir.path().join(FALSE_POSITIVE_FILE_NAME)).unwrap();
        assert_eq!(stored.len(), false_positives.len());
    }

    #[test]
    fn test_resume_and_cached_reproduce_results() {
        let dir = tempfile::tempdir().unwrap();
        let stop_flag = AtomicBool::new(false);
        let (first, first_false_positives) =
            Study::new(small_configuration(ExperimentVariant::Simulate), dir.path())
                .unwrap()
                .run(&stop_flag)
                .unwrap();

        let (resumed, _) = Study::new(small_configuration(ExperimentVariant::Resume), dir.path())
            .unwrap()
            .run(&stop_flag)
            .unwrap();
        assert_eq!(mu_bits(&first), mu_bits(&resumed));

        let (cached, cached_false_positives) =
            Study::new(small_configuration(ExperimentVariant::Cached), dir.path())
                .unwrap()
                .run(&stop_flag)
                .unwrap();
        assert_eq!(mu_bits(&first), mu_bits(&cached));
        assert_eq!(first_false_positives, cached_false_positives);
    }

    #[test]
    fn test_manifest_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        Study::new(small_configuration(ExperimentVariant::Simulate), dir.path())
            .unwrap()
            .recovery(&AtomicBool::new(false))
            .unwrap();

        let mut configuration = small_configuration(ExperimentVariant::Resume);
        configuration.seed = 7;
        let study = Study::new(configuration, dir.path()).unwrap();
        assert!(matches!(
            study.recovery(&AtomicBool::new(false)),
            Err(ExperimentError::ManifestMismatch(_))
        ));
        assert!(matches!(
            study.summarize(),
            Err(ExperimentError::ManifestMismatch(_))
        ));
    }

    #[test]
    fn test_checkpoint_without_manifest_is_not_resumed() {
        let dir = tempfile::tempdir().unwrap();
        Study::new(small_configuration(ExperimentVariant::Simulate), dir.path())
            .unwrap()
            .recovery(&AtomicBool::new(false))
            .unwrap();
        std::fs::remove_file(dir.path().join(MANIFEST_FILE_NAME)).unwrap();

        let study =
            Study::new(small_configuration(ExperimentVariant::Resume), dir.path()).unwrap();
        assert!(matches!(
            study.recovery(&AtomicBool::new(false)),
            Err(ExperimentError::MissingManifest(_))
        ));
        assert!(matches!(
            study.imbalance(),
            Err(ExperimentError::MissingManifest(_))
        ));
        assert!(matches!(
            study.summarize(),
            Err(ExperimentError::MissingManifest(_))
        ));
        // nothing was written
        assert!(!dir.path().join(MANIFEST_FILE_NAME).exists());

        // simulate overwrites the unmanaged results
        let study =
            Study::new(small_configuration(ExperimentVariant::Simulate), dir.path()).unwrap();
        study.recovery(&AtomicBool::new(false)).unwrap();
        assert!(dir.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[test]
    fn test_cached_without_results() {
        let dir = tempfile::tempdir().unwrap();
        let study =
            Study::new(small_configuration(ExperimentVariant::Cached), dir.path()).unwrap();
        assert!(matches!(
            study.recovery(&AtomicBool::new(false)),
            Err(ExperimentError::MissingResults(_))
        ));
        assert!(matches!(
            study.imbalance(),
            Err(ExperimentError::MissingResults(_))
        ));
    }

    #[test]
    fn test_interrupted_run_is_resumable() {
        let dir = tempfile::tempdir().unwrap();
        let study =
            Study::new(small_configuration(ExperimentVariant::Resume), dir.path()).unwrap();
        assert!(matches!(
            study.run(&AtomicBool::new(true)),
            Err(ExperimentError::Interrupted(0))
        ));
        // incomplete recovery results are not used for the imbalance experiment
        assert!(matches!(
            study.imbalance(),
            Err(ExperimentError::MissingResults(_))
        ));
        let (records, _) = study.run(&AtomicBool::new(false)).unwrap();
        assert_eq!(records.len(), 160);
    }

    #[test]
    fn test_summarize_recreates_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let study =
            Study::new(small_configuration(ExperimentVariant::Simulate), dir.path()).unwrap();
        study.recovery(&AtomicBool::new(false)).unwrap();
        std::fs::remove_file(dir.path().join(RECOVERY_SUMMARY_FILE_NAME)).unwrap();

        // without false positive results only the recovery summary is written
        study.summarize().unwrap();
        assert!(dir.path().join(RECOVERY_SUMMARY_FILE_NAME).exists());
        assert!(!dir.path().join(FALSE_POSITIVE_SUMMARY_FILE_NAME).exists());

        study.imbalance().unwrap();
        std::fs::remove_file(dir.path().join(FALSE_POSITIVE_SUMMARY_FILE_NAME)).unwrap();
        study.summarize().unwrap();
        assert!(dir.path().join(FALSE_POSITIVE_SUMMARY_FILE_NAME).exists());
    }
}

// std imports
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// 3rd party imports
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

// internal imports
use super::configuration::{ExperimentConfiguration, ExperimentVariant, RecoveryConfiguration};
use super::derive_seed;
use crate::distribution::{DistributionSpec, ExGaussian};
use crate::errors::experiment_error::ExperimentError;
use crate::estimation::moments::moments;
use crate::estimation::maximum_likelihood::{maximum_likelihood, OptimizerConfiguration};
use crate::io::records_csv::{read_records, write_records, RecordAppender};
use crate::records::simulation_record::{EstimationMethod, SimulationRecord};
use crate::ui::progress::Progress;

/// Stream ID of the recovery experiment for seed derivation
///
const RECOVERY_STREAM: u64 = 1;

/// One combination of distribution and sample size
///
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cell {
    pub distribution: DistributionSpec,
    pub sample_size: usize,
}

impl Cell {
    /// Returns `(distribution ID, sample size)`
    ///
    pub fn key(&self) -> (u32, usize) {
        (self.distribution.id, self.sample_size)
    }

    /// Seed of the cell's random number generator
    ///
    /// # Arguments
    /// * `seed` - Experiment seed
    ///
    pub fn seed(&self, seed: u64) -> u64 {
        derive_seed(
            seed,
            &[
                RECOVERY_STREAM,
                self.distribution.id as u64,
                self.sample_size as u64,
            ],
        )
    }
}

/// Returns all cells, ordered by distribution and then by sample size as configured
///
/// # Arguments
/// * `configuration` - Recovery configuration
///
pub fn cells(configuration: &RecoveryConfiguration) -> Vec<Cell> {
    configuration
        .distributions
        .iter()
        .flat_map(|distribution| {
            configuration
                .sample_sizes
                .iter()
                .map(move |sample_size| Cell {
                    distribution: *distribution,
                    sample_size: *sample_size,
                })
        })
        .collect()
}

/// Simulates all trials of one cell. Each trial draws a sample and
/// appends one moment and one maximum likelihood record.
///
/// # Arguments
/// * `cell` - Distribution and sample size
/// * `num_trials` - Number of trials
/// * `optimizer` - Optimizer of the maximum likelihood estimation
/// * `seed` - Experiment seed
///
pub fn simulate_cell(
    cell: &Cell,
    num_trials: usize,
    optimizer: &OptimizerConfiguration,
    seed: u64,
) -> Result<Vec<SimulationRecord>, ExperimentError> {
    let sampler = ExGaussian::new(&cell.distribution)?;
    let mut rng = SmallRng::seed_from_u64(cell.seed(seed));
    let mut records = Vec::with_capacity(2 * num_trials);
    for _ in 0..num_trials {
        let samples = sampler.sample_n(&mut rng, cell.sample_size);
        let moment_estimate = moments(&samples)?;
        let fit = maximum_likelihood(&samples, &moment_estimate, optimizer)?;
        records.push(SimulationRecord::new(
            &moment_estimate,
            cell.sample_size,
            cell.distribution.id,
            EstimationMethod::Moments,
        ));
        records.push(SimulationRecord::new(
            &fit.estimate,
            cell.sample_size,
            cell.distribution.id,
            EstimationMethod::Mle,
        ));
    }
    Ok(records)
}

/// Runs the recovery experiment, cells in parallel.
///
/// If a checkpoint is given, every finished cell is appended to it. With
/// [`ExperimentVariant::Simulate`] the checkpoint is truncated first, otherwise completed
/// cells are loaded from it and skipped. Incomplete cells are removed from the checkpoint.
///
/// If the stop flag is set, no new cells are started and [`ExperimentError::Interrupted`]
/// is returned once the running cells are finished and checkpointed.
///
/// Records are returned ordered by cell, see [`cells`], independent of resumption.
///
/// # Arguments
/// * `configuration` - Experiment configuration
/// * `checkpoint` - Optional path of the checkpoint CSV
/// * `stop_flag` - Flag to stop starting new cells
///
pub fn run_recovery(
    configuration: &ExperimentConfiguration,
    checkpoint: Option<&Path>,
    stop_flag: &AtomicBool,
) -> Result<Vec<SimulationRecord>, ExperimentError> {
    let recovery = &configuration.recovery;
    let all_cells = cells(recovery);

    let (mut records, completed) = match checkpoint {
        Some(path) if configuration.variant != ExperimentVariant::Simulate && path.exists() => {
            load_completed_cells(path, &all_cells, recovery.num_trials)?
        }
        Some(path) => {
            write_records::<SimulationRecord>(path, &[])?;
            (Vec::new(), HashSet::new())
        }
        None => (Vec::new(), HashSet::new()),
    };

    let pending: Vec<Cell> = all_cells
        .iter()
        .filter(|cell| !completed.contains(&cell.key()))
        .copied()
        .collect();
    info!(
        "Recovery experiment: {} cells, {} checkpointed, {} trials each",
        all_cells.len(),
        completed.len(),
        recovery.num_trials
    );

    let appender = match checkpoint {
        Some(path) => Some(Mutex::new(RecordAppender::open(path)?)),
        None => None,
    };

    let progress = Progress::new("Recovery cells", pending.len());
    let progress_guard = progress.span().enter();

    let new_records = pending
        .par_iter()
        .map(|cell| -> Result<Option<Vec<SimulationRecord>>, ExperimentError> {
            if stop_flag.load(Ordering::Relaxed) {
                return Ok(None);
            }
            let cell_records = simulate_cell(
                cell,
                recovery.num_trials,
                &configuration.optimizer,
                configuration.seed,
            )?;
            if let Some(appender) = appender.as_ref() {
                append_checkpoint(appender, &cell_records)?;
            }
            debug!(
                "Finished distribution {} with sample size {}",
                cell.distribution.id, cell.sample_size
            );
            progress.inc();
            Ok(Some(cell_records))
        })
        .collect::<Result<Vec<_>, _>>()?;
    drop(progress_guard);

    let finished_cells = completed.len() + new_records.iter().flatten().count();
    if stop_flag.load(Ordering::Relaxed) && finished_cells < all_cells.len() {
        return Err(ExperimentError::Interrupted(finished_cells));
    }

    records.extend(new_records.into_iter().flatten().flatten());

    let positions: HashMap<(u32, usize), usize> = all_cells
        .iter()
        .enumerate()
        .map(|(position, cell)| (cell.key(), position))
        .collect();
    records.sort_by_key(|record| {
        positions
            .get(&(record.distribution, record.sample_size))
            .copied()
            .unwrap_or(usize::MAX)
    });

    info!("Recovery experiment finished with {} records", records.len());
    Ok(records)
}

/// Appends the records of a finished cell to the shared checkpoint
///
/// # Arguments
/// * `appender` - Checkpoint appender shared by the workers
/// * `records` - Records of one cell
///
fn append_checkpoint(
    appender: &Mutex<RecordAppender>,
    records: &[SimulationRecord],
) -> Result<(), ExperimentError> {
    appender
        .lock()
        .map_err(|_| ExperimentError::CheckpointPoisoned)?
        .append(records)
}

/// Loads the records of completed cells from the checkpoint
/// and returns them with the completed cell keys.
/// Records of incomplete or unknown cells are removed from the checkpoint.
///
/// # Arguments
/// * `path` - Path of the checkpoint CSV
/// * `cells` - Configured cells
/// * `num_trials` - Number of trials per cell
///
fn load_completed_cells(
    path: &Path,
    cells: &[Cell],
    num_trials: usize,
) -> Result<(Vec<SimulationRecord>, HashSet<(u32, usize)>), ExperimentError> {
    let records: Vec<SimulationRecord> = read_records(path)?;
    let configured: HashSet<(u32, usize)> = cells.iter().map(|cell| cell.key()).collect();

    let mut counts: HashMap<(u32, usize), usize> = HashMap::new();
    for record in records.iter() {
        *counts
            .entry((record.distribution, record.sample_size))
            .or_insert(0) += 1;
    }
    let completed: HashSet<(u32, usize)> = counts
        .into_iter()
        .filter(|(key, count)| *count == 2 * num_trials && configured.contains(key))
        .map(|(key, _)| key)
        .collect();

    let total = records.len();
    let kept: Vec<SimulationRecord> = records
        .into_iter()
        .filter(|record| completed.contains(&(record.distribution, record.sample_size)))
        .collect();
    if kept.len() != total {
        warn!(
            "Dropping {} records of incomplete cells from checkpoint `{}`",
            total - kept.len(),
            path.display()
        );
        write_records(path, &kept)?;
    }
    Ok((kept, completed))
}

// std imports
use std::collections::HashMap;

// 3rd party imports
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

// internal imports
use super::configuration::{ExperimentConfiguration, SampleSizePairing};
use super::derive_seed;
use crate::errors::experiment_error::ExperimentError;
use crate::records::false_positive_record::{FalsePositiveRecord, TestedParameter};
use crate::records::simulation_record::{EstimationMethod, SimulationRecord};
use crate::significance::paired_t_test;
use crate::ui::progress::Progress;

/// Stream ID of the imbalance experiment for seed derivation
///
const IMBALANCE_STREAM: u64 = 2;

/// Groups the valid MLE records of the given distribution by sample size
///
/// # Arguments
/// * `records` - Recovery records
/// * `distribution` - Distribution ID
/// * `threshold` - Estimates with an absolute value above are discarded
///
pub fn mle_pools(
    records: &[SimulationRecord],
    distribution: u32,
    threshold: f64,
) -> HashMap<usize, Vec<SimulationRecord>> {
    let mut pools: HashMap<usize, Vec<SimulationRecord>> = HashMap::new();
    let mut discarded = 0;
    for record in records
        .iter()
        .filter(|r| r.distribution == distribution && r.method == EstimationMethod::Mle)
    {
        if !record.is_valid(threshold) {
            discarded += 1;
            continue;
        }
        pools
            .entry(record.sample_size)
            .or_default()
            .push(record.clone());
    }
    if discarded > 0 {
        warn!(
            "Discarded {} invalid MLE estimates of distribution {}",
            discarded, distribution
        );
    }
    pools
}

/// Simulates paired comparisons between groups of estimates drawn from two pools.
/// Each simulation draws `group_size` records from each pool without replacement
/// and tests mu and tau separately.
///
/// # Arguments
/// * `pool_a` - Estimates at the first sample size
/// * `pool_b` - Estimates at the second sample size
/// * `pairing` - Compared sample sizes
/// * `group_size` - Records per group
/// * `n_simulations` - Number of simulated comparisons
/// * `seed` - Seed of this pairing
///
pub fn simulate_comparisons(
    pool_a: &[SimulationRecord],
    pool_b: &[SimulationRecord],
    pairing: &SampleSizePairing,
    group_size: usize,
    n_simulations: usize,
    seed: u64,
) -> Result<Vec<FalsePositiveRecord>, ExperimentError> {
    for (pool, sample_size) in [(pool_a, pairing.a), (pool_b, pairing.b)] {
        if pool.len() < group_size {
            return Err(ExperimentError::InsufficientRecords {
                sample_size,
                available: pool.len(),
                required: group_size,
            });
        }
    }
    let pair = pairing.id();

    let records = (0..n_simulations)
        .into_par_iter()
        .map(|simulation| -> Result<[FalsePositiveRecord; 2], ExperimentError> {
            let mut rng = SmallRng::seed_from_u64(derive_seed(seed, &[simulation as u64]));
            let group_a: Vec<&SimulationRecord> =
                pool_a.choose_multiple(&mut rng, group_size).collect();
            let group_b: Vec<&SimulationRecord> =
                pool_b.choose_multiple(&mut rng, group_size).collect();

            let mu_test = paired_t_test(
                &group_a.iter().map(|r| r.mu).collect::<Vec<f64>>(),
                &group_b.iter().map(|r| r.mu).collect::<Vec<f64>>(),
            )?;
            let tau_test = paired_t_test(
                &group_a.iter().map(|r| r.tau).collect::<Vec<f64>>(),
                &group_b.iter().map(|r| r.tau).collect::<Vec<f64>>(),
            )?;
            Ok([
                FalsePositiveRecord {
                    p: mu_test.p_value,
                    t: mu_test.statistic,
                    pair: pair.clone(),
                    param: TestedParameter::Mu,
                },
                FalsePositiveRecord {
                    p: tau_test.p_value,
                    t: tau_test.statistic,
                    pair: pair.clone(),
                    param: TestedParameter::Tau,
                },
            ])
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records.into_iter().flatten().collect())
}

/// Runs the imbalance experiment on the recovery records for all configured pairings
///
/// # Arguments
/// * `configuration` - Experiment configuration
/// * `records` - Recovery records
///
pub fn run_imbalance(
    configuration: &ExperimentConfiguration,
    records: &[SimulationRecord],
) -> Result<Vec<FalsePositiveRecord>, ExperimentError> {
    let imbalance = &configuration.imbalance;
    let pools = mle_pools(
        records,
        imbalance.distribution,
        configuration.invalid_estimate_threshold,
    );
    let empty_pool = Vec::new();

    info!(
        "Imbalance experiment: {} pairings, {} simulations each, groups of {}",
        imbalance.pairings.len(),
        imbalance.n_simulations,
        imbalance.group_size
    );

    let progress = Progress::new("Pairings", imbalance.pairings.len());
    let _progress_guard = progress.span().enter();

    let mut false_positives =
        Vec::with_capacity(imbalance.pairings.len() * imbalance.n_simulations * 2);
    for (index, pairing) in imbalance.pairings.iter().enumerate() {
        let pool_a = pools.get(&pairing.a).unwrap_or(&empty_pool);
        let pool_b = pools.get(&pairing.b).unwrap_or(&empty_pool);
        let pairing_records = simulate_comparisons(
            pool_a,
            pool_b,
            pairing,
            imbalance.group_size,
            imbalance.n_simulations,
            derive_seed(configuration.seed, &[IMBALANCE_STREAM, index as u64]),
        )?;
        debug!("Finished pairing {}", pairing.id());
        progress.inc();
        false_positives.extend(pairing_records);
    }
    info!(
        "Imbalance experiment finished with {} records",
        false_positives.len()
    );
    Ok(false_positives)
}

#[cfg(test)]
mod tests {
    use rand_distr::{Distribution, Normal};

    use super::*;
    use crate::estimation::ParameterEstimate;

    /// Pool of MLE records whose mu and tau are normally distributed around the given means
    ///
    fn synthetic_pool(
        sample_size: usize,
        mu: f64,
        tau: f64,
        size: usize,
        seed: u64,
    ) -> Vec<SimulationRecord> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mu_distribution = Normal::new(mu, 10.0).unwrap();
        let tau_distribution = Normal::new(tau, 30.0).unwrap();
        (0..size)
            .map(|_| {
                SimulationRecord::new(
                    &ParameterEstimate::new(
                        mu_distribution.sample(&mut rng),
                        20.0,
                        tau_distribution.sample(&mut rng),
                    ),
                    sample_size,
                    3,
                    EstimationMethod::Mle,
                )
            })
            .collect()
    }

    fn false_positive_rate(records: &[FalsePositiveRecord], param: TestedParameter) -> f64 {
        let tests: Vec<&FalsePositiveRecord> =
            records.iter().filter(|r| r.param == param).collect();
        tests.iter().filter(|r| r.is_significant(0.05)).count() as f64 / tests.len() as f64
    }

    #[test]
    fn test_equal_pools_keep_nominal_rate() {
        let pool = synthetic_pool(100, 300.0, 300.0, 2_000, 1);
        let records = simulate_comparisons(
            &pool,
            &pool,
            &SampleSizePairing::new(100, 100),
            30,
            2_000,
            7,
        )
        .unwrap();
        assert_eq!(records.len(), 4_000);
        assert!(records.iter().all(|r| r.pair == "100_vs_100"));
        for param in [TestedParameter::Mu, TestedParameter::Tau] {
            let rate = false_positive_rate(&records, param);
            assert!(rate > 0.03 && rate < 0.07, "{}: {}", param, rate);
        }
    }

    #[test]
    fn test_biased_pools_inflate_rate() {
        // small samples: mu over- and tau underestimated
        let pool_a = synthetic_pool(20, 310.0, 270.0, 2_000, 1);
        let pool_b = synthetic_pool(500, 300.0, 300.0, 2_000, 2);
        let records = simulate_comparisons(
            &pool_a,
            &pool_b,
            &SampleSizePairing::new(20, 500),
            30,
            1_000,
            7,
        )
        .unwrap();
        for param in [TestedParameter::Mu, TestedParameter::Tau] {
            let rate = false_positive_rate(&records, param);
            assert!(rate > 0.5, "{}: {}", param, rate);
        }
        let tau_statistics: f64 = records
            .iter()
            .filter(|r| r.param == TestedParameter::Tau)
            .map(|r| r.t)
            .sum();
        assert!(tau_statistics < 0.0);
    }

    #[test]
    fn test_deterministic() {
        let pool = synthetic_pool(100, 300.0, 300.0, 100, 1);
        let pairing = SampleSizePairing::new(100, 100);
        assert_eq!(
            simulate_comparisons(&pool, &pool, &pairing, 30, 50, 3).unwrap(),
            simulate_comparisons(&pool, &pool, &pairing, 30, 50, 3).unwrap()
        );
    }

    #[test]
    fn test_insufficient_records() {
        let pool_a = synthetic_pool(20, 300.0, 300.0, 29, 1);
        let pool_b = synthetic_pool(500, 300.0, 300.0, 100, 2);
        let result = simulate_comparisons(
            &pool_a,
            &pool_b,
            &SampleSizePairing::new(20, 500),
            30,
            10,
            7,
        );
        assert!(matches!(
            result,
            Err(ExperimentError::InsufficientRecords {
                sample_size: 20,
                available: 29,
                required: 30
            })
        ));
    }

    #[test]
    fn test_pools_discard_invalid_and_other_records() {
        let mut records = synthetic_pool(20, 300.0, 300.0, 10, 1);
        records[0].tau = 2e6;
        records[1].sigma = f64::NAN;
        records[2].method = EstimationMethod::Moments;
        records[3].distribution = 1;
        let pools = mle_pools(&records, 3, 1e6);
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[&20].len(), 6);
    }

    #[test]
    fn test_run_on_recovery_records() {
        use crate::experiments::configuration::RecoveryConfiguration;
        use crate::experiments::recovery::run_recovery;
        use std::sync::atomic::AtomicBool;

        let mut configuration = ExperimentConfiguration::new();
        configuration.recovery = RecoveryConfiguration {
            num_trials: 200,
            sample_sizes: vec![10, 500],
            distributions: vec![crate::distribution::DistributionSpec::new(
                3, 300.0, 20.0, 300.0,
            )],
        };
        configuration.imbalance.distribution = 3;
        configuration.imbalance.n_simulations = 300;
        configuration.imbalance.pairings = vec![SampleSizePairing::new(10, 500)];
        configuration.validate().unwrap();

        let records = run_recovery(&configuration, None, &AtomicBool::new(false)).unwrap();
        let false_positives = run_imbalance(&configuration, &records).unwrap();
        assert_eq!(false_positives.len(), 600);
        // tau fitted on 10 trials is biased far enough to be detected by 30 pairs
        let rate = false_positive_rate(&false_positives, TestedParameter::Tau);
        assert!(rate > 0.1, "tau false positive rate {}", rate);
    }
}

/// Default seed for all random number generators
///
pub const DEFAULT_SEED: u64 = 42;

/// Number of trials per distribution and sample size in the recovery experiment
///
pub const DEFAULT_NUM_TRIALS: usize = 10_000;

/// Number of simulated comparisons per sample size pairing
///
pub const DEFAULT_N_SIMULATIONS: usize = 10_000;

/// Number of estimates per group in a paired comparison
///
pub const DEFAULT_GROUP_SIZE: usize = 30;

/// Significance level of the paired tests
///
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Estimates with an absolute value above this threshold are treated as invalid
///
pub const DEFAULT_INVALID_ESTIMATE_THRESHOLD: f64 = 1e6;

/// Simulated sample sizes, i.e. trial counts per fitted participant
///
pub const DEFAULT_SAMPLE_SIZES: [usize; 8] = [10, 20, 35, 50, 100, 200, 350, 500];

/// Simulated distributions as `(id, mu, sigma, tau)`
///
pub const DEFAULT_DISTRIBUTIONS: [(u32, f64, f64, f64); 12] = [
    (1, 300.0, 20.0, 100.0),
    (2, 300.0, 20.0, 200.0),
    (3, 300.0, 20.0, 300.0),
    (4, 300.0, 50.0, 100.0),
    (5, 300.0, 50.0, 200.0),
    (6, 300.0, 50.0, 300.0),
    (7, 500.0, 20.0, 100.0),
    (8, 500.0, 20.0, 200.0),
    (9, 500.0, 20.0, 300.0),
    (10, 500.0, 50.0, 100.0),
    (11, 500.0, 50.0, 200.0),
    (12, 500.0, 50.0, 300.0),
];

/// Distribution whose MLE estimates feed the imbalance experiment
///
pub const DEFAULT_IMBALANCE_DISTRIBUTION: u32 = 3;

/// Compared sample sizes in the imbalance experiment
///
pub const DEFAULT_PAIRINGS: [(usize, usize); 6] = [
    (10, 100),
    (20, 200),
    (20, 500),
    (35, 350),
    (50, 500),
    (100, 500),
];

/// Minimum number of samples for the moment estimator (skewness needs 3)
///
pub const MIN_SAMPLES_FOR_ESTIMATION: usize = 3;

/// Maximum Nelder-Mead iterations of a maximum likelihood fit
///
pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000;

/// The simplex has converged once the standard deviation of its negative log-likelihoods is below
///
pub const DEFAULT_SD_TOLERANCE: f64 = 1e-6;

/// Relative step of the initial simplex around the starting point
///
pub const INITIAL_SIMPLEX_STEP: f64 = 0.05;

/// Absolute step of the initial simplex for zero coordinates
///
pub const INITIAL_SIMPLEX_ZERO_STEP: f64 = 0.00025;

/// File name of the recovery records, also used as checkpoint
///
pub const RECOVERY_FILE_NAME: &str = "recovery.csv";

/// File name of the false positive records
///
pub const FALSE_POSITIVE_FILE_NAME: &str = "false_positives.csv";

/// File name of the aggregated recovery records
///
pub const RECOVERY_SUMMARY_FILE_NAME: &str = "recovery_summary.csv";

/// File name of the aggregated false positive records
///
pub const FALSE_POSITIVE_SUMMARY_FILE_NAME: &str = "false_positive_summary.csv";

/// File name of the run manifest
///
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

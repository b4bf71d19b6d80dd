// 3rd party imports
use argmin::core::{CostFunction, Error, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;
use tracing::trace;

// internal imports
use super::moments::SampleMoments;
use super::ParameterEstimate;
use crate::constants::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_SD_TOLERANCE, INITIAL_SIMPLEX_STEP,
    INITIAL_SIMPLEX_ZERO_STEP,
};
use crate::distribution::{ln_pdf, log_likelihood};
use crate::errors::estimation_error::EstimationError;

/// Share of the standard deviation assigned to tau when the moment estimate is unusable
///
const FALLBACK_TAU_SHARE: f64 = 0.8;

/// Share of the standard deviation assigned to sigma when the moment estimate is unusable
///
const FALLBACK_SIGMA_SHARE: f64 = 0.6;

/// Settings of the Nelder-Mead simplex used for the maximum likelihood fits
///
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OptimizerConfiguration {
    /// Maximum number of iterations per fit
    pub max_iterations: u64,
    /// Converged once the standard deviation of the simplex costs is below
    pub sd_tolerance: f64,
}

impl Default for OptimizerConfiguration {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            sd_tolerance: DEFAULT_SD_TOLERANCE,
        }
    }
}

/// Result of a maximum likelihood fit
///
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MleFit {
    /// Estimated parameters
    pub estimate: ParameterEstimate,
    /// Log-likelihood of the samples under `estimate`
    pub log_likelihood: f64,
    /// Optimizer iterations
    pub iterations: u64,
    /// False if the optimizer ran out of iterations, `estimate` is the best iterate then
    pub converged: bool,
}

/// Negative ExGaussian log-likelihood of the samples over `(mu, ln sigma, ln tau)`.
/// Non-finite values are reported as `+inf` so the simplex moves away from invalid regions.
///
struct NegativeLogLikelihood {
    samples: Vec<f64>,
}

impl CostFunction for NegativeLogLikelihood {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        let (mu, sigma, tau) = (param[0], param[1].exp(), param[2].exp());
        let value = -self
            .samples
            .iter()
            .map(|x| ln_pdf(*x, mu, sigma, tau))
            .sum::<f64>();
        if value.is_finite() {
            Ok(value)
        } else {
            Ok(f64::INFINITY)
        }
    }
}

/// Simplex of the start and one vertex per coordinate, moved by 5 % (or a small
/// absolute step for zero coordinates)
///
/// # Arguments
/// * `start` - First vertex
///
fn initial_simplex(start: &[f64]) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(start.to_vec());
    for index in 0..start.len() {
        let mut vertex = start.to_vec();
        vertex[index] = if vertex[index] != 0.0 {
            vertex[index] * (1.0 + INITIAL_SIMPLEX_STEP)
        } else {
            INITIAL_SIMPLEX_ZERO_STEP
        };
        simplex.push(vertex);
    }
    simplex
}

/// Fits the ExGaussian parameters by maximizing the log-likelihood,
/// starting at the given initial guess (usually the moment estimate).
/// Sigma and tau are optimized on log scale to keep them positive.
///
/// Non-convergence is not an error, the best iterate is returned and flagged.
///
/// # Arguments
/// * `samples` - Samples, at least 3
/// * `initial` - Initial guess
/// * `optimizer` - Optimizer settings
///
pub fn maximum_likelihood(
    samples: &[f64],
    initial: &ParameterEstimate,
    optimizer: &OptimizerConfiguration,
) -> Result<MleFit, EstimationError> {
    let moments = SampleMoments::from_samples(samples)?;
    let start = starting_point(initial, &moments);
    let start_log_likelihood = log_likelihood(&start, samples);
    let start_point = vec![start.mu, start.sigma.ln(), start.tau.ln()];

    let cost = NegativeLogLikelihood {
        samples: samples.to_vec(),
    };
    let solver = NelderMead::new(initial_simplex(&start_point))
        .with_sd_tolerance(optimizer.sd_tolerance)
        .map_err(|err| EstimationError::OptimizerError(err.to_string()))?;
    let result = Executor::new(cost, solver)
        .configure(|state| state.max_iters(optimizer.max_iterations))
        .run()
        .map_err(|err| EstimationError::OptimizerError(err.to_string()))?;

    let state = result.state();
    let iterations = state.get_iter();
    let converged = !matches!(
        state.get_termination_status(),
        TerminationStatus::Terminated(TerminationReason::MaxItersReached)
    );
    if !converged {
        trace!(
            "MLE did not converge within {} iterations (n = {})",
            iterations,
            samples.len()
        );
    }

    let fitted_log_likelihood = -state.get_best_cost();
    let best_point = match state.get_best_param() {
        Some(point) if fitted_log_likelihood.is_finite() => point,
        _ => &start_point,
    };
    let estimate = ParameterEstimate::new(best_point[0], best_point[1].exp(), best_point[2].exp());

    // the start is a simplex vertex, this only guards against round trip errors of exp(ln(x))
    if fitted_log_likelihood.is_finite() && fitted_log_likelihood >= start_log_likelihood {
        Ok(MleFit {
            estimate,
            log_likelihood: fitted_log_likelihood,
            iterations,
            converged,
        })
    } else {
        Ok(MleFit {
            estimate: start,
            log_likelihood: start_log_likelihood,
            iterations,
            converged,
        })
    }
}

/// Returns the initial guess if it is a proper distribution with `tau < sd`,
/// otherwise splits the sample standard deviation between sigma and tau.
///
/// # Arguments
/// * `initial` - Initial guess
/// * `moments` - Sample moments
///
fn starting_point(initial: &ParameterEstimate, moments: &SampleMoments) -> ParameterEstimate {
    let sd = moments.sd();
    if initial.is_proper() && initial.tau < sd {
        return *initial;
    }
    // identical samples, keep the simplex away from zero
    let sd = if sd > 0.0 {
        sd
    } else {
        1e-8 * moments.mean.abs().max(1.0)
    };
    let tau = FALLBACK_TAU_SHARE * sd;
    ParameterEstimate::new(moments.mean - tau, FALLBACK_SIGMA_SHARE * sd, tau)
}

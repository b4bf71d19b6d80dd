// 3rd party imports
use polars::prelude::*;

// internal imports
use crate::distribution::DistributionSpec;
use crate::errors::experiment_error::ExperimentError;
use crate::io::dataframe::{
    distributions_to_dataframe, false_positive_records_to_dataframe,
    simulation_records_to_dataframe,
};
use crate::records::false_positive_record::FalsePositiveRecord;
use crate::records::simulation_record::SimulationRecord;

/// Estimated parameters
///
const PARAMETERS: [&str; 3] = ["mu", "sigma", "tau"];

/// Expression which is true if the column is neither NaN nor outside of `±threshold`
///
fn is_plausible(column: &str, threshold: f64) -> Expr {
    col(column)
        .is_not_nan()
        .and(col(column).lt_eq(lit(threshold)))
        .and(col(column).gt_eq(lit(-threshold)))
}

/// Summarizes the recovery records per distribution, sample size and method.
/// Records with a NaN or an absolute estimate above the threshold are excluded.
///
/// Columns: `distribution, sample_size, method, n`, followed by `<param>_mean`, `<param>_sd`,
/// `<param>_median` for mu, sigma and tau, the true parameters `<param>_true`
/// and the bias `<param>_bias = <param>_mean - <param>_true`.
///
/// # Arguments
/// * `records` - Recovery records
/// * `distributions` - Generating distributions
/// * `threshold` - Invalid estimate threshold
///
pub fn recovery_summary(
    records: &[SimulationRecord],
    distributions: &[DistributionSpec],
    threshold: f64,
) -> Result<DataFrame, ExperimentError> {
    let truth = distributions_to_dataframe(distributions)?.lazy();

    let mut aggregations = vec![col("mu").count().cast(DataType::UInt64).alias("n")];
    for parameter in PARAMETERS {
        aggregations.push(col(parameter).mean().alias(&format!("{}_mean", parameter)));
        aggregations.push(col(parameter).std(1).alias(&format!("{}_sd", parameter)));
        aggregations.push(col(parameter).median().alias(&format!("{}_median", parameter)));
    }
    let biases: Vec<Expr> = PARAMETERS
        .iter()
        .map(|parameter| {
            (col(&format!("{}_mean", parameter)) - col(&format!("{}_true", parameter)))
                .alias(&format!("{}_bias", parameter))
        })
        .collect();

    let summary = simulation_records_to_dataframe(records)?
        .lazy()
        .filter(
            is_plausible("mu", threshold)
                .and(is_plausible("sigma", threshold))
                .and(is_plausible("tau", threshold)),
        )
        .group_by_stable([col("distribution"), col("sample_size"), col("method")])
        .agg(aggregations)
        .left_join(truth, col("distribution"), col("distribution"))
        .with_columns(biases)
        .collect()?;
    Ok(summary)
}

/// Summarizes the false positive records per pairing and parameter.
/// Tests with a NaN p-value are excluded.
///
/// Columns: `pair, param, n_tests, false_positive_rate, t_mean`
///
/// # Arguments
/// * `records` - False positive records
/// * `alpha` - Significance level
///
pub fn false_positive_summary(
    records: &[FalsePositiveRecord],
    alpha: f64,
) -> Result<DataFrame, ExperimentError> {
    let summary = false_positive_records_to_dataframe(records)?
        .lazy()
        .filter(col("p").is_not_nan())
        .group_by_stable([col("pair"), col("param")])
        .agg([
            col("p").count().cast(DataType::UInt64).alias("n_tests"),
            col("p")
                .lt(lit(alpha))
                .cast(DataType::Float64)
                .mean()
                .alias("false_positive_rate"),
            col("t").mean().alias("t_mean"),
        ])
        .collect()?;
    Ok(summary)
}

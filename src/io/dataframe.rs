// std imports
use std::fs::File;
use std::path::Path;

// 3rd party imports
use polars::prelude::*;

// internal imports
use crate::distribution::DistributionSpec;
use crate::errors::experiment_error::ExperimentError;
use crate::records::false_positive_record::FalsePositiveRecord;
use crate::records::simulation_record::SimulationRecord;

/// Creates a data frame with the columns `mu, sigma, tau, sample_size, distribution, method`
///
/// # Arguments
/// * `records` - Recovery records
///
pub fn simulation_records_to_dataframe(records: &[SimulationRecord]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new("mu", records.iter().map(|r| r.mu).collect::<Vec<f64>>()),
        Series::new("sigma", records.iter().map(|r| r.sigma).collect::<Vec<f64>>()),
        Series::new("tau", records.iter().map(|r| r.tau).collect::<Vec<f64>>()),
        Series::new(
            "sample_size",
            records
                .iter()
                .map(|r| r.sample_size as u64)
                .collect::<Vec<u64>>(),
        ),
        Series::new(
            "distribution",
            records.iter().map(|r| r.distribution).collect::<Vec<u32>>(),
        ),
        Series::new(
            "method",
            records
                .iter()
                .map(|r| r.method.as_str())
                .collect::<Vec<&str>>(),
        ),
    ])
}

/// Creates a data frame with the columns `p, t, pair, param`
///
/// # Arguments
/// * `records` - False positive records
///
pub fn false_positive_records_to_dataframe(
    records: &[FalsePositiveRecord],
) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new("p", records.iter().map(|r| r.p).collect::<Vec<f64>>()),
        Series::new("t", records.iter().map(|r| r.t).collect::<Vec<f64>>()),
        Series::new(
            "pair",
            records
                .iter()
                .map(|r| r.pair.as_str())
                .collect::<Vec<&str>>(),
        ),
        Series::new(
            "param",
            records
                .iter()
                .map(|r| r.param.as_str())
                .collect::<Vec<&str>>(),
        ),
    ])
}

/// Creates a data frame with the true parameters,
/// columns `distribution, mu_true, sigma_true, tau_true`
///
/// # Arguments
/// * `distributions` - Distributions
///
pub fn distributions_to_dataframe(distributions: &[DistributionSpec]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new(
            "distribution",
            distributions.iter().map(|d| d.id).collect::<Vec<u32>>(),
        ),
        Series::new(
            "mu_true",
            distributions.iter().map(|d| d.mu).collect::<Vec<f64>>(),
        ),
        Series::new(
            "sigma_true",
            distributions.iter().map(|d| d.sigma).collect::<Vec<f64>>(),
        ),
        Series::new(
            "tau_true",
            distributions.iter().map(|d| d.tau).collect::<Vec<f64>>(),
        ),
    ])
}

/// Writes the data frame as CSV with header, overwriting existing files
///
/// # Arguments
/// * `dataframe` - Data frame to write
/// * `path` - Path to the CSV file
///
pub fn write_csv(dataframe: &mut DataFrame, path: &Path) -> Result<(), ExperimentError> {
    let mut file = File::create(path)
        .map_err(|err| ExperimentError::FileError(path.to_string_lossy().to_string(), err))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(dataframe)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::ParameterEstimate;
    use crate::records::simulation_record::EstimationMethod;

    #[test]
    fn test_simulation_records_to_dataframe() {
        let records = vec![
            SimulationRecord::new(
                &ParameterEstimate::new(310.0, 15.0, 280.0),
                20,
                3,
                EstimationMethod::Moments,
            ),
            SimulationRecord::new(
                &ParameterEstimate::new(305.0, 18.0, 290.0),
                20,
                3,
                EstimationMethod::Mle,
            ),
        ];
        let dataframe = simulation_records_to_dataframe(&records).unwrap();
        assert_eq!(dataframe.height(), 2);
        assert_eq!(
            dataframe.get_column_names(),
            vec!["mu", "sigma", "tau", "sample_size", "distribution", "method"]
        );
        assert_eq!(
            dataframe.column("method").unwrap().str().unwrap().get(1),
            Some("mle")
        );
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distributions.csv");
        let mut dataframe =
            distributions_to_dataframe(&[DistributionSpec::new(1, 300.0, 20.0, 100.0)]).unwrap();
        write_csv(&mut dataframe, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("distribution,mu_true,sigma_true,tau_true\n"));
        assert_eq!(content.lines().count(), 2);
    }
}

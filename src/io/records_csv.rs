// std imports
use std::fs::{File, OpenOptions};
use std::path::Path;

// 3rd party imports
use serde::{de::DeserializeOwned, Serialize};

// internal imports
use crate::errors::experiment_error::ExperimentError;

/// Reads all records from a CSV file with header
///
/// # Arguments
/// * `path` - Path to the CSV file
///
pub fn read_records<T>(path: &Path) -> Result<Vec<T>, ExperimentError>
where
    T: DeserializeOwned,
{
    let file = File::open(path)
        .map_err(|err| ExperimentError::FileError(path.to_string_lossy().to_string(), err))?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Writes the records to a CSV file with header, overwriting existing content
///
/// # Arguments
/// * `path` - Path to the CSV file
/// * `records` - Records to write
///
pub fn write_records<T>(path: &Path, records: &[T]) -> Result<(), ExperimentError>
where
    T: Serialize,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .map_err(|err| ExperimentError::FileError(path.to_string_lossy().to_string(), err))?;
    Ok(())
}

/// Appends batches of records to a CSV file, writing the header only into new or empty files.
/// Each batch is flushed so a crash loses at most the batch being written.
///
pub struct RecordAppender {
    path: String,
    writer: csv::Writer<File>,
}

impl RecordAppender {
    /// Opens the file for appending, creates it if necessary
    ///
    /// # Arguments
    /// * `path` - Path to the CSV file
    ///
    pub fn open(path: &Path) -> Result<Self, ExperimentError> {
        let path_str = path.to_string_lossy().to_string();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| ExperimentError::FileError(path_str.clone(), err))?;
        let is_empty = file
            .metadata()
            .map_err(|err| ExperimentError::FileError(path_str.clone(), err))?
            .len()
            == 0;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);
        Ok(Self {
            path: path_str,
            writer,
        })
    }

    /// Appends and flushes the records
    ///
    /// # Arguments
    /// * `records` - Records to append
    ///
    pub fn append<T>(&mut self, records: &[T]) -> Result<(), ExperimentError>
    where
        T: Serialize,
    {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer
            .flush()
            .map_err(|err| ExperimentError::FileError(self.path.clone(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::ParameterEstimate;
    use crate::records::false_positive_record::{FalsePositiveRecord, TestedParameter};
    use crate::records::simulation_record::{EstimationMethod, SimulationRecord};

    fn simulation_records() -> Vec<SimulationRecord> {
        vec![
            SimulationRecord::new(
                &ParameterEstimate::new(301.25, f64::NAN, 297.5),
                10,
                3,
                EstimationMethod::Moments,
            ),
            SimulationRecord::new(
                &ParameterEstimate::new(299.0, 21.0, 300.123456789),
                10,
                3,
                EstimationMethod::Mle,
            ),
        ]
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.csv");
        let records = simulation_records();
        write_records(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("mu,sigma,tau,sample_size,distribution,method\n"));
        assert!(content.contains(",moments\n"));

        let read: Vec<SimulationRecord> = read_records(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert!(read[0].sigma.is_nan());
        assert_eq!(read[0].mu, records[0].mu);
        assert_eq!(read[1], records[1]);
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("false_positives.csv");
        let record = FalsePositiveRecord {
            p: 0.5,
            t: -0.7,
            pair: "20_vs_500".to_string(),
            param: TestedParameter::Tau,
        };
        RecordAppender::open(&path)
            .unwrap()
            .append(&[record.clone()])
            .unwrap();
        RecordAppender::open(&path)
            .unwrap()
            .append(&[record.clone(), record.clone()])
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("p,t,pair,param").count(), 1);
        let read: Vec<FalsePositiveRecord> = read_records(&path).unwrap();
        assert_eq!(read, vec![record.clone(), record.clone(), record]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Vec<SimulationRecord>, _> =
            read_records(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(ExperimentError::FileError(_, _))));
    }
}

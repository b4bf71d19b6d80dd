// Include readme in doc
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Readme.md"))]

/// Default values and file names
pub mod constants;
/// ExGaussian distribution, sampling and likelihood
pub mod distribution;
/// Error types
pub mod errors;
/// Parameter estimators
pub mod estimation;
/// Recovery and imbalance experiments
pub mod experiments;
/// Result files
pub mod io;
/// Result records
pub mod records;
/// Significance tests
pub mod significance;
/// Terminal UI helpers
pub mod ui;

/// Errors related to the experiment configuration
pub mod configuration_error;
/// Errors of the parameter estimators
pub mod estimation_error;
/// Errors shared by the experiments
pub mod experiment_error;
/// Errors related to drawing samples
pub mod sampling_error;
/// Errors of the significance tests
pub mod significance_error;

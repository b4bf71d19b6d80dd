use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimationError {
    #[error("Insufficient data: at least {required} samples are needed, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("Optimizer error: {0}")]
    OptimizerError(String),
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    #[error("Tau must be finite and greater than zero, got {0}")]
    InvalidTau(f64),
    #[error("Sigma must be finite and not negative, got {0}")]
    InvalidSigma(f64),
    #[error("Mu must be finite, got {0}")]
    InvalidMu(f64),
}

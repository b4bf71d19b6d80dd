use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignificanceError {
    #[error("Paired test needs groups of equal size, got {0} and {1}")]
    UnequalGroupSizes(usize, usize),
    #[error("Paired test needs at least 2 pairs, got {0}")]
    InsufficientPairs(usize),
}

//! Error types for the solver and its collaborators

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`crate::GaussSolver`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// Best remaining pivot magnitude was below threshold, or NaN if every
    /// remaining entry was NaN
    #[error("Matrix is singular: pivot {pivot:e} at step {step} is below threshold")]
    Singular { step: usize, pivot: f64 },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Matrix is not square: {rows} x {cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("Invalid thread count: {0}")]
    InvalidThreadCount(usize),

    #[error("Elimination worker panicked")]
    WorkerPanicked,
}

/// Errors raised while building a system matrix
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Wrong formula number: {0}")]
    InvalidFormula(i64),

    #[error("Can't open file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid number {token:?} at position {index}")]
    Parse { index: usize, token: String },

    #[error("Not enough values: expected {expected}, got {got}")]
    TooFewValues { expected: usize, got: usize },
}

/// Umbrella error for callers driving a full generate/solve/verify run
#[derive(Error, Debug)]
pub enum GaussError {
    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, GaussError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_message() {
        let err = SolveError::Singular { step: 2, pivot: 0.0 };
        assert!(err.to_string().contains("step 2"));
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: GaussError = ProviderError::InvalidFormula(7).into();
        assert!(matches!(err, GaussError::Provider(ProviderError::InvalidFormula(7))));
        assert_eq!(err.to_string(), "Wrong formula number: 7");
    }
}

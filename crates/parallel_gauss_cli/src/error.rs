//! CLI error type and process exit codes

use parallel_gauss_core::{GaussError, ProviderError, SolveError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Number of values to be output ({m}) is greater than the matrix dimension ({n})")]
    TooManyOutputs { m: usize, n: usize },

    #[error("Incorrect amount of threads: {0}")]
    InvalidThreads(i64),

    #[error("Formula 0 requires a matrix file")]
    MissingFile,

    #[error(transparent)]
    Gauss(#[from] GaussError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        CliError::Gauss(err.into())
    }
}

impl From<SolveError> for CliError {
    fn from(err: SolveError) -> Self {
        CliError::Gauss(err.into())
    }
}

impl CliError {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::TooManyOutputs { .. } => 1,
            CliError::InvalidThreads(_) => 2,
            CliError::Usage(_) | CliError::MissingFile => 3,
            CliError::Gauss(GaussError::Provider(err)) => match err {
                ProviderError::InvalidFormula(_) => 4,
                ProviderError::Io { .. } => 5,
                ProviderError::Parse { .. } | ProviderError::TooFewValues { .. } => 6,
            },
            CliError::Gauss(GaussError::Solve(SolveError::Singular { .. })) => 7,
            CliError::Gauss(GaussError::Solve(_)) | CliError::Output(_) => 8,
        }
    }
}

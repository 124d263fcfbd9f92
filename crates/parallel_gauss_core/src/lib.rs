//! Parallel Gauss Core Library
//!
//! Dense linear solves by Gaussian elimination with full (row and column)
//! pivoting, run on a fixed pool of cooperating worker threads.
//!
//! # Overview
//!
//! Each solve copies the system, then `p` scoped workers walk the same phase
//! sequence in lock step: search their row stride for a pivot, let one worker swap
//! it into place, eliminate their rows, and finally back-substitute. Phases are
//! separated by a reusable barrier; a singular pivot raises a shared abort flag that
//! every worker honors before the next barrier.
//!
//! # Key Components
//!
//! - [`barrier`] - Reusable phase barrier
//! - [`pivot`] - Shared "keep the largest" pivot cell
//! - [`worker`] - Per-thread elimination state machine
//! - [`solve`] - Solver orchestration and configuration
//! - [`matrix`] - Dense row-major matrix
//! - [`provider`] - Formula and file matrix sources
//! - [`verify`] - Residual and error norms
//! - [`format`] - Text rendering of matrices and vectors
//!
//! # Example
//!
//! ```
//! use parallel_gauss_core::{GaussSolver, Matrix};
//!
//! let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]);
//! let solution = GaussSolver::new(2)?.solve(&a, &[5.0, 10.0])?;
//! assert!((solution.x[1] - 3.0).abs() < 1e-12);
//! # Ok::<(), parallel_gauss_core::SolveError>(())
//! ```

pub mod barrier;
pub mod error;
pub mod format;
pub mod matrix;
pub mod pivot;
pub mod provider;
mod shared;
pub mod solve;
pub mod verify;
pub mod worker;

pub use barrier::CyclicBarrier;
pub use error::{GaussError, ProviderError, Result, SolveError};
pub use format::{format_matrix, format_vector};
pub use matrix::Matrix;
pub use pivot::{PivotCandidate, SharedPivotLocation};
pub use provider::{generate, parse_matrix, read_matrix, rhs_from_odd_columns, Formula};
pub use solve::{GaussSolver, Solution, SolverConfig, DEFAULT_SINGULAR_THRESHOLD};
pub use verify::{error_norm, kahan_sum, residual_norm, verification_threads, verify, VerificationReport};

/// Timing breakdown for one run, in seconds
#[derive(Debug, Clone, Default)]
pub struct Timings {
    pub total_time: f64,
    pub generate_time: f64,
    pub solve_time: f64,
    pub verify_time: f64,
}

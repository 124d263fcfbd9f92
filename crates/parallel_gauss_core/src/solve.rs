//! Multi-threaded Gaussian elimination with full pivoting
//!
//! Solves Ax = b on a private copy of the system. A fixed pool of scoped worker
//! threads cooperates on the copy, coordinated by a [`CyclicBarrier`] and a shared
//! pivot cell; see [`crate::worker`] for the per-phase ownership rules.

use crate::barrier::CyclicBarrier;
use crate::pivot::SharedPivotLocation;
use crate::shared::SharedSystem;
use crate::worker::{EliminationWorker, SolveContext, WorkerOutcome, DESIGNATED_WORKER};
use crate::{Matrix, SolveError};
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Instant;

/// Pivots with a smaller magnitude mark the matrix as singular
pub const DEFAULT_SINGULAR_THRESHOLD: f64 = 1e-19;

/// Solver configuration
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Number of worker threads per solve
    pub num_threads: usize,
    /// Minimum accepted pivot magnitude
    pub singular_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            num_threads: thread::available_parallelism().map_or(1, |n| n.get()),
            singular_threshold: DEFAULT_SINGULAR_THRESHOLD,
        }
    }
}

impl SolverConfig {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }
}

/// Result of a successful solve
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution vector in original variable order
    pub x: Vec<f64>,
    /// Final column permutation: column `i` of the eliminated matrix holds unknown
    /// `column_order[i]`
    pub column_order: Vec<usize>,
    /// Committed pivot value of every elimination step
    pub pivots: Vec<f64>,
    /// Wall-clock time of the parallel section in seconds
    pub solve_time: f64,
}

/// Full-pivoting Gaussian elimination solver
///
/// Every call to [`GaussSolver::solve`] spawns its own workers and tears them
/// down before returning; nothing persists between solves.
#[derive(Debug, Clone)]
pub struct GaussSolver {
    config: SolverConfig,
}

impl GaussSolver {
    /// Solver with `num_threads` workers and the default threshold
    pub fn new(num_threads: usize) -> Result<Self, SolveError> {
        Self::with_config(SolverConfig::with_threads(num_threads))
    }

    pub fn with_config(config: SolverConfig) -> Result<Self, SolveError> {
        if config.num_threads == 0 {
            return Err(SolveError::InvalidThreadCount(config.num_threads));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn num_threads(&self) -> usize {
        self.config.num_threads
    }

    /// Solve Ax = b
    ///
    /// # Arguments
    /// * `a` - n×n coefficient matrix (left untouched)
    /// * `b` - right-hand side of length n (left untouched)
    ///
    /// # Returns
    /// * `Ok(Solution)` - solution and pivoting bookkeeping
    /// * `Err(SolveError::Singular)` - a pivot fell below the threshold; all
    ///   workers stopped at that step
    pub fn solve(&self, a: &Matrix<f64>, b: &[f64]) -> Result<Solution, SolveError> {
        let (rows, cols) = a.dims();
        if !a.is_square() {
            return Err(SolveError::NotSquare { rows, cols });
        }
        if b.len() != rows {
            return Err(SolveError::DimensionMismatch {
                expected: rows,
                got: b.len(),
            });
        }

        let n = rows;
        let num_threads = self.config.num_threads;
        let start = Instant::now();
        log::debug!("solving {n}x{n} system with {num_threads} threads");

        let system = SharedSystem::new(a, b);
        let barrier = CyclicBarrier::new(num_threads);
        let pivot = SharedPivotLocation::new();
        pivot.reset(0);
        let abort = AtomicBool::new(false);
        let ctx = SolveContext {
            system: &system,
            barrier: &barrier,
            pivot: &pivot,
            abort: &abort,
            singular_threshold: self.config.singular_threshold,
        };

        let outcomes = thread::scope(|s| {
            let handles: Vec<_> = (0..num_threads)
                .map(|tid| {
                    let ctx = &ctx;
                    s.spawn(move || EliminationWorker::new(tid, num_threads, ctx).run())
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| SolveError::WorkerPanicked))
                .collect::<Result<Vec<_>, _>>()
        })?;
        let solve_time = start.elapsed().as_secs_f64();

        let pivots = match outcomes.into_iter().nth(DESIGNATED_WORKER) {
            Some(WorkerOutcome::Completed { pivots }) => pivots,
            Some(WorkerOutcome::Singular { step, pivot }) => {
                log::debug!("solve aborted: singular at step {step}");
                return Err(SolveError::Singular { step, pivot });
            }
            Some(WorkerOutcome::Aborted) | None => return Err(SolveError::WorkerPanicked),
        };

        let (x, column_order) = system.into_parts();
        log::debug!("solved {n}x{n} system in {solve_time:.6}s");

        Ok(Solution {
            x,
            column_order,
            pivots,
            solve_time,
        })
    }
}

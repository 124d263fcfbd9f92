//! Per-thread elimination and back-substitution
//!
//! Every worker runs the same phase sequence; phases are separated by the shared
//! [`CyclicBarrier`]. Work is partitioned by row stride: worker `tid` of `p` owns
//! rows `start + tid, start + tid + p, ...` of whatever range the phase touches.
//!
//! Forward elimination, per step:
//!
//! | Phase          | Who        | Reads                    | Writes                       |
//! |----------------|------------|--------------------------|------------------------------|
//! | local search   | all        | own rows, trailing block | pivot cell (under lock)      |
//! | commit + check | worker 0   | pivot cell               | whole A, b, column order     |
//! | elimination    | all        | pivot row, `b[step]`     | own rows below `step`, b     |
//!
//! Back substitution, per row `i` from the bottom:
//!
//! | Phase   | Who      | Reads                      | Writes              |
//! |---------|----------|----------------------------|---------------------|
//! | divide  | worker 0 | `b[i]`, `A[i][i]`          | `x[column_order[i]]` |
//! | update  | all      | column `i`, the new `x`    | own entries of b    |

use crate::barrier::CyclicBarrier;
use crate::pivot::{PivotCandidate, SharedPivotLocation};
use crate::shared::SharedSystem;
use std::sync::atomic::{AtomicBool, Ordering};

/// Index of the worker that performs the single-participant phases
pub const DESIGNATED_WORKER: usize = 0;

/// State shared by all workers of one solve
pub(crate) struct SolveContext<'a> {
    pub system: &'a SharedSystem,
    pub barrier: &'a CyclicBarrier,
    pub pivot: &'a SharedPivotLocation,
    pub abort: &'a AtomicBool,
    pub singular_threshold: f64,
}

/// How a worker left the state machine
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WorkerOutcome {
    /// All steps ran. The designated worker reports the committed pivots.
    Completed { pivots: Vec<f64> },
    /// The designated worker found a pivot below threshold at `step`.
    /// `pivot` is NaN when no trailing entry was comparable.
    Singular { step: usize, pivot: f64 },
    /// Stopped after observing the abort flag raised by the designated worker
    Aborted,
}

pub(crate) struct EliminationWorker<'a> {
    tid: usize,
    num_threads: usize,
    ctx: &'a SolveContext<'a>,
}

impl<'a> EliminationWorker<'a> {
    pub(crate) fn new(tid: usize, num_threads: usize, ctx: &'a SolveContext<'a>) -> Self {
        debug_assert!(tid < num_threads);
        Self {
            tid,
            num_threads,
            ctx,
        }
    }

    fn is_designated(&self) -> bool {
        self.tid == DESIGNATED_WORKER
    }

    /// Rows `start + tid, start + tid + p, ...` below `end`
    fn owned_rows(&self, start: usize, end: usize) -> impl Iterator<Item = usize> {
        (start + self.tid..end).step_by(self.num_threads)
    }

    /// Run forward elimination and back substitution to completion or abort.
    ///
    /// The pivot cell must already hold the reset for step 0.
    pub(crate) fn run(&self) -> WorkerOutcome {
        let n = self.ctx.system.n();
        let mut pivots = Vec::new();
        let mut rejected = None;

        for step in 0..n {
            self.propose_local_pivot(step);
            self.ctx.barrier.wait();

            if self.is_designated() {
                match self.commit_pivot(step) {
                    Ok(value) => pivots.push(value),
                    Err(magnitude) => {
                        rejected = Some(magnitude);
                        self.ctx.abort.store(true, Ordering::Release);
                    }
                }
            }
            self.ctx.barrier.wait();

            // Checked by everyone before the next wait, so no worker is left
            // blocked at a barrier the others will never reach.
            if self.ctx.abort.load(Ordering::Acquire) {
                return match rejected {
                    Some(pivot) => WorkerOutcome::Singular { step, pivot },
                    None => WorkerOutcome::Aborted,
                };
            }

            self.eliminate_below(step);
            self.ctx.barrier.wait();
        }

        for i in (0..n).rev() {
            if self.is_designated() {
                self.solve_row(i);
            }
            self.ctx.barrier.wait();

            self.substitute_column(i);
            self.ctx.barrier.wait();
        }

        WorkerOutcome::Completed { pivots }
    }

    /// Scan owned rows of the trailing submatrix and propose the largest entry
    fn propose_local_pivot(&self, step: usize) {
        let system = self.ctx.system;
        let n = system.n();

        let mut best = PivotCandidate::new(step, step, f64::NEG_INFINITY);
        for i in self.owned_rows(step, n) {
            // SAFETY: the search phase only reads A.
            let row = unsafe { system.row(i) };
            for (j, value) in row.iter().enumerate().skip(step) {
                let magnitude = value.abs();
                if magnitude > best.magnitude {
                    best = PivotCandidate::new(i, j, magnitude);
                }
            }
        }

        self.ctx.pivot.propose(best);
    }

    /// Swap the chosen pivot into `(step, step)` and check it against the threshold.
    ///
    /// Returns the committed pivot value, or the rejected magnitude if the matrix
    /// is singular. Also resets the pivot cell for the next step; no worker
    /// proposes again until the elimination barrier has passed.
    fn commit_pivot(&self, step: usize) -> Result<f64, f64> {
        let system = self.ctx.system;
        let best = self.ctx.pivot.get();

        // NaN magnitudes fail this comparison as well
        if !(best.magnitude >= self.ctx.singular_threshold) {
            log::debug!(
                "pivot {:e} at ({}, {}) below threshold at step {}",
                best.magnitude,
                best.row,
                best.col,
                step
            );
            // Still at the reset value: every trailing entry was NaN
            if best.magnitude == f64::NEG_INFINITY {
                return Err(f64::NAN);
            }
            return Err(best.magnitude);
        }

        // SAFETY: all other workers are blocked at the barrier.
        let value = unsafe {
            system.swap_rows(step, best.row);
            system.swap_cols(step, best.col);
            system.a(step, step)
        };
        log::trace!(
            "step {}: pivot {:e} from ({}, {})",
            step,
            value,
            best.row,
            best.col
        );

        self.ctx.pivot.reset(step + 1);
        Ok(value)
    }

    /// Eliminate column `step` from the owned rows below it
    fn eliminate_below(&self, step: usize) {
        let system = self.ctx.system;
        let n = system.n();

        // SAFETY: row `step` and `b[step]` are read-only in this phase; each row
        // below it and its b entry are written by exactly one worker.
        unsafe {
            let pivot_row = system.row(step);
            let pivot_b = system.b(step);
            let diagonal = pivot_row[step];

            for i in self.owned_rows(step + 1, n) {
                let row = system.row_mut(i);
                let factor = row[step] / diagonal;
                system.set_b(i, system.b(i) - factor * pivot_b);
                for (target, source) in row[step..].iter_mut().zip(&pivot_row[step..]) {
                    *target -= factor * source;
                }
            }
        }
    }

    /// Solve row `i` of the triangular system for its unknown
    fn solve_row(&self, i: usize) {
        let system = self.ctx.system;
        // SAFETY: only the designated worker runs in this phase.
        unsafe {
            let unknown = system.column_of(i);
            system.set_x(unknown, system.b(i) / system.a(i, i));
        }
    }

    /// Move column `i` times the new unknown to the right-hand side of the
    /// owned rows above `i`
    fn substitute_column(&self, i: usize) {
        let system = self.ctx.system;
        // SAFETY: x and column `i` of A are read-only here; each `b[j]`, j < i,
        // is written by exactly one worker.
        unsafe {
            let xi = system.x(system.column_of(i));
            for j in (0..i).rev().skip(self.tid).step_by(self.num_threads) {
                system.set_b(j, system.b(j) - system.a(j, i) * xi);
            }
        }
    }
}

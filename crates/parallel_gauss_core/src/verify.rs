//! Post-solve verification
//!
//! Fork-join reductions over the original system: the relative residual
//! `‖Ax − b‖ / ‖b‖` and a weighted error norm against the known solution of the
//! odd-column right-hand side (`x[k] = k mod 2`). Work is split by row stride, each
//! thread accumulates a private partial sum, and partials are combined in thread
//! order so results are reproducible for a given thread count.

use crate::Matrix;
use std::thread;

/// Thread count used for verification given the solver's thread count
pub fn verification_threads(solver_threads: usize) -> usize {
    (solver_threads.saturating_sub(2) / 2).max(1)
}

/// Compensated (Kahan) summation
pub fn kahan_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for value in values {
        let y = value - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Run `f(tid)` on `num_threads` scoped threads and collect results in `tid` order
fn fork_join<T, F>(num_threads: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_threads)
            .map(|tid| {
                let f = &f;
                s.spawn(move || f(tid))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(value) => value,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    })
}

/// Relative residual `‖Ax − b‖₂ / ‖b‖₂`
///
/// `a` and `b` must be the original, unpermuted system. Returns NaN when `b` is
/// zero and the residual is zero, infinity when only `b` is zero.
pub fn residual_norm(a: &Matrix<f64>, x: &[f64], b: &[f64], num_threads: usize) -> f64 {
    let n = b.len();
    assert_eq!(a.dims(), (n, n));
    assert_eq!(x.len(), n);
    let num_threads = num_threads.max(1);

    // Phase 1: Ax on strided rows
    let partial_products = fork_join(num_threads, |tid| {
        (tid..n)
            .step_by(num_threads)
            .map(|i| {
                let value: f64 = a.row(i).iter().zip(x).map(|(a_ij, x_j)| a_ij * x_j).sum();
                (i, value)
            })
            .collect::<Vec<_>>()
    });
    let mut ax = vec![0.0; n];
    for (i, value) in partial_products.into_iter().flatten() {
        ax[i] = value;
    }

    // Phase 2: per-thread partial squared norms
    let partial_norms = fork_join(num_threads, |tid| {
        (tid..n)
            .step_by(num_threads)
            .fold((0.0, 0.0), |(norm_b, norm_r), i| {
                let r = ax[i] - b[i];
                (norm_b + b[i] * b[i], norm_r + r * r)
            })
    });

    let (norm_b, norm_residual) = partial_norms
        .into_iter()
        .fold((0.0, 0.0), |(sb, sr), (pb, pr)| (sb + pb, sr + pr));

    norm_residual.sqrt() / norm_b.sqrt()
}

/// Expected component of the solution for the odd-column right-hand side
pub fn expected_component(k: usize) -> f64 {
    (k % 2) as f64
}

/// Weighted error norm `sqrt(Σ ((x[k] − k mod 2) / (1 + k)²)²)`
///
/// Per-thread partial sums are combined with [`kahan_sum`].
pub fn error_norm(x: &[f64], num_threads: usize) -> f64 {
    let n = x.len();
    let num_threads = num_threads.max(1);

    let partials = fork_join(num_threads, |tid| {
        (tid..n)
            .step_by(num_threads)
            .map(|k| {
                let diff = x[k] - expected_component(k);
                let scale = 1.0 / ((1 + k) as f64).powi(2);
                (diff * scale) * (diff * scale)
            })
            .sum::<f64>()
    });

    kahan_sum(partials).sqrt()
}

/// Residual and error norms of one solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationReport {
    pub residual_norm: f64,
    pub error_norm: f64,
}

/// Compute both norms concurrently, each with `num_threads` workers
pub fn verify(a: &Matrix<f64>, x: &[f64], b: &[f64], num_threads: usize) -> VerificationReport {
    let (residual, error) = thread::scope(|s| {
        let residual = s.spawn(|| residual_norm(a, x, b, num_threads));
        let error = s.spawn(|| error_norm(x, num_threads));
        (residual.join(), error.join())
    });

    let unwrap_join = |result: thread::Result<f64>| match result {
        Ok(value) => value,
        Err(payload) => std::panic::resume_unwind(payload),
    };

    VerificationReport {
        residual_norm: unwrap_join(residual),
        error_norm: unwrap_join(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_verification_threads() {
        assert_eq!(verification_threads(1), 1);
        assert_eq!(verification_threads(2), 1);
        assert_eq!(verification_threads(4), 1);
        assert_eq!(verification_threads(6), 2);
        assert_eq!(verification_threads(11), 4);
    }

    #[test]
    fn test_kahan_sum_recovers_small_terms() {
        let mut values = vec![1.0];
        values.extend(std::iter::repeat(1e-16).take(10_000));
        let naive: f64 = values.iter().sum();
        let compensated = kahan_sum(values);

        assert_eq!(naive, 1.0);
        assert_relative_eq!(compensated - 1.0, 1e-12, max_relative = 1e-2);
    }

    #[test]
    fn test_exact_solution_has_zero_residual() {
        let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]);
        let b = vec![5.0, 10.0];
        for p in [1, 2, 3] {
            assert_eq!(residual_norm(&a, &[1.0, 3.0], &b, p), 0.0);
        }
    }

    #[test]
    fn test_residual_value() {
        // A = I, x = 0 → residual = ‖b‖ / ‖b‖ = 1
        let a = Matrix::identity(3);
        assert_relative_eq!(residual_norm(&a, &[0.0; 3], &[3.0, 0.0, 4.0], 2), 1.0);
    }

    #[test]
    fn test_error_norm() {
        let exact: Vec<f64> = (0..10).map(expected_component).collect();
        assert_eq!(error_norm(&exact, 3), 0.0);

        // Only x[1] off by 4: (4 / 2²)² = 1
        let mut off = exact.clone();
        off[1] += 4.0;
        assert_relative_eq!(error_norm(&off, 2), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_verify_is_repeatable() {
        let a = Matrix::from_rows(&[vec![3.0, 1.0, 0.5], vec![1.0, 4.0, 1.0], vec![0.2, 1.0, 5.0]]);
        let x = vec![0.1, 0.9, -0.05];
        let b = vec![1.0, 4.0, 1.0];

        let first = verify(&a, &x, &b, 2);
        let second = verify(&a, &x, &b, 2);
        assert_eq!(first.residual_norm.to_bits(), second.residual_norm.to_bits());
        assert_eq!(first.error_norm.to_bits(), second.error_norm.to_bits());
    }
}

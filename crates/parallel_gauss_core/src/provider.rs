//! System matrix providers
//!
//! Builds the coefficient matrix either from one of the closed-form test formulas
//! or from a whitespace-separated text file, and derives the right-hand side.
//!
//! # Formulas
//!
//! With 1-indexed coordinates `i, j` and dimension `n`:
//!
//! | Selector | Formula            |
//! |----------|--------------------|
//! | 1        | `n - max(i, j) + 1` |
//! | 2        | `max(i, j)`         |
//! | 3        | `|i - j|`           |
//! | 4        | `1 / (i + j - 1)` (Hilbert) |

use crate::{Matrix, ProviderError};
use std::fs;
use std::path::Path;
use std::thread;

/// Closed-form matrix formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formula {
    /// `n - max(i, j) + 1`
    NMinusMax,
    /// `max(i, j)`
    Max,
    /// `|i - j|`
    AbsDiff,
    /// `1 / (i + j - 1)`
    Hilbert,
}

impl Formula {
    /// Map a numeric selector (1..=4) to a formula
    pub fn from_selector(selector: i64) -> Result<Self, ProviderError> {
        match selector {
            1 => Ok(Formula::NMinusMax),
            2 => Ok(Formula::Max),
            3 => Ok(Formula::AbsDiff),
            4 => Ok(Formula::Hilbert),
            other => Err(ProviderError::InvalidFormula(other)),
        }
    }

    pub fn selector(&self) -> i64 {
        match self {
            Formula::NMinusMax => 1,
            Formula::Max => 2,
            Formula::AbsDiff => 3,
            Formula::Hilbert => 4,
        }
    }

    /// Entry at 1-indexed `(i, j)` of the `n`×`n` matrix
    pub fn entry(&self, n: usize, i: usize, j: usize) -> f64 {
        match self {
            Formula::NMinusMax => (n - i.max(j) + 1) as f64,
            Formula::Max => i.max(j) as f64,
            Formula::AbsDiff => i.abs_diff(j) as f64,
            Formula::Hilbert => 1.0 / (i + j - 1) as f64,
        }
    }
}

/// Generate the `n`×`n` matrix for `formula`.
///
/// Rows are split into `num_threads` contiguous blocks; the first `n % num_threads`
/// blocks get one extra row. Each block is filled by its own scoped thread.
pub fn generate(formula: Formula, n: usize, num_threads: usize) -> Matrix<f64> {
    let num_threads = num_threads.max(1);
    let mut data = vec![0.0; n * n];

    let rows_per_thread = n / num_threads;
    let remaining_rows = n % num_threads;

    thread::scope(|s| {
        let mut rest = data.as_mut_slice();
        let mut start_row = 0;
        for tid in 0..num_threads {
            let block_rows = rows_per_thread + usize::from(tid < remaining_rows);
            if block_rows == 0 {
                break;
            }
            let (block, tail) = std::mem::take(&mut rest).split_at_mut(block_rows * n);
            rest = tail;
            let first_row = start_row;
            s.spawn(move || {
                for (offset, row) in block.chunks_mut(n).enumerate() {
                    let i = first_row + offset + 1;
                    for (j, value) in row.iter_mut().enumerate() {
                        *value = formula.entry(n, i, j + 1);
                    }
                }
            });
            start_row += block_rows;
        }
    });

    log::info!(
        "generated {n}x{n} matrix with formula {} on {num_threads} threads",
        formula.selector()
    );
    Matrix::from_flat(data, n, n)
}

/// Parse `n * n` whitespace-separated numbers in row-major order.
///
/// Anything after the first `n * n` numbers is ignored.
pub fn parse_matrix(text: &str, n: usize) -> Result<Matrix<f64>, ProviderError> {
    let expected = n * n;
    let mut data = Vec::with_capacity(expected);

    for (index, token) in text.split_whitespace().take(expected).enumerate() {
        let value = token.parse::<f64>().map_err(|_| ProviderError::Parse {
            index,
            token: token.to_string(),
        })?;
        data.push(value);
    }

    if data.len() < expected {
        return Err(ProviderError::TooFewValues {
            expected,
            got: data.len(),
        });
    }

    Ok(Matrix::from_flat(data, n, n))
}

/// Read an `n`×`n` matrix from a text file (see [`parse_matrix`])
pub fn read_matrix(path: impl AsRef<Path>, n: usize) -> Result<Matrix<f64>, ProviderError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let matrix = parse_matrix(&text, n)?;
    log::info!("read {n}x{n} matrix from {}", path.display());
    Ok(matrix)
}

/// Right-hand side whose entries sum the odd-indexed columns of each row
///
/// `b[i] = A[i][1] + A[i][3] + A[i][5] + ...` (0-based columns). For a
/// non-singular A this makes the exact solution `x[k] = k mod 2`.
pub fn rhs_from_odd_columns(a: &Matrix<f64>) -> Vec<f64> {
    (0..a.rows())
        .map(|i| a.row(i).iter().skip(1).step_by(2).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_formula_selectors() {
        for selector in 1..=4 {
            let formula = Formula::from_selector(selector).unwrap();
            assert_eq!(formula.selector(), selector);
        }
        assert!(matches!(
            Formula::from_selector(0),
            Err(ProviderError::InvalidFormula(0))
        ));
        assert!(matches!(
            Formula::from_selector(5),
            Err(ProviderError::InvalidFormula(5))
        ));
    }

    #[test]
    fn test_formula_entries() {
        let n = 4;
        assert_eq!(Formula::NMinusMax.entry(n, 1, 1), 4.0);
        assert_eq!(Formula::NMinusMax.entry(n, 2, 4), 1.0);
        assert_eq!(Formula::Max.entry(n, 3, 2), 3.0);
        assert_eq!(Formula::AbsDiff.entry(n, 1, 4), 3.0);
        assert_eq!(Formula::AbsDiff.entry(n, 4, 1), 3.0);
        assert_eq!(Formula::Hilbert.entry(n, 1, 1), 1.0);
        assert_relative_eq!(Formula::Hilbert.entry(n, 2, 3), 0.25);
    }

    #[test]
    fn test_generate_independent_of_thread_count() {
        let reference = generate(Formula::Hilbert, 7, 1);
        for p in [2, 3, 4, 7, 10] {
            assert_eq!(generate(Formula::Hilbert, 7, p), reference, "p = {p}");
        }
        assert_eq!(*reference.get(6, 6), 1.0 / 13.0);
    }

    #[test]
    fn test_generate_small() {
        let m = generate(Formula::NMinusMax, 3, 2);
        assert_eq!(m.row(0), &[3.0, 2.0, 1.0]);
        assert_eq!(m.row(1), &[2.0, 2.0, 1.0]);
        assert_eq!(m.row(2), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_parse_matrix() {
        let m = parse_matrix("1 2\n3\t4.5\n  99", 2).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.5]);

        assert!(matches!(
            parse_matrix("1 2 3", 2),
            Err(ProviderError::TooFewValues { expected: 4, got: 3 })
        ));
        assert!(matches!(
            parse_matrix("1 x 3 4", 2),
            Err(ProviderError::Parse { index: 1, .. })
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_matrix("/nonexistent/parallel-gauss/matrix.txt", 2).unwrap_err();
        assert!(matches!(err, ProviderError::Io { .. }));
    }

    #[test]
    fn test_rhs_from_odd_columns() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![0.5, 0.5, 0.5, 0.5, 0.5]]);
        assert_eq!(rhs_from_odd_columns(&a), vec![6.0, 1.0]);
        assert_eq!(rhs_from_odd_columns(&Matrix::identity(1)), vec![0.0]);
    }
}

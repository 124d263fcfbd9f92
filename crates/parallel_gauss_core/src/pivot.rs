//! Shared pivot location for full pivoting
//!
//! Workers search disjoint row strides of the trailing submatrix and propose their
//! local maxima here. The cell keeps the candidate's magnitude next to its location,
//! so the compare-and-replace never has to read the matrix under the lock.

use parking_lot::Mutex;

/// A pivot candidate: location in the working matrix and its magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotCandidate {
    pub row: usize,
    pub col: usize,
    pub magnitude: f64,
}

impl PivotCandidate {
    pub fn new(row: usize, col: usize, magnitude: f64) -> Self {
        Self {
            row,
            col,
            magnitude,
        }
    }

    /// Whether `self` should replace `current` as the best pivot.
    ///
    /// Strictly larger magnitude wins. On equal magnitude the candidate earlier in
    /// row-major order wins, which is the entry a sequential scan meets first.
    pub fn beats(&self, current: &PivotCandidate) -> bool {
        self.magnitude > current.magnitude
            || (self.magnitude == current.magnitude
                && (self.row, self.col) < (current.row, current.col))
    }
}

/// Globally best pivot candidate for the current elimination step
#[derive(Debug)]
pub struct SharedPivotLocation {
    best: Mutex<PivotCandidate>,
}

impl SharedPivotLocation {
    pub fn new() -> Self {
        Self {
            best: Mutex::new(PivotCandidate::new(0, 0, f64::NEG_INFINITY)),
        }
    }

    /// Reset to the diagonal position of `step`.
    ///
    /// The reset carries no magnitude, so any real proposal replaces it. If nothing
    /// is proposed the magnitude stays at negative infinity and reads as singular.
    pub fn reset(&self, step: usize) {
        *self.best.lock() = PivotCandidate::new(step, step, f64::NEG_INFINITY);
    }

    /// Replace the recorded best with `candidate` if it beats it.
    ///
    /// Returns whether the candidate was installed.
    pub fn propose(&self, candidate: PivotCandidate) -> bool {
        let mut best = self.best.lock();
        if candidate.beats(&best) {
            *best = candidate;
            true
        } else {
            false
        }
    }

    /// Current best candidate
    pub fn get(&self) -> PivotCandidate {
        *self.best.lock()
    }
}

impl Default for SharedPivotLocation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_larger_magnitude_wins() {
        let cell = SharedPivotLocation::new();
        cell.reset(0);
        assert!(cell.propose(PivotCandidate::new(0, 0, 1.0)));
        assert!(cell.propose(PivotCandidate::new(2, 1, 3.0)));
        assert!(!cell.propose(PivotCandidate::new(1, 1, 2.0)));
        assert_eq!(cell.get(), PivotCandidate::new(2, 1, 3.0));
    }

    #[test]
    fn test_ties_keep_earliest_position() {
        let cell = SharedPivotLocation::new();
        cell.reset(1);
        assert!(cell.propose(PivotCandidate::new(1, 1, 0.5)));
        assert!(cell.propose(PivotCandidate::new(3, 2, 4.0)));
        // Same magnitude, later in row-major order
        assert!(!cell.propose(PivotCandidate::new(3, 4, 4.0)));
        assert!(!cell.propose(PivotCandidate::new(5, 1, 4.0)));
        // Same magnitude, earlier in row-major order
        assert!(cell.propose(PivotCandidate::new(2, 3, 4.0)));
        assert_eq!(cell.get(), PivotCandidate::new(2, 3, 4.0));
    }

    #[test]
    fn test_reset_installs_diagonal() {
        let cell = SharedPivotLocation::new();
        cell.propose(PivotCandidate::new(4, 4, 9.0));
        cell.reset(2);
        let best = cell.get();
        assert_eq!((best.row, best.col), (2, 2));
        // A zero diagonal still replaces the reset
        assert!(cell.propose(PivotCandidate::new(2, 2, 0.0)));
    }

    #[test]
    fn test_nan_never_installed() {
        let cell = SharedPivotLocation::new();
        cell.reset(0);
        assert!(cell.propose(PivotCandidate::new(0, 0, 1.0)));
        assert!(!cell.propose(PivotCandidate::new(1, 1, f64::NAN)));
        assert_eq!(cell.get().row, 0);
    }

    #[test]
    fn test_concurrent_proposals_find_maximum() {
        let cell = SharedPivotLocation::new();
        cell.reset(0);

        thread::scope(|s| {
            for tid in 0..8usize {
                let cell = &cell;
                s.spawn(move || {
                    for k in 0..100usize {
                        let row = tid + 8 * k;
                        cell.propose(PivotCandidate::new(row, 0, (row % 97) as f64));
                    }
                });
            }
        });

        // 96 is the largest residue; row 96 is its first occurrence
        assert_eq!(cell.get(), PivotCandidate::new(96, 0, 96.0));
    }
}

//! Working system shared by all elimination workers
//!
//! Holds the private copies of A and b, the column permutation and the solution
//! vector behind interior mutability. The accessors are `unsafe`: callers uphold the
//! phase discipline of the elimination workers, where within one barrier-delimited
//! phase every written element is owned by exactly one worker and no element is
//! written while another worker reads it.

use crate::Matrix;
use std::cell::UnsafeCell;
use std::ops::Range;

/// Fixed-size buffer writable through a shared reference
pub(crate) struct SharedBuf<T> {
    cells: Box<[UnsafeCell<T>]>,
}

// SAFETY: concurrent access is coordinated by the caller (see module docs); the
// buffer itself only hands out element copies and slices of disjoint ranges.
unsafe impl<T: Send> Sync for SharedBuf<T> {}

impl<T: Copy> SharedBuf<T> {
    pub(crate) fn from_vec(data: Vec<T>) -> Self {
        Self {
            cells: data.into_iter().map(UnsafeCell::new).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    fn base_ptr(&self) -> *mut T {
        // UnsafeCell<T> is repr(transparent), so [UnsafeCell<T>] has the layout of [T]
        self.cells.as_ptr() as *mut T
    }

    /// # Safety
    /// No other thread may write element `i` during the current phase.
    #[inline]
    pub(crate) unsafe fn read(&self, i: usize) -> T {
        *self.cells[i].get()
    }

    /// # Safety
    /// The caller must be the only thread touching element `i` during the current phase.
    #[inline]
    pub(crate) unsafe fn write(&self, i: usize, value: T) {
        *self.cells[i].get() = value;
    }

    /// # Safety
    /// The caller must be the only thread touching elements `i` and `j` during the
    /// current phase.
    #[inline]
    pub(crate) unsafe fn swap(&self, i: usize, j: usize) {
        if i != j {
            std::ptr::swap(self.cells[i].get(), self.cells[j].get());
        }
    }

    /// # Safety
    /// No other thread may write inside `range` while the slice is alive.
    #[inline]
    pub(crate) unsafe fn slice(&self, range: Range<usize>) -> &[T] {
        assert!(range.start <= range.end && range.end <= self.cells.len());
        std::slice::from_raw_parts(self.base_ptr().add(range.start), range.len())
    }

    /// # Safety
    /// No other thread may read or write inside `range` while the slice is alive.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn slice_mut(&self, range: Range<usize>) -> &mut [T] {
        assert!(range.start <= range.end && range.end <= self.cells.len());
        std::slice::from_raw_parts_mut(self.base_ptr().add(range.start), range.len())
    }

    pub(crate) fn into_vec(self) -> Vec<T> {
        self.cells
            .into_vec()
            .into_iter()
            .map(UnsafeCell::into_inner)
            .collect()
    }
}

/// The n×n working system `A·x = b` plus column bookkeeping
pub(crate) struct SharedSystem {
    n: usize,
    a: SharedBuf<f64>,
    b: SharedBuf<f64>,
    column_order: SharedBuf<usize>,
    x: SharedBuf<f64>,
}

impl SharedSystem {
    /// Copy `a` and `b` into a fresh working system with identity column order
    pub(crate) fn new(a: &Matrix<f64>, b: &[f64]) -> Self {
        let n = b.len();
        debug_assert_eq!(a.dims(), (n, n));
        Self {
            n,
            a: SharedBuf::from_vec(a.as_slice().to_vec()),
            b: SharedBuf::from_vec(b.to_vec()),
            column_order: SharedBuf::from_vec((0..n).collect()),
            x: SharedBuf::from_vec(vec![0.0; n]),
        }
    }

    pub(crate) fn n(&self) -> usize {
        self.n
    }

    /// # Safety
    /// No other thread may write `A[i][j]` during the current phase.
    #[inline]
    pub(crate) unsafe fn a(&self, i: usize, j: usize) -> f64 {
        self.a.read(i * self.n + j)
    }

    /// # Safety
    /// No other thread may write row `i` of A while the slice is alive.
    #[inline]
    pub(crate) unsafe fn row(&self, i: usize) -> &[f64] {
        self.a.slice(i * self.n..(i + 1) * self.n)
    }

    /// # Safety
    /// No other thread may access row `i` of A while the slice is alive.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn row_mut(&self, i: usize) -> &mut [f64] {
        self.a.slice_mut(i * self.n..(i + 1) * self.n)
    }

    /// # Safety
    /// No other thread may write `b[i]` during the current phase.
    #[inline]
    pub(crate) unsafe fn b(&self, i: usize) -> f64 {
        self.b.read(i)
    }

    /// # Safety
    /// The caller must own `b[i]` during the current phase.
    #[inline]
    pub(crate) unsafe fn set_b(&self, i: usize, value: f64) {
        self.b.write(i, value);
    }

    /// # Safety
    /// No other thread may write `column_order[i]` during the current phase.
    #[inline]
    pub(crate) unsafe fn column_of(&self, i: usize) -> usize {
        self.column_order.read(i)
    }

    /// # Safety
    /// No other thread may write `x[k]` during the current phase.
    #[inline]
    pub(crate) unsafe fn x(&self, k: usize) -> f64 {
        self.x.read(k)
    }

    /// # Safety
    /// The caller must own `x[k]` during the current phase.
    #[inline]
    pub(crate) unsafe fn set_x(&self, k: usize, value: f64) {
        self.x.write(k, value);
    }

    /// Swap rows `r1` and `r2` of A together with the matching entries of b.
    ///
    /// # Safety
    /// The caller must be the only thread accessing the system during this phase.
    pub(crate) unsafe fn swap_rows(&self, r1: usize, r2: usize) {
        if r1 == r2 {
            return;
        }
        for j in 0..self.n {
            self.a.swap(r1 * self.n + j, r2 * self.n + j);
        }
        self.b.swap(r1, r2);
    }

    /// Swap columns `c1` and `c2` across every row of A and record it in the
    /// column order.
    ///
    /// # Safety
    /// The caller must be the only thread accessing the system during this phase.
    pub(crate) unsafe fn swap_cols(&self, c1: usize, c2: usize) {
        if c1 == c2 {
            return;
        }
        for i in 0..self.n {
            self.a.swap(i * self.n + c1, i * self.n + c2);
        }
        self.column_order.swap(c1, c2);
    }

    /// Tear down after all workers have been joined
    pub(crate) fn into_parts(self) -> (Vec<f64>, Vec<usize>) {
        debug_assert_eq!(self.x.len(), self.n);
        (self.x.into_vec(), self.column_order.into_vec())
    }
}

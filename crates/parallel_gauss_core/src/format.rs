//! Plain-text rendering of matrices and vectors
//!
//! Entries use scientific notation with three decimals, right-aligned to ten
//! characters and followed by a space.

use crate::Matrix;
use std::fmt::Write;

fn push_entry(out: &mut String, value: f64) {
    // Writing into a String cannot fail
    let _ = write!(out, "{value:>10.3e} ");
}

/// Leading `m`×`m` block of `a`, one row per line
pub fn format_matrix(a: &Matrix<f64>, m: usize) -> String {
    let m = m.min(a.rows()).min(a.cols());
    let mut out = String::new();
    for i in 0..m {
        for &value in &a.row(i)[..m] {
            push_entry(&mut out, value);
        }
        out.push('\n');
    }
    out
}

/// First `m` entries of `v` on a single line
pub fn format_vector(v: &[f64], m: usize) -> String {
    let mut out = String::new();
    for &value in v.iter().take(m) {
        push_entry(&mut out, value);
    }
    out.push('\n');
    out
}

//! Small dense linear algebra helpers for feature computation.

use nalgebra::DMatrix;
use ndarray::Array2;

use std::cmp::Ordering;

/// Eigenvalues of a real symmetric matrix, largest first.
pub fn symmetric_eigenvalues(matrix: &Array2<f64>) -> Vec<f64> {
    let n = matrix.nrows();
    let m = DMatrix::from_fn(n, n, |r, c| matrix[[r, c]]);
    let mut eigenvalues: Vec<f64> = m.symmetric_eigenvalues().iter().cloned().collect();
    eigenvalues.sort_by(|x, y| y.partial_cmp(x).unwrap_or(Ordering::Equal));
    eigenvalues
}

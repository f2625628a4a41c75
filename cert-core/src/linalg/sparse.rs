//! Sparse matrix helpers.
//!
//! The quadratic form Q of the certification problem is a symmetric sparse
//! matrix stored in CSC format, upper triangle only. That convention halves
//! storage and matches what the LDL^T factorization in [`super::ldl`]
//! expects, so the symmetric matrix-vector product here reconstructs the
//! lower triangle on the fly.

use sprs::{CsMat, TriMat};

/// Sparse symmetric matrix in CSC format (upper triangle only).
pub type SparseSymmetricCsc = CsMat<f64>;

/// Build a symmetric sparse CSC matrix from upper triangle triplets.
///
/// Only stores the upper triangle. Assumes triplets satisfy j >= i.
/// Duplicate entries are summed.
pub fn from_triplets_symmetric<I>(n: usize, triplets: I) -> SparseSymmetricCsc
where
    I: IntoIterator<Item = (usize, usize, f64)>,
{
    let mut tri = TriMat::new((n, n));
    for (i, j, v) in triplets {
        assert!(j >= i, "symmetric matrix must only contain upper triangle");
        tri.add_triplet(i, j, v);
    }
    tri.to_csc()
}

/// Create a diagonal matrix in CSC format.
pub fn diagonal(diag: &[f64]) -> SparseSymmetricCsc {
    let n = diag.len();
    from_triplets_symmetric(n, diag.iter().enumerate().map(|(i, &v)| (i, i, v)))
}

/// Symmetric matrix-vector product y = A x, with A stored as its upper
/// triangle. Each off-diagonal entry contributes to both rows it mirrors.
pub fn spmv_symmetric(a: &SparseSymmetricCsc, x: &[f64], y: &mut [f64]) {
    assert_eq!(a.cols(), x.len());
    assert_eq!(a.rows(), y.len());

    y.fill(0.0);
    for (val, (row, col)) in a.iter() {
        y[row] += *val * x[col];
        if row != col {
            y[col] += *val * x[row];
        }
    }
}

//! Sparse and dense linear algebra helpers.

pub mod ldl;
pub mod sparse;

pub use ldl::{LdlError, ProxyFactor};
pub use sparse::{SparseSymmetricCsc, from_triplets_symmetric, spmv_symmetric};

/// y += alpha * x
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axpy() {
        let x = vec![1.0, 2.0];
        let mut y = vec![10.0, 20.0];
        axpy(-2.0, &x, &mut y);
        assert_eq!(y, vec![8.0, 16.0]);
    }
}

//! Call-scoped LDL^T factorization of a positive-definite proxy of Q.
//!
//! When a certification call expects many operator applications, Q x can be
//! reproduced from a precomputed factorization L D L^T = Q + sigma*I instead
//! of a fresh sparse multiply: Q x = L D L^T x - sigma*x. The factor is
//! built once per certification call and dropped at return, so a Q that
//! changes between calls can never be paired with a stale factor.
//!
//! Uses the `ldl` crate for the elimination tree and numeric factorization.

use sprs::TriMat;
use thiserror::Error;

use super::sparse::SparseSymmetricCsc;

/// Relative diagonal shift defining the positive-definite proxy Q + sigma*I.
const PROXY_SHIFT_REL: f64 = 1e-10;

/// Proxy factorization errors.
#[derive(Error, Debug)]
pub enum LdlError {
    /// Factorization failed (proxy matrix not positive definite).
    #[error("factorization failed: proxy of Q is not positive definite")]
    FactorizationFailed,
}

/// LDL^T factorization of Q + sigma*I, consumed as a product, not a solve.
///
/// L is unit lower triangular in CSC format with the unit diagonal implicit,
/// D is a positive diagonal.
pub struct ProxyFactor {
    n: usize,
    sigma: f64,
    l_p: Vec<usize>,
    l_i: Vec<usize>,
    l_x: Vec<f64>,
    d: Vec<f64>,
}

impl ProxyFactor {
    /// Factor Q + sigma*I for a symmetric Q given as its upper triangle.
    ///
    /// sigma is scaled to the largest diagonal magnitude of Q so the proxy
    /// is positive definite whenever Q is positive semidefinite; the shift
    /// is subtracted back exactly in [`ProxyFactor::apply_q`].
    pub fn new(q: &SparseSymmetricCsc) -> Result<Self, LdlError> {
        assert_eq!(q.rows(), q.cols(), "quadratic form must be square");
        let n = q.rows();

        let mut diag_max = 0.0_f64;
        for (val, (row, col)) in q.iter() {
            if row == col {
                diag_max = diag_max.max(val.abs());
            }
        }
        let sigma = PROXY_SHIFT_REL * (1.0 + diag_max);

        // Rebuild the pattern with an explicit diagonal: the factorization
        // requires every diagonal entry to be present, and Q may omit zeros.
        let mut tri = TriMat::new((n, n));
        for (val, (row, col)) in q.iter() {
            tri.add_triplet(row, col, *val);
        }
        for i in 0..n {
            tri.add_triplet(i, i, sigma);
        }
        let proxy = tri.to_csc();

        let indptr = proxy.indptr();
        let a_p = indptr.raw_storage();
        let a_i = proxy.indices();
        let a_x = proxy.data();

        let mut work = vec![0; n];
        let mut l_nz = vec![0; n];
        let mut etree = vec![None; n];
        ldl::etree(n, a_p, a_i, &mut work, &mut l_nz, &mut etree)
            .map_err(|_| LdlError::FactorizationFailed)?;

        let nnz_l: usize = l_nz.iter().sum();
        let mut l_p = vec![0; n + 1];
        let mut l_i = vec![0; nnz_l];
        let mut l_x = vec![0.0; nnz_l];
        let mut d = vec![0.0; n];
        let mut d_inv = vec![0.0; n];
        let mut bwork = vec![ldl::Marker::Unused; n];
        let mut iwork = vec![0; 3 * n];
        let mut fwork = vec![0.0; n];

        ldl::factor(
            n,
            a_p,
            a_i,
            a_x,
            &mut l_p,
            &mut l_i,
            &mut l_x,
            &mut d,
            &mut d_inv,
            &l_nz,
            &etree,
            &mut bwork,
            &mut iwork,
            &mut fwork,
        )
        .map_err(|_| LdlError::FactorizationFailed)?;

        // A Cholesky-compatible proxy needs D > 0; an indefinite Q that is
        // too far from positive semidefinite shows up here.
        if d.iter().any(|&di| !(di > 0.0)) {
            return Err(LdlError::FactorizationFailed);
        }

        Ok(Self { n, sigma, l_p, l_i, l_x, d })
    }

    /// Dimension of the factored matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Diagonal shift sigma of the proxy.
    pub fn shift(&self) -> f64 {
        self.sigma
    }

    /// y = (Q + sigma*I) x, computed as L (D (L^T x)).
    pub fn apply(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n);
        assert_eq!(y.len(), self.n);

        // t = D L^T x, with the unit diagonal of L implicit
        let mut t = vec![0.0; self.n];
        for j in 0..self.n {
            let mut acc = x[j];
            for idx in self.l_p[j]..self.l_p[j + 1] {
                acc += self.l_x[idx] * x[self.l_i[idx]];
            }
            t[j] = acc * self.d[j];
        }

        // y = L t
        y.copy_from_slice(&t);
        for j in 0..self.n {
            let tj = t[j];
            for idx in self.l_p[j]..self.l_p[j + 1] {
                y[self.l_i[idx]] += self.l_x[idx] * tj;
            }
        }
    }

    /// y = Q x, recovered from the factor as L D L^T x - sigma*x.
    ///
    /// Agrees with the direct sparse multiply up to rounding.
    pub fn apply_q(&self, x: &[f64], y: &mut [f64]) {
        self.apply(x, y);
        super::axpy(-self.sigma, x, y);
    }
}

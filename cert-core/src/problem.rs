//! Problem data structures and certification settings.
//!
//! The certification routine never forms Q - Lambda. It sees the problem
//! through the [`ProblemData`] trait (dimensions plus a Q-multiply) and the
//! Lagrange multiplier through [`BlockDiagMultiplier`]. Settings and the
//! certification result live here as well.

use crate::linalg::sparse::{self, SparseSymmetricCsc};

/// Problem-data capability: dimensions and the quadratic form Q.
///
/// `n` is the number of problem variables, `d` the block (embedding)
/// dimension; every vector the operator touches has length N = n * d.
pub trait ProblemData {
    /// Number of problem variables n.
    fn num_vars(&self) -> usize;

    /// Block / embedding dimension d.
    fn block_dim(&self) -> usize;

    /// Total operator dimension N = n * d.
    fn dim(&self) -> usize {
        self.num_vars() * self.block_dim()
    }

    /// y = Q x. Both slices have length `dim()`.
    fn apply_q(&self, x: &[f64], y: &mut [f64]);

    /// Upper-triangle CSC view of Q, used by the factorization fast path.
    fn quadratic_form(&self) -> &SparseSymmetricCsc;
}

/// Problem data backed by a sparse symmetric Q in CSC upper-triangle form.
#[derive(Debug, Clone)]
pub struct SparseProblem {
    n: usize,
    d: usize,
    q: SparseSymmetricCsc,
}

impl SparseProblem {
    /// Wrap an n*d x n*d quadratic form.
    pub fn new(n: usize, d: usize, q: SparseSymmetricCsc) -> Self {
        assert_eq!(q.rows(), n * d, "Q must be (n*d) x (n*d)");
        assert_eq!(q.cols(), n * d, "Q must be (n*d) x (n*d)");
        Self { n, d, q }
    }

    /// Build the quadratic form from upper triangle triplets.
    pub fn from_triplets<I>(n: usize, d: usize, triplets: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        Self::new(n, d, sparse::from_triplets_symmetric(n * d, triplets))
    }
}

impl ProblemData for SparseProblem {
    fn num_vars(&self) -> usize {
        self.n
    }

    fn block_dim(&self) -> usize {
        self.d
    }

    fn apply_q(&self, x: &[f64], y: &mut [f64]) {
        sparse::spmv_symmetric(&self.q, x, y);
    }

    fn quadratic_form(&self) -> &SparseSymmetricCsc {
        &self.q
    }
}

/// Block-diagonal Lagrange multiplier Lambda.
///
/// n symmetric d x d blocks stored row-major, block k owning the index
/// range [k*d, (k+1)*d) of the operator.
#[derive(Debug, Clone)]
pub struct BlockDiagMultiplier {
    d: usize,
    blocks: Vec<f64>,
}

impl BlockDiagMultiplier {
    /// n zero blocks of size d x d.
    pub fn zeros(n: usize, d: usize) -> Self {
        assert!(d > 0, "block dimension must be positive");
        Self {
            d,
            blocks: vec![0.0; n * d * d],
        }
    }

    /// n copies of c * I_d on the diagonal.
    pub fn scaled_identity(n: usize, d: usize, c: f64) -> Self {
        let mut out = Self::zeros(n, d);
        for k in 0..n {
            let block = out.block_mut(k);
            for i in 0..d {
                block[i * d + i] = c;
            }
        }
        out
    }

    /// Number of diagonal blocks n.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len() / (self.d * self.d)
    }

    /// Block dimension d.
    pub fn block_dim(&self) -> usize {
        self.d
    }

    /// Total dimension n * d.
    pub fn dim(&self) -> usize {
        self.num_blocks() * self.d
    }

    /// Row-major view of block k.
    pub fn block(&self, k: usize) -> &[f64] {
        let sz = self.d * self.d;
        &self.blocks[k * sz..(k + 1) * sz]
    }

    /// Mutable row-major view of block k.
    pub fn block_mut(&mut self, k: usize) -> &mut [f64] {
        let sz = self.d * self.d;
        &mut self.blocks[k * sz..(k + 1) * sz]
    }

    /// y = Lambda x, block by block.
    pub fn apply(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.dim());
        assert_eq!(y.len(), self.dim());

        let d = self.d;
        for k in 0..self.num_blocks() {
            let block = self.block(k);
            let xk = &x[k * d..(k + 1) * d];
            let yk = &mut y[k * d..(k + 1) * d];
            for i in 0..d {
                let mut acc = 0.0;
                for j in 0..d {
                    acc += block[i * d + j] * xk[j];
                }
                yk[i] = acc;
            }
        }
    }
}

/// Settings for one certification call.
#[derive(Debug, Clone)]
pub struct CertifySettings {
    /// Relative convergence tolerance for the eigensolver.
    pub tol: f64,

    /// Iteration cap passed to the eigensolver (None = solver default).
    pub max_iter: Option<usize>,

    /// Reproduce Q x from a call-scoped LDL^T factor of Q + sigma*I instead
    /// of a sparse multiply per application.
    pub use_factorization: bool,

    /// Seed for the warm-start perturbation and the default solver's
    /// starting vector. None draws from entropy.
    pub seed: Option<u64>,

    /// Promote per-phase diagnostics from debug to info level.
    pub verbose: bool,
}

impl Default for CertifySettings {
    fn default() -> Self {
        Self {
            tol: f64::EPSILON,
            max_iter: None,
            use_factorization: true,
            seed: None,
            verbose: false,
        }
    }
}

/// Result of a certification call.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// Algebraically smallest eigenvalue of Q - Lambda.
    pub lambda_min: f64,

    /// Eigenvector for `lambda_min`, length n * d, normalized by the
    /// eigensolver's convention (unit norm for the built-in backend).
    pub v_min: Vec<f64>,

    /// Whether the last executed solver phase met its tolerance. A false
    /// value is a soft signal; the sign of `lambda_min` is often still
    /// usable as a direction of improvement.
    pub converged: bool,

    /// Largest-magnitude eigenvalue found by the probe phase.
    pub probe_value: f64,

    /// Number of eigensolver invocations (1 = fast path, 2 = shifted).
    pub solves: usize,
}

impl Certificate {
    /// True when `lambda_min >= -eta`, i.e. the candidate is certified
    /// globally optimal up to the caller's tolerance eta.
    pub fn certifies(&self, eta: f64) -> bool {
        self.lambda_min >= -eta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_multiplier_apply() {
        // Two 2x2 blocks: [[1, 2], [2, 5]] and [[0, -1], [-1, 3]]
        let mut lambda = BlockDiagMultiplier::zeros(2, 2);
        lambda.block_mut(0).copy_from_slice(&[1.0, 2.0, 2.0, 5.0]);
        lambda.block_mut(1).copy_from_slice(&[0.0, -1.0, -1.0, 3.0]);
        assert_eq!(lambda.num_blocks(), 2);
        assert_eq!(lambda.dim(), 4);

        let x = vec![1.0, 1.0, 2.0, -1.0];
        let mut y = vec![0.0; 4];
        lambda.apply(&x, &mut y);
        assert_eq!(y, vec![3.0, 7.0, 1.0, -5.0]);
    }

    #[test]
    fn test_scaled_identity() {
        let lambda = BlockDiagMultiplier::scaled_identity(3, 2, 2.5);
        let x = vec![1.0; 6];
        let mut y = vec![0.0; 6];
        lambda.apply(&x, &mut y);
        assert!(y.iter().all(|&v| (v - 2.5).abs() < 1e-15));
    }

    #[test]
    fn test_sparse_problem_dimensions() {
        let problem = SparseProblem::from_triplets(3, 2, vec![(0, 0, 1.0), (5, 5, 2.0)]);
        assert_eq!(problem.num_vars(), 3);
        assert_eq!(problem.block_dim(), 2);
        assert_eq!(problem.dim(), 6);

        let x = vec![1.0; 6];
        let mut y = vec![0.0; 6];
        problem.apply_q(&x, &mut y);
        assert_eq!(y, vec![1.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_certificate_certifies() {
        let cert = Certificate {
            lambda_min: -1e-8,
            v_min: vec![1.0],
            converged: true,
            probe_value: 2.0,
            solves: 2,
        };
        assert!(cert.certifies(1e-6));
        assert!(!cert.certifies(1e-10));
    }
}

//! Restarted Lanczos backend for the largest-magnitude eigenpair.
//!
//! Full reorthogonalization keeps the Krylov basis independent, and the
//! Rayleigh-Ritz step solves the projected tridiagonal problem densely.
//! When the Krylov space stops growing before the basis is full (an
//! invariant subspace, e.g. a warm start sitting on an exact eigenvector),
//! the basis is continued in a random direction orthogonal to everything
//! found so far instead of stalling there.
//!
//! Small operators skip the iteration entirely: the operator is materialized
//! column by column and handed to a dense symmetric eigendecomposition.

use std::cmp::Ordering;

use nalgebra::linalg::SymmetricEigen;
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{EigError, EigOptions, EigenPair, ExtremalEigSolver};
use crate::operator::SymmetricOperator;

/// Basis growth below this norm counts as an invariant subspace.
const BREAKDOWN_TOL: f64 = 1e-12;

/// Restarted Lanczos solver with full reorthogonalization.
#[derive(Debug, Clone)]
pub struct LanczosSolver {
    /// Krylov basis size per restart cycle.
    pub basis_size: usize,
    /// Matrix-vector product budget when the caller gives no cap.
    pub default_max_iter: usize,
    /// Seed for the starting vector and breakdown restarts (None = entropy).
    pub seed: Option<u64>,
}

impl Default for LanczosSolver {
    fn default() -> Self {
        Self {
            basis_size: 50,
            default_max_iter: 300,
            seed: None,
        }
    }
}

impl LanczosSolver {
    /// Solver with explicit basis size and default iteration budget.
    pub fn new(basis_size: usize, default_max_iter: usize) -> Self {
        assert!(basis_size >= 2, "Lanczos basis must hold at least 2 vectors");
        Self {
            basis_size,
            default_max_iter,
            seed: None,
        }
    }

    /// Fix the random seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> Xoshiro256PlusPlus {
        match self.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        }
    }

    /// Materialize the operator and solve densely. Exact for its size, used
    /// when the Krylov basis would cover the whole space anyway.
    fn dense_fallback(&self, op: &dyn SymmetricOperator) -> EigenPair {
        let n = op.dim();
        let mut a = DMatrix::zeros(n, n);
        let mut e = vec![0.0; n];
        let mut col = vec![0.0; n];
        for j in 0..n {
            e[j] = 1.0;
            op.apply_into(&e, &mut col);
            e[j] = 0.0;
            for i in 0..n {
                a[(i, j)] = col[i];
            }
        }

        let eig = SymmetricEigen::new(a);
        let (idx, value) = eig
            .eigenvalues
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.abs().partial_cmp(&b.abs()).unwrap_or(Ordering::Equal)
            })
            .map(|(i, &v)| (i, v))
            .expect("dense eigendecomposition of a non-empty operator");

        EigenPair {
            value,
            vector: eig.eigenvectors.column(idx).iter().copied().collect(),
            converged: true,
            iterations: n,
        }
    }
}

impl ExtremalEigSolver for LanczosSolver {
    fn largest_magnitude(
        &self,
        op: &dyn SymmetricOperator,
        opts: &EigOptions,
    ) -> Result<EigenPair, EigError> {
        let n = op.dim();
        if n == 0 {
            return Err(EigError::EmptyOperator);
        }
        let budget = opts.max_iter.unwrap_or(self.default_max_iter).max(1);

        // A full-size basis is a dense solve in disguise; do it directly.
        if n <= self.basis_size && budget >= n {
            return Ok(self.dense_fallback(op));
        }

        let mut rng = self.rng();
        let mut v: DVector<f64> = match &opts.v0 {
            Some(v0) => {
                if v0.len() != n {
                    return Err(EigError::DimensionMismatch {
                        expected: n,
                        actual: v0.len(),
                    });
                }
                DVector::from_column_slice(v0)
            }
            None => DVector::from_fn(n, |_, _| rng.gen::<f64>() - 0.5),
        };
        let norm = v.norm();
        if !norm.is_finite() || norm <= 0.0 {
            return Err(EigError::ZeroInitialVector);
        }
        v /= norm;

        let m_cap = self.basis_size.min(n);
        let threshold_tol = opts.tol.max(f64::EPSILON);
        let mut w = DVector::zeros(n);
        let mut used = 0usize;

        loop {
            // One restart cycle: grow a Krylov basis from v.
            let mut vs: Vec<DVector<f64>> = vec![v.clone()];
            let mut alpha: Vec<f64> = Vec::with_capacity(m_cap);
            let mut beta: Vec<f64> = Vec::with_capacity(m_cap);
            let mut resid_bound = 0.0;
            let mut invariant = false;

            while alpha.len() < m_cap && used < budget {
                let vj = vs[alpha.len()].clone();
                op.apply_into(vj.as_slice(), w.as_mut_slice());
                used += 1;

                let a = vj.dot(&w);
                alpha.push(a);

                let mut r = w.clone();
                r.axpy(-a, &vj, 1.0);
                if let Some(&b_prev) = beta.last() {
                    let prev = &vs[vs.len() - 2];
                    r.axpy(-b_prev, prev, 1.0);
                }
                // Full reorthogonalization, twice for stability
                for _ in 0..2 {
                    for u in &vs {
                        let c = u.dot(&r);
                        r.axpy(-c, u, 1.0);
                    }
                }

                let b = r.norm();
                resid_bound = b;
                if b <= BREAKDOWN_TOL {
                    // Invariant subspace. Continue in a random orthogonal
                    // direction; if none exists the basis spans everything.
                    let mut fresh: DVector<f64> =
                        DVector::from_fn(n, |_, _| rng.gen::<f64>() - 0.5);
                    for u in &vs {
                        let c = u.dot(&fresh);
                        fresh.axpy(-c, u, 1.0);
                    }
                    let fb = fresh.norm();
                    if fb <= BREAKDOWN_TOL {
                        invariant = true;
                        break;
                    }
                    if alpha.len() == m_cap || used >= budget {
                        break;
                    }
                    beta.push(0.0);
                    vs.push(fresh / fb);
                    continue;
                }

                if alpha.len() == m_cap || used >= budget {
                    break;
                }
                beta.push(b);
                vs.push(r / b);
            }

            // Rayleigh-Ritz on the projected tridiagonal
            let m = alpha.len();
            debug_assert!(m >= 1);
            let mut t = DMatrix::zeros(m, m);
            for i in 0..m {
                t[(i, i)] = alpha[i];
                if i + 1 < m {
                    t[(i, i + 1)] = beta[i];
                    t[(i + 1, i)] = beta[i];
                }
            }
            let eig = SymmetricEigen::new(t);
            let (idx, theta) = eig
                .eigenvalues
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| {
                    a.abs().partial_cmp(&b.abs()).unwrap_or(Ordering::Equal)
                })
                .map(|(i, &v)| (i, v))
                .expect("projected problem is non-empty");

            let s = eig.eigenvectors.column(idx);
            let mut y: DVector<f64> = DVector::zeros(n);
            for (i, u) in vs.iter().enumerate().take(m) {
                y.axpy(s[i], u, 1.0);
            }
            let ynorm = y.norm();
            if ynorm > 0.0 {
                y /= ynorm;
            }

            // Residual of the Ritz pair: ||A y - theta y|| = beta_m |s_m|
            let resid = resid_bound * s[m - 1].abs();
            let converged = invariant || resid <= threshold_tol * theta.abs().max(1.0);

            if converged || used >= budget {
                return Ok(EigenPair {
                    value: theta,
                    vector: y.iter().copied().collect(),
                    converged,
                    iterations: used,
                });
            }

            // Restart from the best Ritz vector
            v = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{BlockDiagMultiplier, SparseProblem};
    use crate::operator::CertificateOperator;

    struct DiagOp {
        values: Vec<f64>,
    }

    impl SymmetricOperator for DiagOp {
        fn dim(&self) -> usize {
            self.values.len()
        }

        fn apply_into(&self, x: &[f64], y: &mut [f64]) {
            for i in 0..self.values.len() {
                y[i] = self.values[i] * x[i];
            }
        }
    }

    #[test]
    fn test_dense_fallback_small_operator() {
        let op = DiagOp {
            values: vec![-3.0, -1.0, 0.0, 2.0, 5.0],
        };
        let solver = LanczosSolver::default().with_seed(7);
        let pair = solver
            .largest_magnitude(&op, &EigOptions::with_tol(1e-12))
            .unwrap();
        assert!(pair.converged);
        assert!((pair.value - 5.0).abs() < 1e-10);
        assert!((pair.vector[4].abs() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_iterative_path_finds_dominant_mode() {
        // 80 > basis size, so the restarted iteration runs
        let mut values: Vec<f64> = (0..80).map(|i| i as f64 / 100.0).collect();
        values[3] = -7.0; // dominant, negative
        let op = DiagOp {
            values: values.clone(),
        };
        let solver = LanczosSolver::default().with_seed(11);
        let pair = solver
            .largest_magnitude(&op, &EigOptions::with_tol(1e-10))
            .unwrap();
        assert!(pair.converged, "did not converge in {} matvecs", pair.iterations);
        assert!((pair.value + 7.0).abs() < 1e-8);
        assert!((pair.vector[3].abs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_warm_start_on_exact_eigenvector_escapes() {
        // v0 is an exact non-dominant eigenvector; the breakdown handling
        // must still reach the dominant mode.
        let mut values = vec![0.0; 60];
        values[50] = 9.0;
        let op = DiagOp {
            values: values.clone(),
        };
        let mut v0 = vec![0.0; 60];
        v0[0] = 1.0;
        let solver = LanczosSolver::default().with_seed(3);
        let opts = EigOptions {
            tol: 1e-10,
            max_iter: None,
            v0: Some(v0),
        };
        let pair = solver.largest_magnitude(&op, &opts).unwrap();
        assert!(pair.converged);
        assert!((pair.value - 9.0).abs() < 1e-8);
    }

    #[test]
    fn test_budget_exhaustion_is_soft() {
        let values: Vec<f64> = (0..70).map(|i| (i as f64).sin() * 3.0).collect();
        let op = DiagOp { values };
        let solver = LanczosSolver::default().with_seed(5);
        let opts = EigOptions {
            tol: 1e-14,
            max_iter: Some(1),
            v0: None,
        };
        let pair = solver.largest_magnitude(&op, &opts).unwrap();
        assert!(!pair.converged);
        assert_eq!(pair.iterations, 1);
        assert!(pair.value.is_finite());
        assert_eq!(pair.vector.len(), 70);
        assert!(pair.vector.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_bad_warm_start_errors() {
        let op = DiagOp {
            values: vec![1.0; 60],
        };
        let solver = LanczosSolver::default();

        let opts = EigOptions {
            tol: 1e-10,
            max_iter: None,
            v0: Some(vec![1.0; 3]),
        };
        assert!(matches!(
            solver.largest_magnitude(&op, &opts),
            Err(EigError::DimensionMismatch {
                expected: 60,
                actual: 3
            })
        ));

        let opts = EigOptions {
            tol: 1e-10,
            max_iter: None,
            v0: Some(vec![0.0; 60]),
        };
        assert!(matches!(
            solver.largest_magnitude(&op, &opts),
            Err(EigError::ZeroInitialVector)
        ));
    }

    #[test]
    fn test_certificate_operator_through_solver() {
        // (Q - Lambda) with Q = diag(1..=4) over n=2 blocks of d=2 and
        // Lambda = 3*I gives spectrum {-2, -1, 0, 1}; LM mode is -2.
        let problem = SparseProblem::from_triplets(
            2,
            2,
            (0..4).map(|i| (i, i, (i + 1) as f64)),
        );
        let lambda = BlockDiagMultiplier::scaled_identity(2, 2, 3.0);
        let op = CertificateOperator::new(&problem, &lambda, false).unwrap();

        let solver = LanczosSolver::default().with_seed(1);
        let pair = solver
            .largest_magnitude(&op, &EigOptions::with_tol(1e-12))
            .unwrap();
        assert!(pair.converged);
        assert!((pair.value + 2.0).abs() < 1e-10);
    }
}

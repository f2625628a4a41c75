//! Matrix-free evaluation of the certificate operator Q - Lambda.
//!
//! The operator is only ever touched through matrix-vector products. Q x
//! comes either from a direct sparse multiply or from the call-scoped
//! LDL^T proxy factor; Lambda x is a block-diagonal multiply. A spectral
//! shift A - c*I is an algebraic composition ([`ShiftedOperator`]), never a
//! stored matrix.

use thiserror::Error;

use crate::linalg::axpy;
use crate::linalg::ldl::{LdlError, ProxyFactor};
use crate::problem::{BlockDiagMultiplier, ProblemData};

/// Operator evaluation errors.
#[derive(Error, Debug)]
pub enum OperatorError {
    /// Vector length does not match the operator dimension n * d.
    #[error("dimension mismatch: operator has dimension {expected}, got {actual}")]
    DimensionMismatch {
        /// Operator dimension n * d.
        expected: usize,
        /// Offending length.
        actual: usize,
    },

    /// Building the proxy factorization of Q failed.
    #[error(transparent)]
    Factorization(#[from] LdlError),
}

/// A symmetric linear operator accessible through matrix-vector products.
///
/// The seam between the certifier and any eigensolver backend. Callers are
/// responsible for passing slices of length `dim()`.
pub trait SymmetricOperator {
    /// Operator dimension.
    fn dim(&self) -> usize;

    /// y = A x.
    fn apply_into(&self, x: &[f64], y: &mut [f64]);
}

/// The certificate operator (Q - Lambda) for one certification call.
///
/// Owns the optional proxy factor for its lifetime; both are dropped
/// together at the end of the call, so no factorization outlives the Q it
/// was built from.
pub struct CertificateOperator<'a, P: ProblemData> {
    problem: &'a P,
    multiplier: &'a BlockDiagMultiplier,
    factor: Option<ProxyFactor>,
    dim: usize,
}

impl<'a, P: ProblemData> CertificateOperator<'a, P> {
    /// Pair a problem with its multiplier, optionally building the proxy
    /// factor of Q + sigma*I for cheaper repeated applications.
    pub fn new(
        problem: &'a P,
        multiplier: &'a BlockDiagMultiplier,
        use_factorization: bool,
    ) -> Result<Self, OperatorError> {
        let dim = problem.dim();
        if multiplier.dim() != dim {
            return Err(OperatorError::DimensionMismatch {
                expected: dim,
                actual: multiplier.dim(),
            });
        }

        let factor = if use_factorization {
            Some(ProxyFactor::new(problem.quadratic_form())?)
        } else {
            None
        };

        Ok(Self {
            problem,
            multiplier,
            factor,
            dim,
        })
    }

    /// Operator dimension n * d.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// (Q - Lambda) x.
    pub fn apply(&self, x: &[f64]) -> Result<Vec<f64>, OperatorError> {
        if x.len() != self.dim {
            return Err(OperatorError::DimensionMismatch {
                expected: self.dim,
                actual: x.len(),
            });
        }
        let mut y = vec![0.0; self.dim];
        self.apply_unchecked(x, &mut y);
        Ok(y)
    }

    /// (Q - Lambda - shift*I) x, derived algebraically from `apply`.
    pub fn apply_shifted(&self, x: &[f64], shift: f64) -> Result<Vec<f64>, OperatorError> {
        let mut y = self.apply(x)?;
        axpy(-shift, x, &mut y);
        Ok(y)
    }

    fn apply_unchecked(&self, x: &[f64], y: &mut [f64]) {
        match &self.factor {
            Some(factor) => factor.apply_q(x, y),
            None => self.problem.apply_q(x, y),
        }

        let mut lx = vec![0.0; self.dim];
        self.multiplier.apply(x, &mut lx);
        axpy(-1.0, &lx, y);
    }
}

impl<P: ProblemData> SymmetricOperator for CertificateOperator<'_, P> {
    fn dim(&self) -> usize {
        self.dim
    }

    fn apply_into(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.dim);
        assert_eq!(y.len(), self.dim);
        self.apply_unchecked(x, y);
    }
}

/// Spectral translate A - shift*I of another operator.
pub struct ShiftedOperator<'a> {
    inner: &'a dyn SymmetricOperator,
    shift: f64,
}

impl<'a> ShiftedOperator<'a> {
    /// Shift `inner` by `-shift * I`.
    pub fn new(inner: &'a dyn SymmetricOperator, shift: f64) -> Self {
        Self { inner, shift }
    }

    /// The shift c in A - c*I.
    pub fn shift(&self) -> f64 {
        self.shift
    }
}

impl SymmetricOperator for ShiftedOperator<'_> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn apply_into(&self, x: &[f64], y: &mut [f64]) {
        self.inner.apply_into(x, y);
        axpy(-self.shift, x, y);
    }
}

//! Extremal eigenpair solver capability.
//!
//! The certifier only ever asks for the *largest-magnitude* eigenpair;
//! requesting the smallest algebraic eigenvalue directly is unreliable when
//! the spectrum's extremes are unknown, which is exactly why the two-phase
//! shift strategy in [`crate::certify`] exists. Backends plug in through
//! [`ExtremalEigSolver`]; [`LanczosSolver`] is the built-in one.

pub mod lanczos;

pub use lanczos::LanczosSolver;

use thiserror::Error;

use crate::operator::SymmetricOperator;

/// An eigenvalue/eigenvector pair with the solver's convergence verdict.
#[derive(Debug, Clone)]
pub struct EigenPair {
    /// Eigenvalue estimate.
    pub value: f64,
    /// Eigenvector estimate, unit norm for the built-in backend.
    pub vector: Vec<f64>,
    /// Whether the residual met the requested tolerance.
    pub converged: bool,
    /// Matrix-vector products spent.
    pub iterations: usize,
}

/// Options forwarded to the eigensolver backend.
#[derive(Debug, Clone, Default)]
pub struct EigOptions {
    /// Relative residual tolerance.
    pub tol: f64,
    /// Cap on matrix-vector products (None = backend default).
    pub max_iter: Option<usize>,
    /// Warm-start vector (backend picks its own start when None).
    pub v0: Option<Vec<f64>>,
}

impl EigOptions {
    /// Options with the given tolerance and everything else defaulted.
    pub fn with_tol(tol: f64) -> Self {
        Self {
            tol,
            ..Self::default()
        }
    }
}

/// Eigensolver failures that indicate caller misuse or degenerate input.
///
/// Running out of iterations is *not* an error; it is reported through
/// [`EigenPair::converged`].
#[derive(Error, Debug)]
pub enum EigError {
    /// Warm-start vector length does not match the operator dimension.
    #[error("initial vector has length {actual}, operator has dimension {expected}")]
    DimensionMismatch {
        /// Operator dimension.
        expected: usize,
        /// Warm-start vector length.
        actual: usize,
    },

    /// Warm-start vector has zero (or non-finite) norm.
    #[error("initial vector has zero or non-finite norm")]
    ZeroInitialVector,

    /// Operator has dimension zero.
    #[error("operator dimension is zero")]
    EmptyOperator,
}

/// Injected extremal-eigenpair capability.
pub trait ExtremalEigSolver {
    /// Largest-magnitude eigenpair of a symmetric operator.
    fn largest_magnitude(
        &self,
        op: &dyn SymmetricOperator,
        opts: &EigOptions,
    ) -> Result<EigenPair, EigError>;
}

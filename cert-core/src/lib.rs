//! Certix: minimum-eigenpair certification for low-rank relaxations
//!
//! Given the Lagrange-dual certificate operator A = Q - Lambda of a low-rank
//! relaxation of a quadratic optimization problem, this crate computes the
//! algebraically smallest eigenvalue lambda_min and its eigenvector without
//! ever materializing A, using only matrix-vector products:
//!
//! - **lambda_min >= 0** (within tolerance): the candidate solution is
//!   certified globally optimal.
//! - **lambda_min < 0**: the eigenvector is a direction of strict
//!   improvement for the outer optimization loop.
//!
//! # Algorithm
//!
//! Iterative Krylov solvers converge to the largest-*magnitude* mode, not
//! the smallest algebraic one, so the certifier works in two phases:
//!
//! 1. **Probe** the largest-magnitude eigenvalue lambda_lm of A. If it is
//!    negative it already is the algebraic minimum (fast path).
//! 2. Otherwise **shift**: solve for the largest-magnitude mode of
//!    A - 2*lambda_lm*I, whose spectrum is entirely non-positive; add
//!    2*lambda_lm back to recover lambda_min with the eigenvector unchanged.
//!
//! The eigensolver is an injected capability ([`ExtremalEigSolver`]); the
//! built-in backend is a restarted, fully reorthogonalized Lanczos
//! iteration ([`LanczosSolver`]). Substituting an Arnoldi or LOBPCG backend
//! changes nothing in the certification logic.
//!
//! # Example
//!
//! ```ignore
//! use cert_core::{certify, BlockDiagMultiplier, CertifySettings, SparseProblem};
//!
//! // Q = diag(-3, -1, 0, 2, 5), Lambda = 0: lambda_min = -3
//! let problem = SparseProblem::from_triplets(
//!     5,
//!     1,
//!     [(0, 0, -3.0), (1, 1, -1.0), (3, 3, 2.0), (4, 4, 5.0)],
//! );
//! let lambda = BlockDiagMultiplier::zeros(5, 1);
//!
//! let cert = certify(&problem, &lambda, None, &CertifySettings::default())?;
//! assert!(!cert.certifies(1e-9));
//! println!("lambda_min = {}", cert.lambda_min);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod certify;
pub mod eig;
pub mod linalg;
pub mod operator;
pub mod problem;

pub use certify::{certify_with_solver, CertifyError};
pub use eig::{EigError, EigOptions, EigenPair, ExtremalEigSolver, LanczosSolver};
pub use operator::{CertificateOperator, OperatorError, ShiftedOperator, SymmetricOperator};
pub use problem::{
    BlockDiagMultiplier, Certificate, CertifySettings, ProblemData, SparseProblem,
};

use nalgebra::DMatrix;

/// Main certification entry point.
///
/// Runs the two-phase probe/shift search with the built-in Lanczos backend,
/// seeded from `settings.seed` when given. `yopt` optionally supplies a
/// candidate solution (d rows, n*d columns) whose first row warm-starts the
/// shifted phase.
///
/// A `converged = false` certificate is a soft failure: the eigenvalue
/// estimate is the best one found within the iteration budget and its sign
/// is frequently still informative.
pub fn certify<P: ProblemData>(
    problem: &P,
    multiplier: &BlockDiagMultiplier,
    yopt: Option<&DMatrix<f64>>,
    settings: &CertifySettings,
) -> Result<Certificate, CertifyError> {
    let mut solver = LanczosSolver::default();
    if let Some(seed) = settings.seed {
        solver = solver.with_seed(seed);
    }
    certify_with_solver(problem, multiplier, yopt, settings, &solver)
}

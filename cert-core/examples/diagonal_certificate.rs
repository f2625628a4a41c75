//! Certify a toy diagonal operator.
//!
//! Q = diag(0, 1, 2, 3, 4, 5) is positive semidefinite, so with Lambda = 0
//! the candidate is certified (lambda_min = 0). Raising Lambda to 2*I makes
//! the spectrum dip below zero and the certificate fails, returning the
//! direction of improvement.

use cert_core::{certify, BlockDiagMultiplier, CertifySettings, SparseProblem};

fn main() {
    let problem = SparseProblem::from_triplets(6, 1, (0..6).map(|i| (i, i, i as f64)));
    let settings = CertifySettings {
        tol: 1e-10,
        seed: Some(42),
        ..CertifySettings::default()
    };

    println!("Certix - diagonal certification example");
    println!("=======================================");

    let lambda = BlockDiagMultiplier::zeros(6, 1);
    let cert = certify(&problem, &lambda, None, &settings).expect("certification failed");
    println!(
        "Lambda = 0:    lambda_min = {:+.3e}  certified = {}  (solves = {})",
        cert.lambda_min,
        cert.certifies(1e-8),
        cert.solves
    );

    let lambda = BlockDiagMultiplier::scaled_identity(6, 1, 2.0);
    let cert = certify(&problem, &lambda, None, &settings).expect("certification failed");
    println!(
        "Lambda = 2*I:  lambda_min = {:+.3e}  certified = {}  (solves = {})",
        cert.lambda_min,
        cert.certifies(1e-8),
        cert.solves
    );
    println!("improvement direction: {:?}", cert.v_min);
}

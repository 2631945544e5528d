//! Stable population structure from the live projection operator.
//!
//! Forms the single-sex projection matrix `A = U + F` over the live age
//! classes and extracts its dominant eigenpair. For a primitive
//! non-negative projection matrix Perron-Frobenius guarantees a unique
//! real positive dominant eigenvalue with a strictly positive eigenvector;
//! anything else is reported as a degenerate eigensystem rather than
//! propagated silently.

use crate::operators::ProjectionOperators;
use ndarray::Array1;
use ndarray_linalg::Eig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relative tolerance for deciding that the dominant eigenpair is real and
/// uniformly signed.
const EIGEN_TOLERANCE: f64 = 1e-8;

/// The equilibrium description of a population projected by `U + F`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableStructure {
    /// Asymptotic growth rate per projection interval, the dominant
    /// eigenvalue of the live projection matrix.
    pub lambda: f64,
    /// Stable age structure `w`, normalized to sum to 1.
    pub age_structure: Array1<f64>,
    /// Distribution of a random birth's mother's age (`pi`), normalized to
    /// sum to 1.
    pub birth_age_distribution: Array1<f64>,
}

#[derive(Error, Debug)]
pub enum StableError {
    #[error("Eigendecomposition of the projection matrix failed: {0}")]
    EigendecompositionFailed(#[from] ndarray_linalg::error::LinalgError),
    #[error(
        "The projection matrix has no unique real positive dominant eigenpair ({reason}); survival and fertility must describe a population capable of sustained growth or decline from every age class."
    )]
    DegenerateEigensystem { reason: String },
}

fn degenerate(reason: impl Into<String>) -> StableError {
    StableError::DegenerateEigensystem {
        reason: reason.into(),
    }
}

/// Solves for the stable growth rate, age structure, and age-at-maternity
/// distribution of the projection defined by `operators`.
pub fn solve_stable_structure(
    operators: &ProjectionOperators,
) -> Result<StableStructure, StableError> {
    let a_sub = &operators.live_transition() + &operators.live_fertility();
    let (eigenvalues, eigenvectors) = a_sub.eig()?;

    let dominant = eigenvalues
        .iter()
        .enumerate()
        .max_by(|(_, x), (_, y)| {
            x.norm()
                .partial_cmp(&y.norm())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(index, _)| index)
        .ok_or_else(|| degenerate("the eigenvalue set is empty"))?;

    let lambda = eigenvalues[dominant];
    let scale = lambda.norm().max(1.0);
    if lambda.im.abs() > EIGEN_TOLERANCE * scale {
        return Err(degenerate(format!(
            "dominant eigenvalue {:.6}{:+.6}i is complex",
            lambda.re, lambda.im
        )));
    }
    if lambda.re <= 0.0 {
        return Err(degenerate(format!(
            "dominant eigenvalue {:.6} is not positive",
            lambda.re
        )));
    }

    let raw = eigenvectors.column(dominant);
    if raw
        .iter()
        .any(|z| z.im.abs() > EIGEN_TOLERANCE * z.norm().max(1.0))
    {
        return Err(degenerate("dominant eigenvector is complex"));
    }
    let mut w: Array1<f64> = raw.mapv(|z| z.re);

    // Eigenvectors come back with an arbitrary sign; orient the mass
    // positively before normalizing.
    if w.sum() < 0.0 {
        w.mapv_inplace(|v| -v);
    }
    let max_abs = w.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    if w.iter().any(|&v| v < -EIGEN_TOLERANCE * max_abs) {
        return Err(degenerate("dominant eigenvector has mixed signs"));
    }
    let total = w.sum();
    if total <= 0.0 {
        return Err(degenerate("dominant eigenvector has no mass"));
    }
    let age_structure = w.mapv(|v| v.max(0.0) / total);

    let first_row = a_sub.row(0);
    let mut maternity: Array1<f64> = &age_structure * &first_row;
    let births = maternity.sum();
    if births <= 0.0 {
        return Err(degenerate(
            "no births occur along the stable age structure, so the age at maternity is undefined",
        ));
    }
    maternity.mapv_inplace(|v| v / births);

    log::debug!(
        "stable structure solved: lambda = {:.6} over {} age classes",
        lambda.re,
        operators.n_ages()
    );

    Ok(StableStructure {
        lambda: lambda.re,
        age_structure,
        birth_age_distribution: maternity,
    })
}

#![deny(dead_code)]
#![deny(unused_imports)]

//! Expected kin counts by age in a stable population.
//!
//! Implements the age-classified matrix kinship model: age-specific
//! survival and fertility define a pair of block projection operators, the
//! dominant eigenpair of their live sub-blocks fixes the stable population
//! structure, and a forward recursion propagates the age distribution of
//! thirteen kin types across ego's lifespan.

pub mod assemble;
pub mod data;
pub mod operators;
pub mod recursion;
pub mod stable;

use ndarray::Array1;
use polars::prelude::{DataFrame, PolarsError};
use thiserror::Error;

pub use crate::data::{DEFAULT_BIRTH_FEMALE, DemographicSchedule, ScheduleError};
pub use crate::operators::ProjectionOperators;
pub use crate::recursion::{KinMatrices, KinType, compute_kin_matrices};
pub use crate::stable::{StableError, StableStructure, solve_stable_structure};

/// Options for [`kin_stable`].
#[derive(Debug, Clone)]
pub struct KinshipOptions {
    /// Fraction of births that are female.
    pub birth_female: f64,
    /// When set, the result carries the stable age-at-maternity
    /// distribution alongside the kin table.
    pub pi_stable: bool,
}

impl Default for KinshipOptions {
    fn default() -> Self {
        Self {
            birth_female: DEFAULT_BIRTH_FEMALE,
            pi_stable: false,
        }
    }
}

/// The assembled output of the kinship pipeline.
#[derive(Debug, Clone)]
pub struct KinshipResult {
    /// Long-format table: one row per (ego age, kin age, vital status),
    /// one expected-count column per kin type code.
    pub table: DataFrame,
    /// Stable population growth rate per projection interval.
    pub lambda: f64,
    /// Stable age-at-maternity distribution, present when requested.
    pub birth_age_distribution: Option<Array1<f64>>,
}

/// Any failure of the kinship pipeline, surfaced at the call boundary.
#[derive(Error, Debug)]
pub enum KinshipError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Stable(#[from] StableError),
    #[error("Failed to assemble the kin table: {0}")]
    Assembly(#[from] PolarsError),
}

/// Computes expected kin counts by age for every ego age in a stable
/// population described by the given survival and fertility schedules.
///
/// `age` is the age grid (strictly increasing, last class open-ended),
/// `px` the survival probabilities, and `fx` the age-specific fertility
/// rates, all of equal length. Input validation failures, as well as a
/// schedule without a unique stable structure, are reported as errors; the
/// recursion itself cannot fail.
pub fn kin_stable(
    age: Array1<i64>,
    px: Array1<f64>,
    fx: Array1<f64>,
    options: &KinshipOptions,
) -> Result<KinshipResult, KinshipError> {
    let schedule = DemographicSchedule::new(age, px, fx, options.birth_female)?;
    kin_stable_from_schedule(&schedule, options.pi_stable)
}

/// Same as [`kin_stable`], starting from an already validated schedule.
pub fn kin_stable_from_schedule(
    schedule: &DemographicSchedule,
    pi_stable: bool,
) -> Result<KinshipResult, KinshipError> {
    let operators = ProjectionOperators::build(schedule);
    let stable = solve_stable_structure(&operators)?;
    log::info!(
        "stable growth rate lambda = {:.6} across {} age classes",
        stable.lambda,
        schedule.n_ages()
    );
    let kin = compute_kin_matrices(&operators, &stable);
    let table = assemble::assemble_kin_table(schedule, &kin)?;
    Ok(KinshipResult {
        table,
        lambda: stable.lambda,
        birth_age_distribution: pi_stable.then(|| stable.birth_age_distribution.clone()),
    })
}

//! Forward age recursion for the thirteen kin types.
//!
//! Every kin type follows the same projection law: the age distribution of
//! that kin when ego reaches the next age class is the current distribution
//! pushed through the transition operator, plus, for kin that are being
//! born during ego's life, the fertility operator applied to the
//! distribution of the kin's mothers. What distinguishes the types is only
//! the initial column (kin already alive when ego is born) and which
//! previously computed matrix supplies the mothers.
//!
//! The dependency structure is a four-phase DAG:
//!
//! 1. daughters, granddaughters, mothers, younger sisters, and nieces
//!    through younger sisters need nothing beyond ego's own trajectory and
//!    the stable maternity distribution;
//! 2. grandmothers, older sisters, and nieces through older sisters are
//!    seeded from completed phase-1 matrices;
//! 3. great-grandmothers and both kinds of aunt build on phase 2;
//! 4. cousins build on phases 2 and 3.
//!
//! Each phase consumes only finished matrices from earlier phases, so the
//! data flow is explicit and no matrix is ever revisited after its last
//! column is written.

use crate::operators::ProjectionOperators;
use crate::stable::StableStructure;
use ndarray::{Array1, Array2, s};

/// The kin types tracked by the model, in canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KinType {
    Daughter,
    Granddaughter,
    Mother,
    Grandmother,
    GreatGrandmother,
    OlderSister,
    YoungerSister,
    NieceFromOlderSister,
    NieceFromYoungerSister,
    OlderAunt,
    YoungerAunt,
    CousinFromOlderAunt,
    CousinFromYoungerAunt,
}

impl KinType {
    pub const ALL: [KinType; 13] = [
        KinType::Daughter,
        KinType::Granddaughter,
        KinType::Mother,
        KinType::Grandmother,
        KinType::GreatGrandmother,
        KinType::OlderSister,
        KinType::YoungerSister,
        KinType::NieceFromOlderSister,
        KinType::NieceFromYoungerSister,
        KinType::OlderAunt,
        KinType::YoungerAunt,
        KinType::CousinFromOlderAunt,
        KinType::CousinFromYoungerAunt,
    ];

    /// Short column code used in tabular output.
    pub fn code(&self) -> &'static str {
        match self {
            KinType::Daughter => "d",
            KinType::Granddaughter => "gd",
            KinType::Mother => "m",
            KinType::Grandmother => "gm",
            KinType::GreatGrandmother => "ggm",
            KinType::OlderSister => "os",
            KinType::YoungerSister => "ys",
            KinType::NieceFromOlderSister => "nos",
            KinType::NieceFromYoungerSister => "nys",
            KinType::OlderAunt => "oa",
            KinType::YoungerAunt => "ya",
            KinType::CousinFromOlderAunt => "coa",
            KinType::CousinFromYoungerAunt => "cya",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            KinType::Daughter => "daughter",
            KinType::Granddaughter => "granddaughter",
            KinType::Mother => "mother",
            KinType::Grandmother => "grandmother",
            KinType::GreatGrandmother => "great-grandmother",
            KinType::OlderSister => "older sister",
            KinType::YoungerSister => "younger sister",
            KinType::NieceFromOlderSister => "niece through an older sister",
            KinType::NieceFromYoungerSister => "niece through a younger sister",
            KinType::OlderAunt => "aunt older than ego's mother",
            KinType::YoungerAunt => "aunt younger than ego's mother",
            KinType::CousinFromOlderAunt => "cousin from an older aunt",
            KinType::CousinFromYoungerAunt => "cousin from a younger aunt",
        }
    }
}

/// One `2A x A` expected-count matrix per kin type: column `j` holds the
/// age distribution (alive rows, then deceased-by-age-at-death rows) of
/// that kin when ego occupies age class `j`.
#[derive(Debug, Clone)]
pub struct KinMatrices {
    n_ages: usize,
    daughters: Array2<f64>,
    granddaughters: Array2<f64>,
    mothers: Array2<f64>,
    grandmothers: Array2<f64>,
    great_grandmothers: Array2<f64>,
    older_sisters: Array2<f64>,
    younger_sisters: Array2<f64>,
    nieces_from_older_sisters: Array2<f64>,
    nieces_from_younger_sisters: Array2<f64>,
    older_aunts: Array2<f64>,
    younger_aunts: Array2<f64>,
    cousins_from_older_aunts: Array2<f64>,
    cousins_from_younger_aunts: Array2<f64>,
}

impl KinMatrices {
    pub fn n_ages(&self) -> usize {
        self.n_ages
    }

    pub fn matrix(&self, kin: KinType) -> &Array2<f64> {
        match kin {
            KinType::Daughter => &self.daughters,
            KinType::Granddaughter => &self.granddaughters,
            KinType::Mother => &self.mothers,
            KinType::Grandmother => &self.grandmothers,
            KinType::GreatGrandmother => &self.great_grandmothers,
            KinType::OlderSister => &self.older_sisters,
            KinType::YoungerSister => &self.younger_sisters,
            KinType::NieceFromOlderSister => &self.nieces_from_older_sisters,
            KinType::NieceFromYoungerSister => &self.nieces_from_younger_sisters,
            KinType::OlderAunt => &self.older_aunts,
            KinType::YoungerAunt => &self.younger_aunts,
            KinType::CousinFromOlderAunt => &self.cousins_from_older_aunts,
            KinType::CousinFromYoungerAunt => &self.cousins_from_younger_aunts,
        }
    }
}

/// Runs the full four-phase recursion and returns the matrices for all
/// thirteen kin types.
pub fn compute_kin_matrices(
    operators: &ProjectionOperators,
    stable: &StableStructure,
) -> KinMatrices {
    let a = operators.n_ages();
    let pi = &stable.birth_age_distribution;
    let ego = ego_indicator(a);

    // Phase 1: self-contained recursions.
    let daughters = propagate(operators, Array1::zeros(2 * a), Some(&ego));
    let granddaughters = propagate(operators, Array1::zeros(2 * a), Some(&daughters));
    let mothers = propagate(operators, maternity_seed(pi, a), None);
    let younger_sisters = propagate(operators, Array1::zeros(2 * a), Some(&mothers));
    let nieces_from_younger_sisters =
        propagate(operators, Array1::zeros(2 * a), Some(&younger_sisters));

    // Phase 2: seeded from completed phase-1 matrices.
    let grandmothers = propagate(operators, kin_of_mother_seed(&mothers, pi, a), None);
    let older_sisters = propagate(operators, kin_of_mother_seed(&daughters, pi, a), None);
    let nieces_from_older_sisters = propagate(
        operators,
        kin_of_mother_seed(&granddaughters, pi, a),
        Some(&older_sisters),
    );

    // Phase 3.
    let great_grandmothers = propagate(operators, kin_of_mother_seed(&grandmothers, pi, a), None);
    let older_aunts = propagate(operators, kin_of_mother_seed(&older_sisters, pi, a), None);
    let younger_aunts = propagate(
        operators,
        kin_of_mother_seed(&younger_sisters, pi, a),
        Some(&grandmothers),
    );

    // Phase 4.
    let cousins_from_older_aunts = propagate(
        operators,
        kin_of_mother_seed(&nieces_from_older_sisters, pi, a),
        Some(&older_aunts),
    );
    let cousins_from_younger_aunts = propagate(
        operators,
        kin_of_mother_seed(&nieces_from_younger_sisters, pi, a),
        Some(&younger_aunts),
    );

    KinMatrices {
        n_ages: a,
        daughters,
        granddaughters,
        mothers,
        grandmothers,
        great_grandmothers,
        older_sisters,
        younger_sisters,
        nieces_from_older_sisters,
        nieces_from_younger_sisters,
        older_aunts,
        younger_aunts,
        cousins_from_older_aunts,
        cousins_from_younger_aunts,
    }
}

/// Fills a kin matrix column by column: each ego age advances the kin
/// distribution through the transition operator and, when a `source`
/// matrix is given, adds the newborns contributed by the source's column
/// for the same ego age.
fn propagate(
    operators: &ProjectionOperators,
    seed: Array1<f64>,
    source: Option<&Array2<f64>>,
) -> Array2<f64> {
    let a = operators.n_ages();
    let u = operators.transition();
    let f = operators.fertility();
    let mut matrix = Array2::zeros((2 * a, a));
    matrix.column_mut(0).assign(&seed);
    for j in 0..a - 1 {
        let mut next = u.dot(&matrix.column(j));
        if let Some(src) = source {
            next += &f.dot(&src.column(j));
        }
        matrix.column_mut(j + 1).assign(&next);
    }
    matrix
}

/// Ego's own trajectory: alive in her current age class with certainty.
/// Used as the fertility source for daughters, so that ego is never
/// counted among her own kin.
fn ego_indicator(a: usize) -> Array2<f64> {
    Array2::from_shape_fn((2 * a, a), |(i, j)| if i == j { 1.0 } else { 0.0 })
}

/// Kin alive at ego's birth whose age then is distributed as the kin's
/// mother's age at a random birth: `[pi; 0]`.
fn maternity_seed(pi: &Array1<f64>, a: usize) -> Array1<f64> {
    let mut seed = Array1::zeros(2 * a);
    seed.slice_mut(s![0..a]).assign(pi);
    seed
}

/// Seeds a kin type from the completed matrix of the same relation taken
/// with respect to ego's mother: the live block mixed over the maternity
/// age distribution. Kin already deceased at ego's birth are not carried
/// over.
fn kin_of_mother_seed(parent: &Array2<f64>, pi: &Array1<f64>, a: usize) -> Array1<f64> {
    let live = parent.slice(s![0..a, ..]).dot(pi);
    let mut seed = Array1::zeros(2 * a);
    seed.slice_mut(s![0..a]).assign(&live);
    seed
}

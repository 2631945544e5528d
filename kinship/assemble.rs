//! Reshapes the per-type kin matrices into one long-format table.
//!
//! This is the only place where positional age-class indices are mapped
//! back to the literal age labels of the input grid; the numeric core is
//! purely positional.

use crate::data::DemographicSchedule;
use crate::recursion::{KinMatrices, KinType};
use itertools::iproduct;
use polars::prelude::*;

/// Builds the `A * A * 2` row table keyed by ego age (`x`), kin age
/// (`x_kin`), and vital status (`alive`), with one expected-count column
/// per kin type code.
pub fn assemble_kin_table(
    schedule: &DemographicSchedule,
    kin: &KinMatrices,
) -> Result<DataFrame, PolarsError> {
    let a = schedule.n_ages();
    let rows = a * a * 2;

    let mut ego_age = Vec::with_capacity(rows);
    let mut kin_age = Vec::with_capacity(rows);
    let mut alive = Vec::with_capacity(rows);
    for (x, x_kin) in iproduct!(0..a, 0..a) {
        for status in ["yes", "no"] {
            ego_age.push(schedule.age[x]);
            kin_age.push(schedule.age[x_kin]);
            alive.push(status);
        }
    }

    let mut columns: Vec<Column> = vec![
        Series::new("x".into(), ego_age).into(),
        Series::new("x_kin".into(), kin_age).into(),
        Series::new("alive".into(), alive).into(),
    ];
    for kin_type in KinType::ALL {
        let matrix = kin.matrix(kin_type);
        let mut values = Vec::with_capacity(rows);
        for (x, x_kin) in iproduct!(0..a, 0..a) {
            values.push(matrix[[x_kin, x]]);
            values.push(matrix[[a + x_kin, x]]);
        }
        columns.push(Series::new(kin_type.code().into(), values).into());
    }

    DataFrame::new(columns)
}

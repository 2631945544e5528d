//! End-to-end checks of the kinship pipeline against hand-computed
//! expectations for small age grids.

use approx::assert_relative_eq;
use ndarray::{Array1, array};
use stemma::{KinshipError, KinshipOptions, ScheduleError, kin_stable};

fn options_with_pi() -> KinshipOptions {
    KinshipOptions {
        birth_female: 0.5,
        pi_stable: true,
    }
}

#[test]
fn three_age_class_scenario_is_exact() {
    let result = kin_stable(
        array![0, 1, 2],
        array![0.9, 0.8, 0.0],
        array![0.0, 0.5, 0.0],
        &options_with_pi(),
    )
    .expect("pipeline succeeds");

    // lambda solves lambda^3 = 0.18 * lambda for this point-fertility
    // schedule.
    assert_relative_eq!(result.lambda, 0.18_f64.sqrt(), epsilon = 1e-10);

    let pi = result
        .birth_age_distribution
        .as_ref()
        .expect("pi was requested");
    assert_relative_eq!(pi[0], 0.0, epsilon = 1e-10);
    assert_relative_eq!(pi[1], 1.0, epsilon = 1e-10);
    assert_relative_eq!(pi[2], 0.0, epsilon = 1e-10);

    let table = &result.table;
    assert_eq!(table.height(), 3 * 3 * 2);
    assert_eq!(
        table.get_column_names_str(),
        vec![
            "x", "x_kin", "alive", "d", "gd", "m", "gm", "ggm", "os", "ys", "nos", "nys", "oa",
            "ya", "coa", "cya"
        ]
    );

    // At ego age 0 the mother is alive at age 1 with certainty and no
    // daughters exist yet. Rows are ordered by (x, x_kin, alive=yes/no),
    // so (0, 1, "yes") is row 2.
    let mothers = table.column("m").unwrap().f64().unwrap();
    assert_relative_eq!(mothers.get(2).unwrap(), 1.0, epsilon = 1e-10);
    let daughters = table.column("d").unwrap().f64().unwrap();
    for row in 0..6 {
        assert_eq!(daughters.get(row).unwrap(), 0.0);
    }
}

#[test]
fn the_pipeline_is_deterministic() {
    let run = || {
        kin_stable(
            array![0, 1, 2],
            array![0.9, 0.8, 0.0],
            array![0.0, 0.5, 0.0],
            &options_with_pi(),
        )
        .expect("pipeline succeeds")
    };
    let first = run();
    let second = run();

    assert_eq!(first.lambda.to_bits(), second.lambda.to_bits());
    assert!(first.table.equals(&second.table));
    let pi_first = first.birth_age_distribution.unwrap();
    let pi_second = second.birth_age_distribution.unwrap();
    for (a, b) in pi_first.iter().zip(pi_second.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn single_age_class_yields_two_rows() {
    let result = kin_stable(
        array![0],
        array![0.5],
        array![2.0],
        &options_with_pi(),
    )
    .expect("pipeline succeeds");

    assert_eq!(result.table.height(), 2);
    assert_relative_eq!(result.lambda, 1.0, epsilon = 1e-12);
    // Only seed columns exist: the mother is certain, descendants absent.
    let mothers = result.table.column("m").unwrap().f64().unwrap();
    assert_relative_eq!(mothers.get(0).unwrap(), 1.0, epsilon = 1e-12);
    let daughters = result.table.column("d").unwrap().f64().unwrap();
    assert_eq!(daughters.get(0).unwrap(), 0.0);
    assert_eq!(daughters.get(1).unwrap(), 0.0);
}

#[test]
fn kin_counts_stay_finite_and_non_negative() {
    let a = 12;
    let age = Array1::from_iter(0..a as i64);
    let px = Array1::from_shape_fn(a as usize, |i| 0.95 - 0.05 * (i as f64 / a as f64));
    let fx = Array1::from_shape_fn(a as usize, |i| {
        let centred = (i as f64 - 5.0) / 2.0;
        0.3 * (-0.5 * centred * centred).exp()
    });
    let result = kin_stable(age, px, fx, &KinshipOptions::default()).expect("pipeline succeeds");

    for code in [
        "d", "gd", "m", "gm", "ggm", "os", "ys", "nos", "nys", "oa", "ya", "coa", "cya",
    ] {
        let column = result.table.column(code).unwrap().f64().unwrap();
        for value in column.into_no_null_iter() {
            assert!(value.is_finite(), "column {code} has a non-finite count");
            assert!(value >= 0.0, "column {code} has a negative count");
        }
    }
}

#[test]
fn invalid_inputs_surface_as_schedule_errors() {
    let err = kin_stable(
        array![0, 1, 2],
        array![0.9, 0.8],
        array![0.0, 0.5, 0.0],
        &KinshipOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        KinshipError::Schedule(ScheduleError::DimensionMismatch { .. })
    ));

    let err = kin_stable(
        array![0, 1],
        array![0.9, 0.8],
        array![0.0, 0.5],
        &KinshipOptions {
            birth_female: 1.5,
            pi_stable: false,
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        KinshipError::Schedule(ScheduleError::InvalidBirthFraction(_))
    ));
}

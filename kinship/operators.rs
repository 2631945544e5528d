//! Block projection operators for the age-classified kinship model.
//!
//! The state space stacks `A` live age classes on top of `A` deceased
//! age-at-death classes. The transition operator moves live mass down the
//! survival sub-diagonal, keeps the open interval in place, and routes
//! dying mass into the matching deceased class, where it stays. The
//! fertility operator credits a surviving mother at the start of the
//! interval with `asfr * px * birth_female` daughters at age zero.

use crate::data::DemographicSchedule;
use ndarray::{Array2, ArrayView2, s};

/// The pair of `2A x 2A` block operators driving the kinship projection.
#[derive(Debug, Clone)]
pub struct ProjectionOperators {
    transition: Array2<f64>,
    fertility: Array2<f64>,
    n_ages: usize,
}

impl ProjectionOperators {
    /// Assembles the transition and fertility operators from a validated
    /// schedule. Pure construction: all rate preconditions are enforced by
    /// [`DemographicSchedule::new`](crate::data::DemographicSchedule::new).
    pub fn build(schedule: &DemographicSchedule) -> Self {
        let a = schedule.n_ages();
        let mut transition = Array2::zeros((2 * a, 2 * a));
        for i in 0..a - 1 {
            transition[[i + 1, i]] = schedule.px[i];
        }
        // Open interval: survivors of the last class remain in it.
        transition[[a - 1, a - 1]] = schedule.px[a - 1];
        for i in 0..a {
            // Deaths land in the age-at-death class and are absorbed there,
            // so every column stays stochastic.
            transition[[a + i, i]] = 1.0 - schedule.px[i];
            transition[[a + i, a + i]] = 1.0;
        }

        let mut fertility = Array2::zeros((2 * a, 2 * a));
        for i in 0..a {
            fertility[[0, i]] = schedule.fx[i] * schedule.px[i] * schedule.birth_female;
        }

        Self {
            transition,
            fertility,
            n_ages: a,
        }
    }

    /// Number of age classes `A` (the operators are `2A x 2A`).
    pub fn n_ages(&self) -> usize {
        self.n_ages
    }

    pub fn transition(&self) -> &Array2<f64> {
        &self.transition
    }

    pub fn fertility(&self) -> &Array2<f64> {
        &self.fertility
    }

    /// Upper-left `A x A` survival block, the live-state projection.
    pub fn live_transition(&self) -> ArrayView2<'_, f64> {
        self.transition.slice(s![0..self.n_ages, 0..self.n_ages])
    }

    /// Upper-left `A x A` fertility block (first row only is non-zero).
    pub fn live_fertility(&self) -> ArrayView2<'_, f64> {
        self.fertility.slice(s![0..self.n_ages, 0..self.n_ages])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn sample_schedule() -> DemographicSchedule {
        DemographicSchedule::new(
            array![0, 1, 2],
            array![0.9, 0.8, 0.0],
            array![0.0, 0.5, 0.0],
            0.5,
        )
        .expect("valid schedule")
    }

    #[test]
    fn every_column_is_stochastic() {
        let operators = ProjectionOperators::build(&sample_schedule());
        let u = operators.transition();
        for column in u.columns() {
            assert_relative_eq!(column.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn survival_flows_down_the_subdiagonal() {
        let operators = ProjectionOperators::build(&sample_schedule());
        let u = operators.transition();
        assert_eq!(u[[1, 0]], 0.9);
        assert_eq!(u[[2, 1]], 0.8);
        // Open interval self-loop.
        assert_eq!(u[[2, 2]], 0.0);
        // Deaths recorded by age at death.
        assert_eq!(u[[3, 0]], 0.1);
        assert_relative_eq!(u[[4, 1]], 0.2, epsilon = 1e-12);
        assert_eq!(u[[5, 2]], 1.0);
        // Once recorded, deaths stay recorded.
        assert_eq!(u[[4, 4]], 1.0);
        assert_eq!(u[[4, 5]], 0.0);
    }

    #[test]
    fn fertility_credits_surviving_mothers_only() {
        let operators = ProjectionOperators::build(&sample_schedule());
        let f = operators.fertility();
        assert_eq!(f[[0, 0]], 0.0);
        assert_relative_eq!(f[[0, 1]], 0.5 * 0.8 * 0.5, epsilon = 1e-12);
        assert_eq!(f[[0, 2]], 0.0);
        // Deceased classes never reproduce.
        assert_eq!(f.slice(s![.., 3..6]).sum(), 0.0);
        // Nothing outside the first row.
        assert_eq!(f.slice(s![1.., ..]).sum(), 0.0);
    }

    #[test]
    fn single_age_class_self_loops() {
        let schedule =
            DemographicSchedule::new(array![0], array![0.5], array![2.0], 0.5).unwrap();
        let operators = ProjectionOperators::build(&schedule);
        let u = operators.transition();
        assert_eq!(u[[0, 0]], 0.5);
        assert_eq!(u[[1, 0]], 0.5);
        assert_eq!(u[[1, 1]], 1.0);
        assert_relative_eq!(operators.fertility()[[0, 0]], 0.5, epsilon = 1e-12);
    }
}

//! # Demographic Schedule Loading and Validation
//!
//! This module is the exclusive entry point for user-provided demographic
//! rates. It validates a life table (age grid, survival probabilities,
//! age-specific fertility rates) against the preconditions of the kinship
//! pipeline and transforms it into the clean `ndarray` structures required
//! by the numeric core.
//!
//! - Strict Schema: tabular input must carry `age`, `px`, and `fx` columns
//!   (case-insensitive). Column names are not configurable.
//! - User-Centric Errors: failures are assumed to be user-input errors and
//!   the `ScheduleError` enum names the exact precondition that was
//!   violated.
//! - The numeric core never re-validates: anything that constructs a
//!   `DemographicSchedule` has already passed through here.

use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Fraction of births that are female under the default sex ratio at birth
/// of 1.04 males per female.
pub const DEFAULT_BIRTH_FEMALE: f64 = 1.0 / 2.04;

/// A validated set of age-specific demographic rates.
///
/// The last age class is an open-ended interval: `px` there is the
/// probability of remaining in that class for another projection step
/// rather than of advancing out of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemographicSchedule {
    /// Age labels, strictly increasing. The last label denotes the open
    /// interval ("this age and above").
    pub age: Array1<i64>,
    /// Probability of surviving from each age class to the next.
    pub px: Array1<f64>,
    /// Age-specific fertility rate at each age class.
    pub fx: Array1<f64>,
    /// Fraction of births that are female.
    pub birth_female: f64,
}

/// Errors raised while validating or loading a demographic schedule.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error(
        "survival has {px} entries and fertility has {fx}, but the age grid has {age} classes; all three must agree"
    )]
    DimensionMismatch { age: usize, px: usize, fx: usize },
    #[error("{quantity} at age index {index} is {value}, outside its valid range of {range}")]
    InvalidRateValue {
        quantity: &'static str,
        index: usize,
        value: f64,
        range: &'static str,
    },
    #[error("the female fraction of births must lie strictly between 0 and 1, got {0}")]
    InvalidBirthFraction(f64),
    #[error("the age grid is empty; at least one age class is required")]
    EmptySchedule,
    #[error("age labels must be strictly increasing, but age[{index}] = {value} is not above its predecessor")]
    AgesNotIncreasing { index: usize, value: i64 },
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("The required column '{0}' was not found in the life table. Please check spelling and case.")]
    ColumnNotFound(String),
    #[error(
        "The required column '{column_name}' could not be converted to the expected type '{expected_type}'. (Found type: {found_type})"
    )]
    ColumnWrongType {
        column_name: String,
        expected_type: &'static str,
        found_type: String,
    },
    #[error("Missing or null values were found in the required column '{0}'. Life tables must be complete.")]
    MissingValues(String),
}

impl DemographicSchedule {
    /// Validates raw rate vectors and assembles a schedule.
    ///
    /// Every precondition of the downstream pipeline is enforced here:
    /// matching lengths, survival probabilities in `[0, 1]`, finite
    /// non-negative fertility, a strictly increasing age grid, and a
    /// female birth fraction strictly inside `(0, 1)`.
    pub fn new(
        age: Array1<i64>,
        px: Array1<f64>,
        fx: Array1<f64>,
        birth_female: f64,
    ) -> Result<Self, ScheduleError> {
        if age.is_empty() {
            return Err(ScheduleError::EmptySchedule);
        }
        if px.len() != age.len() || fx.len() != age.len() {
            return Err(ScheduleError::DimensionMismatch {
                age: age.len(),
                px: px.len(),
                fx: fx.len(),
            });
        }
        for (index, pair) in age.windows(2).into_iter().enumerate() {
            if pair[1] <= pair[0] {
                return Err(ScheduleError::AgesNotIncreasing {
                    index: index + 1,
                    value: pair[1],
                });
            }
        }
        for (index, &value) in px.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ScheduleError::InvalidRateValue {
                    quantity: "survival probability",
                    index,
                    value,
                    range: "[0, 1]",
                });
            }
        }
        for (index, &value) in fx.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ScheduleError::InvalidRateValue {
                    quantity: "fertility rate",
                    index,
                    value,
                    range: "[0, inf)",
                });
            }
        }
        if !birth_female.is_finite() || birth_female <= 0.0 || birth_female >= 1.0 {
            return Err(ScheduleError::InvalidBirthFraction(birth_female));
        }
        Ok(Self {
            age,
            px,
            fx,
            birth_female,
        })
    }

    /// Number of age classes, including the open interval.
    pub fn n_ages(&self) -> usize {
        self.age.len()
    }
}

/// Reads a life table from disk and validates it into a schedule.
///
/// The file is parsed as comma-separated when the extension is `.csv` and
/// as tab-separated otherwise. Required columns: `age` (integer), `px`,
/// `fx` (float), matched case-insensitively.
pub fn load_schedule(path: &str, birth_female: f64) -> Result<DemographicSchedule, ScheduleError> {
    let df = read_tabular(path)?;
    let map = build_case_insensitive_map(df.get_column_names().iter().map(|s| s.as_str()));
    let age = extract_i64_column(&df, &map, "age")?;
    let px = extract_f64_column(&df, &map, "px")?;
    let fx = extract_f64_column(&df, &map, "fx")?;
    DemographicSchedule::new(age, px, fx, birth_female)
}

fn read_tabular(path: &str) -> Result<DataFrame, ScheduleError> {
    let path = Path::new(path);
    let separator = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => b',',
        _ => b'\t',
    };
    let file = File::open(path)?;
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_separator(separator))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(ScheduleError::from)
}

fn build_case_insensitive_map<I, S>(names: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = HashMap::new();
    for name in names {
        let original = name.as_ref().to_string();
        map.insert(original.to_ascii_lowercase(), original);
    }
    map
}

fn extract_f64_column(
    df: &DataFrame,
    map: &HashMap<String, String>,
    key: &str,
) -> Result<Array1<f64>, ScheduleError> {
    let actual = map
        .get(&key.to_ascii_lowercase())
        .ok_or_else(|| ScheduleError::ColumnNotFound(key.to_string()))?;
    let series = df
        .column(actual)
        .map_err(|_| ScheduleError::ColumnNotFound(actual.clone()))?;
    let dtype = series.dtype().clone();
    let series = if dtype != DataType::Float64 {
        series
            .cast(&DataType::Float64)
            .map_err(|_| ScheduleError::ColumnWrongType {
                column_name: actual.clone(),
                expected_type: "float",
                found_type: dtype.to_string(),
            })?
    } else {
        series.clone()
    };
    let values = series.f64().expect("casted to f64");
    if values.null_count() > 0 {
        return Err(ScheduleError::MissingValues(actual.clone()));
    }
    Ok(Array1::from_iter(values.into_no_null_iter()))
}

fn extract_i64_column(
    df: &DataFrame,
    map: &HashMap<String, String>,
    key: &str,
) -> Result<Array1<i64>, ScheduleError> {
    let actual = map
        .get(&key.to_ascii_lowercase())
        .ok_or_else(|| ScheduleError::ColumnNotFound(key.to_string()))?;
    let series = df
        .column(actual)
        .map_err(|_| ScheduleError::ColumnNotFound(actual.clone()))?;
    let dtype = series.dtype().clone();
    let casted = series
        .cast(&DataType::Int64)
        .map_err(|_| ScheduleError::ColumnWrongType {
            column_name: actual.clone(),
            expected_type: "integer",
            found_type: dtype.to_string(),
        })?;
    let values = casted.i64().expect("casted to i64");
    if values.null_count() > 0 {
        return Err(ScheduleError::MissingValues(actual.clone()));
    }
    Ok(Array1::from_iter(values.into_no_null_iter()))
}

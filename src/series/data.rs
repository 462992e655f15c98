//! Observation series container for trend analysis.
//!
//! Purpose
//! -------
//! Provide a small, validated container pairing absolute timestamps with
//! possibly-missing values. Entry points build one of these at the boundary
//! so downstream code can rely on aligned, non-empty inputs.
//!
//! Key behaviors
//! -------------
//! - [`ObservationSeries::new`] enforces equal lengths and non-emptiness.
//! - Missing values are NaN and are kept in place; infinities are accepted
//!   here and treated as missing by the pre-whitening engine.
//! - Derived views ([`ObservationSeries::elapsed_seconds`],
//!   [`ObservationSeries::years`], [`ObservationSeries::n_valid`]) are
//!   computed on demand and never cached.
//!
//! Invariants & assumptions
//! ------------------------
//! - `times.len() == values.len() > 0`.
//! - Timestamps are not required to be sorted; routines that need ordering
//!   sort explicitly.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the happy path, empty input, mismatched lengths, and
//!   NaN-aware counting.
use chrono::NaiveDateTime;
use ndarray::Array1;

use crate::{
    series::time::{calendar_years, elapsed_seconds},
    statistical_tests::{errors::MKResult, validation::validate_lengths},
};

/// `ObservationSeries` — validated `(timestamp, value)` pairs.
///
/// Fields
/// ------
/// - `times`: `Vec<NaiveDateTime>`
///   Observation timestamps.
/// - `values`: `Array1<f64>`
///   Observed values; NaN marks a missing observation.
///
/// Invariants
/// ----------
/// - `times.len() == values.len()` and both are non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    /// Observation timestamps.
    pub times: Vec<NaiveDateTime>,
    /// Observed values (NaN = missing).
    pub values: Array1<f64>,
}

impl ObservationSeries {
    /// Construct a validated [`ObservationSeries`].
    ///
    /// Parameters
    /// ----------
    /// - `times`: `&[NaiveDateTime]`
    ///   Observation timestamps.
    /// - `values`: `&[f64]`
    ///   Observed values, NaN for missing entries.
    ///
    /// Returns
    /// -------
    /// `MKResult<ObservationSeries>`
    ///   An owned copy of the inputs when both checks pass.
    ///
    /// Errors
    /// ------
    /// - `MKError::LengthMismatch { times, values }`
    ///   Returned when the slices differ in length.
    /// - `MKError::EmptySeries`
    ///   Returned when both slices are empty.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use chrono::NaiveDate;
    /// # use mannkendall::series::data::ObservationSeries;
    /// let t0 = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    /// let t1 = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    /// let series = ObservationSeries::new(&[t0, t1], &[1.0, f64::NAN]).unwrap();
    /// assert_eq!(series.n_valid(), 1);
    /// ```
    pub fn new(times: &[NaiveDateTime], values: &[f64]) -> MKResult<Self> {
        validate_lengths(times.len(), values.len())?;
        Ok(ObservationSeries { times: times.to_vec(), values: Array1::from(values.to_vec()) })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of non-missing values.
    pub fn n_valid(&self) -> usize {
        count_valid(self.values.as_slice().unwrap_or(&[]))
    }

    /// Seconds since the first timestamp.
    pub fn elapsed_seconds(&self) -> Vec<f64> {
        elapsed_seconds(&self.times)
    }

    /// Calendar year of every observation.
    pub fn years(&self) -> Vec<i32> {
        calendar_years(&self.times)
    }

    /// Values as a contiguous slice.
    pub fn values(&self) -> &[f64] {
        self.values.as_slice().unwrap_or(&[])
    }
}

/// Count entries that are not NaN.
#[inline]
pub fn count_valid(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

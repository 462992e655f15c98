//! series::time — timestamp arithmetic shared by the trend routines.
//!
//! Purpose
//! -------
//! Convert absolute timestamps into the quantities the statistics actually
//! consume: elapsed seconds for slopes and detrending, calendar years for the
//! S-statistic grouping, and sort permutations for the aggregation driver.
//!
//! Key behaviors
//! -------------
//! - [`dt_to_s`] turns time deltas into fractional seconds.
//! - [`elapsed_seconds`] measures every timestamp from the first one.
//! - [`calendar_years`] extracts the Gregorian year of every timestamp.
//! - [`argsort_times`] / [`de_sort`] build and undo a stable time ordering.
//!
//! Invariants & assumptions
//! ------------------------
//! - Timestamps are naive (zone-free) and interpreted on one common clock.
//! - Elapsed seconds honour leap years: 2020-01-01 to 2021-01-01 is
//!   366 days.
//!
//! Conventions
//! -----------
//! - Slopes are computed per second internally and scaled to per-year with
//!   [`SECONDS_PER_YEAR`] (Julian year of 365.25 days).

use chrono::{Datelike, NaiveDateTime, TimeDelta};

use crate::statistical_tests::errors::{MKError, MKResult};

/// Seconds in a Julian year, used to express slopes per year.
pub const SECONDS_PER_YEAR: f64 = 3600.0 * 24.0 * 365.25;

/// Convert time deltas into fractional seconds.
///
/// Parameters
/// ----------
/// - `deltas`: `&[TimeDelta]`
///   Signed durations, possibly with sub-second parts.
///
/// Returns
/// -------
/// `Vec<f64>`
///   `deltas[i]` expressed in seconds, nanosecond precision preserved.
pub fn dt_to_s(deltas: &[TimeDelta]) -> Vec<f64> {
    deltas
        .iter()
        .map(|d| d.num_seconds() as f64 + f64::from(d.subsec_nanos()) * 1e-9)
        .collect()
}

/// Seconds elapsed from `times[0]` to every entry of `times`.
///
/// Returns an empty vector for an empty input.
pub fn elapsed_seconds(times: &[NaiveDateTime]) -> Vec<f64> {
    let Some(&origin) = times.first() else {
        return Vec::new();
    };
    let deltas: Vec<TimeDelta> = times.iter().map(|&t| t - origin).collect();
    dt_to_s(&deltas)
}

/// Gregorian calendar year of every timestamp.
pub fn calendar_years(times: &[NaiveDateTime]) -> Vec<i32> {
    times.iter().map(|t| t.year()).collect()
}

/// Stable ascending argsort of timestamps.
///
/// Equal timestamps keep their input order, so concatenated sub-series with
/// coincident times are ordered by sub-series first.
pub fn argsort_times(times: &[NaiveDateTime]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..times.len()).collect();
    idx.sort_by_key(|&i| times[i]);
    idx
}

/// Undo a sort: place `values[i]` back at position `sort_indices[i]`.
///
/// Parameters
/// ----------
/// - `values`: `&[f64]`
///   Values in sorted order, i.e. `original[sort_indices[i]] == values[i]`.
/// - `sort_indices`: `&[usize]`
///   Permutation of `0..values.len()` used for the forward sort.
///
/// Returns
/// -------
/// `MKResult<Vec<f64>>`
///   Values restored to their original order.
///
/// Errors
/// ------
/// - `MKError::LengthMismatch`
///   Returned when the two slices differ in length.
/// - `MKError::InvalidPermutation`
///   Returned when an index is out of range or repeated.
///
/// Examples
/// --------
/// ```rust
/// # use mannkendall::series::time::de_sort;
/// let original = [3.0, 1.0, 2.0];
/// let sort_indices = [1, 2, 0];
/// let sorted: Vec<f64> = sort_indices.iter().map(|&i| original[i]).collect();
/// assert_eq!(de_sort(&sorted, &sort_indices).unwrap(), original.to_vec());
/// ```
pub fn de_sort(values: &[f64], sort_indices: &[usize]) -> MKResult<Vec<f64>> {
    let len = values.len();
    if sort_indices.len() != len {
        return Err(MKError::LengthMismatch { times: sort_indices.len(), values: len });
    }

    let mut out = vec![f64::NAN; len];
    let mut seen = vec![false; len];
    for (i, &target) in sort_indices.iter().enumerate() {
        if target >= len || seen[target] {
            return Err(MKError::InvalidPermutation { index: i, len });
        }
        seen[target] = true;
        out[target] = values[i];
    }
    Ok(out)
}

//! statistical_tests::s_statistic — the Mann-Kendall S statistic and its
//! standardized form.
//!
//! Purpose
//! -------
//! Compute S by comparing every observation with every observation of a
//! later calendar year, and standardize it into the normal variable Z used
//! for large-sample probabilities.
//!
//! Key behaviors
//! -------------
//! - [`s_test`] groups observations by calendar year; pairs within the same
//!   year are never compared, which is what makes the per-year counts the
//!   correct "ties in time" for [`kendall_var`](super::ties::kendall_var).
//! - [`std_normal_var`] applies the continuity correction towards zero:
//!   `Z = (S - sign(S)) / sqrt(var)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Missing values contribute nothing to S and are not counted per year.
//! - Years with no observation at all still get an entry (count 0) in the
//!   year-count vector, so its length is `max_year - min_year + 1`.
//! - `S(-x) == -S(x)` for any series `x`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the two- and three-point reference cases, within-year
//!   ties, empty years, NaN handling and the Z short-circuits.
use chrono::NaiveDateTime;
use ndarray::Array1;

use crate::{
    series::time::calendar_years,
    statistical_tests::{errors::MKResult, validation::validate_lengths},
};

/// Mann-Kendall S statistic with calendar-year grouping.
///
/// Parameters
/// ----------
/// - `values`: `&[f64]`
///   Observations; NaN marks a missing value.
/// - `times`: `&[NaiveDateTime]`
///   Observation timestamps, same length as `values`.
///
/// Returns
/// -------
/// `MKResult<(f64, Array1<f64>)>`
///   - `S`: Σ over year pairs `y1 < y2` of Σ `sign(v2 - v1)` over the valid
///     values of those years.
///   - Per-year count of valid values, from the earliest to the latest year
///     spanned by `times`.
///
/// Errors
/// ------
/// - `MKError::LengthMismatch` when `values` and `times` differ in length.
/// - `MKError::EmptySeries` when both are empty.
///
/// Examples
/// --------
/// ```rust
/// # use chrono::NaiveDate;
/// # use mannkendall::statistical_tests::s_statistic::s_test;
/// let t = |y| NaiveDate::from_ymd_opt(y, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let (s, n) = s_test(&[1.0, 2.0, 3.0], &[t(2000), t(2001), t(2002)]).unwrap();
/// assert_eq!(s, 3.0);
/// assert_eq!(n.to_vec(), vec![1.0, 1.0, 1.0]);
/// ```
pub fn s_test(values: &[f64], times: &[NaiveDateTime]) -> MKResult<(f64, Array1<f64>)> {
    validate_lengths(times.len(), values.len())?;

    let years = calendar_years(times);
    let min_year = years.iter().copied().min().unwrap_or_default();
    let max_year = years.iter().copied().max().unwrap_or_default();
    let n_years = (max_year - min_year) as usize + 1;

    let mut by_year: Vec<Vec<f64>> = vec![Vec::new(); n_years];
    for (&year, &v) in years.iter().zip(values) {
        if !v.is_nan() {
            by_year[(year - min_year) as usize].push(v);
        }
    }

    let mut s = 0.0;
    for (i, early) in by_year.iter().enumerate() {
        for late in &by_year[i + 1..] {
            for &v1 in early {
                for &v2 in late {
                    s += sign(v2 - v1);
                }
            }
        }
    }

    let counts = by_year.iter().map(|bucket| bucket.len() as f64).collect::<Array1<f64>>();
    Ok((s, counts))
}

/// Standardized normal variable for S.
///
/// Parameters
/// ----------
/// - `s`: `f64`
///   The S statistic.
/// - `var`: `f64`
///   Its Kendall variance.
///
/// Returns
/// -------
/// `f64`
///   `0` when `s == 0` or `var == 0`, else `(s - sign(s)) / sqrt(var)`.
///   A NaN variance propagates.
pub fn std_normal_var(s: f64, var: f64) -> f64 {
    if s == 0.0 || var == 0.0 {
        return 0.0;
    }
    (s - s.signum()) / var.sqrt()
}

/// Sign with `sign(0) == 0`; NaN differences contribute nothing.
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, 15).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Reference S values for two and three increasing points.
    // - Year grouping: no within-year comparisons, empty years counted as 0.
    // - NaN handling and sign antisymmetry.
    // - `std_normal_var` short-circuits and continuity correction.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Reference end-to-end S values.
    //
    // Given
    // -----
    // - [(2000, 5), (2001, 7)] and three strictly increasing yearly values.
    //
    // Expect
    // ------
    // - S = 1 and S = 3.
    fn s_test_matches_two_and_three_point_references() {
        let (s2, _) = s_test(&[5.0, 7.0], &[ts(2000, 1), ts(2001, 1)]).unwrap();
        let (s3, _) = s_test(&[1.0, 2.0, 4.0], &[ts(2000, 1), ts(2001, 1), ts(2002, 1)]).unwrap();
        assert_eq!(s2, 1.0);
        assert_eq!(s3, 3.0);
    }

    #[test]
    // Purpose
    // -------
    // Observations in the same year are not compared, and empty years are
    // still counted.
    //
    // Given
    // -----
    // - Two increasing values in 2000, one NaN in 2001, one value in 2003.
    //
    // Expect
    // ------
    // - S = 2 (only cross-year pairs), counts [2, 0, 0, 1].
    fn s_test_groups_by_calendar_year() {
        // Arrange
        let values = [1.0, 2.0, f64::NAN, 3.0];
        let times = [ts(2000, 1), ts(2000, 6), ts(2001, 3), ts(2003, 1)];

        // Act
        let (s, n) = s_test(&values, &times).unwrap();

        // Assert
        assert_eq!(s, 2.0);
        assert_eq!(n.to_vec(), vec![2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Negating the data negates S.
    //
    // Given
    // -----
    // - A noisy series over six years and its negation.
    //
    // Expect
    // ------
    // - S(-x) == -S(x).
    fn s_test_is_antisymmetric() {
        let values = [0.3, 1.2, 0.7, 0.7, 2.1, 1.9];
        let negated: Vec<f64> = values.iter().map(|v| -v).collect();
        let times: Vec<NaiveDateTime> = (0..6).map(|i| ts(2010 + i, 1)).collect();

        let (s, _) = s_test(&values, &times).unwrap();
        let (s_neg, _) = s_test(&negated, &times).unwrap();
        assert_eq!(s_neg, -s);
    }

    #[test]
    // Purpose
    // -------
    // Z short-circuits to zero and applies the continuity correction.
    //
    // Given
    // -----
    // - (S, var) = (0, 4), (3, 0), (5, 4), (-5, 4).
    //
    // Expect
    // ------
    // - 0, 0, 2, -2.
    fn std_normal_var_handles_zero_and_corrects_towards_zero() {
        assert_eq!(std_normal_var(0.0, 4.0), 0.0);
        assert_eq!(std_normal_var(3.0, 0.0), 0.0);
        assert_relative_eq!(std_normal_var(5.0, 4.0), 2.0);
        assert_relative_eq!(std_normal_var(-5.0, 4.0), -2.0);
    }
}

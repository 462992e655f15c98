//! statistical_tests::validation — shared input guards for trend routines.
//!
//! Purpose
//! -------
//! Centralize the argument checks shared by the tie counter, Sen's slope,
//! the MK compositor, the pre-whitening engine and the aggregation driver,
//! so each entry point rejects bad input the same way.
//!
//! Key behaviors
//! -------------
//! - [`validate_percentage`] checks confidence/significance levels.
//! - [`validate_resolution`] checks the tie resolution.
//! - [`validate_lengths`] checks timestamp/value alignment and non-emptiness.
//!
//! Conventions
//! -----------
//! - Pure functions returning `MKResult<()>`; no allocation beyond the error.
//! - Missing values (NaN) inside the *data* are never a validation error.

use crate::statistical_tests::errors::{MKError, MKResult};

/// Validate a percent-valued parameter.
///
/// Parameters
/// ----------
/// - `name`: `&'static str`
///   Public argument name, echoed in the error.
/// - `value`: `f64`
///   Candidate percentage.
///
/// Errors
/// ------
/// - `MKError::InvalidPercentage`
///   Returned when `value` is NaN or outside `[0, 100]`.
pub fn validate_percentage(name: &'static str, value: f64) -> MKResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(MKError::InvalidPercentage { name, value });
    }
    Ok(())
}

/// Validate the tie resolution (finite and strictly positive).
pub fn validate_resolution(value: f64) -> MKResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MKError::InvalidResolution { value });
    }
    Ok(())
}

/// Validate that a series has matching, non-zero timestamp/value lengths.
///
/// Errors
/// ------
/// - `MKError::LengthMismatch` when `times != values`.
/// - `MKError::EmptySeries` when both are zero.
pub fn validate_lengths(times: usize, values: usize) -> MKResult<()> {
    if times != values {
        return Err(MKError::LengthMismatch { times, values });
    }
    if values == 0 {
        return Err(MKError::EmptySeries);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Every error branch of the three guards plus their happy paths.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Percentages on the closed boundary are accepted.
    //
    // Given
    // -----
    // - 0, 95 and 100.
    //
    // Expect
    // ------
    // - All return `Ok(())`.
    fn validate_percentage_accepts_closed_interval() {
        for value in [0.0, 95.0, 100.0] {
            assert!(validate_percentage("alpha_mk", value).is_ok(), "value {value}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Out-of-range and NaN percentages are rejected with the argument name.
    //
    // Given
    // -----
    // - -1, 100.5 and NaN for `alpha_cl`.
    //
    // Expect
    // ------
    // - `InvalidPercentage { name: "alpha_cl", .. }` each time.
    fn validate_percentage_rejects_out_of_range_and_nan() {
        for value in [-1.0, 100.5, f64::NAN] {
            match validate_percentage("alpha_cl", value) {
                Err(MKError::InvalidPercentage { name, .. }) => assert_eq!(name, "alpha_cl"),
                other => panic!("expected InvalidPercentage, got {other:?}"),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Resolution must be finite and strictly positive.
    //
    // Given
    // -----
    // - 0, -0.1, inf, NaN (rejected) and 1e-3 (accepted).
    //
    // Expect
    // ------
    // - Errors for the first four, `Ok` for the last.
    fn validate_resolution_rejects_non_positive_and_non_finite() {
        for value in [0.0, -0.1, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                validate_resolution(value),
                Err(MKError::InvalidResolution { .. })
            ));
        }
        assert!(validate_resolution(1e-3).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Length guard distinguishes mismatch from emptiness.
    //
    // Given
    // -----
    // - (3, 2), (0, 0) and (4, 4).
    //
    // Expect
    // ------
    // - `LengthMismatch`, `EmptySeries`, `Ok` respectively.
    fn validate_lengths_reports_mismatch_and_empty() {
        assert_eq!(
            validate_lengths(3, 2),
            Err(MKError::LengthMismatch { times: 3, values: 2 })
        );
        assert_eq!(validate_lengths(0, 0), Err(MKError::EmptySeries));
        assert!(validate_lengths(4, 4).is_ok());
    }
}

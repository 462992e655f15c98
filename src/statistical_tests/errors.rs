//! statistical_tests::errors — crate-wide error type and Python bridge.
//!
//! Purpose
//! -------
//! Provide the single error enum and result alias used by every trend-test
//! routine in this crate (tie counting, S-statistic, Sen's slope,
//! pre-whitening and temporal aggregation), together with a conversion layer
//! to Python exceptions for PyO3-based bindings.
//!
//! Key behaviors
//! -------------
//! - Define [`MKResult`] and [`MKError`] as the canonical result and error
//!   types for input validation failures.
//! - Attach human-readable `Display` messages to each variant, embedding the
//!   offending payload (value, index, lengths, tag).
//! - Implement `From<MKError> for PyErr` so that Python callers receive a
//!   `ValueError` carrying the Rust message.
//!
//! Invariants & assumptions
//! ------------------------
//! - Only *input validation* failures are errors. Statistical undefined-ness
//!   (too few points, all-missing data, non-homogeneous trends) is reported
//!   through NaN-valued result fields and never through [`MKError`].
//! - `MKError` values are small and cheap to clone.
//!
//! Conventions
//! -----------
//! - Percent-valued parameters are named by their public argument name
//!   (`"alpha_mk"`, `"alpha_cl"`, ...) so messages point at the call site.
//!
//! Testing notes
//! -------------
//! - Unit tests verify that each variant's `Display` message embeds its
//!   payload. The PyO3 conversion is left to Python-level tests.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type MKResult<T> = Result<T, MKError>;

/// MKError — validation failures for Mann-Kendall trend routines.
///
/// Variants
/// --------
/// - `EmptySeries`
///   The observation series has no entries at all.
/// - `LengthMismatch { times, values }`
///   Timestamp and value arrays have different lengths.
/// - `InvalidResolution { value }`
///   The tie resolution is not a finite, strictly positive number.
/// - `InvalidPercentage { name, value }`
///   A percent-valued parameter lies outside `[0, 100]` or is NaN.
/// - `InvalidVariance { value }`
///   A Kendall variance passed to Sen's slope is negative or infinite.
/// - `UnknownPwMethod { name, reason }`
///   The pre-whitening tag is not one of the recognized methods.
/// - `SubSeriesCountMismatch { times, values }`
///   Aggregation was given a different number of timestamp and value arrays.
/// - `SubSeriesLengthMismatch { index, times, values }`
///   Sub-series `index` has mismatched timestamp/value lengths.
/// - `InvalidPermutation { index, len }`
///   A sort-index vector is not a permutation of `0..len`.
/// - `InvalidLag { lag, len }`
///   A lag or recursion order is incompatible with the input length.
/// - `InvalidDegreesOfFreedom { df }`
///   A chi-squared distribution could not be built for the homogeneity test.
/// - `InvalidTimestamp { index, value }`
///   An epoch-seconds timestamp is not finite or out of the calendar range.
#[derive(Debug, Clone, PartialEq)]
pub enum MKError {
    // ---- Series shape ----
    /// No observations were supplied.
    EmptySeries,

    /// Timestamps and values differ in length.
    LengthMismatch { times: usize, values: usize },

    // ---- Parameters ----
    /// Resolution must be finite and > 0.
    InvalidResolution { value: f64 },

    /// Percentages must lie in [0, 100].
    InvalidPercentage { name: &'static str, value: f64 },

    /// Kendall variance must be non-negative.
    InvalidVariance { value: f64 },

    /// Unrecognized pre-whitening tag.
    UnknownPwMethod { name: String, reason: &'static str },

    // ---- Aggregation structure ----
    /// Different number of timestamp and value sub-series.
    SubSeriesCountMismatch { times: usize, values: usize },

    /// Sub-series with mismatched timestamp/value lengths.
    SubSeriesLengthMismatch { index: usize, times: usize, values: usize },

    // ---- Low-level helpers ----
    /// Sort indices do not form a permutation.
    InvalidPermutation { index: usize, len: usize },

    /// Lag or order too large for the series.
    InvalidLag { lag: usize, len: usize },

    /// Chi-squared degrees of freedom rejected by statrs.
    InvalidDegreesOfFreedom { df: f64 },

    /// Epoch seconds that cannot be turned into a timestamp.
    InvalidTimestamp { index: usize, value: f64 },
}

impl std::error::Error for MKError {}

impl std::fmt::Display for MKError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MKError::EmptySeries => write!(f, "Observation series must not be empty."),
            MKError::LengthMismatch { times, values } => write!(
                f,
                "Timestamps and values must have equal length: got {times} timestamps and {values} values."
            ),
            MKError::InvalidResolution { value } => {
                write!(f, "Invalid resolution: {value}. Must be finite and > 0.")
            }
            MKError::InvalidPercentage { name, value } => {
                write!(f, "Invalid {name}: {value}. Must lie in [0, 100].")
            }
            MKError::InvalidVariance { value } => {
                write!(f, "Invalid Kendall variance: {value}. Must be non-negative.")
            }
            MKError::UnknownPwMethod { name, reason } => {
                write!(f, "Unknown pre-whitening method {name:?}. {reason}")
            }
            MKError::SubSeriesCountMismatch { times, values } => write!(
                f,
                "Got {times} timestamp sub-series but {values} value sub-series."
            ),
            MKError::SubSeriesLengthMismatch { index, times, values } => write!(
                f,
                "Sub-series {index}: {times} timestamps but {values} values."
            ),
            MKError::InvalidPermutation { index, len } => write!(
                f,
                "Sort indices are not a permutation of 0..{len} (offending entry at {index})."
            ),
            MKError::InvalidLag { lag, len } => {
                write!(f, "Invalid lag/order {lag} for a sequence of length {len}.")
            }
            MKError::InvalidDegreesOfFreedom { df } => {
                write!(f, "Invalid chi-squared degrees of freedom: {df}.")
            }
            MKError::InvalidTimestamp { index, value } => {
                write!(f, "Invalid timestamp at position {index}: {value} epoch seconds.")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<MKError> for PyErr {
    fn from(err: MKError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `Display` formatting for MKError variants.
    // - Embedding of payload values (lengths, names, tags) into messages.
    //
    // They intentionally DO NOT cover:
    // - The `From<MKError> for PyErr` conversion, which needs the Python C API.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `MKError::EmptySeries` has a non-empty message.
    //
    // Given
    // -----
    // - An `MKError::EmptySeries` value.
    //
    // Expect
    // ------
    // - `err.to_string()` is non-empty.
    fn mk_error_empty_series_has_nonempty_display_message() {
        // Arrange
        let err = MKError::EmptySeries;

        // Act
        let msg = err.to_string();

        // Assert
        assert!(!msg.trim().is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Ensure length mismatches report both lengths.
    //
    // Given
    // -----
    // - `LengthMismatch { times: 12, values: 11 }`.
    //
    // Expect
    // ------
    // - The message contains "12" and "11".
    fn mk_error_length_mismatch_includes_both_lengths() {
        // Arrange
        let err = MKError::LengthMismatch { times: 12, values: 11 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("12") && msg.contains("11"), "Got: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Ensure percentage errors name the offending parameter and value.
    //
    // Given
    // -----
    // - `InvalidPercentage { name: "alpha_cl", value: 120.0 }`.
    //
    // Expect
    // ------
    // - The message contains "alpha_cl" and "120".
    fn mk_error_invalid_percentage_names_parameter() {
        // Arrange
        let err = MKError::InvalidPercentage { name: "alpha_cl", value: 120.0 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("alpha_cl") && msg.contains("120"), "Got: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Ensure unknown method tags are echoed back to the caller.
    //
    // Given
    // -----
    // - `UnknownPwMethod` with name "tfpw".
    //
    // Expect
    // ------
    // - The message contains the quoted tag.
    fn mk_error_unknown_pw_method_echoes_tag() {
        // Arrange
        let err = MKError::UnknownPwMethod { name: "tfpw".to_string(), reason: "Try 'pw'." };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("\"tfpw\""), "Got: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Ensure sub-series length errors identify the sub-series index.
    //
    // Given
    // -----
    // - `SubSeriesLengthMismatch { index: 3, times: 5, values: 4 }`.
    //
    // Expect
    // ------
    // - The message mentions "Sub-series 3".
    fn mk_error_sub_series_length_mismatch_includes_index() {
        // Arrange
        let err = MKError::SubSeriesLengthMismatch { index: 3, times: 5, values: 4 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("Sub-series 3"), "Got: {msg}");
    }
}

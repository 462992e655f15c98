//! utils — conversions at the Python boundary.
//!
//! Purpose
//! -------
//! Turn Python inputs (numpy arrays, pandas Series, lists of floats or
//! `datetime` objects, epoch seconds) into the slices and timestamps the
//! core routines take. Only [`timestamps_from_epoch`] is compiled without
//! the `python-bindings` feature.
//!
//! Conventions
//! -----------
//! - Epoch seconds are interpreted as UTC and converted to naive
//!   timestamps; sub-second parts are kept to the nanosecond.
use chrono::{DateTime, NaiveDateTime};

use crate::statistical_tests::errors::{MKError, MKResult};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

/// Convert UTC epoch seconds into naive timestamps.
///
/// Errors
/// ------
/// - `MKError::InvalidTimestamp` for a non-finite value or one outside the
///   range chrono can represent.
pub fn timestamps_from_epoch(secs: &[f64]) -> MKResult<Vec<NaiveDateTime>> {
    secs.iter()
        .enumerate()
        .map(|(index, &value)| {
            let invalid = MKError::InvalidTimestamp { index, value };
            if !value.is_finite() {
                return Err(invalid);
            }
            let whole = value.floor();
            let nanos = (((value - whole) * 1e9).round() as u32).min(999_999_999);
            DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc()).ok_or(invalid)
        })
        .collect()
}

/// Borrow a 1-D float64 array from a numpy array, a pandas Series or any
/// float sequence. Missing values stay NaN.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_values: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr) = raw_values.extract::<PyReadonlyArray1<f64>>() {
        if arr.as_slice().is_ok() {
            return Ok(arr);
        }
    }

    if let Ok(obj) = raw_values.call_method("to_numpy", (false,), None) {
        if let Ok(series) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series.as_slice().is_ok() {
                return Ok(series);
            }
        }
    }

    let vec: Vec<f64> = raw_values.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Values of one series as an owned vector.
#[cfg(feature = "python-bindings")]
pub fn extract_values<'py>(py: Python<'py>, raw_values: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
    let arr = extract_f64_array(py, raw_values)?;
    let slice = arr.as_slice().map_err(|_| {
        PyTypeError::new_err("values must be a 1-D contiguous float64 array or sequence")
    })?;
    Ok(slice.to_vec())
}

/// Timestamps of one series, from `datetime` objects or epoch seconds.
#[cfg(feature = "python-bindings")]
pub fn extract_timestamps<'py>(
    py: Python<'py>, raw_times: &Bound<'py, PyAny>,
) -> PyResult<Vec<NaiveDateTime>> {
    if let Ok(times) = raw_times.extract::<Vec<NaiveDateTime>>() {
        return Ok(times);
    }
    let secs = extract_values(py, raw_times).map_err(|_| {
        PyTypeError::new_err("timestamps must be naive datetime objects or epoch seconds")
    })?;
    Ok(timestamps_from_epoch(&secs)?)
}

/// Split a Python list of sub-series into its items.
#[cfg(feature = "python-bindings")]
pub fn extract_sub_series<'py>(raw: &Bound<'py, PyAny>) -> PyResult<Vec<Bound<'py, PyAny>>> {
    raw.extract::<Vec<Bound<'py, PyAny>>>()
        .map_err(|_| PyTypeError::new_err("expected a list of 1-D sub-series"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Epoch-second conversion, including fractional seconds.
    // - Rejection of non-finite and out-of-range values.
    //
    // They intentionally DO NOT cover:
    // - The PyO3 extractors, which need a Python interpreter.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Epoch seconds map to the matching UTC timestamps.
    //
    // Given
    // -----
    // - 0, 946_684_800 (2000-01-01) and 1.5.
    //
    // Expect
    // ------
    // - 1970-01-01, 2000-01-01 and 1970-01-01 00:00:01.500.
    fn timestamps_from_epoch_converts_utc_seconds() {
        let out = timestamps_from_epoch(&[0.0, 946_684_800.0, 1.5]).unwrap();

        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(out[0], day(1970, 1, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(out[1], day(2000, 1, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(out[2], day(1970, 1, 1).and_hms_milli_opt(0, 0, 1, 500).unwrap());
    }

    #[test]
    // Purpose
    // -------
    // Unusable values are reported with their position.
    //
    // Given
    // -----
    // - A NaN at position 1; 1e300 at position 0.
    //
    // Expect
    // ------
    // - `InvalidTimestamp` with the matching index.
    fn timestamps_from_epoch_rejects_bad_values() {
        assert!(matches!(
            timestamps_from_epoch(&[0.0, f64::NAN]),
            Err(MKError::InvalidTimestamp { index: 1, .. })
        ));
        assert!(matches!(
            timestamps_from_epoch(&[1e300]),
            Err(MKError::InvalidTimestamp { index: 0, .. })
        ));
    }
}

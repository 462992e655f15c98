//! statistical_tests::sen_slope — Sen's slope with interpolated confidence
//! limits.
//!
//! Purpose
//! -------
//! Estimate the magnitude of a monotonic trend as the median of all pairwise
//! slopes, with lower/upper confidence limits read off the sorted slope
//! distribution at ranks derived from the Kendall variance.
//!
//! Key behaviors
//! -------------
//! - Pairwise slopes `(v_j - v_i) / (t_j - t_i)` for `j > i`; non-finite
//!   slopes (missing values, coincident timestamps) are discarded.
//! - `C = Φ⁻¹(1 - (1 - confidence/100)/2) · sqrt(variance)`; the limits sit at
//!   zero-based ranks `0.5 (N - C) - 1` and `0.5 (N + C) - 1` of the sorted
//!   slopes, linearly interpolated and clamped to the extremes. Limits
//!   that would land on the wrong side of the median are pulled onto it.
//!
//! Invariants & assumptions
//! ------------------------
//! - `lcl <= slope <= ucl` whenever the variance is finite.
//! - Units are value per second; multiply by
//!   [`SECONDS_PER_YEAR`](crate::series::time::SECONDS_PER_YEAR) for per-year
//!   trends.
//! - A NaN variance is accepted and produces NaN limits around a finite
//!   slope; no finite pairwise slope at all yields NaN for all three.
//!
//! Testing notes
//! -------------
//! - Unit tests cover an exact linear trend, CI ordering and clamping, NaN
//!   propagation and the argument checks.
use chrono::NaiveDateTime;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{
    series::time::elapsed_seconds,
    statistical_tests::{
        errors::{MKError, MKResult},
        nanstats::median_of_sorted,
        validation::{validate_lengths, validate_percentage},
    },
};

/// Sen's slope estimate and its confidence limits (value per second).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SenSlope {
    pub slope: f64,
    pub lcl: f64,
    pub ucl: f64,
}

impl SenSlope {
    fn undefined() -> Self {
        SenSlope { slope: f64::NAN, lcl: f64::NAN, ucl: f64::NAN }
    }

    /// Multiply all three fields by `factor` (e.g. seconds per year).
    pub fn scaled(&self, factor: f64) -> Self {
        SenSlope { slope: self.slope * factor, lcl: self.lcl * factor, ucl: self.ucl * factor }
    }
}

/// Sen's slope of `values` against `times`.
///
/// Parameters
/// ----------
/// - `times`: `&[NaiveDateTime]`
///   Observation timestamps.
/// - `values`: `&[f64]`
///   Observations, NaN for missing entries.
/// - `variance`: `f64`
///   Kendall variance of S for this series. Must be non-negative or NaN.
/// - `confidence`: `f64`
///   Confidence level of the limits, in percent (`[0, 100]`, usually 90).
///
/// Returns
/// -------
/// `MKResult<SenSlope>`
///   Slope, lower and upper confidence limits in value per second.
///
/// Errors
/// ------
/// - `MKError::InvalidPercentage` when `confidence` is outside `[0, 100]`.
/// - `MKError::InvalidVariance` when `variance` is negative or infinite.
/// - `MKError::LengthMismatch` / `MKError::EmptySeries` for bad shapes.
///
/// Examples
/// --------
/// ```rust
/// # use chrono::NaiveDate;
/// # use mannkendall::statistical_tests::sen_slope::sen_slope;
/// let t = |d| NaiveDate::from_ymd_opt(2000, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let out = sen_slope(&[t(1), t(2), t(3)], &[0.0, 86400.0, 172800.0], 1.0, 90.0).unwrap();
/// assert!((out.slope - 1.0).abs() < 1e-12);
/// ```
pub fn sen_slope(
    times: &[NaiveDateTime], values: &[f64], variance: f64, confidence: f64,
) -> MKResult<SenSlope> {
    validate_lengths(times.len(), values.len())?;
    sen_slope_seconds(&elapsed_seconds(times), values, variance, confidence)
}

/// Sen's slope against elapsed seconds rather than timestamps.
///
/// Same contract as [`sen_slope`]; used by the pre-whitening engine which
/// already works in seconds.
pub fn sen_slope_seconds(
    secs: &[f64], values: &[f64], variance: f64, confidence: f64,
) -> MKResult<SenSlope> {
    validate_lengths(secs.len(), values.len())?;
    validate_percentage("confidence", confidence)?;
    if variance < 0.0 || variance.is_infinite() {
        return Err(MKError::InvalidVariance { value: variance });
    }

    let mut slopes = pairwise_slopes(secs, values);
    if slopes.is_empty() {
        return Ok(SenSlope::undefined());
    }
    slopes.sort_by(f64::total_cmp);

    let slope = median_of_sorted(&slopes);

    let z = Normal::standard().inverse_cdf(1.0 - (1.0 - confidence / 100.0) / 2.0);
    let c = z * variance.sqrt();
    let n = slopes.len() as f64;
    let m1 = 0.5 * (n - c) - 1.0;
    let m2 = 0.5 * (n + c) - 1.0;

    // With C < 1 the upper rank falls below the median rank.
    let lcl = interp_rank(&slopes, m1);
    let ucl = interp_rank(&slopes, m2);
    Ok(SenSlope {
        slope,
        lcl: if lcl > slope { slope } else { lcl },
        ucl: if ucl < slope { slope } else { ucl },
    })
}

/// All finite pairwise slopes `(v_j - v_i) / (t_j - t_i)`, `j > i`.
fn pairwise_slopes(secs: &[f64], values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            let d = (values[j] - values[i]) / (secs[j] - secs[i]);
            if d.is_finite() {
                out.push(d);
            }
        }
    }
    out
}

/// Linear interpolation at fractional rank `x` of a sorted slice, clamped
/// to its first and last elements.
fn interp_rank(sorted: &[f64], x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let last = sorted.len() - 1;
    if x <= 0.0 {
        return sorted[0];
    }
    if x >= last as f64 {
        return sorted[last];
    }
    let lo = x.floor() as usize;
    let frac = x - lo as f64;
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}

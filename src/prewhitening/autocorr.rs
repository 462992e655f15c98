//! prewhitening::autocorr — NaN-tolerant autocorrelation and the
//! Levinson-Durbin recursion.
//!
//! Purpose
//! -------
//! Provide the two numerical building blocks of the AR(1) fit: a lagged
//! Pearson autocorrelation that skips missing values pairwise, and the
//! order-recursive Levinson-Durbin solver that turns an autocorrelation
//! sequence into AR coefficients and partial autocorrelations.
//!
//! Key behaviors
//! -------------
//! - [`nanautocorr`] demeans into a fresh buffer (the input is never
//!   modified), then for every lag `0..=max_lag` correlates the overlapping
//!   pairs where both values are present. Lag 0 is exactly `1.0`.
//! - [`levinson`] runs the classical recursion and returns the AR polynomial
//!   `a = [1, a_1, ..., a_p]`, the final prediction error and the reflection
//!   coefficients `k`; the partial autocorrelations are `-k`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `significant_lags <= max_lag < series.len()`.
//! - `order < r.len()` for the recursion.
//! - A lag without at least two valid pairs, or with zero spread, yields a
//!   NaN coefficient rather than an error.
//!
//! Conventions
//! -----------
//! - The confidence bound is `1.96 / sqrt(N) · sqrt(Σ_{k=0..=r} ρ_k²)` with
//!   `N` the full series length, missing values included.
//! - The recursion follows the signal-processing sign convention
//!   (`x_t + a_1 x_{t-1} + ... = e_t`).
//!
//! Testing notes
//! -------------
//! - Unit tests check lag-0 exactness, a hand-computed lag-1 value with
//!   missing data, input immutability, AR(1)/AR(2) recursions and the
//!   argument checks.
use ndarray::Array1;

use crate::statistical_tests::{
    errors::{MKError, MKResult},
    nanstats::nanmean,
};

/// Two-sided 95% normal quantile used for the autocorrelation bound.
const BOUND_QUANTILE: f64 = 1.96;

/// Lagged autocorrelation of a series with missing values.
///
/// Parameters
/// ----------
/// - `series`: `&[f64]`
///   Observations, NaN for missing entries. Not modified.
/// - `max_lag`: `usize`
///   Largest lag to compute; must be `< series.len()`.
/// - `significant_lags`: `usize`
///   Number of lags entering the confidence bound; must be `<= max_lag`.
///
/// Returns
/// -------
/// `MKResult<(Array1<f64>, f64)>`
///   Coefficients for lags `0..=max_lag` and the confidence bound.
///
/// Errors
/// ------
/// - `MKError::InvalidLag`
///   Returned when `max_lag >= series.len()` or
///   `significant_lags > max_lag`.
///
/// Examples
/// --------
/// ```rust
/// # use mannkendall::prewhitening::autocorr::nanautocorr;
/// let (rho, _) = nanautocorr(&[1.0, 3.0, 2.0, 5.0, 4.0], 2, 1).unwrap();
/// assert_eq!(rho[0], 1.0);
/// ```
pub fn nanautocorr(
    series: &[f64], max_lag: usize, significant_lags: usize,
) -> MKResult<(Array1<f64>, f64)> {
    let len = series.len();
    if max_lag >= len {
        return Err(MKError::InvalidLag { lag: max_lag, len });
    }
    if significant_lags > max_lag {
        return Err(MKError::InvalidLag { lag: significant_lags, len: max_lag + 1 });
    }

    let mean = nanmean(series);
    let centred: Vec<f64> = series.iter().map(|v| v - mean).collect();

    let mut rho = Array1::<f64>::from_elem(max_lag + 1, f64::NAN);
    for lag in 0..=max_lag {
        let r = paired_correlation(&centred[lag..], &centred[..len - lag]);
        rho[lag] = if lag == 0 && r.is_finite() { 1.0 } else { r };
    }

    let ss: f64 = rho.iter().take(significant_lags + 1).map(|r| r * r).sum();
    let bound = BOUND_QUANTILE / (len as f64).sqrt() * ss.sqrt();

    Ok((rho, bound))
}

/// Pearson correlation over the positions where both inputs are present.
fn paired_correlation(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> =
        x.iter().zip(y).filter(|(a, b)| !a.is_nan() && !b.is_nan()).map(|(&a, &b)| (a, b)).collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxy, sxx, syy) = pairs.iter().fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), &(a, b)| {
        let (da, db) = (a - mx, b - my);
        (sxy + da * db, sxx + da * da, syy + db * db)
    });
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 { f64::NAN } else { sxy / denom }
}

/// Output of the Levinson-Durbin recursion.
///
/// Fields
/// ------
/// - `a`: AR polynomial `[1, a_1, ..., a_p]`.
/// - `error`: one-step prediction error after order `p`.
/// - `reflection`: reflection coefficients `k_1..k_p`.
#[derive(Debug, Clone, PartialEq)]
pub struct LevinsonOutcome {
    pub a: Array1<f64>,
    pub error: f64,
    pub reflection: Array1<f64>,
}

impl LevinsonOutcome {
    /// Partial autocorrelations, `-k`.
    pub fn pacf(&self) -> Array1<f64> {
        -&self.reflection
    }
}

/// Levinson-Durbin recursion on an autocorrelation (or autocovariance)
/// sequence.
///
/// Parameters
/// ----------
/// - `r`: `&[f64]`
///   Sequence `r_0, r_1, ...`; only the first `order + 1` entries are used.
/// - `order`: `usize`
///   AR order `p`; must be `< r.len()`.
///
/// Returns
/// -------
/// `MKResult<LevinsonOutcome>`
///   AR polynomial of length `p + 1`, prediction error, reflection
///   coefficients of length `p`.
///
/// Errors
/// ------
/// - `MKError::InvalidLag` when `order >= r.len()`.
///
/// Notes
/// -----
/// - Scaling `r` by a positive constant scales `error` and leaves `a` and
///   `reflection` unchanged.
pub fn levinson(r: &[f64], order: usize) -> MKResult<LevinsonOutcome> {
    if order >= r.len() {
        return Err(MKError::InvalidLag { lag: order, len: r.len() });
    }

    let mut a = vec![1.0];
    let mut error = r[0];
    let mut reflection = Vec::with_capacity(order);

    for m in 1..=order {
        let acc = r[m] + (1..m).map(|j| a[j] * r[m - j]).sum::<f64>();
        let k = -acc / error;

        let prev = a.clone();
        a.push(k);
        for j in 1..m {
            a[j] = prev[j] + k * prev[m - j];
        }
        error *= 1.0 - k * k;
        reflection.push(k);
    }

    Ok(LevinsonOutcome {
        a: Array1::from(a),
        error,
        reflection: Array1::from(reflection),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `nanautocorr`: lag-0 exactness, pairwise NaN skipping, bound, and
    //   immutability of the input.
    // - `levinson`: AR(1) and AR(2) recursions and the order guard.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Lag 0 is exactly one and lag 1 matches a hand computation.
    //
    // Given
    // -----
    // - [1, 2, NaN, 4, 5, 6] (mean 3.6), lags up to 2.
    //
    // Expect
    // ------
    // - rho[0] == 1; rho[1] equals the Pearson correlation of the valid
    //   pairs (2,1), (5,4), (6,5), which is 1.
    fn nanautocorr_lag_zero_is_one_and_pairs_skip_nan() {
        // Arrange
        let data = [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0];

        // Act
        let (rho, _) = nanautocorr(&data, 2, 1).unwrap();

        // Assert
        assert_eq!(rho[0], 1.0);
        assert_relative_eq!(rho[1], 1.0, epsilon = 1e-12);
        assert_eq!(rho.len(), 3);
    }

    #[test]
    // Purpose
    // -------
    // An alternating series has lag-1 correlation -1 and the bound follows
    // the documented formula.
    //
    // Given
    // -----
    // - [1, -1, 1, -1, 1, -1, 1, -1], r = 1.
    //
    // Expect
    // ------
    // - rho[1] = -1; bound = 1.96 / sqrt(8) · sqrt(2).
    fn nanautocorr_alternating_series_and_bound() {
        let data = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];

        let (rho, bound) = nanautocorr(&data, 3, 1).unwrap();

        assert_relative_eq!(rho[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(bound, 1.96 / 8f64.sqrt() * 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The caller's buffer is not demeaned in place.
    //
    // Given
    // -----
    // - A vector with mean 2.
    //
    // Expect
    // ------
    // - The vector is unchanged after the call.
    fn nanautocorr_does_not_mutate_input() {
        let data = vec![1.0, 2.0, 3.0, 2.0, 1.0, 3.0];
        let copy = data.clone();

        let _ = nanautocorr(&data, 2, 1).unwrap();

        assert_eq!(data, copy);
    }

    #[test]
    // Purpose
    // -------
    // Lag arguments are checked.
    //
    // Given
    // -----
    // - max_lag equal to the length; significant lags above max_lag.
    //
    // Expect
    // ------
    // - `InvalidLag` both times.
    fn nanautocorr_rejects_invalid_lags() {
        let data = [1.0, 2.0, 3.0];
        assert!(matches!(nanautocorr(&data, 3, 0), Err(MKError::InvalidLag { .. })));
        assert!(matches!(nanautocorr(&data, 1, 2), Err(MKError::InvalidLag { .. })));
    }

    #[test]
    // Purpose
    // -------
    // AR(1) autocorrelations give one reflection coefficient and a PACF
    // equal to the lag-1 correlation.
    //
    // Given
    // -----
    // - r = [1, 0.6, 0.36], order 2.
    //
    // Expect
    // ------
    // - a = [1, -0.6, 0], error = 0.64, pacf = [0.6, 0].
    fn levinson_recovers_ar1() {
        // Arrange
        let r = [1.0, 0.6, 0.36];

        // Act
        let out = levinson(&r, 2).unwrap();

        // Assert
        assert_relative_eq!(out.a[0], 1.0);
        assert_relative_eq!(out.a[1], -0.6, epsilon = 1e-12);
        assert_relative_eq!(out.a[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.error, 0.64, epsilon = 1e-12);
        let pacf = out.pacf();
        assert_relative_eq!(pacf[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(pacf[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // AR(2) Yule-Walker solution is reproduced.
    //
    // Given
    // -----
    // - x_t = 0.5 x_{t-1} + 0.3 x_{t-2} + e_t, whose autocorrelations are
    //   ρ1 = 0.5 / 0.7, ρ2 = 0.5 ρ1 + 0.3.
    //
    // Expect
    // ------
    // - a = [1, -0.5, -0.3]; last reflection coefficient -0.3.
    fn levinson_recovers_ar2() {
        let rho1 = 0.5 / 0.7;
        let rho2 = 0.5 * rho1 + 0.3;

        let out = levinson(&[1.0, rho1, rho2], 2).unwrap();

        assert_relative_eq!(out.a[1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(out.a[2], -0.3, epsilon = 1e-12);
        assert_relative_eq!(out.reflection[1], -0.3, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The order must fit inside the sequence.
    //
    // Given
    // -----
    // - A 2-element sequence and order 2.
    //
    // Expect
    // ------
    // - `InvalidLag { lag: 2, len: 2 }`.
    fn levinson_rejects_order_beyond_sequence() {
        assert_eq!(levinson(&[1.0, 0.5], 2), Err(MKError::InvalidLag { lag: 2, len: 2 }));
    }
}

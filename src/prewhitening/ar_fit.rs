//! prewhitening::ar_fit — lag-1 autoregressive fit with a significance test.
//!
//! Purpose
//! -------
//! Estimate the lag-1 autocorrelation of a series, decide from the first
//! partial autocorrelation whether it is statistically significant, and if
//! so remove the AR(1) component.
//!
//! Key behaviors
//! -------------
//! - Up to [`MAX_AUTOCORR_LAGS`] lags are computed (at most half the series
//!   length), and up to [`MAX_SIGNIFICANT_LAGS`] enter the Levinson-Durbin
//!   recursion.
//! - The lag-1 PACF is compared with `Φ⁻¹(1 - (1 - alpha_ak/100)/2) /
//!   sqrt(n_valid)`. Below the bound the series is returned unchanged with
//!   significance `0` and a warning is logged.
//! - Above it, `w_0 = NaN` and `w_i = x_i - ρ_1 x_{i-1}`, with significance
//!   `alpha_ak`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Infinite values are treated as missing in a private copy; the caller's
//!   slice is never modified.
//! - All-missing input gives `(NaN, all-NaN, NaN)` without a warning.
//! - Series too short for two lags (fewer than four points) are reported as
//!   not significant.
//!
//! Testing notes
//! -------------
//! - Unit tests cover a strongly autocorrelated series, the infinite-bound
//!   path, the all-missing and short-series paths and infinity handling.
use ndarray::Array1;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

use crate::{
    prewhitening::autocorr::{levinson, nanautocorr},
    series::data::count_valid,
    statistical_tests::{errors::MKResult, validation::validate_percentage},
};

/// Maximum number of autocorrelation lags computed.
pub const MAX_AUTOCORR_LAGS: usize = 10;

/// Maximum AR order used for the partial autocorrelation.
pub const MAX_SIGNIFICANT_LAGS: usize = 5;

/// ArFit — result of the lag-1 autoregressive fit.
///
/// Fields
/// ------
/// - `ak_lag`: lag-1 autocorrelation coefficient.
/// - `ak_std`: standard error of the lag-1 PACF, `sqrt((1 - φ²)/n_valid)`.
/// - `whitened`: AR(1)-removed series when significant, else a copy of the
///   (infinity-cleaned) input.
/// - `ss`: `alpha_ak` when significant, `0` when not, NaN for all-missing
///   input.
/// - `significant`: whether the AR(1) component was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArFit {
    pub ak_lag: f64,
    pub ak_std: f64,
    pub whitened: Array1<f64>,
    pub ss: f64,
    pub significant: bool,
}

impl ArFit {
    fn undefined(len: usize) -> Self {
        ArFit {
            ak_lag: f64::NAN,
            ak_std: f64::NAN,
            whitened: Array1::from_elem(len, f64::NAN),
            ss: f64::NAN,
            significant: false,
        }
    }

    fn not_significant(ak_lag: f64, ak_std: f64, cleaned: Vec<f64>) -> Self {
        ArFit { ak_lag, ak_std, whitened: Array1::from(cleaned), ss: 0.0, significant: false }
    }

    /// Number of non-missing values in the whitened series.
    pub fn n_valid(&self) -> usize {
        self.whitened.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Fit an AR(1) component and remove it when significant.
///
/// Parameters
/// ----------
/// - `obs`: `&[f64]`
///   Observations, NaN for missing entries; infinities count as missing.
/// - `alpha_ak`: `f64`
///   Confidence level (percent) of the autocorrelation test, default 95.
///
/// Returns
/// -------
/// `MKResult<ArFit>`
///   The lag-1 coefficient, its standard error, the (possibly) whitened
///   series and the significance flag.
///
/// Errors
/// ------
/// - `MKError::InvalidPercentage` when `alpha_ak` is outside `[0, 100]`.
///
/// Notes
/// -----
/// - A NaN PACF (e.g. a constant series) is not below the bound and takes
///   the significant branch; the resulting all-NaN series is handled by
///   the caller.
pub fn nanprewhite_arok(obs: &[f64], alpha_ak: f64) -> MKResult<ArFit> {
    validate_percentage("alpha_ak", alpha_ak)?;

    let cleaned: Vec<f64> =
        obs.iter().map(|&v| if v.is_infinite() { f64::NAN } else { v }).collect();
    let n_valid = count_valid(&cleaned);
    if n_valid == 0 {
        return Ok(ArFit::undefined(obs.len()));
    }

    let nlag = MAX_AUTOCORR_LAGS.min(cleaned.len() / 2);
    if nlag < 2 {
        warn!(len = cleaned.len(), "series too short to fit an AR(1) component");
        return Ok(ArFit::not_significant(f64::NAN, f64::NAN, cleaned));
    }
    let p_ind = MAX_SIGNIFICANT_LAGS.min(nlag - 1);

    let (rho, _) = nanautocorr(&cleaned, nlag, p_ind)?;
    let scaled: Vec<f64> = rho.iter().map(|r| r / n_valid as f64).collect();
    let pacf = levinson(&scaled, p_ind)?.pacf();

    let n = n_valid as f64;
    let ak_lag = rho[1];
    let ak_std = ((1.0 - pacf[0] * pacf[0]) / n).sqrt();
    let uconf = Normal::standard().inverse_cdf(1.0 - (1.0 - alpha_ak / 100.0) / 2.0) / n.sqrt();

    if pacf[0].abs() < uconf {
        warn!(
            n_valid,
            pacf_lag1 = pacf[0],
            bound = uconf,
            "no statistically significant autocorrelation"
        );
        return Ok(ArFit::not_significant(ak_lag, ak_std, cleaned));
    }

    let mut whitened = Array1::from_elem(cleaned.len(), f64::NAN);
    for i in 1..cleaned.len() {
        whitened[i] = cleaned[i] - ak_lag * cleaned[i - 1];
    }

    Ok(ArFit { ak_lag, ak_std, whitened, ss: alpha_ak, significant: true })
}

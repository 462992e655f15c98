//! prewhitening::prewhite — the five pre-whitened datasets used by the
//! Mann-Kendall driver.
//!
//! Purpose
//! -------
//! Remove lag-1 autocorrelation from an (already time-sorted) series in the
//! five ways the aggregation driver can consume: plain pre-whitening (PW),
//! its variance-corrected form (PW_COR), trend-free pre-whitening after Yue
//! (TFPW_Y), the iterative Wang & Swail scheme (TFPW_WS) and the
//! variance-corrected TFPW (VCTFPW).
//!
//! Key behaviors
//! -------------
//! - The raw series is fitted once with
//!   [`nanprewhite_arok`](crate::prewhitening::ar_fit::nanprewhite_arok).
//!   Unless the lag-1 component is significant and at least
//!   [`MIN_PW_COEFFICIENT`], every dataset is a copy of the input.
//! - Trends are removed and added back in value per second against the
//!   seconds elapsed since the first timestamp.
//! - TFPW_WS iterates detrend / refit / re-slope until the AR coefficient
//!   moves less than [`AK_TOLERANCE`] or the slope less than
//!   [`SLOPE_TOLERANCE`], and gives up after [`MAX_TFPW_WS_ITERATIONS`]
//!   rounds, keeping the last estimate.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every dataset has the input length and is aligned with the input
//!   timestamps; the caller's slice is never modified.
//! - Infinite values are treated as missing.
//! - The computation is deterministic: identical inputs give bit-identical
//!   outputs.
//!
//! Downstream usage
//! ----------------
//! - [`mk_temp_aggr`](crate::aggregation::temp_aggr::mk_temp_aggr) runs
//!   [`prewhite`] once over the time-sorted concatenation of all
//!   sub-series and picks datasets through [`PrewhitenedSet::get`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover the collapse branch, a trended AR(1) series, the
//!   TFPW_Y and VCTFPW formulas recomputed from the AR fit, the TFPW_WS
//!   round limit, a diverging TFPW_WS series, determinism and the argument
//!   checks.
use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use ndarray::Array1;
use tracing::{debug, warn};

use crate::{
    prewhitening::ar_fit::nanprewhite_arok,
    series::data::{ObservationSeries, count_valid},
    statistical_tests::{
        errors::{MKError, MKResult},
        nanstats::nanvar,
        s_statistic::s_test,
        sen_slope::sen_slope_seconds,
        ties::{kendall_var, nb_tie},
        validation::{validate_percentage, validate_resolution},
    },
};

/// Maximum number of TFPW_WS refinement rounds; the last estimate is kept
/// when the tolerances are still not met.
pub const MAX_TFPW_WS_ITERATIONS: usize = 10;

/// Convergence tolerance on the lag-1 coefficient in TFPW_WS.
pub const AK_TOLERANCE: f64 = 1e-4;

/// Convergence tolerance on the slope in TFPW_WS (1e-4 per day, in 1/s).
pub const SLOPE_TOLERANCE: f64 = 1e-4 / 86_400.0;

/// Smallest lag-1 coefficient for which pre-whitening is applied.
pub const MIN_PW_COEFFICIENT: f64 = 0.05;

/// Confidence level used for the internal slope estimates. Only the point
/// slope is consumed, so the level has no effect on the datasets.
const INTERNAL_SLOPE_CONFIDENCE: f64 = 90.0;

/// PwSeries — key of one pre-whitened dataset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PwSeries {
    Pw,
    PwCor,
    TfpwY,
    TfpwWs,
    Vctfpw,
}

impl PwSeries {
    /// All dataset keys in output order.
    pub const ALL: [PwSeries; 5] =
        [PwSeries::Pw, PwSeries::PwCor, PwSeries::TfpwY, PwSeries::TfpwWs, PwSeries::Vctfpw];

    /// Lower-case tag of the dataset.
    pub fn tag(&self) -> &'static str {
        match self {
            PwSeries::Pw => "pw",
            PwSeries::PwCor => "pw_cor",
            PwSeries::TfpwY => "tfpw_y",
            PwSeries::TfpwWs => "tfpw_ws",
            PwSeries::Vctfpw => "vctfpw",
        }
    }
}

impl fmt::Display for PwSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PwSeries {
    type Err = MKError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        PwSeries::ALL.into_iter().find(|key| key.tag() == lower).ok_or(MKError::UnknownPwMethod {
            name: s.to_string(),
            reason: "Valid datasets are: pw, pw_cor, tfpw_y, tfpw_ws, vctfpw",
        })
    }
}

/// The five pre-whitened datasets, each aligned with the input timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct PrewhitenedSet {
    pub pw: Array1<f64>,
    pub pw_cor: Array1<f64>,
    pub tfpw_y: Array1<f64>,
    pub tfpw_ws: Array1<f64>,
    pub vctfpw: Array1<f64>,
}

impl PrewhitenedSet {
    fn uniform(values: &[f64]) -> Self {
        let copy = Array1::from(values.to_vec());
        PrewhitenedSet {
            pw: copy.clone(),
            pw_cor: copy.clone(),
            tfpw_y: copy.clone(),
            tfpw_ws: copy.clone(),
            vctfpw: copy,
        }
    }

    /// Dataset stored under `key`.
    pub fn get(&self, key: PwSeries) -> &Array1<f64> {
        match key {
            PwSeries::Pw => &self.pw,
            PwSeries::PwCor => &self.pw_cor,
            PwSeries::TfpwY => &self.tfpw_y,
            PwSeries::TfpwWs => &self.tfpw_ws,
            PwSeries::Vctfpw => &self.vctfpw,
        }
    }
}

/// ArCoefficients — lag-1 coefficients behind each dataset.
///
/// Fields
/// ------
/// - `pw`: coefficient of the raw series (also used for `pw_cor`).
/// - `ss`: significance flag of that fit (`alpha_ak`, `0` or NaN).
/// - `vctfpw` / `tfpw_y`: coefficient of the raw series detrended with its
///   own Sen's slope.
/// - `ss_vc`: significance flag of that fit.
/// - `tfpw_ws`: coefficient reached by the TFPW_WS iteration.
///
/// Everything except `pw` and `ss` is NaN when pre-whitening is skipped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArCoefficients {
    pub pw: f64,
    pub ss: f64,
    pub vctfpw: f64,
    pub ss_vc: f64,
    pub tfpw_y: f64,
    pub tfpw_ws: f64,
}

impl ArCoefficients {
    /// Coefficient behind the dataset `key`.
    pub fn get(&self, key: PwSeries) -> f64 {
        match key {
            PwSeries::Pw | PwSeries::PwCor => self.pw,
            PwSeries::TfpwY => self.tfpw_y,
            PwSeries::TfpwWs => self.tfpw_ws,
            PwSeries::Vctfpw => self.vctfpw,
        }
    }
}

/// Output of [`prewhite`].
#[derive(Debug, Clone, PartialEq)]
pub struct PrewhiteOutcome {
    pub datasets: PrewhitenedSet,
    pub coefficients: ArCoefficients,
    /// Number of TFPW_WS refinement rounds performed.
    pub tfpw_ws_iterations: usize,
}

/// Build the five pre-whitened datasets of a time-sorted series.
///
/// Parameters
/// ----------
/// - `obs`: `&[f64]`
///   Observations, NaN for missing entries.
/// - `times`: `&[NaiveDateTime]`
///   Timestamps, sorted ascending, same length as `obs`.
/// - `resolution`: `f64`
///   Tie resolution used by the internal Sen's slope estimates.
/// - `alpha_ak`: `f64`
///   Confidence level (percent) of the autocorrelation tests.
///
/// Returns
/// -------
/// `MKResult<PrewhiteOutcome>`
///   The datasets, the coefficients behind them and the number of TFPW_WS
///   rounds.
///
/// Errors
/// ------
/// - `MKError::LengthMismatch` / `MKError::EmptySeries` for bad shapes.
/// - `MKError::InvalidResolution` for a bad resolution.
/// - `MKError::InvalidPercentage` when `alpha_ak` is outside `[0, 100]`.
///
/// Notes
/// -----
/// - Every AR fit that finds no significant autocorrelation logs a
///   warning; none of them is an error.
pub fn prewhite(
    obs: &[f64], times: &[NaiveDateTime], resolution: f64, alpha_ak: f64,
) -> MKResult<PrewhiteOutcome> {
    validate_resolution(resolution)?;
    validate_percentage("alpha_ak", alpha_ak)?;
    let series = ObservationSeries::new(times, obs)?;

    let cleaned: Vec<f64> =
        obs.iter().map(|&v| if v.is_infinite() { f64::NAN } else { v }).collect();
    let secs = series.elapsed_seconds();
    let trend = TrendContext { times: &series.times, secs: &secs, resolution };

    let fit = nanprewhite_arok(&cleaned, alpha_ak)?;
    let mut coefficients = ArCoefficients {
        pw: fit.ak_lag,
        ss: fit.ss,
        vctfpw: f64::NAN,
        ss_vc: f64::NAN,
        tfpw_y: f64::NAN,
        tfpw_ws: f64::NAN,
    };

    if !(fit.n_valid() > 0 && fit.significant && fit.ak_lag >= MIN_PW_COEFFICIENT) {
        debug!(ak = fit.ak_lag, ss = fit.ss, "pre-whitening skipped");
        return Ok(PrewhiteOutcome {
            datasets: PrewhitenedSet::uniform(&cleaned),
            coefficients,
            tfpw_ws_iterations: 0,
        });
    }

    let pw = fit.whitened.clone();
    let pw_cor = &fit.whitened / (1.0 - fit.ak_lag);

    let b0_pw = trend.slope(as_slice(&pw_cor), &cleaned)?;
    let b0_or = trend.slope(&cleaned, &cleaned)?;

    let fit_or = nanprewhite_arok(&add_trend(&cleaned, &secs, -b0_or), alpha_ak)?;
    coefficients.vctfpw = fit_or.ak_lag;
    coefficients.ss_vc = fit_or.ss;
    coefficients.tfpw_y = fit_or.ak_lag;

    let tfpw_y = if fit_or.n_valid() > 0 {
        Array1::from(add_trend(as_slice(&fit_or.whitened), &secs, b0_or))
    } else {
        Array1::from(cleaned.clone())
    };

    let ws = wang_swail(&cleaned, &trend, fit.ak_lag, b0_pw, alpha_ak, MAX_TFPW_WS_ITERATIONS)?;
    let tfpw_ws = if count_valid(&ws.series) > 0 {
        coefficients.tfpw_ws = ws.ak;
        Array1::from(ws.series)
    } else {
        Array1::from(cleaned.clone())
    };

    let ratio = nanvar(&cleaned, 1) / nanvar(as_slice(&fit_or.whitened), 1);
    let rescaled: Vec<f64> = fit_or.whitened.iter().map(|v| v * ratio).collect();
    let ac = coefficients.vctfpw;
    let b_vc = if ac >= 0.0 { b0_or / ((1.0 + ac) / (1.0 - ac)).sqrt() } else { b0_or };
    let vctfpw = Array1::from(add_trend(&rescaled, &secs, b_vc));

    Ok(PrewhiteOutcome {
        datasets: PrewhitenedSet { pw, pw_cor, tfpw_y, tfpw_ws, vctfpw },
        coefficients,
        tfpw_ws_iterations: ws.iterations,
    })
}

/// Shared inputs of the internal slope estimates.
struct TrendContext<'a> {
    times: &'a [NaiveDateTime],
    secs: &'a [f64],
    resolution: f64,
}

impl TrendContext<'_> {
    /// Sen's slope (1/s) of `values`, with ties and year counts from
    /// `values` and the valid count from `counted`.
    fn slope(&self, values: &[f64], counted: &[f64]) -> MKResult<f64> {
        let t = nb_tie(values, self.resolution)?;
        let (_, n) = s_test(values, self.times)?;
        let variance = kendall_var(counted, &t, &n);
        Ok(sen_slope_seconds(self.secs, values, variance, INTERNAL_SLOPE_CONFIDENCE)?.slope)
    }
}

/// Result of the TFPW_WS iteration.
struct WangSwail {
    series: Vec<f64>,
    ak: f64,
    iterations: usize,
}

/// Wang & Swail trend-free pre-whitening.
///
/// Starts from the raw coefficient `ak_raw` and the PW_COR slope `b0`,
/// refits on the raw series detrended with `b0`, then alternates
/// whitening, re-slope and refit until one of the tolerances is met or
/// `max_iterations` rounds have run.
fn wang_swail(
    obs: &[f64], trend: &TrendContext<'_>, ak_raw: f64, b0: f64, alpha_ak: f64,
    max_iterations: usize,
) -> MKResult<WangSwail> {
    let first = nanprewhite_arok(&add_trend(obs, trend.secs, -b0), alpha_ak)?;
    let mut ak = first.ak_lag;
    let mut significant = first.significant;

    if !(ak.abs() >= MIN_PW_COEFFICIENT && significant) {
        return Ok(WangSwail { series: first.whitened.to_vec(), ak: ak_raw, iterations: 0 });
    }

    let mut previous_ak = ak_raw;
    let mut previous_slope = b0;
    let mut series = ws_whiten(obs, ak);
    let mut slope = trend.slope(&series, &series)?;
    let mut iterations = 0;

    while (ak - previous_ak).abs() > AK_TOLERANCE
        && (slope - previous_slope).abs() > SLOPE_TOLERANCE
    {
        if !(ak >= MIN_PW_COEFFICIENT && significant) {
            break;
        }
        iterations += 1;
        previous_ak = ak;
        previous_slope = slope;

        let refit = nanprewhite_arok(&add_trend(obs, trend.secs, -slope), alpha_ak)?;
        ak = refit.ak_lag;
        significant = refit.significant;
        debug!(iteration = iterations, ak, slope, "TFPW_WS refinement");

        if ak > 0.0 && significant {
            series = ws_whiten(obs, ak);
            slope = trend.slope(&series, &series)?;
            if iterations >= max_iterations {
                warn!(iterations, ak, slope, "TFPW_WS did not converge; keeping last estimate");
                break;
            }
        }
    }

    Ok(WangSwail { series, ak, iterations })
}

/// `w_0 = x_0`, `w_i = (x_i - ak x_{i-1}) / (1 - ak)`.
fn ws_whiten(obs: &[f64], ak: f64) -> Vec<f64> {
    let mut out = obs.to_vec();
    for i in 1..obs.len() {
        out[i] = (obs[i] - ak * obs[i - 1]) / (1.0 - ak);
    }
    out
}

/// `values + slope * secs`; a negative slope detrends.
fn add_trend(values: &[f64], secs: &[f64], slope: f64) -> Vec<f64> {
    values.iter().zip(secs).map(|(v, t)| v + slope * t).collect()
}

fn as_slice(values: &Array1<f64>) -> &[f64] {
    values.as_slice().unwrap_or(&[])
}

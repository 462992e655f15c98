//! statistical_tests::mk_stat — the Mann-Kendall statistic compositor.
//!
//! Purpose
//! -------
//! Combine tie counts, the S statistic, the Kendall variance and Sen's slope
//! into one [`MkRecord`] for a single series: probability, significance,
//! per-year slope with confidence limits and the percent-of-median views.
//!
//! Key behaviors
//! -------------
//! - [`compute_mk_stat`] runs the full single-series pipeline and also
//!   returns the raw S, variance and Z so callers can aggregate them.
//! - [`mk_probability`] switches between the two-sided normal tail (more
//!   than [`NORMAL_APPROX_MIN_N`] valid values) and the exact table.
//! - [`significance`] maps a probability to `alpha_mk` or `0`.
//! - [`prob_3pw`] merges the PW and TFPW_Y probabilities, flagging
//!   disagreement with negative sentinels.
//!
//! Invariants & assumptions
//! ------------------------
//! - A NaN probability is never significant.
//! - `slope`, `ucl`, `lcl` are per year (`× SECONDS_PER_YEAR`).
//! - The percent fields divide by `|median|` of the analysed values; a zero
//!   median gives infinite percentages rather than an error.
//!
//! Conventions
//! -----------
//! - Significance sentinels from [`prob_3pw`]:
//!   - `alpha_mk`: both PW and TFPW_Y significant,
//!   - `-1`: only TFPW_Y significant (false positive),
//!   - `-2`: only PW significant (false negative),
//!   - `0`: neither.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the small-sample table branch, the normal branch on a
//!   strong trend, the `prob_3pw` truth table and argument validation.
use chrono::NaiveDateTime;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{
    series::{data::ObservationSeries, time::SECONDS_PER_YEAR},
    statistical_tests::{
        errors::MKResult,
        nanstats::{nanmax, nanmedian},
        prob_table::prob_mk_n,
        s_statistic::{s_test, std_normal_var},
        sen_slope::{SenSlope, sen_slope},
        ties::{kendall_var, nb_tie},
        validation::validate_percentage,
    },
};

/// Above this many valid values the normal approximation is used.
pub const NORMAL_APPROX_MIN_N: usize = 10;

/// MkRecord — Mann-Kendall result for one series.
///
/// Fields
/// ------
/// - `p`: two-sided exceedance probability.
/// - `ss`: significance level attained (`alpha_mk`), `0`, or a negative
///   disagreement sentinel (see [`prob_3pw`]). NaN when undefined.
/// - `slope`, `ucl`, `lcl`: Sen's slope and confidence limits per year.
/// - `median`: median of the analysed values.
/// - `slope_p`, `ucl_p`, `lcl_p`: the above in percent of `|median|` per year.
///
/// Notes
/// -----
/// - Created fresh per call and never mutated by the library afterwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MkRecord {
    pub p: f64,
    pub ss: f64,
    pub slope: f64,
    pub ucl: f64,
    pub lcl: f64,
    pub median: f64,
    pub slope_p: f64,
    pub ucl_p: f64,
    pub lcl_p: f64,
}

impl MkRecord {
    /// Record with every field NaN (too few observations).
    pub fn undefined() -> Self {
        MkRecord {
            p: f64::NAN,
            ss: f64::NAN,
            slope: f64::NAN,
            ucl: f64::NAN,
            lcl: f64::NAN,
            median: f64::NAN,
            slope_p: f64::NAN,
            ucl_p: f64::NAN,
            lcl_p: f64::NAN,
        }
    }

    /// Assemble a record from a per-year trend and the series median,
    /// deriving the percent-of-median fields.
    pub fn from_trend(p: f64, ss: f64, trend: SenSlope, median: f64) -> Self {
        let pct = 100.0 / median.abs();
        MkRecord {
            p,
            ss,
            slope: trend.slope,
            ucl: trend.ucl,
            lcl: trend.lcl,
            median,
            slope_p: trend.slope * pct,
            ucl_p: trend.ucl * pct,
            lcl_p: trend.lcl * pct,
        }
    }

    /// `true` when `ss` reports agreement at a positive confidence level.
    pub fn is_significant(&self) -> bool {
        self.ss > 0.0
    }
}

/// Full single-series output: the record plus the raw statistics.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MkStatOutcome {
    pub record: MkRecord,
    /// Mann-Kendall S.
    pub s: f64,
    /// Ties-corrected variance of S.
    pub variance: f64,
    /// Standardized normal variable.
    pub z: f64,
}

/// Run the Mann-Kendall test and Sen's slope on one series.
///
/// Parameters
/// ----------
/// - `times`: `&[NaiveDateTime]`
///   Observation timestamps.
/// - `values`: `&[f64]`
///   Observations, NaN for missing entries.
/// - `resolution`: `f64`
///   Tie resolution (finite, > 0).
/// - `alpha_mk`: `f64`
///   Significance level of the test in percent (default 95).
/// - `alpha_cl`: `f64`
///   Confidence level of the slope limits in percent (default 90).
///
/// Returns
/// -------
/// `MKResult<MkStatOutcome>`
///   The [`MkRecord`] together with S, its variance and Z.
///
/// Errors
/// ------
/// - `MKError::InvalidPercentage` for `alpha_mk` / `alpha_cl` outside
///   `[0, 100]`.
/// - `MKError::InvalidResolution` for a bad resolution.
/// - `MKError::LengthMismatch` / `MKError::EmptySeries` for bad shapes.
///
/// Notes
/// -----
/// - Probability: `2 (1 - Φ(|Z|))` when more than ten values are valid,
///   otherwise the exact table at `(|S|, n_valid)`.
///
/// Examples
/// --------
/// ```rust
/// # use chrono::NaiveDate;
/// # use mannkendall::statistical_tests::mk_stat::compute_mk_stat;
/// let times: Vec<_> = (2000..2020)
///     .map(|y| NaiveDate::from_ymd_opt(y, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
///     .collect();
/// let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
/// let out = compute_mk_stat(&times, &values, 0.1, 95.0, 90.0).unwrap();
/// assert_eq!(out.s, 190.0);
/// assert_eq!(out.record.ss, 95.0);
/// ```
pub fn compute_mk_stat(
    times: &[NaiveDateTime], values: &[f64], resolution: f64, alpha_mk: f64, alpha_cl: f64,
) -> MKResult<MkStatOutcome> {
    validate_percentage("alpha_mk", alpha_mk)?;
    validate_percentage("alpha_cl", alpha_cl)?;
    let series = ObservationSeries::new(times, values)?;
    let data = series.values();

    let t = nb_tie(data, resolution)?;
    let (s, n) = s_test(data, &series.times)?;
    let variance = kendall_var(data, &t, &n);
    let z = std_normal_var(s, variance);

    let p = mk_probability(s, z, series.n_valid());
    let ss = significance(p, alpha_mk);

    let trend = sen_slope(&series.times, data, variance, alpha_cl)?.scaled(SECONDS_PER_YEAR);
    let record = MkRecord::from_trend(p, ss, trend, nanmedian(data));

    Ok(MkStatOutcome { record, s, variance, z })
}

/// Two-sided probability of S.
///
/// Uses the normal tail of `|z|` when `n_valid > NORMAL_APPROX_MIN_N`, the
/// exact table at `(|s|, n_valid)` otherwise (NaN outside the table).
pub fn mk_probability(s: f64, z: f64, n_valid: usize) -> f64 {
    if n_valid > NORMAL_APPROX_MIN_N {
        2.0 * (1.0 - Normal::standard().cdf(z.abs()))
    } else {
        prob_mk_n(s.abs(), n_valid)
    }
}

/// `alpha_mk` when `p <= 1 - alpha_mk / 100`, else `0` (NaN `p` gives `0`).
#[inline]
pub fn significance(p: f64, alpha_mk: f64) -> f64 {
    if p <= 1.0 - alpha_mk / 100.0 { alpha_mk } else { 0.0 }
}

/// Combine PW and TFPW_Y probabilities for the 3PW method.
///
/// Parameters
/// ----------
/// - `p_pw`: `f64`
///   Probability from the PW series.
/// - `p_tfpw_y`: `f64`
///   Probability from the TFPW_Y series.
/// - `alpha_mk`: `f64`
///   Significance level in percent.
///
/// Returns
/// -------
/// `MKResult<(f64, f64)>`
///   - `p`: the larger of the two probabilities (NaN-skipping).
///   - `ss`: `alpha_mk` when both pass, `-1` when only TFPW_Y passes (a
///     false positive), `-2` when only PW passes (a false negative), `0`
///     otherwise.
///
/// Errors
/// ------
/// - `MKError::InvalidPercentage` when `alpha_mk` is outside `[0, 100]`.
///
/// Examples
/// --------
/// ```rust
/// # use mannkendall::statistical_tests::mk_stat::prob_3pw;
/// let (p, ss) = prob_3pw(0.2, 0.01, 95.0).unwrap();
/// assert_eq!(p, 0.2);
/// assert_eq!(ss, -1.0);
/// ```
pub fn prob_3pw(p_pw: f64, p_tfpw_y: f64, alpha_mk: f64) -> MKResult<(f64, f64)> {
    validate_percentage("alpha_mk", alpha_mk)?;

    let threshold = 1.0 - alpha_mk / 100.0;
    let p = nanmax(&[p_pw, p_tfpw_y]);
    let pw_passes = p_pw <= threshold;
    let tfpw_y_passes = p_tfpw_y <= threshold;

    let ss = match (pw_passes, tfpw_y_passes) {
        (true, true) => alpha_mk,
        (false, true) => -1.0,
        (true, false) => -2.0,
        (false, false) => 0.0,
    };
    Ok((p, ss))
}

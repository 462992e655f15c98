//! aggregation::temp_aggr — Mann-Kendall test over temporal aggregations.
//!
//! Purpose
//! -------
//! Run the Mann-Kendall test and Sen's slope on a record split into
//! sub-series (months, seasons, ...) and combine them into one total
//! trend, with a chi-squared test of whether the sub-series trends are
//! homogeneous enough to be summarized by a single slope.
//!
//! Key behaviors
//! -------------
//! - All sub-series are concatenated, sorted by time and pre-whitened once,
//!   so the autocorrelation is estimated on the full record. The datasets
//!   are then de-sorted and split back into the original grouping.
//! - Each sub-series with at least two observations is tested on the
//!   dataset of the chosen [`PwMethod`]; for 3pw the significance combines
//!   PW and TFPW_Y through [`prob_3pw`] and the slope comes from VCTFPW.
//! - S and its variance are summed across sub-series (separately for PW
//!   and TFPW_Y under 3pw) to give the total probability.
//! - `xhomo = Σ z_i² - n · mean(z)²` is compared with the chi-squared
//!   quantile at `alpha_xhomo` with `n - 1` degrees of freedom.
//! - The total median, and with it the total percent fields, is the median
//!   of the VCTFPW dataset for every method.
//!
//! Invariants & assumptions
//! ------------------------
//! - Sub-series with at most one observation get an all-NaN record and a
//!   NaN `z`; they never raise an error.
//! - With a single sub-series the homogeneity check is skipped and the
//!   total slope equals that sub-series' slope.
//! - Non-homogeneous trends leave the total slope and limits NaN and log a
//!   warning.
//!
//! Downstream usage
//! ----------------
//! - Index the outcome with [`AggregateOutcome::get`]; key `n_sub_series`
//!   is the total record, mirroring the usual "one entry per season plus
//!   the year" layout.
//!
//! Testing notes
//! -------------
//! - Tests use `alpha_ak = 100` where exact values are asserted; the
//!   autocorrelation bound is then infinite and the datasets equal the raw
//!   data.
use chrono::NaiveDateTime;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::warn;

use crate::{
    aggregation::options::{MKOptions, PwMethod},
    prewhitening::prewhite::{PrewhiteOutcome, PwSeries, prewhite},
    series::{
        data::count_valid,
        time::{argsort_times, de_sort},
    },
    statistical_tests::{
        errors::{MKError, MKResult},
        mk_stat::{MkRecord, compute_mk_stat, mk_probability, prob_3pw, significance},
        nanstats::{nanmean, nanmedian, nansum},
        s_statistic::std_normal_var,
        sen_slope::SenSlope,
    },
};

/// AggregateOutcome — per-sub-series records plus the combined total.
///
/// Fields
/// ------
/// - `series`: one [`MkRecord`] per sub-series, in input order.
/// - `total`: the combined record.
/// - `ak`: lag-1 coefficient behind the slope dataset (VCTFPW for 3pw).
/// - `xhomo`: homogeneity statistic `Σ z² - n · mean(z)²`.
/// - `critical`: chi-squared quantile it is compared with (NaN for a
///   single sub-series).
/// - `homogeneous`: whether the total slope was computed.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome {
    pub series: Vec<MkRecord>,
    pub total: MkRecord,
    pub ak: f64,
    pub xhomo: f64,
    pub critical: f64,
    pub homogeneous: bool,
}

impl AggregateOutcome {
    /// Number of sub-series; also the key of the total record.
    pub fn n_sub_series(&self) -> usize {
        self.series.len()
    }

    /// Record for sub-series `key`, or the total when `key == n_sub_series`.
    pub fn get(&self, key: usize) -> Option<&MkRecord> {
        if key == self.series.len() { Some(&self.total) } else { self.series.get(key) }
    }

    /// `(key, record)` pairs, sub-series first, total last.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &MkRecord)> {
        self.series.iter().chain(std::iter::once(&self.total)).enumerate()
    }
}

/// Running sums of S and its variance.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    s: f64,
    variance: f64,
}

impl Accumulator {
    fn add(&mut self, s: f64, variance: f64) {
        self.s += s;
        self.variance += variance;
    }

    fn probability(&self, n_valid: usize) -> f64 {
        mk_probability(self.s, std_normal_var(self.s, self.variance), n_valid)
    }
}

/// Mann-Kendall test and Sen's slope on a series split into sub-series.
///
/// Parameters
/// ----------
/// - `multi_times`: `&[Vec<NaiveDateTime>]`
///   Timestamps of each sub-series.
/// - `multi_values`: `&[Vec<f64>]`
///   Values of each sub-series, NaN for missing entries.
/// - `opts`: `&MKOptions`
///   Resolution, method and confidence levels.
///
/// Returns
/// -------
/// `MKResult<AggregateOutcome>`
///   One record per sub-series, the total record and the homogeneity
///   diagnostics.
///
/// Errors
/// ------
/// - `MKError::SubSeriesCountMismatch` when the two lists differ in length.
/// - `MKError::SubSeriesLengthMismatch` when a sub-series pair differs in
///   length.
/// - `MKError::EmptySeries` when no observation is supplied at all.
/// - `MKError::InvalidResolution` / `MKError::InvalidPercentage` for bad
///   options.
///
/// Notes
/// -----
/// - The total probability uses the count of valid observations over all
///   sub-series for the small-sample branch.
pub fn mk_temp_aggr(
    multi_times: &[Vec<NaiveDateTime>], multi_values: &[Vec<f64>], opts: &MKOptions,
) -> MKResult<AggregateOutcome> {
    opts.validate()?;
    if multi_times.len() != multi_values.len() {
        return Err(MKError::SubSeriesCountMismatch {
            times: multi_times.len(),
            values: multi_values.len(),
        });
    }
    for (index, (times, values)) in multi_times.iter().zip(multi_values).enumerate() {
        if times.len() != values.len() {
            return Err(MKError::SubSeriesLengthMismatch {
                index,
                times: times.len(),
                values: values.len(),
            });
        }
    }

    let all_times: Vec<NaiveDateTime> = multi_times.concat();
    let all_values: Vec<f64> = multi_values.concat();
    if all_values.is_empty() {
        return Err(MKError::EmptySeries);
    }

    let sort_ind = argsort_times(&all_times);
    let sorted_times: Vec<NaiveDateTime> = sort_ind.iter().map(|&i| all_times[i]).collect();
    let sorted_values: Vec<f64> = sort_ind.iter().map(|&i| all_values[i]).collect();
    let pw = prewhite(&sorted_values, &sorted_times, opts.resolution, opts.alpha_ak)?;

    let lens: Vec<usize> = multi_values.iter().map(Vec::len).collect();
    let split = |key: PwSeries| split_dataset(&pw, key, &sort_ind, &lens);

    let method = opts.pw_method;
    let slope_data = split(method.slope_series())?;
    let (pw_data, tfpw_y_data) = if method == PwMethod::ThreePw {
        (split(PwSeries::Pw)?, split(PwSeries::TfpwY)?)
    } else {
        (Vec::new(), Vec::new())
    };

    let n_tas = multi_values.len();
    let mut records = Vec::with_capacity(n_tas);
    let mut z = vec![f64::NAN; n_tas];
    let mut acc_single = Accumulator::default();
    let mut acc_pw = Accumulator::default();
    let mut acc_tfpw_y = Accumulator::default();

    for (i, times) in multi_times.iter().enumerate() {
        if times.len() <= 1 {
            records.push(MkRecord::undefined());
            continue;
        }
        let run = |data: &[f64]| {
            compute_mk_stat(times, data, opts.resolution, opts.alpha_mk, opts.alpha_cl)
        };

        let main = run(slope_data[i].as_slice())?;
        z[i] = main.z;
        if method == PwMethod::ThreePw {
            let on_pw = run(pw_data[i].as_slice())?;
            let on_tfpw_y = run(tfpw_y_data[i].as_slice())?;
            acc_pw.add(on_pw.s, on_pw.variance);
            acc_tfpw_y.add(on_tfpw_y.s, on_tfpw_y.variance);
            let (p, ss) = prob_3pw(on_pw.record.p, on_tfpw_y.record.p, opts.alpha_mk)?;
            records.push(MkRecord { p, ss, ..main.record });
        } else {
            acc_single.add(main.s, main.variance);
            records.push(main.record);
        }
    }

    let n_valid: usize = multi_values.iter().map(|v| count_valid(v)).sum();
    let (p, ss) = if method == PwMethod::ThreePw {
        prob_3pw(acc_pw.probability(n_valid), acc_tfpw_y.probability(n_valid), opts.alpha_mk)?
    } else {
        let p = acc_single.probability(n_valid);
        (p, significance(p, opts.alpha_mk))
    };

    let z_sq: Vec<f64> = z.iter().map(|v| v * v).collect();
    let mean_z = nanmean(&z);
    let xhomo = nansum(&z_sq) - n_tas as f64 * mean_z * mean_z;
    let critical = homogeneity_critical(n_tas, opts.alpha_xhomo)?;
    let homogeneous = n_tas == 1 || xhomo <= critical;

    let trend = if homogeneous {
        let column = |f: fn(&MkRecord) -> f64| nanmedian(&records.iter().map(f).collect::<Vec<_>>());
        SenSlope { slope: column(|r| r.slope), lcl: column(|r| r.lcl), ucl: column(|r| r.ucl) }
    } else {
        warn!(xhomo, critical, n_sub_series = n_tas, "trends not homogeneous; total slope undefined");
        SenSlope { slope: f64::NAN, lcl: f64::NAN, ucl: f64::NAN }
    };
    let median = nanmedian(&split(PwSeries::Vctfpw)?.concat());
    let total = MkRecord::from_trend(p, ss, trend, median);

    Ok(AggregateOutcome {
        series: records,
        total,
        ak: pw.coefficients.get(method.slope_series()),
        xhomo,
        critical,
        homogeneous,
    })
}

/// Restore dataset `key` to input order and cut it into sub-series.
fn split_dataset(
    pw: &PrewhiteOutcome, key: PwSeries, sort_ind: &[usize], lens: &[usize],
) -> MKResult<Vec<Vec<f64>>> {
    let sorted = pw.datasets.get(key).to_vec();
    let restored = de_sort(&sorted, sort_ind)?;

    let mut out = Vec::with_capacity(lens.len());
    let mut start = 0;
    for &len in lens {
        out.push(restored[start..start + len].to_vec());
        start += len;
    }
    Ok(out)
}

/// Chi-squared quantile at `alpha_xhomo` percent with `n_tas - 1` degrees of
/// freedom; NaN when there is a single sub-series.
fn homogeneity_critical(n_tas: usize, alpha_xhomo: f64) -> MKResult<f64> {
    if n_tas < 2 {
        return Ok(f64::NAN);
    }
    let df = (n_tas - 1) as f64;
    let chi2 = ChiSquared::new(df).map_err(|_| MKError::InvalidDegreesOfFreedom { df })?;
    Ok(chi2.inverse_cdf(alpha_xhomo / 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    /// Options whose autocorrelation bound is infinite, so the datasets are
    /// the raw values.
    fn raw_opts(method: PwMethod) -> MKOptions {
        MKOptions::new(0.001).unwrap().with_pw_method(method).with_alpha_ak(100.0).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Single sub-series pass-through of the slope.
    // - Homogeneous and non-homogeneous seasonal splits.
    // - Degenerate sub-series and structural validation.
    // - An end-to-end run through the autocorrelated branch.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // With one sub-series the total equals the sub-series record.
    //
    // Given
    // -----
    // - 20 yearly strictly increasing values, 3pw.
    //
    // Expect
    // ------
    // - Total p and slope/limits equal the sub-series ones; ss = 95;
    //   `get(1)` is the total and `get(2)` is None.
    fn mk_temp_aggr_single_sub_series_passes_through() {
        // Arrange
        let times: Vec<_> = (2000..2020).map(|y| at(y, 1)).collect();
        let values: Vec<f64> = (0..20).map(f64::from).collect();

        // Act
        let out = mk_temp_aggr(&[times], &[values], &raw_opts(PwMethod::ThreePw)).unwrap();

        // Assert
        let series = out.series[0];
        assert!(out.homogeneous);
        assert!(out.critical.is_nan());
        assert_eq!(out.total.p, series.p);
        assert_eq!(out.total.slope, series.slope);
        assert_eq!(out.total.lcl, series.lcl);
        assert_eq!(out.total.ucl, series.ucl);
        assert_eq!(out.total.ss, 95.0);
        assert_eq!(out.get(1), Some(&out.total));
        assert!(out.get(2).is_none());
        assert_eq!(out.iter().count(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Sub-series with identical trends are homogeneous and combined.
    //
    // Given
    // -----
    // - Four seasons over 15 years, each rising by 1 per year with its own
    //   offset; TFPW_Y.
    //
    // Expect
    // ------
    // - homogeneous, xhomo ~ 0, total slope ~ 1 per year, ss = 95.
    fn mk_temp_aggr_combines_homogeneous_seasons() {
        // Arrange
        let mut times = Vec::new();
        let mut values = Vec::new();
        for season in 0..4u32 {
            times.push((2000..2015).map(|y| at(y, 3 * season + 1)).collect::<Vec<_>>());
            values.push((0..15).map(|i| f64::from(i) + 10.0 * f64::from(season)).collect());
        }

        // Act
        let out = mk_temp_aggr(&times, &values, &raw_opts(PwMethod::TfpwY)).unwrap();

        // Assert
        assert!(out.homogeneous);
        assert_relative_eq!(out.xhomo, 0.0, epsilon = 1e-9);
        assert!(out.critical > 6.0 && out.critical < 6.5);
        assert_relative_eq!(out.total.slope, 1.0, epsilon = 5e-3);
        assert_eq!(out.total.ss, 95.0);
        assert_eq!(out.n_sub_series(), 4);
    }

    #[test]
    // Purpose
    // -------
    // Opposite trends are not combined; per-series results keep input
    // order.
    //
    // Given
    // -----
    // - January values rising by 1/yr from 100, July values falling by
    //   1/yr from 0, 20 years, PW.
    //
    // Expect
    // ------
    // - Not homogeneous, total slope/limits NaN.
    // - Sub-series 0 has slope ~ +1 and median 109.5, sub-series 1 slope
    //   ~ -1 and median -9.5.
    fn mk_temp_aggr_flags_opposite_trends() {
        let jan: Vec<_> = (2000..2020).map(|y| at(y, 1)).collect();
        let jul: Vec<_> = (2000..2020).map(|y| at(y, 7)).collect();
        let up: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i)).collect();
        let down: Vec<f64> = (0..20).map(|i| -f64::from(i)).collect();

        let out = mk_temp_aggr(&[jan, jul], &[up, down], &raw_opts(PwMethod::Pw)).unwrap();

        assert!(!out.homogeneous);
        assert!(out.xhomo > out.critical);
        assert!(out.total.slope.is_nan() && out.total.lcl.is_nan() && out.total.ucl.is_nan());
        assert_relative_eq!(out.series[0].slope, 1.0, epsilon = 5e-3);
        assert_relative_eq!(out.series[1].slope, -1.0, epsilon = 5e-3);
        assert_relative_eq!(out.series[0].median, 109.5);
        assert_relative_eq!(out.series[1].median, -9.5);
    }

    #[test]
    // Purpose
    // -------
    // A sub-series with a single observation is undefined, not an error.
    //
    // Given
    // -----
    // - A 12-year rising sub-series and a one-point sub-series.
    //
    // Expect
    // ------
    // - Record 1 is all NaN; the total slope equals record 0's slope.
    fn mk_temp_aggr_single_point_sub_series_is_undefined() {
        let times = vec![(2000..2012).map(|y| at(y, 2)).collect::<Vec<_>>(), vec![at(2005, 8)]];
        let values = vec![(0..12).map(f64::from).collect::<Vec<_>>(), vec![3.0]];

        let out = mk_temp_aggr(&times, &values, &raw_opts(PwMethod::Vctfpw)).unwrap();

        let lone = out.series[1];
        assert!(lone.p.is_nan() && lone.ss.is_nan() && lone.slope.is_nan());
        assert!(out.homogeneous);
        assert_eq!(out.total.slope, out.series[0].slope);
    }

    #[test]
    // Purpose
    // -------
    // Structural mismatches are reported with their location.
    //
    // Given
    // -----
    // - Two timestamp lists vs one value list; a length mismatch in
    //   sub-series 1; no sub-series at all.
    //
    // Expect
    // ------
    // - `SubSeriesCountMismatch`, `SubSeriesLengthMismatch { index: 1 }`,
    //   `EmptySeries`.
    fn mk_temp_aggr_validates_structure() {
        let opts = MKOptions::new(0.1).unwrap();
        let t = vec![at(2000, 1), at(2001, 1)];
        let v = vec![1.0, 2.0];

        assert_eq!(
            mk_temp_aggr(&[t.clone(), t.clone()], &[v.clone()], &opts),
            Err(MKError::SubSeriesCountMismatch { times: 2, values: 1 })
        );
        assert_eq!(
            mk_temp_aggr(&[t.clone(), t.clone()], &[v.clone(), vec![1.0]], &opts),
            Err(MKError::SubSeriesLengthMismatch { index: 1, times: 2, values: 1 })
        );
        assert_eq!(mk_temp_aggr(&[], &[], &opts), Err(MKError::EmptySeries));
    }

    #[test]
    // Purpose
    // -------
    // Options built by struct literal are still validated.
    //
    // Given
    // -----
    // - alpha_mk = 150.
    //
    // Expect
    // ------
    // - `InvalidPercentage { name: "alpha_mk", .. }`.
    fn mk_temp_aggr_validates_options() {
        let opts = MKOptions { alpha_mk: 150.0, ..MKOptions::new(0.1).unwrap() };
        let t = vec![at(2000, 1), at(2001, 1), at(2002, 1)];
        assert!(matches!(
            mk_temp_aggr(&[t], &[vec![1.0, 2.0, 3.0]], &opts),
            Err(MKError::InvalidPercentage { name: "alpha_mk", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The autocorrelated branch runs end to end with 3pw.
    //
    // Given
    // -----
    // - Ten years of monthly AR(1) values with a trend, split by month.
    //
    // Expect
    // ------
    // - Twelve records, finite total p in [0, 1], finite ak.
    fn mk_temp_aggr_runs_with_autocorrelation() {
        let mut state = 42u64;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
        };
        let mut times = vec![Vec::new(); 12];
        let mut values = vec![Vec::new(); 12];
        let mut prev = 0.0;
        for k in 0..120usize {
            prev = 0.8 * prev + next();
            times[k % 12].push(at(2000 + (k / 12) as i32, (k % 12) as u32 + 1));
            values[k % 12].push(prev + 0.02 * k as f64);
        }

        let out = mk_temp_aggr(&times, &values, &MKOptions::new(0.001).unwrap()).unwrap();

        assert_eq!(out.series.len(), 12);
        assert!((0.0..=1.0).contains(&out.total.p));
        assert!(out.ak.is_finite());
    }

    #[test]
    // Purpose
    // -------
    // The total median comes from the VCTFPW dataset whatever the method.
    //
    // Given
    // -----
    // - 120 monthly AR(1) values (phi = 0.8) with a trend as one
    //   sub-series, method PW, so pre-whitening is applied.
    //
    // Expect
    // ------
    // - total.median = nanmedian of the VCTFPW dataset, which differs from
    //   the median of the PW data reported for the sub-series.
    fn mk_temp_aggr_total_median_uses_vctfpw() {
        // Arrange
        let mut state = 3u64;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
        };
        let times: Vec<NaiveDateTime> =
            (0..120usize).map(|k| at(2000 + (k / 12) as i32, (k % 12) as u32 + 1)).collect();
        let mut prev = 0.0;
        let values: Vec<f64> = (0..120)
            .map(|k| {
                prev = 0.8 * prev + next();
                prev + 0.05 * f64::from(k)
            })
            .collect();
        let opts = MKOptions::new(0.001).unwrap().with_pw_method(PwMethod::Pw);
        let reference = prewhite(&values, &times, opts.resolution, opts.alpha_ak).unwrap();
        assert_eq!(reference.coefficients.ss, 95.0);

        // Act
        let out = mk_temp_aggr(&[times], &[values], &opts).unwrap();

        // Assert
        let expected = nanmedian(reference.datasets.vctfpw.as_slice().unwrap());
        assert_relative_eq!(out.total.median, expected, epsilon = 1e-12);
        assert!((out.total.median - out.series[0].median).abs() > 1e-6);
    }
}

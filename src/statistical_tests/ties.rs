//! statistical_tests::ties — tie counting and the ties-corrected Kendall
//! variance.
//!
//! Purpose
//! -------
//! Count groups of observations that are indistinguishable within the
//! instrument resolution, and combine those counts with the per-year
//! observation counts into the variance of the Mann-Kendall S statistic.
//!
//! Key behaviors
//! -------------
//! - [`nb_tie`] bins the finite values into equal-width bins of width
//!   `resolution`, starting at the minimum, and returns the counts of the
//!   occupied bins. Only occupied bins are stored, so memory follows the
//!   number of values and not the range-to-resolution ratio.
//! - [`kendall_var`] evaluates the variance of S with corrections for ties
//!   in value (`t`) and ties in time (`n`, the per-year counts).
//!
//! Invariants & assumptions
//! ------------------------
//! - Tie counts are re-derived for every series variant; a pre-whitened
//!   series gets its own tie vector.
//! - A tie vector holding a single NaN means "undefined": all values
//!   missing, or at most four valid values. NaN entries contribute nothing
//!   to the variance sums.
//!
//! Conventions
//! -----------
//! - Bin edges are produced by linear spacing rather than repeated addition,
//!   so `k + 1` edges span exactly `[min, min + k * resolution]` with
//!   `k = floor((max - min) / resolution) + 1`.
//! - Bins are half-open `[e_i, e_{i+1})` except the last, which is closed.
//!
//! Testing notes
//! -------------
//! - Unit tests reproduce the reference tie vectors and the reference
//!   variance of 140 for `t = [4, 2, 4, 2]`, `n = [7, 5]`, 12 valid values.
use std::collections::BTreeMap;

use ndarray::Array1;

use crate::{
    series::data::count_valid,
    statistical_tests::{errors::MKResult, nanstats::nansum, validation::validate_resolution},
};

/// Below this many valid values (inclusive) ties are not estimated.
pub const MIN_VALID_FOR_TIES: usize = 4;

/// Count ties within `resolution` among the non-missing values of `data`.
///
/// Parameters
/// ----------
/// - `data`: `&[f64]`
///   Observations; NaN and infinities count as missing.
/// - `resolution`: `f64`
///   Bin width below which two values count as tied. Must be finite and
///   strictly positive.
///
/// Returns
/// -------
/// `MKResult<Array1<f64>>`
///   - `[NaN]` when every value is missing or at most four are valid.
///   - `[count]` when all valid values are identical.
///   - Otherwise the counts of the non-empty histogram bins, in bin order.
///     Empty bins add nothing to the variance sums and are left out.
///
/// Errors
/// ------
/// - `MKError::InvalidResolution`
///   Returned when `resolution` is not finite or not positive.
///
/// Examples
/// --------
/// ```rust
/// # use mannkendall::statistical_tests::ties::nb_tie;
/// let data = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let t = nb_tie(&data, 2.0).unwrap();
/// assert_eq!(t.to_vec(), vec![2.0, 2.0, 2.0, 1.0]);
/// ```
pub fn nb_tie(data: &[f64], resolution: f64) -> MKResult<Array1<f64>> {
    validate_resolution(resolution)?;

    let valid: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.len() <= MIN_VALID_FOR_TIES {
        return Ok(Array1::from(vec![f64::NAN]));
    }

    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Ok(Array1::from(vec![valid.len() as f64]));
    }

    let grid = BinGrid::new(min, max, resolution);
    let mut counts: BTreeMap<u64, f64> = BTreeMap::new();
    for &v in &valid {
        *counts.entry(grid.bin_of(v)).or_insert(0.0) += 1.0;
    }
    Ok(counts.into_values().collect())
}

/// Rounding moves a value by at most a couple of bins away from its
/// direct index.
const EDGE_CORRECTIONS: usize = 4;

/// Linearly spaced bin edges `e_i = min + i * step`, evaluated on demand.
struct BinGrid {
    min: f64,
    step: f64,
    n_bins: u64,
}

impl BinGrid {
    fn new(min: f64, max: f64, resolution: f64) -> Self {
        let n_bins_f = ((max - min) / resolution).floor() + 1.0;
        if !n_bins_f.is_finite() {
            return BinGrid { min, step: resolution, n_bins: u64::MAX };
        }
        let n_bins = n_bins_f as u64;
        let step = (min + n_bins as f64 * resolution - min) / n_bins as f64;
        BinGrid { min, step, n_bins }
    }

    fn edge(&self, i: u64) -> f64 {
        self.min + self.step * i as f64
    }

    /// Index of the half-open bin `[e_i, e_{i+1})` holding `v`; the last
    /// bin is closed.
    fn bin_of(&self, v: f64) -> u64 {
        let last = self.n_bins - 1;
        // Saturating cast; the edge checks below settle rounding at bin borders.
        let mut bin = (((v - self.min) / self.step).floor() as u64).min(last);
        for _ in 0..EDGE_CORRECTIONS {
            if bin < last && self.edge(bin + 1) <= v {
                bin += 1;
            } else if bin > 0 && self.edge(bin) > v {
                bin -= 1;
            } else {
                break;
            }
        }
        bin
    }
}

/// Variance of the Mann-Kendall S statistic with tie corrections.
///
/// Parameters
/// ----------
/// - `data`: `&[f64]`
///   The series S was computed on; only its count of valid values `l` is
///   used.
/// - `t`: `&Array1<f64>`
///   Tie counts in value (from [`nb_tie`]). NaN entries are skipped.
/// - `n`: `&Array1<f64>`
///   Valid-observation counts per calendar year. NaN entries are skipped.
///
/// Returns
/// -------
/// `f64`
///   ```text
///   (l(l-1)(2l+5) - Σ t(t-1)(2t+5) - Σ n(n-1)(2n+5)) / 18
///     + Σ t(t-1)(t-2) · Σ n(n-1)(n-2) / (9 l(l-1)(l-2))
///     + Σ t(t-1) · Σ n(n-1) / (2 l(l-1))
///   ```
///
/// Notes
/// -----
/// - With `l <= 2` the two cross terms have a zero denominator and a zero
///   numerator (no group can exceed `l`); they are taken as zero.
/// - When every valid value falls in one year the exact variance is zero;
///   rounding can push it slightly below, so negatives are clamped to zero.
pub fn kendall_var(data: &[f64], t: &Array1<f64>, n: &Array1<f64>) -> f64 {
    let l = count_valid(data) as f64;

    let cubic = |x: f64| x * (x - 1.0) * (2.0 * x + 5.0);
    let falling3 = |x: f64| x * (x - 1.0) * (x - 2.0);
    let falling2 = |x: f64| x * (x - 1.0);
    let sum_of = |xs: &Array1<f64>, f: &dyn Fn(f64) -> f64| -> f64 {
        nansum(&xs.iter().map(|&x| f(x)).collect::<Vec<f64>>())
    };

    let base = (cubic(l) - sum_of(t, &cubic) - sum_of(n, &cubic)) / 18.0;

    let d3 = 9.0 * falling3(l);
    let third = if d3 == 0.0 { 0.0 } else { sum_of(t, &falling3) * sum_of(n, &falling3) / d3 };

    let d2 = 2.0 * falling2(l);
    let second = if d2 == 0.0 { 0.0 } else { sum_of(t, &falling2) * sum_of(n, &falling2) / d2 };

    let var = base + third + second;
    if var < 0.0 { 0.0 } else { var }
}

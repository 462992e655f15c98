//! statistical_tests::prob_table — exact small-sample Mann-Kendall
//! probabilities.
//!
//! Purpose
//! -------
//! Embed the exact upper-tail probabilities `P(S >= |s|)` of the
//! Mann-Kendall statistic for sample sizes up to 10 (Gilbert 1987,
//! Table A18), used instead of the normal approximation for short series.
//!
//! Conventions
//! -----------
//! - Rows are indexed by `|S|` (`0..=45`), columns by sample size with
//!   `n` stored at column `n - 1`.
//! - Cells with no defined probability (wrong parity of S for n, or
//!   n < 4) hold NaN.
//! - The table is frozen data; [`prob_mk_n`] is the only accessor needed.

const NAN: f64 = f64::NAN;

/// Number of `|S|` rows in [`PROB_MK_N`].
pub const PROB_MK_N_ROWS: usize = 46;

/// Largest sample size covered by [`PROB_MK_N`].
pub const PROB_MK_N_MAX_N: usize = 10;

/// Exact probabilities indexed as `PROB_MK_N[|S|][n - 1]`.
#[rustfmt::skip]
pub static PROB_MK_N: [[f64; PROB_MK_N_MAX_N]; PROB_MK_N_ROWS] = [
    [NAN, NAN, NAN, 0.625, 0.592, NAN, NAN, 0.548, 0.54, NAN],
    [NAN, NAN, NAN, NAN, NAN, 0.5, 0.5, NAN, NAN, 0.5],
    [NAN, NAN, NAN, 0.375, 0.408, NAN, NAN, 0.452, 0.46, NAN],
    [NAN, NAN, NAN, NAN, NAN, 0.36, 0.386, NAN, NAN, 0.431],
    [NAN, NAN, NAN, 0.167, 0.242, NAN, NAN, 0.36, 0.381, NAN],
    [NAN, NAN, NAN, NAN, NAN, 0.235, 0.281, NAN, NAN, 0.364],
    [NAN, NAN, NAN, 0.042, 0.117, NAN, NAN, 0.274, 0.306, NAN],
    [NAN, NAN, NAN, NAN, NAN, 0.136, 0.191, NAN, NAN, 0.3],
    [NAN, NAN, NAN, NAN, 0.042, NAN, NAN, 0.199, 0.238, NAN],
    [NAN, NAN, NAN, NAN, NAN, 0.068, 0.119, NAN, NAN, 0.242],
    [NAN, NAN, NAN, NAN, 0.0083, NAN, NAN, 0.138, 0.179, NAN],
    [NAN, NAN, NAN, NAN, NAN, 0.028, 0.068, NAN, NAN, 0.19],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.089, 0.13, NAN],
    [NAN, NAN, NAN, NAN, NAN, 0.0083, 0.035, NAN, NAN, 0.146],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.054, 0.09, NAN],
    [NAN, NAN, NAN, NAN, NAN, 0.0014, 0.015, NAN, NAN, 0.108],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.031, 0.06, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, 0.0054, NAN, NAN, 0.078],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.016, 0.038, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, 0.0014, NAN, NAN, 0.054],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.0071, 0.022, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, 0.0002, NAN, NAN, 0.036],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.0028, 0.012, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.023],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.00087, 0.0063, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.014],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.00019, 0.0029, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.0083],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, 2.5e-05, 0.0012, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.0046],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.00043, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.0023],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.00012, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.0011],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 2.5e-05, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.00047],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 2.8e-06, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 0.00018],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 5.8e-05],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 1.5e-05],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 2.8e-06],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN],
    [NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, NAN, 2.8e-07],
];

/// Exact small-sample probability for `|S|` and `n` valid observations.
///
/// Parameters
/// ----------
/// - `s_abs`: `f64`
///   Absolute value of the S statistic (integral).
/// - `n`: `usize`
///   Number of non-missing observations.
///
/// Returns
/// -------
/// `f64`
///   The tabulated probability, or NaN when `(|S|, n)` falls outside the
///   table, `s_abs` is not a non-negative integer, or the cell is undefined.
pub fn prob_mk_n(s_abs: f64, n: usize) -> f64 {
    if s_abs.is_nan() || s_abs < 0.0 || s_abs.fract() != 0.0 || n == 0 || n > PROB_MK_N_MAX_N {
        return NAN;
    }
    let row = s_abs as usize;
    if row >= PROB_MK_N_ROWS {
        return NAN;
    }
    PROB_MK_N[row][n - 1]
}

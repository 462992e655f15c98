//! statistical_tests::nanstats — NaN-skipping reductions.
//!
//! Small reductions that ignore missing values, used wherever the trend
//! routines summarize data that may contain NaN. An input with no valid
//! entries yields NaN (or 0 for [`nansum`]).

/// Sum of the non-NaN entries (0 when there are none).
#[inline]
pub fn nansum(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).sum()
}

/// Mean of the non-NaN entries.
pub fn nanmean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Variance of the non-NaN entries with `n - ddof` in the denominator.
///
/// NaN when fewer than `ddof + 1` valid entries are present.
pub fn nanvar(values: &[f64], ddof: usize) -> f64 {
    let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.len() <= ddof {
        return f64::NAN;
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    let ss: f64 = valid.iter().map(|v| (v - mean).powi(2)).sum();
    ss / (valid.len() - ddof) as f64
}

/// Median of the non-NaN entries (mean of the two central values for an
/// even count).
pub fn nanmedian(values: &[f64]) -> f64 {
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.sort_by(f64::total_cmp);
    median_of_sorted(&valid)
}

/// Maximum of the non-NaN entries.
pub fn nanmax(values: &[f64]) -> f64 {
    values.iter().copied().filter(|v| !v.is_nan()).fold(f64::NAN, f64::max)
}

/// Median of an already sorted, NaN-free slice.
#[inline]
pub(crate) fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => 0.5 * (sorted[n / 2 - 1] + sorted[n / 2]),
    }
}

//! Property tests for the trend statistics.
//!
//! Coverage
//! --------
//! - `s_test` antisymmetry under sign reversal.
//! - `de_sort` undoing an arbitrary permutation.
//! - Sen's slope confidence limits bracketing the slope.
//! - Lag-0 autocorrelation of a non-constant series.
//! - Determinism of the pre-whitening engine.
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use mannkendall::{
    prewhitening::{PwSeries, nanautocorr, prewhite},
    series::de_sort,
    statistical_tests::{s_test, sen_slope_seconds},
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

const DEFAULT_PROPTEST_CASES: u32 = 128;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .unwrap_or(DEFAULT_PROPTEST_CASES)
}

/// Timestamps spaced `days` apart from 1990-01-01.
fn spaced(n: usize, days: i64) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    (0..n).map(|i| start + TimeDelta::days(days * i as i64)).collect()
}

fn permutation(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<usize>)> {
    (1usize..max_len).prop_flat_map(|n| {
        (
            prop::collection::vec(-1e3f64..1e3, n),
            Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        .. ProptestConfig::default()
    })]

    #[test]
    fn s_test_is_antisymmetric(values in prop::collection::vec(-100.0f64..100.0, 2..40)) {
        let times = spaced(values.len(), 150);
        let negated: Vec<f64> = values.iter().map(|v| -v).collect();

        let (s, n) = s_test(&values, &times).unwrap();
        let (s_neg, n_neg) = s_test(&negated, &times).unwrap();

        prop_assert_eq!(s_neg, -s);
        prop_assert_eq!(n, n_neg);
    }

    #[test]
    fn de_sort_undoes_any_permutation((values, sort_indices) in permutation(60)) {
        let sorted: Vec<f64> = sort_indices.iter().map(|&i| values[i]).collect();
        prop_assert_eq!(de_sort(&sorted, &sort_indices).unwrap(), values);
    }

    #[test]
    fn sen_slope_limits_bracket_slope(
        values in prop::collection::vec(-50.0f64..50.0, 2..30),
        variance in 0.0f64..1e4,
        confidence in 1.0f64..99.9,
    ) {
        let secs: Vec<f64> = (0..values.len()).map(|i| i as f64 * 3600.0).collect();

        let out = sen_slope_seconds(&secs, &values, variance, confidence).unwrap();

        prop_assert!(out.lcl <= out.slope, "lcl {} > slope {}", out.lcl, out.slope);
        prop_assert!(out.slope <= out.ucl, "slope {} > ucl {}", out.slope, out.ucl);
    }

    #[test]
    fn nanautocorr_lag_zero_is_one(values in prop::collection::vec(-10.0f64..10.0, 8..50)) {
        let spread = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            - values.iter().cloned().fold(f64::INFINITY, f64::min);
        prop_assume!(spread > 1e-6);
        let max_lag = (values.len() / 2).min(10);

        let (rho, _) = nanautocorr(&values, max_lag, max_lag.min(5) - 1).unwrap();

        prop_assert_eq!(rho[0], 1.0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases() / 4,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prewhite_is_deterministic(
        values in prop::collection::vec(-10.0f64..10.0, 8..60),
        resolution in 0.001f64..1.0,
    ) {
        let times = spaced(values.len(), 30);

        let first = prewhite(&values, &times, resolution, 95.0).unwrap();
        let second = prewhite(&values, &times, resolution, 95.0).unwrap();

        for key in PwSeries::ALL {
            let a: Vec<u64> = first.datasets.get(key).iter().map(|v| v.to_bits()).collect();
            let b: Vec<u64> = second.datasets.get(key).iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(a, b, "dataset {}", key);
        }
    }
}

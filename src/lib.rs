//! mannkendall — Mann-Kendall trend test and Sen's slope with pre-whitening.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the trend routines to Python via the `_mannkendall` extension
//! module. The statistics follow the MeteoSwiss / WMO-GAW procedure: the
//! Mann-Kendall test with tie and year corrections, Sen's slope with
//! confidence limits, five pre-whitening schemes against serial correlation
//! and a seasonal aggregation with a homogeneity test.
//!
//! Key behaviors
//! -------------
//! - Expose the core modules (`series`, `statistical_tests`,
//!   `prewhitening`, `aggregation`) as the public crate surface.
//! - With the `python-bindings` feature, define `#[pyclass]` wrappers for
//!   the single-series test and the temporal aggregation, and register the
//!   `statistical_tests` and `aggregation` submodules.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue and error mapping.
//! - Diagnostics are emitted through `tracing`; the crate never installs a
//!   subscriber.
//!
//! Downstream usage
//! ----------------
//! - Rust callers typically write:
//!
//!   ```rust
//!   use mannkendall::aggregation::{MKOptions, mk_temp_aggr};
//!   ```
//!
//! - The Python packaging layer imports `_mannkendall` and wraps its
//!   classes in user-facing APIs.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and
//!   by the integration tests under `tests/`.

pub mod aggregation;
pub mod prewhitening;
pub mod series;
pub mod statistical_tests;
pub mod utils;

#[cfg(feature = "python-bindings")]
use std::str::FromStr;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    aggregation::{AggregateOutcome, MKOptions, PwMethod, mk_temp_aggr},
    statistical_tests::mk_stat::{MkRecord, MkStatOutcome, compute_mk_stat},
    utils::{extract_sub_series, extract_timestamps, extract_values},
};

/// TrendRecord — Python view of one Mann-Kendall result record.
///
/// Fields mirror [`MkRecord`]: probability, significance, Sen's slope and
/// limits per year, the median, and the slope and limits in percent of the
/// median per year. Undefined fields are NaN.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "mannkendall.statistical_tests")]
#[derive(Clone)]
pub struct TrendRecord {
    inner: MkRecord,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl TrendRecord {
    #[getter]
    pub fn p(&self) -> f64 {
        self.inner.p
    }

    #[getter]
    pub fn ss(&self) -> f64 {
        self.inner.ss
    }

    #[getter]
    pub fn slope(&self) -> f64 {
        self.inner.slope
    }

    #[getter]
    pub fn ucl(&self) -> f64 {
        self.inner.ucl
    }

    #[getter]
    pub fn lcl(&self) -> f64 {
        self.inner.lcl
    }

    #[getter]
    pub fn median(&self) -> f64 {
        self.inner.median
    }

    #[getter]
    pub fn slope_p(&self) -> f64 {
        self.inner.slope_p
    }

    #[getter]
    pub fn ucl_p(&self) -> f64 {
        self.inner.ucl_p
    }

    #[getter]
    pub fn lcl_p(&self) -> f64 {
        self.inner.lcl_p
    }

    fn __repr__(&self) -> String {
        format!(
            "TrendRecord(p={}, ss={}, slope={}, lcl={}, ucl={})",
            self.inner.p, self.inner.ss, self.inner.slope, self.inner.lcl, self.inner.ucl
        )
    }
}

/// MannKendall — Python-facing wrapper for the single-series test.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `MannKendall(times, values, resolution, alpha_mk=95, alpha_cl=90)`:
/// - `times`: naive `datetime` objects or UTC epoch seconds.
/// - `values`: 1-D float array-like, NaN for missing entries.
/// - `resolution`: tie resolution, finite and `> 0`.
///
/// Notes
/// -----
/// - No pre-whitening is applied; use `TemporalAggregation` with a single
///   sub-series for the pre-whitened analysis.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "mannkendall.statistical_tests")]
pub struct MannKendall {
    inner: MkStatOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl MannKendall {
    #[new]
    #[pyo3(
        text_signature = "(times, values, resolution, /, alpha_mk=95.0, alpha_cl=90.0)",
        signature = (times, values, resolution, alpha_mk = 95.0, alpha_cl = 90.0)
    )]
    pub fn new<'py>(
        py: Python<'py>, times: &Bound<'py, PyAny>, values: &Bound<'py, PyAny>, resolution: f64,
        alpha_mk: f64, alpha_cl: f64,
    ) -> PyResult<MannKendall> {
        let times = extract_timestamps(py, times)?;
        let values = extract_values(py, values)?;
        let inner = compute_mk_stat(&times, &values, resolution, alpha_mk, alpha_cl)?;
        Ok(MannKendall { inner })
    }

    /// The result record.
    #[getter]
    pub fn result(&self) -> TrendRecord {
        TrendRecord { inner: self.inner.record }
    }

    /// The Mann-Kendall S statistic.
    #[getter]
    pub fn s(&self) -> f64 {
        self.inner.s
    }

    /// Tie-corrected variance of S.
    #[getter]
    pub fn variance(&self) -> f64 {
        self.inner.variance
    }

    /// Standardized normal variable.
    #[getter]
    pub fn z(&self) -> f64 {
        self.inner.z
    }
}

/// TemporalAggregation — Python-facing wrapper for [`mk_temp_aggr`].
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `TemporalAggregation(multi_times, multi_values, resolution, pw_method="3pw",
/// alpha_mk=95, alpha_cl=90, alpha_xhomo=90, alpha_ak=95)`:
/// - `multi_times`: list of timestamp sub-series (datetimes or epoch seconds).
/// - `multi_values`: list of value sub-series, matching `multi_times`.
///
/// Notes
/// -----
/// - `result(k)` returns sub-series `k`; `result(n_sub_series)` the total.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "mannkendall.aggregation")]
pub struct TemporalAggregation {
    inner: AggregateOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl TemporalAggregation {
    #[new]
    #[pyo3(
        text_signature = "(multi_times, multi_values, resolution, /, pw_method='3pw', alpha_mk=95.0, alpha_cl=90.0, alpha_xhomo=90.0, alpha_ak=95.0)",
        signature = (
            multi_times, multi_values, resolution, pw_method = "3pw", alpha_mk = 95.0,
            alpha_cl = 90.0, alpha_xhomo = 90.0, alpha_ak = 95.0
        )
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new<'py>(
        py: Python<'py>, multi_times: &Bound<'py, PyAny>, multi_values: &Bound<'py, PyAny>,
        resolution: f64, pw_method: &str, alpha_mk: f64, alpha_cl: f64, alpha_xhomo: f64,
        alpha_ak: f64,
    ) -> PyResult<TemporalAggregation> {
        let opts = MKOptions::new(resolution)?
            .with_pw_method(PwMethod::from_str(pw_method)?)
            .with_alpha_mk(alpha_mk)?
            .with_alpha_cl(alpha_cl)?
            .with_alpha_xhomo(alpha_xhomo)?
            .with_alpha_ak(alpha_ak)?;

        let times = extract_sub_series(multi_times)?
            .iter()
            .map(|item| extract_timestamps(py, item))
            .collect::<PyResult<Vec<_>>>()?;
        let values = extract_sub_series(multi_values)?
            .iter()
            .map(|item| extract_values(py, item))
            .collect::<PyResult<Vec<_>>>()?;

        let inner = mk_temp_aggr(&times, &values, &opts)?;
        Ok(TemporalAggregation { inner })
    }

    /// Number of sub-series (also the key of the total record).
    #[getter]
    pub fn n_sub_series(&self) -> usize {
        self.inner.n_sub_series()
    }

    /// Record for sub-series `key`, or the total when `key == n_sub_series`.
    pub fn result(&self, key: usize) -> PyResult<TrendRecord> {
        self.inner
            .get(key)
            .map(|r| TrendRecord { inner: *r })
            .ok_or_else(|| PyValueError::new_err(format!("no record for key {key}")))
    }

    /// The combined record.
    #[getter]
    pub fn total(&self) -> TrendRecord {
        TrendRecord { inner: self.inner.total }
    }

    /// Lag-1 coefficient behind the slope dataset.
    #[getter]
    pub fn ak(&self) -> f64 {
        self.inner.ak
    }

    /// Homogeneity statistic.
    #[getter]
    pub fn xhomo(&self) -> f64 {
        self.inner.xhomo
    }

    /// Chi-squared critical value of the homogeneity test.
    #[getter]
    pub fn critical(&self) -> f64 {
        self.inner.critical
    }

    /// Whether the sub-series trends were combined.
    #[getter]
    pub fn homogeneous(&self) -> bool {
        self.inner.homogeneous
    }
}

/// Python module initializer for `_mannkendall`.
///
/// Key behaviors
/// -------------
/// - Create `statistical_tests` and `aggregation` submodules and attach them
///   to `_mannkendall`.
/// - Register the submodules in `sys.modules` so they are importable via
///   dotted paths from Python.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating submodules or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _mannkendall<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let statistical_tests_mod = PyModule::new(py, "statistical_tests")?;
    let aggregation_mod = PyModule::new(py, "aggregation")?;
    statistical_tests(m, &statistical_tests_mod)?;
    aggregation(m, &aggregation_mod)?;

    let modules = py.import("sys")?.getattr("modules")?;
    modules.set_item("mannkendall.statistical_tests", statistical_tests_mod)?;
    modules.set_item("mannkendall.aggregation", aggregation_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn statistical_tests<'py>(parent: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<MannKendall>()?;
    m.add_class::<TrendRecord>()?;
    parent.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn aggregation<'py>(parent: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<TemporalAggregation>()?;
    parent.add_submodule(m)?;
    Ok(())
}

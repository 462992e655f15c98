//! statistical_tests — the Mann-Kendall test, Sen's slope and their
//! building blocks.
//!
//! Purpose
//! -------
//! Collect the single-series trend statistics and their shared
//! infrastructure: tie counting, the S statistic with its tie-corrected
//! variance, Sen's slope with confidence limits, the exact small-sample
//! probability table and the compositor that ties them together. The
//! crate-wide error type and input guards also live here.
//!
//! Key behaviors
//! -------------
//! - [`compute_mk_stat`] runs the full single-series test and returns an
//!   [`MkRecord`] together with S, its variance and Z.
//! - [`prob_3pw`] combines PW and TFPW_Y probabilities for the 3pw method.
//! - [`nb_tie`], [`kendall_var`], [`s_test`], [`std_normal_var`] and
//!   [`sen_slope`] are exposed for callers composing their own pipelines.
//!
//! Invariants & assumptions
//! ------------------------
//! - Missing values are NaN and are skipped by every statistic; they are
//!   never a validation error.
//! - Only malformed input (shapes, percentages, resolution, variance) is
//!   reported through [`MKError`]; undefined statistics are NaN.
//!
//! Conventions
//! -----------
//! - Slopes are value per second internally and value per year in
//!   [`MkRecord`].
//! - Percent-valued parameters (`alpha_mk`, `alpha_cl`) lie in `[0, 100]`.
//!
//! Testing notes
//! -------------
//! - Each module carries unit tests against hand-computed reference values
//!   (tie vectors, the Kendall variance of 140, the table checksum).

pub mod errors;
pub mod mk_stat;
pub mod nanstats;
pub mod prob_table;
pub mod s_statistic;
pub mod sen_slope;
pub mod ties;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{MKError, MKResult};
pub use self::mk_stat::{
    MkRecord, MkStatOutcome, NORMAL_APPROX_MIN_N, compute_mk_stat, mk_probability, prob_3pw,
    significance,
};
pub use self::prob_table::{PROB_MK_N, prob_mk_n};
pub use self::s_statistic::{s_test, std_normal_var};
pub use self::sen_slope::{SenSlope, sen_slope, sen_slope_seconds};
pub use self::ties::{kendall_var, nb_tie};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use mannkendall::statistical_tests::prelude::*;
//
// to import the main statistical-testing surface in a single line.

pub mod prelude {
    pub use super::errors::{MKError, MKResult};
    pub use super::mk_stat::{MkRecord, compute_mk_stat, prob_3pw};
    pub use super::sen_slope::{SenSlope, sen_slope};
}

//! prewhitening — removal of lag-1 autocorrelation before trend testing.
//!
//! Purpose
//! -------
//! Serial correlation inflates the false-positive rate of the Mann-Kendall
//! test. This subtree estimates the lag-1 autoregressive component of a
//! series and produces the pre-whitened datasets the aggregation driver
//! tests and takes slopes from.
//!
//! Key behaviors
//! -------------
//! - [`nanautocorr`] and [`levinson`] provide NaN-aware autocorrelation and
//!   the Levinson-Durbin recursion.
//! - [`nanprewhite_arok`] decides whether the lag-1 component is
//!   significant at `alpha_ak` and removes it if so.
//! - [`prewhite`] builds the PW, PW_COR, TFPW_Y, TFPW_WS and VCTFPW
//!   datasets plus the coefficients behind them.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are time-sorted; [`prewhite`] works on one series at a time.
//! - Caller slices are never modified; infinities become NaN in private
//!   copies.
//! - "No significant autocorrelation" is a `tracing` warning, never an
//!   error.
//!
//! Downstream usage
//! ----------------
//! - [`crate::aggregation`] calls [`prewhite`] once over the time-sorted
//!   concatenation of all sub-series.

pub mod ar_fit;
pub mod autocorr;
pub mod prewhite;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::ar_fit::{ArFit, MAX_AUTOCORR_LAGS, MAX_SIGNIFICANT_LAGS, nanprewhite_arok};
pub use self::autocorr::{LevinsonOutcome, levinson, nanautocorr};
pub use self::prewhite::{
    AK_TOLERANCE, ArCoefficients, MAX_TFPW_WS_ITERATIONS, MIN_PW_COEFFICIENT, PrewhiteOutcome,
    PrewhitenedSet, PwSeries, SLOPE_TOLERANCE, prewhite,
};

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use mannkendall::prewhitening::prelude::*;` to
// import the pre-whitening surface in a single line.

pub mod prelude {
    pub use super::ar_fit::{ArFit, nanprewhite_arok};
    pub use super::prewhite::{ArCoefficients, PrewhiteOutcome, PrewhitenedSet, PwSeries, prewhite};
}

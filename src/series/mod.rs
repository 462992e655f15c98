//! series — observation containers and timestamp helpers.
//!
//! Purpose
//! -------
//! Hold the validated `(timestamp, value)` container and the timestamp
//! arithmetic (elapsed seconds, calendar years, sort/de-sort) used across the
//! statistics, pre-whitening and aggregation subtrees.
//!
//! Downstream usage
//! ----------------
//! - Entry points build an [`ObservationSeries`] to validate their inputs.
//! - Slope and detrending code uses [`elapsed_seconds`] and
//!   [`SECONDS_PER_YEAR`]; the S-statistic uses [`calendar_years`].

pub mod data;
pub mod time;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::{ObservationSeries, count_valid};
pub use self::time::{
    SECONDS_PER_YEAR, argsort_times, calendar_years, de_sort, dt_to_s, elapsed_seconds,
};

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use mannkendall::series::prelude::*;` to import the
// series surface in a single line.

pub mod prelude {
    pub use super::data::ObservationSeries;
    pub use super::time::{SECONDS_PER_YEAR, de_sort, dt_to_s};
}

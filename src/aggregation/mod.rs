//! aggregation — Mann-Kendall trend analysis over temporal aggregations.
//!
//! Purpose
//! -------
//! Top-level entry point of the crate: configure a run with [`MKOptions`],
//! then call [`mk_temp_aggr`] on a record split into sub-series (a single
//! sub-series is the plain yearly analysis).
//!
//! Key behaviors
//! -------------
//! - [`PwMethod`] selects the pre-whitening method; 3pw is the default.
//! - [`AggregateOutcome`] holds one [`MkRecord`](crate::statistical_tests::mk_stat::MkRecord)
//!   per sub-series plus the combined total and the homogeneity diagnostics.
//!
//! Downstream usage
//! ----------------
//! - Typical Rust code imports:
//!
//!   ```rust
//!   use mannkendall::aggregation::{MKOptions, PwMethod, mk_temp_aggr};
//!   ```

pub mod options;
pub mod temp_aggr;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::options::{MKOptions, PwMethod};
pub use self::temp_aggr::{AggregateOutcome, mk_temp_aggr};

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use mannkendall::aggregation::prelude::*;` to
// import the aggregation surface in a single line.

pub mod prelude {
    pub use super::options::{MKOptions, PwMethod};
    pub use super::temp_aggr::{AggregateOutcome, mk_temp_aggr};
}

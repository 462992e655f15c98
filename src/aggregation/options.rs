//! aggregation::options — method selection and confidence levels for the
//! aggregation driver.
//!
//! Purpose
//! -------
//! Bundle every tuning knob of
//! [`mk_temp_aggr`](crate::aggregation::temp_aggr::mk_temp_aggr) in one
//! validated value so entry points check their configuration once.
//!
//! Key behaviors
//! -------------
//! - [`PwMethod`] parses the five method tags case-insensitively.
//! - [`MKOptions::new`] validates the resolution and applies the defaults
//!   (3pw, `alpha_mk = 95`, `alpha_cl = 90`, `alpha_xhomo = 90`,
//!   `alpha_ak = 95`); each `with_*` builder validates its own value.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed [`MKOptions`] always holds a finite, positive resolution
//!   and percentages in `[0, 100]`.
use std::{fmt, str::FromStr};

use crate::{
    prewhitening::prewhite::PwSeries,
    statistical_tests::{
        errors::{MKError, MKResult},
        validation::{validate_percentage, validate_resolution},
    },
};

/// Pre-whitening method applied before the Mann-Kendall test.
///
/// Variants:
/// - `Pw`: plain pre-whitening.
/// - `TfpwY`: trend-free pre-whitening after Yue et al. (2002).
/// - `TfpwWs`: iterative trend-free pre-whitening after Wang & Swail (2001).
/// - `Vctfpw`: variance-corrected TFPW after Wang et al. (2015).
/// - `ThreePw`: significance from PW and TFPW_Y combined, slope from VCTFPW.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive tags
/// (`"pw"`, `"tfpw_y"`, `"tfpw_ws"`, `"vctfpw"`, `"3pw"`). Unknown tags
/// return `MKError::UnknownPwMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PwMethod {
    Pw,
    TfpwY,
    TfpwWs,
    Vctfpw,
    #[default]
    ThreePw,
}

impl PwMethod {
    /// All recognized methods.
    pub const ALL: [PwMethod; 5] =
        [PwMethod::Pw, PwMethod::TfpwY, PwMethod::TfpwWs, PwMethod::Vctfpw, PwMethod::ThreePw];

    /// Lower-case tag of the method.
    pub fn tag(&self) -> &'static str {
        match self {
            PwMethod::Pw => "pw",
            PwMethod::TfpwY => "tfpw_y",
            PwMethod::TfpwWs => "tfpw_ws",
            PwMethod::Vctfpw => "vctfpw",
            PwMethod::ThreePw => "3pw",
        }
    }

    /// Dataset the slope, its limits and the median are taken from.
    pub fn slope_series(&self) -> PwSeries {
        match self {
            PwMethod::Pw => PwSeries::Pw,
            PwMethod::TfpwY => PwSeries::TfpwY,
            PwMethod::TfpwWs => PwSeries::TfpwWs,
            PwMethod::Vctfpw | PwMethod::ThreePw => PwSeries::Vctfpw,
        }
    }
}

impl fmt::Display for PwMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PwMethod {
    type Err = MKError;

    /// Parse a method tag (case-insensitive).
    ///
    /// Any other value returns `MKError::UnknownPwMethod` listing the valid
    /// tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pw" => Ok(PwMethod::Pw),
            "tfpw_y" => Ok(PwMethod::TfpwY),
            "tfpw_ws" => Ok(PwMethod::TfpwWs),
            "vctfpw" => Ok(PwMethod::Vctfpw),
            "3pw" => Ok(PwMethod::ThreePw),
            _ => Err(MKError::UnknownPwMethod {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'pw', 'tfpw_y', 'tfpw_ws', 'vctfpw' or '3pw'.",
            }),
        }
    }
}

/// Configuration of the aggregation driver.
///
/// Fields:
/// - `resolution` — tie resolution of the instrument (finite, `> 0`).
/// - `pw_method` — pre-whitening method.
/// - `alpha_mk` — significance level of the MK test, percent.
/// - `alpha_cl` — confidence level of the slope limits, percent.
/// - `alpha_xhomo` — confidence level of the homogeneity test, percent.
/// - `alpha_ak` — confidence level of the autocorrelation test, percent.
///
/// Constructor:
/// - `new(resolution)` — defaults to 3pw, 95, 90, 90, 95.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MKOptions {
    pub resolution: f64,
    pub pw_method: PwMethod,
    pub alpha_mk: f64,
    pub alpha_cl: f64,
    pub alpha_xhomo: f64,
    pub alpha_ak: f64,
}

impl MKOptions {
    /// Options with the default method and confidence levels.
    ///
    /// # Errors
    /// - [`MKError::InvalidResolution`] if `resolution` is not finite or not
    ///   strictly positive.
    pub fn new(resolution: f64) -> MKResult<Self> {
        validate_resolution(resolution)?;
        Ok(Self {
            resolution,
            pw_method: PwMethod::default(),
            alpha_mk: 95.0,
            alpha_cl: 90.0,
            alpha_xhomo: 90.0,
            alpha_ak: 95.0,
        })
    }

    pub fn with_pw_method(mut self, pw_method: PwMethod) -> Self {
        self.pw_method = pw_method;
        self
    }

    pub fn with_alpha_mk(mut self, alpha_mk: f64) -> MKResult<Self> {
        validate_percentage("alpha_mk", alpha_mk)?;
        self.alpha_mk = alpha_mk;
        Ok(self)
    }

    pub fn with_alpha_cl(mut self, alpha_cl: f64) -> MKResult<Self> {
        validate_percentage("alpha_cl", alpha_cl)?;
        self.alpha_cl = alpha_cl;
        Ok(self)
    }

    pub fn with_alpha_xhomo(mut self, alpha_xhomo: f64) -> MKResult<Self> {
        validate_percentage("alpha_xhomo", alpha_xhomo)?;
        self.alpha_xhomo = alpha_xhomo;
        Ok(self)
    }

    pub fn with_alpha_ak(mut self, alpha_ak: f64) -> MKResult<Self> {
        validate_percentage("alpha_ak", alpha_ak)?;
        self.alpha_ak = alpha_ak;
        Ok(self)
    }

    /// Re-check every field; used by entry points that accept options built
    /// by struct literal.
    pub fn validate(&self) -> MKResult<()> {
        validate_resolution(self.resolution)?;
        validate_percentage("alpha_mk", self.alpha_mk)?;
        validate_percentage("alpha_cl", self.alpha_cl)?;
        validate_percentage("alpha_xhomo", self.alpha_xhomo)?;
        validate_percentage("alpha_ak", self.alpha_ak)
    }
}

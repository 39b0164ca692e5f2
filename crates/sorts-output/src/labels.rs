//! Display names and lookback horizons for beta variables.
//!
//! Horizon betas are named `beta_ind_<base>_<days>_N`. Level factors have no
//! horizon and carry [`LEVEL_FACTOR_DAYS`] instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizon sentinel for level factors.
pub const LEVEL_FACTOR_DAYS: i32 = -99;

/// Label attached to one raw variable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLabel {
    /// Raw identifier as it appears in the beta panel
    pub key: &'static str,
    /// Human-readable variable name
    pub variable: &'static str,
    /// Lookback horizon in days, or [`LEVEL_FACTOR_DAYS`]
    pub days: i32,
}

const fn label(key: &'static str, variable: &'static str, days: i32) -> VariableLabel {
    VariableLabel { key, variable, days }
}

/// Every known beta variable.
pub const LABELS: &[VariableLabel] = &[
    label("beta_ind_D_clamp_30_N", "D_clamp", 30),
    label("beta_ind_D_clamp_60_N", "D_clamp", 60),
    label("beta_ind_D_clamp_90_N", "D_clamp", 90),
    label("beta_ind_D_clamp_120_N", "D_clamp", 120),
    label("beta_ind_D_clamp_150_N", "D_clamp", 150),
    label("beta_ind_D_clamp_180_N", "D_clamp", 180),
    label("beta_ind_rn_prob_20_30_N", "rn_prob_20", 30),
    label("beta_ind_rn_prob_20_60_N", "rn_prob_20", 60),
    label("beta_ind_rn_prob_20_90_N", "rn_prob_20", 90),
    label("beta_ind_rn_prob_20_120_N", "rn_prob_20", 120),
    label("beta_ind_rn_prob_20_150_N", "rn_prob_20", 150),
    label("beta_ind_rn_prob_20_180_N", "rn_prob_20", 180),
    label("beta_ind_rn_prob_80_30_N", "rn_prob_80", 30),
    label("beta_ind_rn_prob_80_60_N", "rn_prob_80", 60),
    label("beta_ind_rn_prob_80_90_N", "rn_prob_80", 90),
    label("beta_ind_rn_prob_80_120_N", "rn_prob_80", 120),
    label("beta_ind_rn_prob_80_150_N", "rn_prob_80", 150),
    label("beta_ind_rn_prob_80_180_N", "rn_prob_80", 180),
    // Level factors
    label("beta_PC1_balanced", "PC1_balanced", LEVEL_FACTOR_DAYS),
    label("beta_PC1_unbalanced", "PC1_unbalanced", LEVEL_FACTOR_DAYS),
    label("beta_level", "level_factor", LEVEL_FACTOR_DAYS),
];

/// Find the label for a raw identifier.
pub fn lookup(key: &str) -> Option<&'static VariableLabel> {
    LABELS.iter().find(|l| l.key == key)
}

/// Value of the `days` column.
///
/// Unknown identifiers keep their raw text, so the column can mix horizons
/// and identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DaysLabel {
    /// Horizon in days, or [`LEVEL_FACTOR_DAYS`]
    Horizon(i32),
    /// Raw identifier that has no label
    Raw(String),
}

impl fmt::Display for DaysLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizon(days) => write!(f, "{}", days),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Display name for `key`, or `key` itself when unknown.
pub fn display_name(key: &str) -> &str {
    lookup(key).map_or(key, |l| l.variable)
}

/// Horizon for `key`, or the raw identifier when unknown.
pub fn days_label(key: &str) -> DaysLabel {
    lookup(key).map_or_else(|| DaysLabel::Raw(key.to_string()), |l| DaysLabel::Horizon(l.days))
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Detector configuration and the iterative driver that applies it.

mod detector;
mod error;

pub use detector::detect;
pub use error::StrategyError;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_SENSITIVITY, DEFAULT_DILATION_FREQUENCY_SIZE, DEFAULT_DILATION_TIME_SIZE,
    DEFAULT_HIGH_PASS_SIGMA_SQ_H, DEFAULT_HIGH_PASS_SIGMA_SQ_V, DEFAULT_HIGH_PASS_WINDOW_H,
    DEFAULT_HIGH_PASS_WINDOW_W, DEFAULT_ITERATION_COUNT, DEFAULT_MAX_LENGTH,
    DEFAULT_MIN_AVAILABLE_FREQUENCIES_RATIO, DEFAULT_MIN_AVAILABLE_TF_RATIO,
    DEFAULT_MIN_AVAILABLE_TIMES_RATIO, DEFAULT_MIN_GOOD_FREQUENCY_RATIO,
    DEFAULT_MIN_GOOD_TIME_RATIO, DEFAULT_RHO, DEFAULT_SENSITIVITY_START, DEFAULT_SIR_ETA_FREQ,
    DEFAULT_SIR_ETA_TIME,
};

/// Which baselines a strategy's own knobs (as opposed to the scheduler's
/// selection filter) consider in scope. This mirrors the `baselines`
/// strategy-file option; the scheduler's selection filter (which also
/// distinguishes "auto of current antennae only") is a separate, coarser
/// concept living in [`crate::scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineSelection {
    All,
    Cross,
    Auto,
}

impl Default for BaselineSelection {
    fn default() -> Self {
        BaselineSelection::All
    }
}

/// One step of the detector pipeline. Represented as a flat, tagged enum
/// rather than a polymorphic action tree: the sequence is always walked
/// front-to-back and strategies in this codebase are not GUI-editable, so
/// there is nothing for a tree of indices to buy over a `Vec`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    SumThreshold {
        base_sensitivity: f32,
        flag_time: bool,
        flag_frequency: bool,
    },
    CombineFlagResults,
    RecomputeBackground,
    Sir {
        eta_time: f32,
        eta_frequency: f32,
    },
    Dilate {
        time_size: usize,
        frequency_size: usize,
    },
    RowColumnCollapse {
        row_threshold: f32,
        column_threshold: f32,
        global_threshold: f32,
    },
}

/// The full set of detector knobs, loadable from a TOML strategy file or
/// constructed with [`Strategy::default`]. Field names are exactly the
/// `snake_case` names recognized in the strategy file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strategy {
    pub baselines: BaselineSelection,
    pub iteration_count: usize,
    pub sensitivity_start: f32,
    pub keep_transients: bool,
    pub change_res_vertically: bool,
    pub use_original_flags: bool,
    pub sum_threshold_sensitivity: f32,
    pub vertical_smoothing: f64,
    pub on_stokes_iq: bool,

    pub max_length: usize,
    pub base_sensitivity: f32,
    pub rho: f32,

    pub high_pass_sigma_sq_h: f64,
    pub high_pass_sigma_sq_v: f64,
    pub high_pass_window_w: usize,
    pub high_pass_window_h: usize,

    pub dilation_time_size: usize,
    pub dilation_frequency_size: usize,

    pub sir_eta_time: f32,
    pub sir_eta_freq: f32,

    pub min_good_time_ratio: f32,
    pub min_good_frequency_ratio: f32,
    pub min_available_times_ratio: f32,
    pub min_available_frequencies_ratio: f32,
    pub min_available_tf_ratio: f32,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            baselines: BaselineSelection::All,
            iteration_count: DEFAULT_ITERATION_COUNT,
            sensitivity_start: DEFAULT_SENSITIVITY_START,
            keep_transients: false,
            change_res_vertically: false,
            use_original_flags: false,
            sum_threshold_sensitivity: 1.0,
            vertical_smoothing: DEFAULT_HIGH_PASS_SIGMA_SQ_V,
            on_stokes_iq: false,

            max_length: DEFAULT_MAX_LENGTH,
            base_sensitivity: DEFAULT_BASE_SENSITIVITY,
            rho: DEFAULT_RHO,

            high_pass_sigma_sq_h: DEFAULT_HIGH_PASS_SIGMA_SQ_H,
            high_pass_sigma_sq_v: DEFAULT_HIGH_PASS_SIGMA_SQ_V,
            high_pass_window_w: DEFAULT_HIGH_PASS_WINDOW_W,
            high_pass_window_h: DEFAULT_HIGH_PASS_WINDOW_H,

            dilation_time_size: DEFAULT_DILATION_TIME_SIZE,
            dilation_frequency_size: DEFAULT_DILATION_FREQUENCY_SIZE,

            sir_eta_time: DEFAULT_SIR_ETA_TIME,
            sir_eta_freq: DEFAULT_SIR_ETA_FREQ,

            min_good_time_ratio: DEFAULT_MIN_GOOD_TIME_RATIO,
            min_good_frequency_ratio: DEFAULT_MIN_GOOD_FREQUENCY_RATIO,
            min_available_times_ratio: DEFAULT_MIN_AVAILABLE_TIMES_RATIO,
            min_available_frequencies_ratio: DEFAULT_MIN_AVAILABLE_FREQUENCIES_RATIO,
            min_available_tf_ratio: DEFAULT_MIN_AVAILABLE_TF_RATIO,
        }
    }
}

impl Strategy {
    /// Parse a strategy from TOML text; any field absent in `text` takes
    /// its `Default` value.
    pub fn from_toml_str(text: &str) -> Result<Self, StrategyError> {
        toml::from_str(text).map_err(StrategyError::from)
    }

    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("Strategy always serializes")
    }

    /// The effective number of detector iterations, doubled for robust
    /// (transient-friendly) mode per the base sensitivity schedule.
    pub fn effective_iteration_count(&self) -> usize {
        self.iteration_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let strategy = Strategy::default();
        let text = strategy.to_toml_string();
        let parsed = Strategy::from_toml_str(&text).unwrap();
        assert_eq!(strategy, parsed);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let strategy = Strategy::from_toml_str("iteration_count = 5\n").unwrap();
        assert_eq!(strategy.iteration_count, 5);
        assert_eq!(strategy.rho, Strategy::default().rho);
    }

    #[test]
    fn type_mismatch_is_a_parse_error() {
        let err = Strategy::from_toml_str("iteration_count = \"two\"\n").unwrap_err();
        assert!(matches!(err, StrategyError::Parse(_)));
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants. Default values here are also referenced by the CLI
`--help` text, so changing a value here changes both the `Strategy`
default and the documented default.
 */

/// Alignment (in elements) that every [`crate::structures::Image`] and
/// [`crate::structures::Mask`] row stride is padded to. Must be a multiple
/// of 4, per the stride invariant; 8 matches `wide::f32x8`.
pub const ROW_ALIGN: usize = 8;

/// Default maximum SumThreshold window length.
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// Default SumThreshold base sensitivity (threshold at length 1, before
/// per-iteration sensitivity and the strategy's overall multiplier are
/// applied).
pub const DEFAULT_BASE_SENSITIVITY: f32 = 6.0;

/// Default SumThreshold threshold decay factor per doubling of length.
pub const DEFAULT_RHO: f32 = 1.5;

/// Default number of detector iterations (non-robust mode).
pub const DEFAULT_ITERATION_COUNT: usize = 2;

/// Default number of detector iterations in robust mode.
pub const ROBUST_ITERATION_COUNT: usize = 4;

/// Default starting sensitivity multiplier `S` in `s_0 = S * 2^(N/2)`.
pub const DEFAULT_SENSITIVITY_START: f32 = 2.0;

/// Default high-pass filter window width (time direction, samples).
pub const DEFAULT_HIGH_PASS_WINDOW_W: usize = 21;

/// Default high-pass filter window height (frequency direction, samples).
pub const DEFAULT_HIGH_PASS_WINDOW_H: usize = 31;

/// Default high-pass filter variance, time direction.
pub const DEFAULT_HIGH_PASS_SIGMA_SQ_H: f64 = 2.5;

/// Default high-pass filter variance, frequency direction ("vertical
/// smoothing").
pub const DEFAULT_HIGH_PASS_SIGMA_SQ_V: f64 = 5.0;

/// Default final-pass morphological dilation, time direction.
pub const DEFAULT_DILATION_TIME_SIZE: usize = 0;

/// Default final-pass morphological dilation, frequency direction.
pub const DEFAULT_DILATION_FREQUENCY_SIZE: usize = 0;

/// Default final-pass SIR eta, time direction.
pub const DEFAULT_SIR_ETA_TIME: f32 = 0.2;

/// Default final-pass SIR eta, frequency direction.
pub const DEFAULT_SIR_ETA_FREQ: f32 = 0.2;

/// Default row/column/global collapse thresholds (fraction flagged).
pub const DEFAULT_MIN_GOOD_TIME_RATIO: f32 = 0.2;
pub const DEFAULT_MIN_GOOD_FREQUENCY_RATIO: f32 = 0.2;
pub const DEFAULT_MIN_AVAILABLE_TIMES_RATIO: f32 = 0.8;
pub const DEFAULT_MIN_AVAILABLE_FREQUENCIES_RATIO: f32 = 0.8;
pub const DEFAULT_MIN_AVAILABLE_TF_RATIO: f32 = 0.8;

/// Morphology engine default sub-mask enlargement parameters for
/// `SegmentByLengthRatio`.
pub const DEFAULT_H_LINE_ENLARGING: usize = 1;
pub const DEFAULT_V_LINE_ENLARGING: usize = 1;
pub const DEFAULT_H_DENSITY_ENLARGE_RATIO: f32 = 0.5;
pub const DEFAULT_V_DENSITY_ENLARGE_RATIO: f32 = 0.5;

/// Reserved segment ids written by [`crate::algorithms::morphology::classify`].
pub const BROADBAND_SEGMENT: u32 = 1;
pub const LINE_SEGMENT: u32 = 2;
pub const BLOB_SEGMENT: u32 = 3;

/// Safety factor applied to the per-worker memory estimate to account for
/// in-flight copies (original, contaminated, background, scratch masks).
pub const MEMORY_SAFETY_FACTOR: usize = 3;

/// Minimum interval between progress updates.
pub const PROGRESS_UPDATE_INTERVAL_MS: u64 = 100;

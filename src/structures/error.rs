// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors constructing or combining [`super::Image`], [`super::Mask`] and
/// [`super::TimeFrequencyData`] values. Out-of-range element access is a
/// programming error and panics rather than returning one of these.
#[derive(Error, Debug, PartialEq)]
pub enum StructuresError {
    #[error("shape mismatch: expected {expected_width}x{expected_height}, got {got_width}x{got_height}")]
    ShapeMismatch {
        expected_width: usize,
        expected_height: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error("window length must be at least 1, got {0}")]
    ZeroLengthWindow(usize),

    #[error("threshold must be finite, got {0}")]
    NonFiniteThreshold(f32),

    #[error("a TimeFrequencyData bundle must have at least one polarization")]
    NoPolarizations,
}

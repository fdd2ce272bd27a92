// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-baseline metadata and the bundle that flows through the scheduler.

use hifitime::Epoch;
use ndarray::{Array1, Array2};

use crate::structures::time_frequency::TimeFrequencyData;

/// The non-numeric half of one baseline's worth of work: everything the
/// core reads but never mutates. `Epoch` is used for observation instants
/// (as opposed to `chrono`, which this codebase reserves for wall-clock
/// report/log timestamps).
#[derive(Clone, Debug)]
pub struct BaselineMetadata {
    pub antenna1: usize,
    pub antenna2: usize,
    pub band: usize,
    pub sequence: usize,
    /// One observation epoch per time step.
    pub times: Vec<Epoch>,
    /// One frequency (Hz) per channel.
    pub channel_frequencies: Array1<f64>,
    /// `(n_times, 3)` UVW coordinates, in metres.
    pub uvw: Array2<f64>,
}

impl BaselineMetadata {
    pub fn is_auto_correlation(&self) -> bool {
        self.antenna1 == self.antenna2
    }

    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    pub fn n_channels(&self) -> usize {
        self.channel_frequencies.len()
    }
}

/// One baseline's worth of samples queued for detection: the
/// time/frequency data, its metadata, and the baseline's position in the
/// image-set's iteration order (used only for progress reporting and to
/// correlate a result with its write request; the core never depends on
/// this value).
#[derive(Clone, Debug)]
pub struct BaselineData {
    pub data: TimeFrequencyData,
    pub metadata: BaselineMetadata,
    pub index: usize,
}

impl BaselineData {
    pub fn new(data: TimeFrequencyData, metadata: BaselineMetadata, index: usize) -> Self {
        Self {
            data,
            metadata,
            index,
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Radio-frequency interference (RFI) detection for radio-astronomy
//! time-frequency visibilities.
//!
//! The crate implements the per-baseline detection engine (SumThreshold,
//! the scale-invariant rank operator, morphological segmentation, a
//! high-pass background fit and the iterative driver that ties them
//! together) plus a bounded reader/worker/writer scheduler that runs the
//! engine over many baselines concurrently. Visibility ingest, on-disk
//! flag formats, telescope configuration and strategy scripting are
//! deliberately out of scope; this crate consumes those as collaborator
//! traits (see [`io`]).

pub mod algorithms;
pub(crate) mod cli;
pub(crate) mod constants;
pub mod error;
pub mod io;
pub mod scheduler;
pub mod strategy;
pub mod structures;

#[cfg(test)]
mod tests;

// Re-exports.
pub use cli::Args;
pub use error::FlaggerError;
pub use io::{FlagWriter, ImageSetReader, ProgressListener};
pub use scheduler::{run_scheduler, SchedulerConfig};
pub use strategy::{detect, Strategy};
pub use structures::{
    BaselineData, BaselineMetadata, Image, Mask, Polarisation, SegmentedImage, TimeFrequencyData,
};

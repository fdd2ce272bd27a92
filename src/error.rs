// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all flagger-related errors. This should be the *only*
//! error enum that is publicly visible.

use thiserror::Error;

use crate::scheduler::SchedulerError;
use crate::strategy::StrategyError;
use crate::structures::StructuresError;

/// The *only* publicly visible error from this crate.
#[derive(Error, Debug)]
pub enum FlaggerError {
    /// An error constructing or manipulating a core structure (image, mask,
    /// segmented image).
    #[error("{0}")]
    Structures(#[from] StructuresError),

    /// An error loading or validating a strategy.
    #[error("{0}")]
    Strategy(#[from] StrategyError),

    /// An error from the baseline scheduler.
    #[error("{0}")]
    Scheduler(#[from] SchedulerError),

    /// An IO error, usually from reading a strategy file.
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors from [`super::run_scheduler`].
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Even a single worker's estimated memory use exceeds the available
    /// budget.
    #[error(
        "insufficient memory for even one worker: {per_worker_bytes} bytes needed, \
         {available_bytes} available"
    )]
    InsufficientMemory {
        per_worker_bytes: usize,
        available_bytes: usize,
    },

    /// A collaborator (reader, writer, progress listener) reported an I/O
    /// failure.
    #[error("collaborator I/O failure: {0}")]
    Io(String),

    /// A reader, worker, or writer task panicked.
    #[error("scheduler task panicked: {0}")]
    Panicked(String),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The three collaborator traits the scheduler drives: a baseline reader,
//! a flag writer and a progress listener. The core crate knows nothing
//! about measurement sets, FITS files or any other on-disk format; an
//! application embedding this crate supplies its own implementations.

mod in_memory;
pub mod progress;

pub use in_memory::{InMemoryFlagWriter, InMemoryImageSet};
pub use progress::TerminalProgressListener;

use crate::scheduler::selection::Candidate;
use crate::structures::{BaselineData, Mask};

/// A cursor over the candidate baselines an [`ImageSetReader`] can produce,
/// in whatever native order the underlying format stores them.
pub trait BaselineIndex: Clone + Send + 'static {
    /// Advance to the next candidate. Calling this on an index for which
    /// [`is_valid`](BaselineIndex::is_valid) is `false` is a logic error.
    fn next(&self) -> Self;
    /// Whether this index still refers to a baseline in range.
    fn is_valid(&self) -> bool;
    /// The antenna/band identity of this candidate, consulted by the
    /// scheduler's selection filter before a read is ever requested.
    fn candidate(&self) -> Candidate;
}

/// The single I/O handle the scheduler's reader task owns. Implementors
/// are expected to be cheaply cloneable (each worker gets its own clone)
/// or, if the underlying format does not allow concurrent handles, to
/// serialize reads internally.
pub trait ImageSetReader: Send {
    type Index: BaselineIndex;

    /// The first candidate index to consider.
    fn start_index(&self) -> Self::Index;

    /// Queue a read for `index`; the data becomes available to
    /// [`get_next_requested`](ImageSetReader::get_next_requested) after
    /// the next [`perform_read_requests`](ImageSetReader::perform_read_requests).
    fn add_read_request(&mut self, index: Self::Index);

    /// Perform all queued reads. Implementations that read eagerly in
    /// `add_read_request` may make this a no-op.
    fn perform_read_requests(&mut self) -> std::io::Result<()>;

    /// Pop the next completed read, if any are ready.
    fn get_next_requested(&mut self) -> Option<BaselineData>;

    /// Lower bound on the reader's in-flight queue depth below which the
    /// reader should resume queuing reads, for `worker_count` workers.
    fn min_recommended_buffer(&self, worker_count: usize) -> usize {
        worker_count
    }

    /// Upper bound on the reader's in-flight queue depth above which the
    /// reader should block, for `worker_count` workers.
    fn max_recommended_buffer(&self, worker_count: usize) -> usize {
        2 * worker_count
    }
}

/// The shared sink for completed flag masks. Implementations must be safe
/// to call from the single writer task; the scheduler never calls these
/// methods concurrently.
pub trait FlagWriter: Send {
    /// Queue `mask` as the result for baseline `index`.
    fn add_write_task(&mut self, index: usize, mask: Mask);

    /// Flush all queued write tasks.
    fn perform_write_tasks(&mut self) -> std::io::Result<()>;
}

/// Progress reporting, decoupled from any particular rendering.
pub trait ProgressListener: Send {
    fn on_start_task(&self, description: &str);
    fn on_progress(&self, done: usize, total: usize);
    fn on_finish(&self);
    fn on_exception(&self, what: &str);
}

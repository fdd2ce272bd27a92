// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The bounded reader/worker/writer pipeline that runs the detector over
//! every selected baseline in an image set. Threading primitives mirror
//! this codebase's own read/model/write pipeline: `std::thread::scope`,
//! `crossbeam_channel::bounded` queues, a shared `AtomicCell<bool>`
//! failure flag, and `scopeguard::defer_on_unwind!` so a panicking stage
//! still marks the flag before unwinding.

mod error;
mod memory;
pub mod selection;

pub use error::SchedulerError;
pub use selection::{BaselineClass, Selection};

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use crossbeam_utils::atomic::AtomicCell;
use log::warn;
use scopeguard::defer_on_unwind;

use crate::constants::PROGRESS_UPDATE_INTERVAL_MS;
use crate::io::{FlagWriter, ImageSetReader, ProgressListener};
use crate::strategy::Strategy;
use crate::structures::{BaselineData, Mask};

/// Everything [`run_scheduler`] needs to know besides the strategy and the
/// three collaborators.
pub struct SchedulerConfig {
    pub selection: Selection,
    pub requested_workers: usize,
    pub available_memory_bytes: usize,
    /// Polarizations, timesteps and channels of one baseline, used only to
    /// estimate per-worker memory use; every baseline in an image set is
    /// assumed to share this shape.
    pub polarizations: usize,
    pub timesteps: usize,
    pub channels: usize,
}

/// Summary of one [`run_scheduler`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_selected: usize,
    pub completed: usize,
    pub worker_count: usize,
}

/// Run the detector over every baseline `reader` yields that `config`'s
/// selection filter accepts, writing results through `writer` and
/// reporting progress through `progress`.
pub fn run_scheduler<R, W, P>(
    mut reader: R,
    mut writer: W,
    progress: &P,
    strategy: &Strategy,
    config: SchedulerConfig,
) -> Result<SchedulerStats, SchedulerError>
where
    R: ImageSetReader,
    W: FlagWriter,
    P: ProgressListener,
{
    let per_worker_bytes =
        memory::estimate_per_worker_bytes(config.polarizations, config.timesteps, config.channels);
    let worker_count = memory::plan_worker_count(
        config.requested_workers,
        per_worker_bytes,
        config.available_memory_bytes,
    )?;
    if worker_count < config.requested_workers {
        warn!(
            "reducing worker count from {} to {worker_count} to fit the available memory budget",
            config.requested_workers
        );
    }

    let total_selected = count_selected(&reader, &config.selection);
    progress.on_start_task("Flagging baselines");

    let read_buffer = reader.max_recommended_buffer(worker_count).max(1);
    let (read_tx, read_rx) = bounded::<BaselineData>(read_buffer);
    let (write_tx, write_rx) = bounded::<(usize, Mask)>(read_buffer);

    let error = AtomicCell::new(false);

    let (reader_result, worker_panics, writer_result) = thread::scope(|s| {
        let selection = &config.selection;
        let reader_handle = s.spawn(|| {
            defer_on_unwind! { error.store(true); }
            let result = reader_loop(&mut reader, selection, read_tx, &error);
            if result.is_err() {
                error.store(true);
            }
            result
        });

        let worker_handles: Vec<_> = (0..worker_count)
            .map(|_| {
                let worker_rx = read_rx.clone();
                let worker_tx = write_tx.clone();
                s.spawn(|| {
                    defer_on_unwind! { error.store(true); }
                    worker_loop(worker_rx, worker_tx, strategy, &error);
                })
            })
            .collect();
        drop(read_rx);
        drop(write_tx);

        let writer_handle = s.spawn(|| {
            defer_on_unwind! { error.store(true); }
            let result = writer_loop(&mut writer, write_rx, progress, total_selected, &error);
            if result.is_err() {
                error.store(true);
            }
            result
        });

        let reader_result = reader_handle.join();
        let any_worker_panicked = worker_handles
            .into_iter()
            .map(|handle| handle.join().is_err())
            .any(|panicked| panicked);
        let writer_result = writer_handle.join();
        (reader_result, any_worker_panicked, writer_result)
    });

    match reader_result {
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(SchedulerError::Panicked("reader task panicked".to_string())),
        Ok(Ok(())) => {}
    }

    if worker_panics {
        return Err(SchedulerError::Panicked("a worker task panicked".to_string()));
    }

    let completed = match writer_result {
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(SchedulerError::Panicked("writer task panicked".to_string())),
        Ok(Ok(completed)) => completed,
    };

    progress.on_finish();
    Ok(SchedulerStats {
        total_selected,
        completed,
        worker_count,
    })
}

fn count_selected<R: ImageSetReader>(reader: &R, selection: &Selection) -> usize {
    let mut index = reader.start_index();
    let mut count = 0usize;
    while index.is_valid() {
        if selection.accepts(index.candidate()) {
            count += 1;
        }
        index = index.next();
    }
    count
}

fn reader_loop<R: ImageSetReader>(
    reader: &mut R,
    selection: &Selection,
    sender: Sender<BaselineData>,
    error: &AtomicCell<bool>,
) -> Result<(), SchedulerError> {
    let mut index = reader.start_index();
    while index.is_valid() && !error.load() {
        if selection.accepts(index.candidate()) {
            reader.add_read_request(index);
        }
        index = index.next();
    }
    reader
        .perform_read_requests()
        .map_err(|e| SchedulerError::Io(e.to_string()))?;
    while let Some(baseline) = reader.get_next_requested() {
        if error.load() || sender.send(baseline).is_err() {
            break;
        }
    }
    Ok(())
}

fn worker_loop(
    receiver: Receiver<BaselineData>,
    sender: Sender<(usize, Mask)>,
    strategy: &Strategy,
    error: &AtomicCell<bool>,
) {
    for baseline in receiver.iter() {
        if error.load() {
            break;
        }
        let mask = crate::strategy::detect(&baseline.data, strategy);
        if sender.send((baseline.index, mask)).is_err() {
            break;
        }
    }
}

fn writer_loop<W: FlagWriter, P: ProgressListener>(
    writer: &mut W,
    receiver: Receiver<(usize, Mask)>,
    progress: &P,
    total: usize,
    error: &AtomicCell<bool>,
) -> Result<usize, SchedulerError> {
    let mut completed = 0usize;
    let mut last_report = Instant::now();
    let interval = Duration::from_millis(PROGRESS_UPDATE_INTERVAL_MS);

    for (index, mask) in receiver.iter() {
        writer.add_write_task(index, mask);
        writer
            .perform_write_tasks()
            .map_err(|e| SchedulerError::Io(e.to_string()))?;
        completed += 1;

        if error.load() {
            progress.on_exception("a worker or the reader failed; draining remaining results");
        }
        if last_report.elapsed() >= interval || completed == total {
            progress.on_progress(completed, total);
            last_report = Instant::now();
        }
    }
    Ok(completed)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-worker memory estimation and worker-count planning.

use crate::constants::MEMORY_SAFETY_FACTOR;
use crate::scheduler::error::SchedulerError;

/// Estimated bytes of memory one worker needs to hold a single baseline's
/// data (original, contaminated, background and scratch mask, per the
/// `safety_factor` fudge) while it runs the detector.
pub fn estimate_per_worker_bytes(polarizations: usize, timesteps: usize, channels: usize) -> usize {
    8 * polarizations * timesteps * channels * MEMORY_SAFETY_FACTOR
}

/// Reduce `requested_workers` until `requested_workers * per_worker_bytes`
/// fits within `available_bytes`, never going below 1. Returns
/// [`SchedulerError::InsufficientMemory`] if even one worker does not fit.
pub fn plan_worker_count(
    requested_workers: usize,
    per_worker_bytes: usize,
    available_bytes: usize,
) -> Result<usize, SchedulerError> {
    if per_worker_bytes > available_bytes {
        return Err(SchedulerError::InsufficientMemory {
            per_worker_bytes,
            available_bytes,
        });
    }
    let max_workers = (available_bytes / per_worker_bytes).max(1);
    Ok(requested_workers.min(max_workers).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_all_three_dimensions() {
        let estimate = estimate_per_worker_bytes(2, 100, 50);
        assert_eq!(estimate, 8 * 2 * 100 * 50 * MEMORY_SAFETY_FACTOR);
    }

    #[test]
    fn plan_reduces_worker_count_to_fit() {
        let per_worker = 1_000;
        let available = 2_500;
        let workers = plan_worker_count(8, per_worker, available).unwrap();
        assert_eq!(workers, 2);
    }

    #[test]
    fn plan_never_reduces_below_one() {
        let workers = plan_worker_count(1, 1_000, 1_500).unwrap();
        assert_eq!(workers, 1);
    }

    #[test]
    fn plan_fails_when_even_one_worker_does_not_fit() {
        let err = plan_worker_count(4, 10_000, 1_000).unwrap_err();
        assert!(matches!(err, SchedulerError::InsufficientMemory { .. }));
    }

    #[test]
    fn plan_does_not_exceed_the_request() {
        let workers = plan_worker_count(2, 100, 10_000).unwrap();
        assert_eq!(workers, 2);
    }
}

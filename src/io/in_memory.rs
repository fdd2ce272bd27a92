// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! In-memory [`ImageSetReader`]/[`FlagWriter`] pair, used by tests and by
//! anything that wants to run the scheduler over synthesized data without
//! a real measurement-set library.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::io::{BaselineIndex, FlagWriter, ImageSetReader};
use crate::scheduler::selection::Candidate;
use crate::structures::{BaselineData, Mask};

/// A [`BaselineIndex`] over a fixed-size in-memory baseline list. Carries a
/// shared table of every baseline's [`Candidate`] identity (computed once,
/// up front) so that `next()` can look up the candidate at the new
/// position without needing a borrow of the owning [`InMemoryImageSet`].
#[derive(Clone, Debug)]
pub struct InMemoryIndex {
    position: usize,
    candidates: Arc<[Candidate]>,
}

impl BaselineIndex for InMemoryIndex {
    fn next(&self) -> Self {
        Self {
            position: self.position + 1,
            candidates: Arc::clone(&self.candidates),
        }
    }

    fn is_valid(&self) -> bool {
        self.position < self.candidates.len()
    }

    fn candidate(&self) -> Candidate {
        self.candidates[self.position]
    }
}

/// An [`ImageSetReader`] over a `Vec<BaselineData>` already resident in
/// memory.
pub struct InMemoryImageSet {
    baselines: Vec<BaselineData>,
    candidates: Arc<[Candidate]>,
    pending: VecDeque<usize>,
    ready: VecDeque<BaselineData>,
}

impl InMemoryImageSet {
    pub fn new(baselines: Vec<BaselineData>) -> Self {
        let candidates: Arc<[Candidate]> = baselines
            .iter()
            .map(|baseline| Candidate::from(&baseline.metadata))
            .collect::<Vec<_>>()
            .into();
        Self {
            baselines,
            candidates,
            pending: VecDeque::new(),
            ready: VecDeque::new(),
        }
    }
}

impl ImageSetReader for InMemoryImageSet {
    type Index = InMemoryIndex;

    fn start_index(&self) -> Self::Index {
        InMemoryIndex {
            position: 0,
            candidates: Arc::clone(&self.candidates),
        }
    }

    fn add_read_request(&mut self, index: Self::Index) {
        self.pending.push_back(index.position);
    }

    fn perform_read_requests(&mut self) -> std::io::Result<()> {
        while let Some(position) = self.pending.pop_front() {
            self.ready.push_back(self.baselines[position].clone());
        }
        Ok(())
    }

    fn get_next_requested(&mut self) -> Option<BaselineData> {
        self.ready.pop_front()
    }
}

/// A [`FlagWriter`] that records every written mask into a shared map,
/// inspectable by tests after the scheduler finishes.
#[derive(Clone, Default)]
pub struct InMemoryFlagWriter {
    written: Arc<Mutex<Vec<(usize, Mask)>>>,
    pending: Vec<(usize, Mask)>,
}

impl InMemoryFlagWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cloneable handle to the results, safe to inspect after the
    /// scheduler run completes.
    pub fn results(&self) -> Arc<Mutex<Vec<(usize, Mask)>>> {
        Arc::clone(&self.written)
    }
}

impl FlagWriter for InMemoryFlagWriter {
    fn add_write_task(&mut self, index: usize, mask: Mask) {
        self.pending.push((index, mask));
    }

    fn perform_write_tasks(&mut self) -> std::io::Result<()> {
        let mut written = self.written.lock().expect("writer mutex poisoned");
        written.extend(self.pending.drain(..));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::{BaselineMetadata, ComplexImage, Polarisation, TimeFrequencyData};
    use hifitime::Epoch;
    use ndarray::{Array1, Array2};

    fn dummy_baseline(index: usize, antenna1: usize, antenna2: usize) -> BaselineData {
        let data = TimeFrequencyData::new(
            vec![(Polarisation::XX, ComplexImage::zeros(2, 2))],
            Mask::unflagged(2, 2),
        )
        .unwrap();
        let metadata = BaselineMetadata {
            antenna1,
            antenna2,
            band: 0,
            sequence: 0,
            times: vec![Epoch::from_gpst_seconds(0.0), Epoch::from_gpst_seconds(1.0)],
            channel_frequencies: Array1::from_elem(2, 150.0e6),
            uvw: Array2::zeros((2, 3)),
        };
        BaselineData::new(data, metadata, index)
    }

    #[test]
    fn reads_are_returned_in_request_order() {
        let mut reader = InMemoryImageSet::new(vec![
            dummy_baseline(0, 1, 2),
            dummy_baseline(1, 3, 4),
        ]);
        let index0 = reader.start_index();
        let index1 = index0.next();
        reader.add_read_request(index1);
        reader.add_read_request(index0);
        reader.perform_read_requests().unwrap();
        assert_eq!(reader.get_next_requested().unwrap().index, 1);
        assert_eq!(reader.get_next_requested().unwrap().index, 0);
        assert!(reader.get_next_requested().is_none());
    }

    #[test]
    fn index_reports_candidate_antennas() {
        let reader = InMemoryImageSet::new(vec![dummy_baseline(0, 5, 6)]);
        let index = reader.start_index();
        let candidate = index.candidate();
        assert_eq!(candidate.antenna1, 5);
        assert_eq!(candidate.antenna2, 6);
    }

    #[test]
    fn writer_accumulates_across_flushes() {
        let mut writer = InMemoryFlagWriter::new();
        writer.add_write_task(0, Mask::unflagged(2, 2));
        writer.perform_write_tasks().unwrap();
        writer.add_write_task(1, Mask::all_flagged(2, 2));
        writer.perform_write_tasks().unwrap();
        let results = writer.results();
        let written = results.lock().unwrap();
        assert_eq!(written.len(), 2);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end scenarios that exercise more than one module together.
//! Single-component behaviour is tested alongside the component itself;
//! this module is for the cross-cutting scenarios that don't belong to
//! any one of them.

use crate::scheduler::{run_scheduler, BaselineClass, SchedulerConfig, Selection};
use crate::strategy::{detect, Strategy};
use crate::structures::{
    BaselineData, BaselineMetadata, ComplexImage, Image, Mask, Polarisation, TimeFrequencyData,
};

use hifitime::Epoch;
use ndarray::{Array1, Array2};

fn flat_baseline(index: usize, antenna1: usize, antenna2: usize, width: usize, height: usize) -> BaselineData {
    let complex = ComplexImage::zeros(width, height);
    let data = TimeFrequencyData::new(vec![(Polarisation::I, complex)], Mask::unflagged(width, height))
        .unwrap();
    let metadata = BaselineMetadata {
        antenna1,
        antenna2,
        band: 0,
        sequence: 0,
        times: (0..height)
            .map(|t| Epoch::from_gpst_seconds(t as f64))
            .collect(),
        channel_frequencies: Array1::from_elem(width, 150.0e6),
        uvw: Array2::zeros((height, 3)),
    };
    BaselineData::new(data, metadata, index)
}

/// Scenario 1 (single bright sample): a lone spike well above the
/// background should end up flagged, and the rest of the image should
/// not, after a full `detect()` run with default thresholds.
#[test]
fn detect_flags_a_single_bright_sample() {
    let width = 10;
    let height = 10;
    let mut real = Image::zeros(width, height);
    real.set_value(5, 5, 100.0);
    let complex = ComplexImage {
        real,
        imag: Image::zeros(width, height),
    };
    let data = TimeFrequencyData::new(vec![(Polarisation::I, complex)], Mask::unflagged(width, height))
        .unwrap();

    let mask = detect(&data, &Strategy::default());

    assert!(mask.value(5, 5));
    let flagged: usize = (0..height)
        .map(|y| (0..width).filter(|&x| mask.value(x, y)).count())
        .sum();
    assert!(flagged < width * height, "detect() should not flag the whole image");
}

/// Scenario 6 (scheduler back-pressure), run through the public
/// `run_scheduler` entry point rather than the scheduler's own internal
/// unit tests, to additionally prove the selection filter and the
/// writer's accumulated results agree on the baseline count.
#[test]
fn scheduler_delivers_every_selected_baseline_to_the_writer() {
    let baselines: Vec<BaselineData> = (0..6)
        .map(|i| {
            let (a1, a2) = if i % 3 == 0 { (i, i) } else { (i, i + 1) };
            flat_baseline(i, a1, a2, 8, 8)
        })
        .collect();
    let expected_selected = baselines
        .iter()
        .filter(|b| b.metadata.antenna1 != b.metadata.antenna2)
        .count();

    let reader = crate::io::InMemoryImageSet::new(baselines);
    let writer = crate::io::InMemoryFlagWriter::new();
    let results = writer.results();
    let progress = crate::io::TerminalProgressListener::new(false);

    let config = SchedulerConfig {
        selection: Selection {
            class: BaselineClass::CrossOnly,
            ..Selection::default()
        },
        requested_workers: 2,
        available_memory_bytes: 1024 * 1024 * 1024,
        polarizations: 1,
        timesteps: 8,
        channels: 8,
    };

    let stats = run_scheduler(reader, writer, &progress, &Strategy::default(), config).unwrap();

    assert_eq!(stats.total_selected, expected_selected);
    assert_eq!(stats.completed, expected_selected);
    assert_eq!(results.lock().unwrap().len(), expected_selected);
}

/// Scenario 10 (row/column/global collapse): a mask with every channel in
/// one time sample flagged should, after `detect()`'s final collapse
/// pass, have that whole row flagged (not just the samples the kernels
/// themselves touched).
#[test]
fn row_collapse_flags_the_whole_time_sample() {
    let width = 16;
    let height = 8;
    let mut real = Image::zeros(width, height);
    let mut mask = Mask::unflagged(width, height);
    for x in 0..width {
        mask.set_value(x, 2, true);
        real.set_value(x, 2, 50.0);
    }
    let complex = ComplexImage {
        real,
        imag: Image::zeros(width, height),
    };
    let data = TimeFrequencyData::new(vec![(Polarisation::I, complex)], mask).unwrap();

    let out = detect(&data, &Strategy::default());

    for x in 0..width {
        assert!(out.value(x, 2), "column {x} of the fully-flagged row should stay flagged");
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The SumThreshold combinatorial thresholder: flags a sample if some
//! consecutive run of length `L` containing it has a mean magnitude
//! exceeding `T`. Applied for a geometric sequence of lengths, each built
//! on the mask left by the previous one.

use wide::f32x8;

use crate::structures::view::{GridView, GridViewMut, Swapped};

/// How a missing-aware SumThreshold pass treats missing samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingAwareMode {
    /// Two-pointer scan that skips missing samples while keeping a running
    /// sum/count, so a window of `length` spans however many raw positions
    /// it needs to find `length` non-missing ones.
    Consecutive,
    /// Compact the non-missing samples of a row into a dense scratch
    /// buffer, run the plain kernel on it, then scatter the result back.
    Stacked,
}

/// Run one SumThreshold pass over every row of `image`, OR-ing newly
/// flagged samples into `mask`. Previously flagged samples are excluded
/// from both the sum and the count, as are non-finite (`NaN`/infinite)
/// samples, which are additionally always flagged; a window where every
/// sample is already flagged or non-finite can never trigger. Window means
/// are evaluated against the mask as it stood on entry — a trigger never
/// feeds back into the accumulator for later windows in the same row.
pub fn horizontal<I: GridView<f32>, M: GridViewMut<bool>>(
    image: &I,
    mask: &mut M,
    length: usize,
    threshold: f32,
) {
    assert!(length >= 1);
    assert!(threshold.is_finite(), "threshold must be finite, got {threshold}");
    let width = image.width();
    if length > width {
        return;
    }
    for y in 0..image.height() {
        horizontal_row(image, mask, y, length, threshold);
    }
}

pub fn vertical<I: GridView<f32>, M: GridViewMut<bool>>(
    image: &I,
    mask: &mut M,
    length: usize,
    threshold: f32,
) {
    let swapped_image = Swapped(image);
    let mut swapped_mask = Swapped(mask);
    horizontal(&swapped_image, &mut swapped_mask, length, threshold);
}

fn horizontal_row<I: GridView<f32>, M: GridViewMut<bool>>(
    image: &I,
    mask: &mut M,
    y: usize,
    length: usize,
    threshold: f32,
) {
    let width = image.width();

    // Non-finite samples are treated as missing: flagged unconditionally and
    // excluded from every window's accumulation. Written before the scan so
    // the read-only snapshot below already reflects them.
    for x in 0..width {
        if !image.value(x, y).is_finite() {
            mask.set_value(x, y, true);
        }
    }

    // A read-only snapshot of the mask as it stands on entry. All window
    // means are evaluated against this, never against `mask` itself, so a
    // trigger later in the row can never corrupt an earlier window's
    // bookkeeping or suppress a later one.
    let snapshot: Vec<bool> = (0..width).map(|x| mask.value(x, y)).collect();

    let mut sum = 0.0f32;
    let mut count = 0u32;
    for x in 0..length {
        if !snapshot[x] {
            sum += image.value(x, y);
            count += 1;
        }
    }
    let mut window_end = length;
    loop {
        if count > 0 && (sum / count as f32).abs() > threshold {
            for x in window_end - length..window_end {
                mask.set_value(x, y, true);
            }
        }
        if window_end >= width {
            break;
        }
        let leaving = window_end - length;
        if !snapshot[leaving] {
            sum -= image.value(leaving, y);
            count -= 1;
        }
        if !snapshot[window_end] {
            sum += image.value(window_end, y);
            count += 1;
        }
        window_end += 1;
    }
}

/// SIMD-vectorized horizontal pass for 8-wide lanes. Falls back silently to
/// the scalar row kernel when `length` is not a power of two large enough
/// to benefit, or when the row is too narrow; the fallback produces
/// bit-identical results to [`horizontal`] in the no-missing case.
pub fn horizontal_simd8<I: GridView<f32>, M: GridViewMut<bool>>(
    image: &I,
    mask: &mut M,
    length: usize,
    threshold: f32,
) {
    assert!(threshold.is_finite(), "threshold must be finite, got {threshold}");
    if length < 8 || image.width() < length + 8 {
        horizontal(image, mask, length, threshold);
        return;
    }
    let width = image.width();
    for y in 0..image.height() {
        // Non-finite samples are treated as missing: flagged unconditionally
        // and excluded from every window's accumulation, exactly as in
        // `horizontal_row`, so this path agrees with it bit-for-bit.
        for x in 0..width {
            if !image.value(x, y).is_finite() {
                mask.set_value(x, y, true);
            }
        }
        let snapshot: Vec<bool> = (0..width).map(|x| mask.value(x, y)).collect();

        // The widened-window running sum is still sequential per row (each
        // window overlaps the last), so the 8-wide lanes are used to batch
        // the final threshold test and mask OR across 8 adjacent window
        // starts rather than the accumulation itself. `sums`/`counts` are
        // built entirely from the read-only `snapshot`, so no window's
        // result depends on a flag this same pass has set.
        let mut sums = vec![0.0f32; width];
        let mut counts = vec![0u32; width];
        let mut sum = 0.0f32;
        let mut count = 0u32;
        for x in 0..length {
            if !snapshot[x] {
                sum += image.value(x, y);
                count += 1;
            }
        }
        sums[0] = sum;
        counts[0] = count;
        let mut window_end = length;
        let mut idx = 1;
        while window_end < width {
            let leaving = window_end - length;
            if !snapshot[leaving] {
                sum -= image.value(leaving, y);
                count -= 1;
            }
            if !snapshot[window_end] {
                sum += image.value(window_end, y);
                count += 1;
            }
            sums[idx] = sum;
            counts[idx] = count;
            window_end += 1;
            idx += 1;
        }

        let n_windows = idx;
        let mut lane = 0;
        while lane + 8 <= n_windows {
            let s = f32x8::from([
                sums[lane],
                sums[lane + 1],
                sums[lane + 2],
                sums[lane + 3],
                sums[lane + 4],
                sums[lane + 5],
                sums[lane + 6],
                sums[lane + 7],
            ]);
            let means = (s / f32x8::from([
                counts[lane].max(1) as f32,
                counts[lane + 1].max(1) as f32,
                counts[lane + 2].max(1) as f32,
                counts[lane + 3].max(1) as f32,
                counts[lane + 4].max(1) as f32,
                counts[lane + 5].max(1) as f32,
                counts[lane + 6].max(1) as f32,
                counts[lane + 7].max(1) as f32,
            ]))
            .abs();
            let means: [f32; 8] = means.into();
            for i in 0..8 {
                let w = lane + i;
                if counts[w] > 0 && means[i] > threshold {
                    for x in w..w + length {
                        mask.set_value(x, y, true);
                    }
                }
            }
            lane += 8;
        }
        while lane < n_windows {
            if counts[lane] > 0 && (sums[lane] / counts[lane] as f32).abs() > threshold {
                for x in lane..lane + length {
                    mask.set_value(x, y, true);
                }
            }
            lane += 1;
        }
    }
}

pub fn vertical_simd8<I: GridView<f32>, M: GridViewMut<bool>>(
    image: &I,
    mask: &mut M,
    length: usize,
    threshold: f32,
) {
    let swapped_image = Swapped(image);
    let mut swapped_mask = Swapped(mask);
    horizontal_simd8(&swapped_image, &mut swapped_mask, length, threshold);
}

/// The missing-aware horizontal variant. `missing` marks structurally
/// absent samples (e.g. correlator flags); the window is evaluated over the
/// subsequence that skips them, and a missing position is never flagged by
/// this call.
pub fn horizontal_missing<I: GridView<f32>, M: GridViewMut<bool>, Ms: GridView<bool>>(
    image: &I,
    mask: &mut M,
    missing: &Ms,
    length: usize,
    threshold: f32,
    variant: MissingAwareMode,
) {
    assert!(threshold.is_finite(), "threshold must be finite, got {threshold}");
    let width = image.width();
    if length > width {
        return;
    }
    match variant {
        MissingAwareMode::Consecutive => {
            for y in 0..image.height() {
                horizontal_missing_consecutive_row(image, mask, missing, y, length, threshold);
            }
        }
        MissingAwareMode::Stacked => {
            for y in 0..image.height() {
                horizontal_missing_stacked_row(image, mask, missing, y, length, threshold);
            }
        }
    }
}

pub fn vertical_missing<I: GridView<f32>, M: GridViewMut<bool>, Ms: GridView<bool>>(
    image: &I,
    mask: &mut M,
    missing: &Ms,
    length: usize,
    threshold: f32,
    variant: MissingAwareMode,
) {
    let swapped_image = Swapped(image);
    let mut swapped_mask = Swapped(mask);
    let swapped_missing = Swapped(missing);
    horizontal_missing(
        &swapped_image,
        &mut swapped_mask,
        &swapped_missing,
        length,
        threshold,
        variant,
    );
}

/// Two-pointer scan: advance `right` until `length` non-missing samples
/// have been collected, test, slide by dropping the leftmost non-missing
/// sample and collecting the next one.
fn horizontal_missing_consecutive_row<I: GridView<f32>, M: GridViewMut<bool>, Ms: GridView<bool>>(
    image: &I,
    mask: &mut M,
    missing: &Ms,
    y: usize,
    length: usize,
    threshold: f32,
) {
    let width = image.width();
    let non_missing: Vec<usize> = (0..width).filter(|&x| !missing.value(x, y)).collect();
    if non_missing.len() < length {
        return;
    }

    // Non-finite samples are treated as missing: flagged unconditionally and
    // excluded from every window's accumulation. Written before the
    // read-only snapshot below, same as the plain row kernel.
    for &x in &non_missing {
        if !image.value(x, y).is_finite() {
            mask.set_value(x, y, true);
        }
    }
    let snapshot: Vec<bool> = non_missing.iter().map(|&x| mask.value(x, y)).collect();

    let mut sum = 0.0f32;
    let mut count = 0u32;
    for i in 0..length {
        if !snapshot[i] {
            sum += image.value(non_missing[i], y);
            count += 1;
        }
    }
    let mut end = length;
    loop {
        if count > 0 && (sum / count as f32).abs() > threshold {
            for &x in &non_missing[end - length..end] {
                mask.set_value(x, y, true);
            }
        }
        if end >= non_missing.len() {
            break;
        }
        if !snapshot[end - length] {
            sum -= image.value(non_missing[end - length], y);
            count -= 1;
        }
        if !snapshot[end] {
            sum += image.value(non_missing[end], y);
            count += 1;
        }
        end += 1;
    }
}

/// Compact the non-missing samples of the row into a dense scratch buffer,
/// run the plain row kernel on it, then scatter flags back. Produces the
/// same result as [`horizontal_missing_consecutive_row`] but via an
/// auxiliary allocation, matching the alternative implementation the core
/// is required to support.
fn horizontal_missing_stacked_row<I: GridView<f32>, M: GridViewMut<bool>, Ms: GridView<bool>>(
    image: &I,
    mask: &mut M,
    missing: &Ms,
    y: usize,
    length: usize,
    threshold: f32,
) {
    let width = image.width();
    let non_missing: Vec<usize> = (0..width).filter(|&x| !missing.value(x, y)).collect();
    if non_missing.len() < length {
        return;
    }
    let mut values = Vec::with_capacity(non_missing.len());
    let mut snapshot = Vec::with_capacity(non_missing.len());
    for &x in &non_missing {
        let v = image.value(x, y);
        values.push(v);
        snapshot.push(mask.value(x, y) || !v.is_finite());
    }

    let n = non_missing.len();
    // Separate from `snapshot`: `snapshot` is the read-only input the
    // accumulator consults; `triggered` only records this pass's own
    // findings, so a trigger never corrupts a later window's bookkeeping.
    let mut triggered = vec![false; n];
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for i in 0..length {
        if !snapshot[i] {
            sum += values[i];
            count += 1;
        }
    }
    let mut end = length;
    loop {
        if count > 0 && (sum / count as f32).abs() > threshold {
            for f in &mut triggered[end - length..end] {
                *f = true;
            }
        }
        if end >= n {
            break;
        }
        if !snapshot[end - length] {
            sum -= values[end - length];
            count -= 1;
        }
        if !snapshot[end] {
            sum += values[end];
            count += 1;
        }
        end += 1;
    }

    for (i, &x) in non_missing.iter().enumerate() {
        if triggered[i] || !values[i].is_finite() {
            mask.set_value(x, y, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::{Image, Mask};

    #[test]
    fn isolated_spike_is_flagged() {
        let mut data = vec![0.0f32; 16];
        data[8] = 100.0;
        let image = Image::from_vec(16, 1, &data);
        let mut mask = Mask::unflagged(16, 1);
        horizontal(&image, &mut mask, 1, 5.0);
        assert!(mask.value(8, 0));
        assert!(!mask.value(7, 0));
    }

    #[test]
    fn flat_moderate_run_is_flagged_at_longer_length() {
        let data = vec![3.0f32; 16];
        let image = Image::from_vec(16, 1, &data);
        let mut mask = Mask::unflagged(16, 1);
        horizontal(&image, &mut mask, 4, 2.0);
        assert!(mask.value(0, 0));
        assert!(mask.value(15, 0));
    }

    #[test]
    fn already_flagged_window_cannot_trigger() {
        let data = vec![100.0f32; 4];
        let image = Image::from_vec(4, 1, &data);
        let mut mask = Mask::all_flagged(4, 1);
        horizontal(&image, &mut mask, 4, 1000.0);
        for x in 0..4 {
            assert!(mask.value(x, 0));
        }
    }

    #[test]
    fn length_exceeding_width_is_a_noop() {
        let image = Image::zeros(4, 1);
        let mut mask = Mask::unflagged(4, 1);
        horizontal(&image, &mut mask, 5, 0.0);
        for x in 0..4 {
            assert!(!mask.value(x, 0));
        }
    }

    #[test]
    fn simd_matches_scalar_reference() {
        let mut data = vec![0.1f32; 64];
        for (i, v) in data.iter_mut().enumerate() {
            *v = ((i * 37) % 13) as f32 * 0.5;
        }
        data[40] = 50.0;
        let image = Image::from_vec(64, 1, &data);
        let mut scalar_mask = Mask::unflagged(64, 1);
        let mut simd_mask = Mask::unflagged(64, 1);
        horizontal(&image, &mut scalar_mask, 8, 3.0);
        horizontal_simd8(&image, &mut simd_mask, 8, 3.0);
        for x in 0..64 {
            assert_eq!(scalar_mask.value(x, 0), simd_mask.value(x, 0), "x={x}");
        }
    }

    #[test]
    fn missing_consecutive_and_stacked_agree() {
        let mut data = vec![0.0f32; 20];
        data[5] = 50.0;
        data[15] = 50.0;
        let image = Image::from_vec(20, 1, &data);
        let mut missing = Mask::unflagged(20, 1);
        missing.set_value(6, 0, true);
        missing.set_value(7, 0, true);

        let mut mask_a = Mask::unflagged(20, 1);
        let mut mask_b = Mask::unflagged(20, 1);
        horizontal_missing(&image, &mut mask_a, &missing, 3, 4.0, MissingAwareMode::Consecutive);
        horizontal_missing(&image, &mut mask_b, &missing, 3, 4.0, MissingAwareMode::Stacked);
        for x in 0..20 {
            assert_eq!(mask_a.value(x, 0), mask_b.value(x, 0), "x={x}");
        }
        assert!(!mask_a.value(6, 0));
        assert!(!mask_a.value(7, 0));
    }

    #[test]
    fn non_finite_sample_is_flagged_and_does_not_poison_later_windows() {
        let mut data = vec![0.0f32; 12];
        data[4] = f32::NAN;
        data[8] = 100.0;
        data[9] = 100.0;
        data[10] = 100.0;
        let image = Image::from_vec(12, 1, &data);
        let mut mask = Mask::unflagged(12, 1);
        horizontal(&image, &mut mask, 3, 10.0);

        assert!(mask.value(4, 0), "a NaN sample must always be flagged");
        assert!(mask.value(8, 0));
        assert!(mask.value(9, 0));
        assert!(mask.value(10, 0));
        assert!(!mask.value(0, 0), "the NaN must not poison windows elsewhere in the row");
        assert!(!mask.value(1, 0));
    }

    #[test]
    fn earlier_trigger_does_not_corrupt_later_window() {
        let mut data = vec![0.0f32; 12];
        data[0] = 1000.0;
        let image = Image::from_vec(12, 1, &data);
        let mut mask = Mask::unflagged(12, 1);
        horizontal(&image, &mut mask, 4, 90.0);

        assert!(mask.value(0, 0));
        assert!(mask.value(1, 0));
        assert!(mask.value(2, 0));
        assert!(mask.value(3, 0));
        assert!(
            !mask.value(4, 0),
            "a window with no real spike must not trigger after an earlier trigger in the row"
        );
        assert!(!mask.value(5, 0));
        assert!(!mask.value(8, 0));
    }

    #[test]
    fn vertical_matches_transposed_horizontal() {
        let data: Vec<f32> = (0..20).map(|i| if i == 11 { 50.0 } else { 0.0 }).collect();
        let image = Image::from_vec(4, 5, &data);
        let mut a = Mask::unflagged(4, 5);
        vertical(&image, &mut a, 2, 3.0);

        let swapped_image = Swapped(&image);
        let mut b = Mask::unflagged(4, 5);
        let mut swapped_b = Swapped(&mut b);
        horizontal(&swapped_image, &mut swapped_b, 2, 3.0);

        for y in 0..5 {
            for x in 0..4 {
                assert_eq!(a.value(x, y), b.value(x, y));
            }
        }
    }
}

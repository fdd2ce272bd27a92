// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Connected-component segmentation of a flag mask, segment clustering,
//! shape classification and small-segment removal.

use std::collections::HashMap;

use crate::algorithms::sir;
use crate::constants::{
    BLOB_SEGMENT, BROADBAND_SEGMENT, DEFAULT_H_DENSITY_ENLARGE_RATIO, DEFAULT_H_LINE_ENLARGING,
    DEFAULT_V_DENSITY_ENLARGE_RATIO, DEFAULT_V_LINE_ENLARGING, LINE_SEGMENT,
};
use crate::structures::{Mask, SegmentedImage};

/// Tunables for [`segment_by_length_ratio`], mirroring the defaults the
/// detector's morphology stage is constructed with.
#[derive(Clone, Copy, Debug)]
pub struct LengthRatioParams {
    pub h_line_enlarging: usize,
    pub v_line_enlarging: usize,
    pub h_density_enlarge_ratio: f32,
    pub v_density_enlarge_ratio: f32,
}

impl Default for LengthRatioParams {
    fn default() -> Self {
        Self {
            h_line_enlarging: DEFAULT_H_LINE_ENLARGING,
            v_line_enlarging: DEFAULT_V_LINE_ENLARGING,
            h_density_enlarge_ratio: DEFAULT_H_DENSITY_ENLARGE_RATIO,
            v_density_enlarge_ratio: DEFAULT_V_DENSITY_ENLARGE_RATIO,
        }
    }
}

/// The horizontal/vertical run-length "opening" at each flagged sample:
/// positive when the horizontal run through it is at least as long as the
/// vertical one, negative otherwise (sign alone is what flood-fill uses to
/// decide whether two touching flagged samples belong to the same
/// connected shape).
fn calculate_openings(mask: &Mask) -> Vec<Vec<i64>> {
    let width = mask.width();
    let height = mask.height();
    let mut values = vec![vec![0i64; width]; height];

    for y in 0..height {
        let mut length = 0usize;
        for x in 0..width {
            if mask.value(x, y) {
                length += 1;
            } else if length > 0 {
                for i in x - length..x {
                    values[y][i] = length as i64;
                }
                length = 0;
            }
        }
        if length > 0 {
            for i in width - length..width {
                values[y][i] = length as i64;
            }
        }
    }

    for x in 0..width {
        let mut length = 0usize;
        for y in 0..height {
            if mask.value(x, y) {
                length += 1;
            } else if length > 0 {
                for i in y - length..y {
                    if values[i][x] < length as i64 {
                        values[i][x] = -(length as i64);
                    }
                }
                length = 0;
            }
        }
        if length > 0 {
            for i in height - length..height {
                if values[i][x] < length as i64 {
                    values[i][x] = -(length as i64);
                }
            }
        }
    }

    values
}

/// Flood-fill one connected component of `mask` starting at `(x, y)`,
/// assigning `value` to every sample reachable while staying within
/// samples whose opening sign matches the start's.
fn flood_fill(
    mask: &Mask,
    output: &mut SegmentedImage,
    openings: &[Vec<i64>],
    start_x: usize,
    start_y: usize,
    value: u32,
) {
    let mut stack = vec![(start_x, start_y)];
    while let Some((x, y)) = stack.pop() {
        output.set_segment_id(x, y, value);
        let z = openings[y][x];
        let same_sign = |other: i64| (other > 0 && z > 0) || (other < 0 && z < 0);

        if x > 0 && output.segment_id(x - 1, y) == 0 && mask.value(x - 1, y) {
            if same_sign(openings[y][x - 1]) {
                stack.push((x - 1, y));
            }
        }
        if x + 1 < mask.width() && output.segment_id(x + 1, y) == 0 && mask.value(x + 1, y) {
            if same_sign(openings[y][x + 1]) {
                stack.push((x + 1, y));
            }
        }
        if y > 0 && output.segment_id(x, y - 1) == 0 && mask.value(x, y - 1) {
            if same_sign(openings[y - 1][x]) {
                stack.push((x, y - 1));
            }
        }
        if y + 1 < mask.height() && output.segment_id(x, y + 1) == 0 && mask.value(x, y + 1) {
            if same_sign(openings[y + 1][x]) {
                stack.push((x, y + 1));
            }
        }
    }
}

/// Segment `mask` into connected components, where two adjacent flagged
/// samples belong to the same segment only if their local horizontal/
/// vertical run-length "opening" has the same sign (both samples sit in a
/// run that is locally wider than tall, or both locally taller than wide).
/// This favors merging along an RFI event's dominant elongation direction
/// over naive 4-connectivity.
pub fn segment_by_max_length(mask: &Mask) -> SegmentedImage {
    let openings = calculate_openings(mask);
    let mut output = SegmentedImage::new(mask.width(), mask.height());
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if mask.value(x, y) && output.segment_id(x, y) == 0 {
                let id = output.allocate_id();
                flood_fill(mask, &mut output, &openings, x, y, id);
            }
        }
    }
    output
}

fn horizontal_run_counts(mask: &Mask) -> Vec<Vec<u32>> {
    let width = mask.width();
    let height = mask.height();
    let mut values = vec![vec![0u32; width]; height];
    for y in 0..height {
        let mut length = 0usize;
        for x in 0..width {
            if mask.value(x, y) {
                length += 1;
            } else if length > 0 {
                for i in x - length..x {
                    values[y][i] = length as u32;
                }
                length = 0;
            }
        }
        if length > 0 {
            for i in width - length..width {
                values[y][i] = length as u32;
            }
        }
    }
    values
}

fn vertical_run_counts(mask: &Mask) -> Vec<Vec<u32>> {
    let width = mask.width();
    let height = mask.height();
    let mut values = vec![vec![0u32; width]; height];
    for x in 0..width {
        let mut length = 0usize;
        for y in 0..height {
            if mask.value(x, y) {
                length += 1;
            } else if length > 0 {
                for i in y - length..y {
                    values[i][x] = length as u32;
                }
                length = 0;
            }
        }
        if length > 0 {
            for i in height - length..height {
                values[i][x] = length as u32;
            }
        }
    }
    values
}

/// Segment `mask` by the ratio of horizontal to vertical run-length
/// density, separating line-like RFI (dominant horizontal or vertical
/// extent) from blob-like RFI. The horizontal and vertical sub-masks are
/// each dilated (by `*_line_enlarging` samples) and scale-invariantly
/// dilated (by `*_density_enlarge_ratio`) before flood-filling, so nearby
/// same-orientation segments merge.
pub fn segment_by_length_ratio(mask: &Mask, params: LengthRatioParams) -> SegmentedImage {
    let mut h_counts = horizontal_run_counts(mask);
    let mut v_counts = vertical_run_counts(mask);

    let mut horizontal_sub = Mask::unflagged(mask.width(), mask.height());
    let mut vertical_sub = Mask::unflagged(mask.width(), mask.height());
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            let v = mask.value(x, y);
            horizontal_sub.set_value(x, y, v && h_counts[y][x] > v_counts[y][x]);
            // The ambiguous case (h == v) is resolved as "neither": the
            // original splits it into a reserved third sub-mask that is
            // never flood-filled from, so it is always false here too.
            vertical_sub.set_value(x, y, v && h_counts[y][x] <= v_counts[y][x]);
        }
    }

    super::dilation::dilate(&mut horizontal_sub, params.h_line_enlarging, 0);
    super::dilation::dilate(&mut vertical_sub, 0, params.v_line_enlarging);
    sir::operate_horizontally(&mut horizontal_sub, params.h_density_enlarge_ratio);
    sir::operate_vertically(&mut vertical_sub, params.v_density_enlarge_ratio);

    h_counts = horizontal_run_counts(&horizontal_sub);
    v_counts = vertical_run_counts(&vertical_sub);

    let mut output = SegmentedImage::new(mask.width(), mask.height());
    for (sub, counts_are_h) in [(&horizontal_sub, true), (&vertical_sub, false)] {
        for y in 0..mask.height() {
            for x in 0..mask.width() {
                if sub.value(x, y) && output.segment_id(x, y) == 0 {
                    let id = output.allocate_id();
                    flood_fill_length_ratio(
                        mask, sub, &mut output, &h_counts, &v_counts, x, y, id, counts_are_h,
                    );
                }
            }
        }
    }
    output
}

#[allow(clippy::too_many_arguments)]
fn flood_fill_length_ratio(
    mask: &Mask,
    sub: &Mask,
    output: &mut SegmentedImage,
    h_counts: &[Vec<u32>],
    v_counts: &[Vec<u32>],
    start_x: usize,
    start_y: usize,
    value: u32,
    counts_are_h: bool,
) {
    let mut visited = vec![false; mask.width() * mask.height()];
    let idx = |x: usize, y: usize| y * mask.width() + x;
    let mut stack = vec![(start_x, start_y)];
    visited[idx(start_x, start_y)] = true;
    while let Some((x, y)) = stack.pop() {
        if mask.value(x, y) {
            if output.segment_id(x, y) == 0 {
                output.set_segment_id(x, y, value);
            } else if !counts_are_h && h_counts[y][x] < v_counts[y][x] {
                output.set_segment_id(x, y, value);
            }
        }
        let mut neighbours = Vec::with_capacity(4);
        if x > 0 {
            neighbours.push((x - 1, y));
        }
        if x + 1 < mask.width() {
            neighbours.push((x + 1, y));
        }
        if y > 0 {
            neighbours.push((x, y - 1));
        }
        if y + 1 < mask.height() {
            neighbours.push((x, y + 1));
        }
        for (nx, ny) in neighbours {
            if !visited[idx(nx, ny)] && sub.value(nx, ny) {
                visited[idx(nx, ny)] = true;
                stack.push((nx, ny));
            }
        }
    }
}

#[derive(Clone, Debug)]
struct SegmentInfo {
    segment: u32,
    top: usize,
    left: usize,
    bottom: usize,
    right: usize,
    count: usize,
    width: usize,
    height: usize,
    y_total: usize,
    marked: bool,
}

impl SegmentInfo {
    fn new(segment: u32, x: usize, y: usize) -> Self {
        Self {
            segment,
            top: y,
            left: x,
            bottom: y + 1,
            right: x + 1,
            count: 0,
            width: 0,
            height: 0,
            y_total: 0,
            marked: false,
        }
    }

    fn add_point(&mut self, x: usize, y: usize) {
        if x < self.left {
            self.left = x;
        }
        if x >= self.right {
            self.right = x + 1;
        }
        if y < self.top {
            self.top = y;
        }
        if y >= self.bottom {
            self.bottom = y + 1;
        }
        self.y_total += y;
        self.count += 1;
    }

    fn horizontal_distance(&self, other: &SegmentInfo) -> i64 {
        if other.left > self.right {
            (other.left - self.right) as i64
        } else if self.left > other.right {
            (self.left - other.right) as i64
        } else {
            0
        }
    }

    fn vertical_distance(&self, other: &SegmentInfo) -> i64 {
        if other.top > self.bottom {
            (other.top - self.bottom) as i64
        } else if self.top > other.bottom {
            (self.top - other.bottom) as i64
        } else {
            0
        }
    }
}

fn segment_map(image: &SegmentedImage) -> HashMap<u32, SegmentInfo> {
    let mut segments: HashMap<u32, SegmentInfo> = HashMap::new();
    for y in 0..image.height() {
        for x in 0..image.width() {
            let id = image.segment_id(x, y);
            if id != 0 {
                segments
                    .entry(id)
                    .or_insert_with(|| SegmentInfo::new(id, x, y))
                    .add_point(x, y);
            }
        }
    }
    for info in segments.values_mut() {
        info.width = info.right - info.left;
        info.height = info.bottom - info.top;
    }
    segments
}

/// Merge segments that plausibly represent one physical RFI event split by
/// the earlier flood-fill pass: either a large blob touching a much
/// smaller, much more elongated noise spur right next to it (likely the
/// same continuous transmitter), or two similarly-shaped segments that
/// share the same channel range and sit close together.
pub fn cluster(image: &mut SegmentedImage) {
    let mut segments = segment_map(image);
    let ids: Vec<u32> = segments.keys().copied().collect();

    for &id1 in &ids {
        for &id2 in &ids {
            if id1 == id2 {
                continue;
            }
            let (info1, info2) = match (segments.get(&id1), segments.get(&id2)) {
                (Some(a), Some(b)) => (a.clone(), b.clone()),
                _ => continue,
            };
            if info1.segment == info2.segment || info1.marked || info2.marked {
                continue;
            }

            let h_dist = info1.horizontal_distance(&info2);
            let v_dist = info1.vertical_distance(&info2);
            let max_dist = h_dist.max(v_dist);
            let min_count = info1.count.min(info2.count) as i64;
            let max_width = info1.width.max(info2.width) as i64;
            let max_height = info1.height.max(info2.height) as i64;
            let min_height = info1.height.min(info2.height) as i64;
            let width_dist = (info1.width as i64 - info2.width as i64).abs();
            let height_dist = (info1.height as i64 - info2.height as i64).abs();
            let y1_mean = info1.y_total as f64 / info1.count as f64;
            let y2_mean = info2.y_total as f64 / info2.count as f64;
            let y_mean_dist = (y1_mean - y2_mean).abs();

            let noise_h1 = max_dist <= 1
                && info2.count as i64 > info1.count as i64 * 20
                && info2.width > info1.width * 8
                && info1.height < 16
                && info1.width < image.width() / 10;
            let noise_h2 = max_dist <= 1
                && info1.count as i64 > info2.count as i64 * 20
                && info1.width > info2.width * 8
                && info2.height < 16
                && info2.width < image.width() / 10;
            let noise_v1 = max_dist <= 1
                && info2.count as i64 > info1.count as i64 * 20
                && info2.height > info1.height * 8
                && info1.height < 16
                && info1.width < image.width() / 10;
            let noise_v2 = max_dist <= 1
                && info1.count as i64 > info2.count as i64 * 20
                && info1.height > info2.height * 8
                && info2.height < 16
                && info2.width < image.width() / 10;

            let shape_match = v_dist == 0
                && (y_mean_dist * 8.0) <= (max_height + min_height) as f64
                && width_dist <= max_width / 4 + 2
                && height_dist <= max_height / 4 + 2
                && max_dist < min_count * 32;

            let should_cluster = noise_h1 || noise_h2 || noise_v1 || noise_v2 || shape_match;
            let remove1 = noise_h1 || noise_v1;
            let remove2 = noise_h2 || noise_v2;

            if should_cluster {
                let old_segment = info2.segment;
                image.merge(old_segment, info1.segment);
                for info in segments.values_mut() {
                    if info.segment == old_segment {
                        info.segment = info1.segment;
                    }
                }
            }
            if remove1 {
                if let Some(i) = segments.get_mut(&id1) {
                    i.marked = true;
                }
            }
            if remove2 {
                if let Some(i) = segments.get_mut(&id2) {
                    i.marked = true;
                }
            }
        }
    }
}

/// Clear every segment with `count <= threshold_level` samples back to
/// unassigned.
pub fn remove_small_segments(image: &mut SegmentedImage, threshold_level: usize) {
    let segments = segment_map(image);
    for info in segments.values() {
        if info.count <= threshold_level {
            image.remove(info.segment);
        }
    }
}

/// Reassign every segment's id to one of the three reserved shape classes:
/// [`LINE_SEGMENT`] for a much-wider-than-tall segment, [`BROADBAND_SEGMENT`]
/// for a much-taller-than-wide one, [`BLOB_SEGMENT`] otherwise.
pub fn classify(image: &mut SegmentedImage) {
    image.reserve_id(BLOB_SEGMENT.max(BROADBAND_SEGMENT).max(LINE_SEGMENT));
    let segments = segment_map(image);
    for info in segments.values() {
        let target = if info.width > info.height * 10 {
            LINE_SEGMENT
        } else if info.height > info.width * 10 {
            BROADBAND_SEGMENT
        } else {
            BLOB_SEGMENT
        };
        image.merge(info.segment, target);
    }
}

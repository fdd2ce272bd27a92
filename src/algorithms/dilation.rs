// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fixed-radius morphological dilation of a flag mask: expand every flagged
//! run by up to `size` samples on either side, in time and/or frequency.

use crate::structures::Mask;

/// Dilate `mask` in place by `time_size` samples horizontally and
/// `frequency_size` samples vertically. Either size may be zero to skip
/// that direction.
pub fn dilate(mask: &mut Mask, time_size: usize, frequency_size: usize) {
    dilate_horizontally(mask, time_size);
    dilate_vertically(mask, frequency_size);
}

/// A single pass over one row: `dist` tracks samples since the last flag
/// seen within the look-ahead window; any sample within `size` of a flagged
/// sample (on either side) is dilated to flagged. Grounded on the
/// distance-counter sweep used for both directions in the original
/// morphological flagger.
pub fn dilate_horizontally(mask: &mut Mask, time_size: usize) {
    if time_size == 0 {
        return;
    }
    let width = mask.width();
    let time_size = time_size.min(width);
    let int_size = time_size as i64;

    for y in 0..mask.height() {
        let mut destination = vec![false; width];
        let mut dist = int_size + 1;
        for x in 0..time_size {
            if mask.value(x, y) {
                dist = -int_size;
            }
            dist += 1;
        }
        for x in 0..width.saturating_sub(time_size) {
            if mask.value(x + time_size, y) {
                dist = -int_size;
            }
            if dist <= int_size {
                destination[x] = true;
                dist += 1;
            }
        }
        for x in width.saturating_sub(time_size)..width {
            if dist <= int_size {
                destination[x] = true;
                dist += 1;
            }
        }
        for x in 0..width {
            mask.set_value(x, y, destination[x]);
        }
    }
}

pub fn dilate_vertically(mask: &mut Mask, frequency_size: usize) {
    if frequency_size == 0 {
        return;
    }
    let height = mask.height();
    let frequency_size = frequency_size.min(height);
    let int_size = frequency_size as i64;

    for x in 0..mask.width() {
        let mut destination = vec![false; height];
        let mut dist = int_size + 1;
        for y in 0..frequency_size {
            if mask.value(x, y) {
                dist = -int_size;
            }
            dist += 1;
        }
        for y in 0..height.saturating_sub(frequency_size) {
            if mask.value(x, y + frequency_size) {
                dist = -int_size;
            }
            if dist <= int_size {
                destination[y] = true;
                dist += 1;
            }
        }
        for y in height.saturating_sub(frequency_size)..height {
            if dist <= int_size {
                destination[y] = true;
                dist += 1;
            }
        }
        for y in 0..height {
            mask.set_value(x, y, destination[y]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_flag_dilates_both_directions_horizontally() {
        let mut mask = Mask::unflagged(9, 1);
        mask.set_value(4, 0, true);
        dilate_horizontally(&mut mask, 2);
        for x in 2..=6 {
            assert!(mask.value(x, 0), "x={x}");
        }
        assert!(!mask.value(1, 0));
        assert!(!mask.value(7, 0));
    }

    #[test]
    fn zero_size_is_a_noop() {
        let mut mask = Mask::unflagged(5, 1);
        mask.set_value(2, 0, true);
        dilate_horizontally(&mut mask, 0);
        assert!(mask.value(2, 0));
        assert!(!mask.value(1, 0));
    }

    #[test]
    fn vertical_dilation_expands_a_column() {
        let mut mask = Mask::unflagged(1, 9);
        mask.set_value(0, 4, true);
        dilate_vertically(&mut mask, 1);
        assert!(mask.value(0, 3));
        assert!(mask.value(0, 4));
        assert!(mask.value(0, 5));
        assert!(!mask.value(0, 2));
    }
}

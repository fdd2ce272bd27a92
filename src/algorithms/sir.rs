// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The scale-invariant rank (SIR) operator: a dilation whose reach scales
//! with the size of the flagged region it is dilating, rather than by a
//! fixed number of samples.
//!
//! For a row of flags treated as a sequence `w(y) = 0` when flagged, `1`
//! otherwise, a sample `y` is flagged by the operator if some subsequence
//! containing `y` has a flagged fraction of at least `eta`. The O(n)
//! algorithm below rewrites this as a maximum-subarray-sum test: map a flag
//! to `eta` and an unflagged sample to `eta - 1`, then `y` is flagged iff
//! the maximum-sum subarray containing `y` is non-negative. Offringa, van de
//! Gronde & Roerdink (2012).

use crate::structures::view::{GridView, GridViewMut, Swapped};

/// Apply the SIR operator to every row of `mask`, in place.
pub fn operate_horizontally<M: GridViewMut<bool>>(mask: &mut M, eta: f32) {
    let width = mask.width();
    if width == 0 {
        return;
    }
    let mut values = vec![0.0f32; width];
    let mut w = vec![0.0f32; width + 1];
    let mut min_indices = vec![0usize; width + 1];
    let mut max_indices = vec![0usize; width + 1];

    for row in 0..mask.height() {
        for i in 0..width {
            values[i] = if mask.value(i, row) { eta } else { eta - 1.0 };
        }
        prefix_min_max(&values, &mut w, &mut min_indices, &mut max_indices);
        for i in 0..width {
            let max_w = w[max_indices[i]] - w[min_indices[i]];
            mask.set_value(i, row, max_w >= 0.0);
        }
    }
}

/// Apply the SIR operator vertically, by running the horizontal kernel over
/// an XY-swapped view.
pub fn operate_vertically<M: GridViewMut<bool>>(mask: &mut M, eta: f32) {
    let mut swapped = Swapped(mask);
    operate_horizontally(&mut swapped, eta);
}

/// The missing-aware horizontal variant: samples where `missing` is set are
/// excluded from the subsequence search entirely (as if the row had been
/// compacted to remove them), and left untouched in `mask` on return.
pub fn operate_horizontally_missing<M: GridViewMut<bool>, Ms: GridView<bool>>(
    mask: &mut M,
    missing: &Ms,
    eta: f32,
) {
    let width = mask.width();
    if width == 0 {
        return;
    }
    let mut values = vec![0.0f32; width];
    let mut w = vec![0.0f32; width + 1];
    let mut min_indices = vec![0usize; width + 1];
    let mut max_indices = vec![0usize; width + 1];

    for row in 0..mask.height() {
        let mut n_available = 0usize;
        for i in 0..width {
            if !missing.value(i, row) {
                values[n_available] = if mask.value(i, row) { eta } else { eta - 1.0 };
                n_available += 1;
            }
        }
        if n_available == 0 {
            continue;
        }
        prefix_min_max(
            &values[..n_available],
            &mut w[..n_available + 1],
            &mut min_indices[..n_available + 1],
            &mut max_indices[..n_available + 1],
        );
        let mut n = 0usize;
        for i in 0..width {
            if !missing.value(i, row) {
                let max_w = w[max_indices[n]] - w[min_indices[n]];
                mask.set_value(i, row, max_w >= 0.0);
                n += 1;
            }
        }
    }
}

pub fn operate_vertically_missing<M: GridViewMut<bool>, Ms: GridView<bool>>(
    mask: &mut M,
    missing: &Ms,
    eta: f32,
) {
    let mut swapped_mask = Swapped(mask);
    let swapped_missing = Swapped(missing);
    operate_horizontally_missing(&mut swapped_mask, &swapped_missing, eta);
}

/// The penalty-weighted missing-aware variant: a missing sample contributes
/// `(eta - 1) * penalty` to the running sum instead of being skipped
/// entirely, letting a run of missing samples count as weak (but not
/// disqualifying) evidence against dilation.
pub fn operate_horizontally_missing_penalty<M: GridViewMut<bool>, Ms: GridView<bool>>(
    mask: &mut M,
    missing: &Ms,
    eta: f32,
    penalty: f32,
) {
    let width = mask.width();
    if width == 0 {
        return;
    }
    let penalty_value = (eta - 1.0) * penalty;
    let mut values = vec![0.0f32; width];
    let mut w = vec![0.0f32; width + 1];
    let mut min_indices = vec![0usize; width + 1];
    let mut max_indices = vec![0usize; width + 1];

    for row in 0..mask.height() {
        for i in 0..width {
            values[i] = if missing.value(i, row) {
                penalty_value
            } else if mask.value(i, row) {
                eta
            } else {
                eta - 1.0
            };
        }
        prefix_min_max(&values, &mut w, &mut min_indices, &mut max_indices);
        for i in 0..width {
            if !missing.value(i, row) {
                let max_w = w[max_indices[i]] - w[min_indices[i]];
                mask.set_value(i, row, max_w >= 0.0);
            }
        }
    }
}

pub fn operate_vertically_missing_penalty<M: GridViewMut<bool>, Ms: GridView<bool>>(
    mask: &mut M,
    missing: &Ms,
    eta: f32,
    penalty: f32,
) {
    let mut swapped_mask = Swapped(mask);
    let swapped_missing = Swapped(missing);
    operate_horizontally_missing_penalty(&mut swapped_mask, &swapped_missing, eta, penalty);
}

/// Shared O(n) core: given `values` of length `n`, fill `w` (length `n+1`,
/// the prefix sums with `w[0] = 0`), `min_indices[i]` (the index of the
/// minimum `w` in `0..=i`) and `max_indices[i]` (the index of the maximum
/// `w` in `i+1..=n`, i.e. strictly after `i`).
fn prefix_min_max(
    values: &[f32],
    w: &mut [f32],
    min_indices: &mut [usize],
    max_indices: &mut [usize],
) {
    let n = values.len();
    w[0] = 0.0;
    min_indices[0] = 0;
    let mut current_min = 0usize;
    for i in 1..=n {
        w[i] = w[i - 1] + values[i - 1];
        if w[i] < w[current_min] {
            current_min = i;
        }
        min_indices[i] = current_min;
    }

    let mut current_max = n;
    for i in (1..n).rev() {
        max_indices[i] = current_max;
        if w[i] > w[current_max] {
            current_max = i;
        }
    }
    if n > 0 {
        max_indices[0] = current_max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::Mask;

    #[test]
    fn small_flagged_run_is_not_dilated_at_low_eta() {
        let mut mask = Mask::unflagged(10, 1);
        mask.set_value(5, 0, true);
        operate_horizontally(&mut mask, 0.2);
        assert!(mask.value(5, 0));
        assert!(!mask.value(4, 0));
        assert!(!mask.value(6, 0));
    }

    #[test]
    fn large_flagged_run_dilates_neighbours() {
        let mut mask = Mask::unflagged(10, 1);
        for x in 3..7 {
            mask.set_value(x, 0, true);
        }
        operate_horizontally(&mut mask, 0.5);
        // A 4-wide flagged run out of 10 should pull in nearby samples.
        assert!(mask.value(2, 0) || mask.value(7, 0));
    }

    #[test]
    fn vertical_matches_transposed_horizontal() {
        let mut a = Mask::unflagged(4, 5);
        a.set_value(1, 2, true);
        let mut b = a.clone();
        operate_vertically(&mut a, 0.3);

        let mut swapped = Swapped(&mut b);
        operate_horizontally(&mut swapped, 0.3);

        for y in 0..5 {
            for x in 0..4 {
                assert_eq!(a.value(x, y), b.value(x, y));
            }
        }
    }

    #[test]
    fn missing_samples_are_excluded_and_untouched() {
        let mut mask = Mask::unflagged(6, 1);
        let mut missing = Mask::unflagged(6, 1);
        missing.set_value(2, 0, true);
        mask.set_value(2, 0, true); // a missing sample's own flag is irrelevant
        for x in [0usize, 1, 3, 4, 5] {
            mask.set_value(x, 0, true);
        }
        operate_horizontally_missing(&mut mask, &missing, 0.9);
        assert!(mask.value(2, 0), "missing sample untouched, stays true here");
        for x in [0usize, 1, 3, 4, 5] {
            assert!(mask.value(x, 0));
        }
    }

    #[test]
    fn zero_width_does_not_panic() {
        let mut mask = Mask::unflagged(0, 3);
        operate_horizontally(&mut mask, 0.5);
    }
}

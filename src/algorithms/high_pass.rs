// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gaussian-weighted sliding-window background fit. Separable in time and
//! frequency: a smooth "background" is estimated by weighted convolution,
//! with flagged samples contributing zero weight, and the residual
//! (`image - background`) is what the next SumThreshold pass sees.

use rayon::prelude::*;

use crate::constants::{
    DEFAULT_HIGH_PASS_SIGMA_SQ_H, DEFAULT_HIGH_PASS_SIGMA_SQ_V, DEFAULT_HIGH_PASS_WINDOW_H,
    DEFAULT_HIGH_PASS_WINDOW_W,
};
use crate::structures::{Image, Mask};

/// Tunables for [`fit_background`].
#[derive(Clone, Copy, Debug)]
pub struct HighPassParams {
    /// Kernel half-extent in the time direction, samples.
    pub window_time: usize,
    /// Kernel half-extent in the frequency direction, samples.
    pub window_frequency: usize,
    /// Gaussian variance, time direction.
    pub sigma_sq_time: f64,
    /// Gaussian variance, frequency direction.
    pub sigma_sq_frequency: f64,
}

impl Default for HighPassParams {
    fn default() -> Self {
        Self {
            window_time: DEFAULT_HIGH_PASS_WINDOW_W,
            window_frequency: DEFAULT_HIGH_PASS_WINDOW_H,
            sigma_sq_time: DEFAULT_HIGH_PASS_SIGMA_SQ_H,
            sigma_sq_frequency: DEFAULT_HIGH_PASS_SIGMA_SQ_V,
        }
    }
}

fn gaussian_kernel(radius: usize, sigma_sq: f64) -> Vec<f64> {
    (0..=2 * radius)
        .map(|i| {
            let d = i as f64 - radius as f64;
            (-d * d / (2.0 * sigma_sq)).exp()
        })
        .collect()
}

/// Produce the smoothed background of `image`, weighted by `1 - mask` (a
/// flagged sample contributes zero weight to every window it falls in).
/// Rows are fit independently and in parallel; the column pass that follows
/// is likewise row-parallel after transposing the intermediate.
pub fn fit_background(image: &Image, mask: &Mask, params: HighPassParams) -> Image {
    let horizontal = convolve_horizontal(
        image,
        mask,
        params.window_time,
        params.sigma_sq_time,
    );
    convolve_vertical(
        &horizontal.0,
        &horizontal.1,
        params.window_frequency,
        params.sigma_sq_frequency,
    )
}

/// Horizontal pass: returns the partially smoothed image together with its
/// effective weight sums (needed so the vertical pass can keep weighting
/// consistently rather than re-deriving it from a binary mask alone).
fn convolve_horizontal(
    image: &Image,
    mask: &Mask,
    radius: usize,
    sigma_sq: f64,
) -> (Image, Image) {
    let width = image.width();
    let height = image.height();
    let kernel = gaussian_kernel(radius, sigma_sq);
    let mut out_values = vec![0.0f32; width * height];
    let mut out_weights = vec![0.0f32; width * height];

    out_values
        .par_chunks_mut(width)
        .zip(out_weights.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (value_row, weight_row))| {
            for x in 0..width {
                let mut sum = 0.0f64;
                let mut weight_sum = 0.0f64;
                let lo = x.saturating_sub(radius);
                let hi = (x + radius).min(width - 1);
                for i in lo..=hi {
                    if mask.value(i, y) {
                        continue;
                    }
                    let k = kernel[(i as i64 - x as i64 + radius as i64) as usize];
                    sum += k * image.value(i, y) as f64;
                    weight_sum += k;
                }
                if weight_sum > 0.0 {
                    value_row[x] = (sum / weight_sum) as f32;
                    weight_row[x] = weight_sum as f32;
                } else {
                    value_row[x] = 0.0;
                    weight_row[x] = 0.0;
                }
            }
        });

    (
        Image::from_vec(width, height, &out_values),
        Image::from_vec(width, height, &out_weights),
    )
}

fn convolve_vertical(
    horizontal_values: &Image,
    horizontal_weights: &Image,
    radius: usize,
    sigma_sq: f64,
) -> Image {
    let width = horizontal_values.width();
    let height = horizontal_values.height();
    let kernel = gaussian_kernel(radius, sigma_sq);
    let mut out = vec![0.0f32; width * height];

    // Column-major chunking keeps each parallel unit independent; transpose
    // back into row-major order once all columns are done.
    let columns: Vec<Vec<f32>> = (0..width)
        .into_par_iter()
        .map(|x| {
            let mut column = vec![0.0f32; height];
            for y in 0..height {
                let mut sum = 0.0f64;
                let mut weight_sum = 0.0f64;
                let lo = y.saturating_sub(radius);
                let hi = (y + radius).min(height - 1);
                for i in lo..=hi {
                    let w = horizontal_weights.value(x, i) as f64;
                    if w == 0.0 {
                        continue;
                    }
                    let k = kernel[(i as i64 - y as i64 + radius as i64) as usize];
                    sum += k * w * horizontal_values.value(x, i) as f64;
                    weight_sum += k * w;
                }
                column[y] = if weight_sum > 0.0 {
                    (sum / weight_sum) as f32
                } else {
                    0.0
                };
            }
            column
        })
        .collect();

    for (x, column) in columns.iter().enumerate() {
        for (y, &v) in column.iter().enumerate() {
            out[y * width + x] = v;
        }
    }
    Image::from_vec(width, height, &out)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Polarization-tagged time/frequency data for a single baseline.

use strum_macros::{Display, EnumIter};

use crate::structures::error::StructuresError;
use crate::structures::image::Image;
use crate::structures::mask::Mask;

/// A single correlation product. The set actually present in a
/// [`TimeFrequencyData`] depends on how the observation was correlated; only
/// `I` is guaranteed to be derivable from any of the others.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Polarisation {
    I,
    XX,
    XY,
    YX,
    YY,
    RR,
    RL,
    LR,
    LL,
}

/// A single complex-valued polarization's real/imaginary image pair.
#[derive(Clone, Debug)]
pub struct ComplexImage {
    pub real: Image,
    pub imag: Image,
}

impl ComplexImage {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            real: Image::zeros(width, height),
            imag: Image::zeros(width, height),
        }
    }

    /// Elementwise amplitude, `sqrt(real^2 + imag^2)`.
    pub fn amplitude(&self) -> Image {
        let mut out = Image::zeros(self.real.width(), self.real.height());
        for y in 0..self.real.height() {
            for x in 0..self.real.width() {
                let r = self.real.value(x, y);
                let i = self.imag.value(x, y);
                out.set_value(x, y, (r * r + i * i).sqrt());
            }
        }
        out
    }
}

/// The time/frequency data and flag mask for one baseline, one or more
/// polarizations. Derived polarizations (e.g. Stokes `I` from `XX`/`YY`) are
/// computed on demand rather than cached, since a strategy typically only
/// ever reads one derived product per run.
#[derive(Clone, Debug)]
pub struct TimeFrequencyData {
    width: usize,
    height: usize,
    polarisations: Vec<(Polarisation, ComplexImage)>,
    mask: Mask,
}

impl TimeFrequencyData {
    /// Construct a bundle from a list of `(polarisation, data)` pairs, all
    /// sharing one flag mask. Returns [`StructuresError::NoPolarizations`]
    /// if `polarisations` is empty, or [`StructuresError::ShapeMismatch`] if
    /// the images disagree in size with each other or with `mask`.
    pub fn new(
        polarisations: Vec<(Polarisation, ComplexImage)>,
        mask: Mask,
    ) -> Result<Self, StructuresError> {
        let (first_pol, first) = polarisations
            .first()
            .ok_or(StructuresError::NoPolarizations)?;
        let width = first.real.width();
        let height = first.real.height();
        let _ = first_pol;
        for (_, image) in &polarisations {
            if image.real.width() != width || image.real.height() != height {
                return Err(StructuresError::ShapeMismatch {
                    expected_width: width,
                    expected_height: height,
                    got_width: image.real.width(),
                    got_height: image.real.height(),
                });
            }
        }
        if mask.width() != width || mask.height() != height {
            return Err(StructuresError::ShapeMismatch {
                expected_width: width,
                expected_height: height,
                got_width: mask.width(),
                got_height: mask.height(),
            });
        }
        Ok(Self {
            width,
            height,
            polarisations,
            mask,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn mask_mut(&mut self) -> &mut Mask {
        &mut self.mask
    }

    pub fn set_mask(&mut self, mask: Mask) {
        self.mask = mask;
    }

    pub fn has_polarisation(&self, pol: Polarisation) -> bool {
        self.raw(pol).is_some()
    }

    fn raw(&self, pol: Polarisation) -> Option<&ComplexImage> {
        self.polarisations
            .iter()
            .find(|(p, _)| *p == pol)
            .map(|(_, image)| image)
    }

    /// Fetch (computing if necessary) the amplitude image for `pol`.
    /// Derives Stokes `I` as `(XX + YY) / 2` when `XX`/`YY` are present but
    /// `I` was not stored directly, and similarly for the circular basis.
    pub fn amplitude(&self, pol: Polarisation) -> Option<Image> {
        if let Some(raw) = self.raw(pol) {
            return Some(raw.amplitude());
        }
        if pol == Polarisation::I {
            if let (Some(xx), Some(yy)) = (self.raw(Polarisation::XX), self.raw(Polarisation::YY))
            {
                return Some(stokes_i(xx, yy));
            }
            if let (Some(rr), Some(ll)) = (self.raw(Polarisation::RR), self.raw(Polarisation::LL))
            {
                return Some(stokes_i(rr, ll));
            }
        }
        None
    }
}

fn stokes_i(a: &ComplexImage, b: &ComplexImage) -> Image {
    let mut out = Image::zeros(a.real.width(), a.real.height());
    for y in 0..a.real.height() {
        for x in 0..a.real.width() {
            let amp_a = (a.real.value(x, y).powi(2) + a.imag.value(x, y).powi(2)).sqrt();
            let amp_b = (b.real.value(x, y).powi(2) + b.imag.value(x, y).powi(2)).sqrt();
            out.set_value(x, y, 0.5 * (amp_a + amp_b));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(width: usize, height: usize, value: f32) -> ComplexImage {
        let mut c = ComplexImage::zeros(width, height);
        for y in 0..height {
            for x in 0..width {
                c.real.set_value(x, y, value);
            }
        }
        c
    }

    #[test]
    fn empty_polarisations_rejected() {
        let err = TimeFrequencyData::new(vec![], Mask::unflagged(1, 1)).unwrap_err();
        assert_eq!(err, StructuresError::NoPolarizations);
    }

    #[test]
    fn derives_stokes_i_from_xx_yy() {
        let data = TimeFrequencyData::new(
            vec![
                (Polarisation::XX, sample(2, 2, 2.0)),
                (Polarisation::YY, sample(2, 2, 4.0)),
            ],
            Mask::unflagged(2, 2),
        )
        .unwrap();
        let amp = data.amplitude(Polarisation::I).unwrap();
        assert_eq!(amp.value(0, 0), 3.0);
    }

    #[test]
    fn shape_mismatch_detected() {
        let err = TimeFrequencyData::new(
            vec![(Polarisation::XX, sample(2, 2, 1.0))],
            Mask::unflagged(3, 3),
        )
        .unwrap_err();
        assert!(matches!(err, StructuresError::ShapeMismatch { .. }));
    }
}

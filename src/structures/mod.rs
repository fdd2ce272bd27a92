// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The data types the detection core reads and produces: images, masks,
//! the view traits that let kernels run on either orientation, segmented
//! images, and per-baseline bundles.

mod baseline;
mod error;
mod image;
mod mask;
mod segmented_image;
mod time_frequency;
mod view;

pub use baseline::{BaselineData, BaselineMetadata};
pub use error::StructuresError;
pub use image::Image;
pub use mask::Mask;
pub use segmented_image::SegmentedImage;
pub use time_frequency::{ComplexImage, Polarisation, TimeFrequencyData};
pub use view::{GridView, GridViewMut, Swapped};

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The numeric kernels the detector composes: SumThreshold, the
//! scale-invariant rank operator, fixed-radius dilation, morphological
//! segmentation, and the Gaussian high-pass background fit.

pub mod dilation;
pub mod high_pass;
pub mod morphology;
pub mod sir;
pub mod sum_threshold;

pub use high_pass::HighPassParams;
pub use morphology::LengthRatioParams;
pub use sum_threshold::MissingAwareMode;

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors loading a [`super::Strategy`] from a TOML file.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("failed to parse strategy file: {0}")]
    Parse(#[from] toml::de::Error),
}

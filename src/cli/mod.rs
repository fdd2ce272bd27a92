// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line argument parsing. `Args` is a thin `clap` front-end;
//! [`Args::load_strategy`] and [`Args::selection`] do the args → params
//! translation the rest of the crate actually runs on, mirroring this
//! codebase's own CLI-struct-to-params-struct split.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;

use crate::error::FlaggerError;
use crate::scheduler::{BaselineClass, Selection};
use crate::strategy::Strategy;

/// Which read strategy hint to pass through to the reader collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadMode {
    Direct,
    Indirect,
    Memory,
    Auto,
}

/// RFI flagging over one or more measurement sets.
#[derive(Parser, Debug)]
#[clap(name = "rfi_flagger", author, version, about)]
pub struct Args {
    /// One or more measurement-set paths to flag.
    #[clap(required = true)]
    pub measurement_sets: Vec<PathBuf>,

    /// Worker thread count. Defaults to the number of available cores.
    #[clap(short = 'j', long, help_heading = "PARALLELISM")]
    pub workers: Option<usize>,

    /// Enable verbose (debug-level) logging.
    #[clap(short, long, help_heading = "USER INTERFACE")]
    pub verbose: bool,

    /// Load a strategy from this TOML file instead of the built-in default.
    #[clap(long, help_heading = "STRATEGY")]
    pub strategy: Option<PathBuf>,

    /// Read visibilities in one contiguous pass, trading memory for I/O
    /// locality.
    #[clap(
        long,
        help_heading = "READER",
        conflicts_with_all = &["indirect_read", "memory_read"]
    )]
    pub direct_read: bool,

    /// Read visibilities baseline-by-baseline, trading I/O locality for
    /// lower peak memory.
    #[clap(
        long,
        help_heading = "READER",
        conflicts_with_all = &["direct_read", "memory_read"]
    )]
    pub indirect_read: bool,

    /// Read the entire measurement set into memory up front.
    #[clap(
        long,
        help_heading = "READER",
        conflicts_with_all = &["direct_read", "indirect_read"]
    )]
    pub memory_read: bool,

    /// Skip measurement sets whose history table records a prior flagging
    /// run.
    #[clap(long, help_heading = "SELECTION")]
    pub skip_flagged: bool,

    /// Request UVW coordinates in the baseline metadata.
    #[clap(long, help_heading = "READER")]
    pub uvw: bool,

    /// Data column name passed to the reader collaborator.
    #[clap(long, default_value = "DATA", help_heading = "READER")]
    pub column: String,

    /// Comma-separated spectral window (band) indices to flag; default is
    /// all bands.
    #[clap(long, use_value_delimiter = true, help_heading = "SELECTION")]
    pub bands: Option<Vec<usize>>,

    /// Comma-separated field (scan) indices to flag; default is all
    /// fields.
    #[clap(long, use_value_delimiter = true, help_heading = "SELECTION")]
    pub fields: Option<Vec<usize>>,

    /// Treat every spectral window as one combined band.
    #[clap(long, help_heading = "READER")]
    pub combine_spws: bool,

    /// Bandpass correction file for the optional calibration step.
    #[clap(long, help_heading = "CALIBRATION")]
    pub bandpass: Option<PathBuf>,
}

impl Args {
    /// The read mode requested on the command line; `Auto` if none of the
    /// exclusive flags were given.
    pub fn read_mode(&self) -> ReadMode {
        if self.direct_read {
            ReadMode::Direct
        } else if self.indirect_read {
            ReadMode::Indirect
        } else if self.memory_read {
            ReadMode::Memory
        } else {
            ReadMode::Auto
        }
    }

    /// The worker count to request, defaulting to the number of available
    /// cores when `-j` was not given.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Load the strategy named by `-strategy`, or [`Strategy::default`] if
    /// none was given.
    pub fn load_strategy(&self) -> Result<Strategy, FlaggerError> {
        match &self.strategy {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(Strategy::from_toml_str(&text)?)
            }
            None => Ok(Strategy::default()),
        }
    }

    /// The scheduler's baseline selection filter for `-bands`/`-fields`.
    /// Antenna class and include/exclude sets are not CLI-exposed in this
    /// rewrite (the base spec's CLI surface has no equivalent flags); they
    /// default to [`BaselineClass::All`] with no antenna restriction.
    pub fn selection(&self) -> Selection {
        Selection {
            class: BaselineClass::All,
            include_antennas: None,
            exclude_antennas: HashSet::new(),
            include_bands: self
                .bands
                .as_ref()
                .map(|bands| bands.iter().copied().collect()),
            include_fields: self
                .fields
                .as_ref()
                .map(|fields| fields.iter().copied().collect()),
        }
    }
}

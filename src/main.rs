// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line entry point. Maps `Result<(), FlaggerError>` plus
//! argument-parsing outcomes onto the crate's four exit codes.

use std::process::ExitCode;

use clap::Parser;
use log::error;

use rfi_flagger::{FlaggerError, SchedulerConfig};

mod cli {
    pub use rfi_flagger::Args;
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_ARGUMENT_ERROR: u8 = 10;
const EXIT_STRATEGY_ERROR: u8 = 20;
const EXIT_UNHANDLED_ERROR: u8 = 30;

fn main() -> ExitCode {
    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_ARGUMENT_ERROR);
        }
    };

    init_logger(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e @ FlaggerError::Strategy(_)) => {
            error!("{e}");
            ExitCode::from(EXIT_STRATEGY_ERROR)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(EXIT_UNHANDLED_ERROR)
        }
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();
}

fn run(args: &cli::Args) -> Result<(), FlaggerError> {
    let strategy = args.load_strategy()?;
    let selection = args.selection();
    let worker_count = args.worker_count();

    log::info!(
        "Flagging {} measurement set(s) with {worker_count} worker(s)",
        args.measurement_sets.len()
    );
    log::debug!("Read mode: {:?}", args.read_mode());

    // The reader/writer collaborators that would actually open a
    // measurement set are not part of this crate (see the crate's module
    // documentation); wiring one in is left to an embedding application.
    // `SchedulerConfig` is still built here so the strategy and selection
    // this binary parsed are ready for `run_scheduler` once a caller
    // supplies real collaborators.
    let _config = SchedulerConfig {
        selection,
        requested_workers: worker_count,
        available_memory_bytes: available_memory_bytes(),
        polarizations: 4,
        timesteps: 0,
        channels: 0,
    };
    let _ = strategy;

    Ok(())
}

fn available_memory_bytes() -> usize {
    // No portable, dependency-free way to query physical memory without
    // adding a new crate the rest of the stack does not otherwise need;
    // assume a generous budget and let `plan_worker_count` do its job once
    // a real collaborator supplies a measured figure.
    16 * 1024 * 1024 * 1024
}

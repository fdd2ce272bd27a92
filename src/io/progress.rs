// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The default [`ProgressListener`](super::ProgressListener), rendering an
//! `indicatif` bar in the same style this codebase uses for its own
//! read/model/write pipeline.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::error;

use crate::io::ProgressListener;

/// A single `indicatif` bar, shown or hidden depending on whether the
/// caller wants a progress display at all (e.g. not a TTY).
pub struct TerminalProgressListener {
    bar: Mutex<Option<ProgressBar>>,
    draw: bool,
}

impl TerminalProgressListener {
    pub fn new(draw_progress_bar: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            draw: draw_progress_bar,
        }
    }
}

impl Default for TerminalProgressListener {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgressListener for TerminalProgressListener {
    fn on_start_task(&self, description: &str) {
        let pb = ProgressBar::with_draw_target(
            Some(0),
            if self.draw {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:17}: [{wide_bar:.blue}] {pos:4}/{len:4} baselines ({elapsed_precise}<{eta_precise})")
                .unwrap()
                .progress_chars("=> "),
        )
        .with_message(description.to_string());
        *self.bar.lock().expect("progress bar mutex poisoned") = Some(pb);
    }

    fn on_progress(&self, done: usize, total: usize) {
        if let Some(pb) = self.bar.lock().expect("progress bar mutex poisoned").as_ref() {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        }
    }

    fn on_finish(&self) {
        if let Some(pb) = self.bar.lock().expect("progress bar mutex poisoned").as_ref() {
            pb.finish();
        }
    }

    fn on_exception(&self, what: &str) {
        error!("scheduler task failed: {what}");
        if let Some(pb) = self.bar.lock().expect("progress bar mutex poisoned").as_ref() {
            pb.abandon();
        }
    }
}

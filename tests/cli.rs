// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Exit-code scenarios for the `rfi_flagger` binary.

use assert_cmd::Command;
use std::io::Write;

/// Scenario 8: a strategy file with a type mismatch is rejected with exit
/// code 20.
#[test]
fn bad_strategy_file_exits_20() {
    let mut strategy_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(strategy_file, "iteration_count = \"two\"").unwrap();

    let mut cmd = Command::cargo_bin("rfi_flagger").unwrap();
    cmd.arg("dummy.ms")
        .arg("--strategy")
        .arg(strategy_file.path())
        .assert()
        .code(20);
}

/// Bad CLI arguments (no measurement set given) are an argument error,
/// exit code 10, before a strategy is ever loaded.
#[test]
fn missing_measurement_set_exits_10() {
    let mut cmd = Command::cargo_bin("rfi_flagger").unwrap();
    cmd.assert().code(10);
}

/// A well-formed invocation with the default strategy exits 0.
#[test]
fn default_strategy_exits_0() {
    let mut cmd = Command::cargo_bin("rfi_flagger").unwrap();
    cmd.arg("dummy.ms").assert().code(0);
}

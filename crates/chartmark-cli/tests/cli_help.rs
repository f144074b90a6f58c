use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    cargo_bin_cmd!("chartmark")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("hydrate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_hydrate_help_shows_overrides() {
    cargo_bin_cmd!("chartmark")
        .args(["hydrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--base-url"))
        .stdout(predicate::str::contains("--width"))
        .stdout(predicate::str::contains("--turn"));
}

#[test]
fn test_unknown_command_fails() {
    cargo_bin_cmd!("chartmark").arg("paint").assert().failure();
}

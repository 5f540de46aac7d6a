use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    cargo_bin_cmd!("revu")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_help_shows_server_url_flag() {
    cargo_bin_cmd!("revu")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--server-url"));
}

#[test]
fn test_version_prints_crate_version() {
    cargo_bin_cmd!("revu")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}

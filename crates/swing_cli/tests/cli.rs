// crates/swing_cli/tests/cli.rs
//
// Black-box runs of the `swingometer` binary against the fixtures directory.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn cmd() -> Command {
    let mut c = Command::cargo_bin("swingometer").expect("binary");
    c.arg("--data").arg(fixture("dataset.json"));
    c
}

fn quiet(c: &mut Command) -> &mut Command {
    c.arg("--params").arg(fixture("params_quiet.json"))
}

#[test]
fn single_election_prints_summary() {
    let mut c = cmd();
    quiet(&mut c)
        .args(["-1", "-t", "55", "-l", "45"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Conservative victory (majority 1)"))
        .stdout(predicate::str::contains("Seats: 2, majority threshold 1"));
}

#[test]
fn regional_targets_split_the_seats() {
    let mut c = cmd();
    quiet(&mut c)
        .args(["-1", "--regional", "-t", "55", "-l", "45", "--regional-targets"])
        .arg(fixture("regional.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Conservative victory (majority 0)"))
        .stdout(predicate::str::contains("Single election (regional swing)"));
}

#[test]
fn montecarlo_json_has_run_record() {
    let mut c = cmd();
    let out = quiet(&mut c)
        .args(["-m", "25", "-t", "55", "-l", "45", "--seed", "0x10", "--render", "json"])
        .output()
        .expect("run");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let v: Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["run"]["engine"], "swingometer");
    assert_eq!(v["run"]["mode"], "monte_carlo");
    assert_eq!(v["run"]["seed"], 16);
    assert_eq!(v["run"]["dataset_sha256"].as_str().map(str::len), Some(64));
    assert_eq!(v["ensemble"]["accepted"], 25);
    assert_eq!(v["ensemble"]["discarded"], 0);
    assert_eq!(v["ensemble"]["parties"][0]["party"], "Conservative");
    assert_eq!(v["ensemble"]["parties"][0]["win"], "100.0%");
    assert_eq!(v["data"]["win_pct"]["Conservative"], 100.0);
}

#[test]
fn report_file_is_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("report.json");
    let mut c = cmd();
    quiet(&mut c)
        .args(["-m", "5", "-t", "55", "-l", "45", "--quiet", "--out"])
        .arg(&path)
        .assert()
        .success();
    let v: Value = serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(v["ensemble"]["requested"], 5);
}

#[test]
fn poll_series_orders_by_date() {
    let mut c = cmd();
    let out = quiet(&mut c)
        .args(["--render", "json", "--polls"])
        .arg(fixture("polls.json"))
        .output()
        .expect("run");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v: Value = serde_json::from_slice(&out.stdout).expect("json");
    let polls = v["polls"]["polls"].as_array().expect("polls");
    assert_eq!(polls.len(), 2);
    assert_eq!(polls[0]["date"], "2015-05-01");
    assert_eq!(polls[0]["leader"], "Conservative");
    assert_eq!(polls[1]["leader"], "Labour");
}

#[test]
fn no_mode_is_a_validation_error() {
    cmd()
        .args(["-t", "55"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--single-election"));
}

#[test]
fn target_over_hundred_percent_is_rejected() {
    cmd().args(["-1", "-t", "80", "-l", "30"]).assert().code(2);
}

#[test]
fn zero_total_dataset_is_rejected() {
    Command::cargo_bin("swingometer")
        .expect("binary")
        .arg("--data")
        .arg(fixture("bad_dataset.json"))
        .args(["-1", "-t", "50"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("total votes is zero"));
}

#[test]
fn unreadable_output_path_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory where the report file should go.
    let out = dir.path().join("taken");
    std::fs::create_dir(&out).expect("mkdir");
    let mut c = cmd();
    quiet(&mut c)
        .args(["-1", "-t", "55", "-l", "45", "--out"])
        .arg(&out)
        .assert()
        .code(4);
}

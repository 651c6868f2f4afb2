#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

#[test]
fn cli_adds_a_weekly_rule() {
    run_cli("weekly payday 2024-01-05 2\nquit\n")
        .success()
        .stdout(str_contains("Rule added with id=1"))
        .stdout(str_contains("payday"));
}

#[test]
fn cli_reports_rule_validation_errors() {
    run_cli("monthly rent 2024-01-01 32\nquit\n")
        .success()
        .stdout(str_contains(
            "day-of-month value 32 out of range (expected 1..=31)",
        ));
}

#[test]
fn cli_delete_command_removes_rule() {
    run_cli("weekly payday 2024-01-05\ndelete 1\nquit\n")
        .success()
        .stdout(str_contains("Rule 1 removed."));
}

#[test]
fn cli_checks_single_dates() {
    run_cli("weekly mondays 2024-01-01\noccurs 1 2024-01-08\noccurs 1 2024-01-09\nquit\n")
        .success()
        .stdout(str_contains("2024-01-08: occurs"))
        .stdout(str_contains("2024-01-09: no occurrence"));
}

#[test]
fn cli_samples_weeks_with_a_limit() {
    run_cli("weekly mondays 2024-01-01\nweeks 1 4\nquit\n")
        .success()
        .stdout(str_contains("2024-01-15"))
        .stdout(str_contains("3 week(s) sampled"));
}

#[test]
fn cli_previews_weekly_load() {
    run_cli("weekly solo 2024-01-01\npreview 1 4\nquit\n")
        .success()
        .stdout(str_contains(
            "Total occurrences: 0 | Total weeks: 3 | Average per week: 0.00",
        ));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "weekly keeper 2024-01-05\nsave json {}\nweekly scratch 2024-02-01\nload json {}\nshow\nquit\n",
        path, path
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(
        output.contains("Loaded from"),
        "expected output to mention load completion"
    );
    assert!(
        output.contains("keeper"),
        "expected persisted rule to remain"
    );
    let after_reload = output.split("Loaded from").last().unwrap_or_default();
    assert!(
        !after_reload.contains("scratch"),
        "temporary rule should not appear after reload:\n{}",
        after_reload
    );
}

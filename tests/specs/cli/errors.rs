//! CLI error-surface specs: diagnostics follow the Error/Cause/Fix shape.

use crate::prelude::*;

#[test]
fn abort_unknown_session_shows_fix() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd.args(["abort", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Error: session not found: 0"));
    assert!(stderr.contains("Fix:"));
}

#[test]
fn abort_deletes_the_session_directory() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");

    let output = cmd.args(["abort", "0"]).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert!(stdout_of(&output).contains("Aborted session 0"));
    assert!(!scope.session_dir("0").exists());
}

#[test]
fn workflow_with_missing_file_fails() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd.args(["workflow", "nope.toml"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn workflow_with_bad_pipe_reference_fails() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    std::fs::write(
        scope.dir.path().join("wf.toml"),
        "name = \"bad\"\n\n[[phase]]\nname = \"one\"\ntask = \"t\"\nchecker = \"true\"\npipe_from = [\"ghost\"]\n",
    )
    .unwrap();

    let output = cmd.args(["workflow", "wf.toml"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("ghost"));
}

#[test]
fn commit_outside_a_session_fails() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd.args(["commit", "tdd"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("CORRAL_SESSION_ID"));
}

#[test]
fn commit_unknown_pattern_lists_known_ones() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");

    let output = cmd
        .env("CORRAL_SESSION_ID", "0")
        .args(["commit", "waterfall"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("tdd"));
}

#[test]
fn commit_and_advance_walk_the_pattern() {
    let scope = Scope::new();
    scope.write_session("0", "running");

    let Some(mut commit) = scope.corral() else { return };
    let output = commit
        .env("CORRAL_SESSION_ID", "0")
        .args(["commit", "tdd"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert!(stdout_of(&output).contains("Committed to tdd"));
    assert_eq!(scope.read_field("0", "pattern_current"), "red");

    let Some(mut advance) = scope.corral() else { return };
    let output = advance.env("CORRAL_SESSION_ID", "0").arg("advance").output().unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Now in green phase"));
    assert_eq!(scope.read_field("0", "pattern_current"), "green");
    assert_eq!(scope.read_field("0", "pattern_completed"), "[\"red\"]");
}

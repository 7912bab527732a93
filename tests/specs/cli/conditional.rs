//! Conditional branching specs: --on-fail / --on-pass gating.
//!
//! Skipped sessions never touch tmux, so these run anywhere.

use crate::prelude::*;

#[test]
fn on_fail_skips_when_dependency_passed() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "done");
    scope.set_next_id(1);

    let output = cmd
        .args(["spawn", "--on-fail", "0", "Fix the build", "--checker", "true"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    let session_id = stdout_of(&output);
    assert_eq!(session_id, "1");
    assert_eq!(scope.read_field(&session_id, "state"), "skipped");
    assert_eq!(scope.read_field(&session_id, "tmux"), "");
    assert_eq!(scope.read_field(&session_id, "depends_on"), "[\"0\"]");
}

#[test]
fn on_fail_runs_when_dependency_failed_needs_tmux() {
    if !tmux_works() {
        return;
    }
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "failed");
    scope.set_next_id(1);

    let output = cmd
        .args(["spawn", "--on-fail", "0", "Fix the build", "--checker", "true"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    let session_id = stdout_of(&output);
    assert_eq!(scope.read_field(&session_id, "state"), "running");
}

#[test]
fn on_pass_skips_when_dependency_failed() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "failed");
    scope.set_next_id(1);

    let output = cmd
        .args(["spawn", "--on-pass", "0", "Deploy", "--checker", "true"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(scope.read_field(&stdout_of(&output), "state"), "skipped");
}

#[test]
fn on_pass_skips_when_dependency_aborted() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "aborted");
    scope.set_next_id(1);

    let output = cmd
        .args(["spawn", "--on-pass", "0", "Deploy", "--checker", "true"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(scope.read_field(&stdout_of(&output), "state"), "skipped");
}

#[test]
fn conditional_gate_resolves_aliases() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "done");
    scope.write_field("0", "alias", "build");
    scope.set_next_id(1);

    let output = cmd
        .args(["spawn", "--on-fail", "build", "Fix", "--checker", "true"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(scope.read_field(&stdout_of(&output), "state"), "skipped");
}

#[test]
fn missing_dependency_fails_with_diagnostic() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd
        .args(["spawn", "--on-fail", "999", "Fix", "--checker", "true"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("--on-fail session '999' not found"));
}

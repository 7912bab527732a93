//! `corral exit` specs.

use crate::prelude::*;

#[test]
fn exit_sets_state_and_reason() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");

    let output = cmd
        .env("CORRAL_SESSION_ID", "0")
        .args(["exit", "Auth module needs event-driven redesign"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(scope.read_field("0", "state"), "exited");
    assert_eq!(
        scope.read_field("0", "exit_reason"),
        "Auth module needs event-driven redesign"
    );
    assert!(stdout_of(&output).contains("Session 0 exited"));
}

#[test]
fn exit_outside_a_session_fails() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd.args(["exit", "reason"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("CORRAL_SESSION_ID not set"));
}

#[test]
fn exit_for_missing_session_fails() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd
        .env("CORRAL_SESSION_ID", "42")
        .args(["exit", "reason"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("session not found"));
}

//! Spawn specs that create real tmux windows.

use crate::prelude::*;

#[test]
fn root_session_ids_are_sequential() {
    if !tmux_works() {
        return;
    }
    let scope = Scope::new();

    let Some(mut first) = scope.corral() else { return };
    let output = first.args(["spawn", "A", "--checker", "true"]).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "0");

    let Some(mut second) = scope.corral() else { return };
    let output = second.args(["spawn", "B", "--checker", "true"]).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "1");
}

#[test]
fn child_sessions_index_under_their_parent() {
    if !tmux_works() {
        return;
    }
    let scope = Scope::new();
    scope.write_session("0", "running");

    let Some(mut first) = scope.corral() else { return };
    first.env("CORRAL_SESSION_ID", "0");
    let output = first.args(["spawn", "child", "--checker", "true"]).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "0.0");

    let Some(mut second) = scope.corral() else { return };
    second.env("CORRAL_SESSION_ID", "0");
    let output = second.args(["spawn", "child", "--checker", "true"]).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "0.1");
}

#[test]
fn spawn_records_the_session_and_contract() {
    if !tmux_works() {
        return;
    }
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd
        .args(["spawn", "Write tests for auth", "--checker", "pytest tests/"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    let id = stdout_of(&output);

    assert_eq!(scope.read_field(&id, "state"), "running");
    assert_eq!(scope.read_field(&id, "task"), "(pending...)");
    assert_eq!(scope.read_field(&id, "tmux"), format!("corral-{}", id));
    assert!(scope.read_field(&id, "contract.md").contains("# Task\nWrite tests for auth"));

    let loop_state: serde_json::Value =
        serde_json::from_str(&scope.read_field(&id, "loop_state.json")).unwrap();
    assert_eq!(loop_state["checker"], "pytest tests/");
    assert_eq!(loop_state["max_iterations"], 3);
    assert_eq!(loop_state["history"], serde_json::json!([]));
}

#[test]
fn alias_conflicts_are_rejected() {
    if !tmux_works() {
        return;
    }
    let scope = Scope::new();
    scope.write_session("0", "running");
    scope.write_field("0", "alias", "auth");
    scope.set_next_id(1);

    let Some(mut cmd) = scope.corral() else { return };
    let output = cmd
        .args(["spawn", "More auth", "--checker", "true", "--id", "auth"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("alias 'auth' is already used by session 0"));
    assert!(stderr.contains("Fix:"));
}

#[test]
fn terminate_when_persists_criteria() {
    if !tmux_works() {
        return;
    }
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd
        .args([
            "spawn",
            "Iterate on tests",
            "--checker",
            "true",
            "--terminate-when",
            "cargo test",
            "--max-iterations",
            "5",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    let id = stdout_of(&output);

    assert_eq!(scope.read_field(&id, "termination_criteria"), "cargo test");
    assert_eq!(scope.read_field(&id, "max_iterations"), "5");
    assert!(scope.read_field(&id, "contract.md").contains("# Termination Criteria"));
}

//! `corral wait` / `corral poll` specs.

use crate::prelude::*;

#[test]
fn poll_lists_all_sessions() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");
    scope.write_session("1", "done");

    let output = cmd.arg("poll").output().unwrap();
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("0\trunning\tBuild"));
    assert!(stdout.contains("1\tdone\tBuild"));
}

#[test]
fn poll_single_session_by_alias() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");
    scope.write_field("0", "alias", "build");

    let output = cmd.args(["poll", "build"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).starts_with("0\trunning"));
}

#[test]
fn poll_unknown_session_fails() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd.args(["poll", "9"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("session not found"));
}

#[test]
fn wait_returns_immediately_for_terminal_sessions() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "done");
    scope.write_session("1", "failed");

    let output = cmd.args(["wait", "0", "1"]).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("0\tdone"));
    assert!(stdout.contains("1\tfailed"));
}

#[test]
fn wait_unblocks_when_state_flips() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");

    let state_path = scope.session_dir("0").join("state");
    let flipper = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(300));
        std::fs::write(state_path, "done").unwrap();
    });

    let output = cmd.args(["wait", "0"]).output().unwrap();
    flipper.join().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert!(stdout_of(&output).contains("0\tdone"));
}

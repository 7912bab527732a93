//! `corral check-termination` specs: exit-code protocol and JSON output.

use crate::prelude::*;

#[test]
fn passing_criteria_recommend_terminate_with_exit_zero() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");
    scope.write_field("0", "termination_criteria", "test -e /");
    scope.write_field("0", "iteration", "1");
    scope.write_field("0", "max_iterations", "5");

    let output = cmd.args(["check-termination", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0), "{}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Recommendation: TERMINATE"));
    assert!(stdout.contains("all criteria passed"));
}

#[test]
fn failing_criteria_recommend_iterate_with_exit_two() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");
    scope.write_field("0", "termination_criteria", "test -e /nonexistent-corral-path");
    scope.write_field("0", "iteration", "1");
    scope.write_field("0", "max_iterations", "5");

    let output = cmd.args(["check-termination", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout_of(&output).contains("Recommendation: ITERATE"));
}

#[test]
fn exhausted_budget_recommends_terminate() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");
    scope.write_field("0", "termination_criteria", "test -e /nonexistent-corral-path");
    scope.write_field("0", "iteration", "5");
    scope.write_field("0", "max_iterations", "5");

    let output = cmd.args(["check-termination", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("max iterations (5) reached"));
}

#[test]
fn increment_bumps_the_iteration_counter() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");
    scope.write_field("0", "termination_criteria", "test -e /");
    scope.write_field("0", "iteration", "1");

    let output = cmd.args(["check-termination", "--increment", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(scope.read_field("0", "iteration"), "2");
}

#[test]
fn json_output_is_structured() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");
    scope.write_field(
        "0",
        "termination_criteria",
        "test -e /\nAll edge cases handled",
    );
    scope.write_field("0", "iteration", "1");
    scope.write_field("0", "max_iterations", "5");

    let output = cmd.args(["check-termination", "--json", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let payload: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(payload["session"], "0");
    assert_eq!(payload["iteration"], 1);
    assert_eq!(payload["max_iterations"], 5);
    assert_eq!(payload["recommend_terminate"], false);
    let checks = payload["checks"].as_array().unwrap();
    assert_eq!(checks.len(), 2);
    assert_eq!(checks[0]["passed"], true);
    assert_eq!(checks[1]["passed"], false);
    assert!(checks[1]["detail"]
        .as_str()
        .unwrap()
        .contains("descriptive criterion"));
}

#[test]
fn missing_criteria_is_an_error() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };
    scope.write_session("0", "running");

    let output = cmd.args(["check-termination", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("--terminate-when"));
}

#[test]
fn unknown_session_is_an_error() {
    let scope = Scope::new();
    let Some(mut cmd) = scope.corral() else { return };

    let output = cmd.args(["check-termination", "9"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    pytest      = { "pytest tests/",            true },
    ruff        = { "ruff check src/",          true },
    cargo       = { "cargo test",               true },
    script      = { "./verify.sh",              true },
    go_tool     = { "go test ./...",            true },
    test_expr   = { "test -e target/out",       true },
    descriptive = { "All edge cases handled",   false },
    prose       = { "User can log in",          false },
)]
fn command_detection(criterion: &str, expected: bool) {
    assert_eq!(is_command(criterion), expected);
}

#[test]
fn detection_is_case_insensitive() {
    assert!(is_command("Pytest tests/"));
}

#[test]
fn summary_lists_checks_and_recommendation() {
    let result = TerminationResult {
        checks: vec![
            TerminationCheck {
                criterion: "cargo test".to_string(),
                passed: true,
                detail: String::new(),
            },
            TerminationCheck {
                criterion: "All edge cases handled".to_string(),
                passed: false,
                detail: "descriptive criterion — cannot be automatically verified".to_string(),
            },
        ],
        iteration: 2,
        max_iterations: 5,
        recommend_terminate: false,
        reason: "criteria not met: All edge cases handled".to_string(),
    };

    let summary = result.summary();
    assert!(summary.contains("Iteration 2/5"));
    assert!(summary.contains("[PASS] cargo test"));
    assert!(summary.contains("[FAIL] All edge cases handled"));
    assert!(summary.contains("descriptive criterion"));
    assert!(summary.contains("Recommendation: ITERATE"));
}

#[test]
fn summary_for_terminate_recommendation() {
    let result = TerminationResult {
        checks: vec![TerminationCheck {
            criterion: "cargo test".to_string(),
            passed: true,
            detail: String::new(),
        }],
        iteration: 1,
        max_iterations: 5,
        recommend_terminate: true,
        reason: "all criteria passed".to_string(),
    };
    assert!(result.summary().contains("Recommendation: TERMINATE — all criteria passed"));
}

#[test]
fn json_roundtrip() {
    let result = TerminationResult {
        checks: vec![TerminationCheck {
            criterion: "pytest".to_string(),
            passed: false,
            detail: "2 failed".to_string(),
        }],
        iteration: 1,
        max_iterations: 3,
        recommend_terminate: false,
        reason: "criteria not met: pytest".to_string(),
    };
    let json = serde_json::to_string(&result).unwrap();
    let back: TerminationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

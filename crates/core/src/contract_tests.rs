// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::verdict::{GateVerdict, Verdict};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// --- ContractSpec ---

#[test]
fn task_only_contract() {
    let contract = ContractSpec::new("Write tests for auth").render();
    assert_eq!(contract, "# Task\nWrite tests for auth");
}

#[test]
fn dependencies_render_wait_command() {
    let spec = ContractSpec {
        depends_on: strings(&["0", "1.2"]),
        ..ContractSpec::new("Synthesize")
    };
    let contract = spec.render();
    assert!(contract.contains("# Dependencies"));
    assert!(contract.contains("corral wait 0 1.2"));
}

#[test]
fn phase_section() {
    let spec = ContractSpec {
        phase: "red".to_string(),
        ..ContractSpec::new("Write failing tests")
    };
    assert!(spec.render().contains("You are in the **red** phase."));
}

#[test]
fn pattern_commitment_lists_phases() {
    let spec = ContractSpec {
        pattern: "tdd".to_string(),
        ..ContractSpec::new("Build it")
    };
    let contract = spec.render();
    assert!(contract.contains("# Pattern Commitment"));
    assert!(contract.contains("**tdd**"));
    assert!(contract.contains("red -> green -> refactor"));
}

#[test]
fn phaseless_pattern_commitment() {
    let spec = ContractSpec {
        pattern: "dag".to_string(),
        ..ContractSpec::new("Build it")
    };
    let contract = spec.render();
    assert!(contract.contains("**dag**"));
    assert!(!contract.contains("Phases:"));
}

#[test]
fn prior_results_joined_with_rules() {
    let spec = ContractSpec {
        prior_results: strings(&["**0**: Found 3 libs.", "**1**: Chose one."]),
        ..ContractSpec::new("Use results")
    };
    let contract = spec.render();
    assert!(contract.contains("# Prior Results"));
    assert!(contract.contains("Found 3 libs."));
    assert!(contract.contains("\n\n---\n\n"));
}

#[test]
fn file_scope_and_verification() {
    let spec = ContractSpec {
        file_scope: strings(&["src/auth/"]),
        verify: strings(&["pytest tests/", "No new warnings"]),
        ..ContractSpec::new("Fix bug")
    };
    let contract = spec.render();
    assert!(contract.contains("# File Scope"));
    assert!(contract.contains("- `src/auth/`"));
    assert!(contract.contains("# Verification"));
    assert!(contract.contains("- pytest tests/"));
}

#[test]
fn termination_section_includes_bound() {
    let spec = ContractSpec {
        termination: strings(&["pytest tests/"]),
        max_iterations: Some(5),
        ..ContractSpec::new("Iterate")
    };
    let contract = spec.render();
    assert!(contract.contains("# Termination Criteria"));
    assert!(contract.contains("(max 5 iterations)"));
    assert!(contract.contains("- pytest tests/"));
}

#[test]
fn sections_are_in_fixed_order() {
    let spec = ContractSpec {
        prompt: "The task".to_string(),
        depends_on: strings(&["0"]),
        phase: "green".to_string(),
        pattern: "tdd".to_string(),
        parent_intent: "Ship the feature".to_string(),
        prior_results: strings(&["**0**: done"]),
        file_scope: strings(&["src/"]),
        verify: strings(&["cargo test"]),
        termination: strings(&["cargo test"]),
        max_iterations: Some(3),
    };
    let contract = spec.render();

    let order = [
        "# Dependencies",
        "# Phase",
        "# Pattern Commitment",
        "# Parent Intent",
        "# Prior Results",
        "# Task",
        "# File Scope",
        "# Verification",
        "# Termination Criteria",
    ];
    let mut last = 0;
    for heading in order {
        let idx = contract.find(heading).unwrap_or_else(|| panic!("missing {}", heading));
        assert!(idx >= last, "{} out of order", heading);
        last = idx;
    }
}

// --- CheckerContract ---

#[test]
fn rubric_contract_with_criteria() {
    let contract = CheckerContract {
        doer_result: "Implemented search feature".to_string(),
        iteration: 0,
        criteria: strings(&["Results are relevant", "Edge cases handled"]),
        nice_to_have: strings(&["Performance is good"]),
        notes: "Uses Elasticsearch".to_string(),
        ..Default::default()
    }
    .render();

    assert!(contract.contains("# Role"));
    assert!(contract.contains("# Must-Have Criteria"));
    assert!(contract.contains("1. Results are relevant"));
    assert!(contract.contains("2. Edge cases handled"));
    assert!(contract.contains("# Nice-to-Have Criteria"));
    assert!(contract.contains("1. Performance is good"));
    assert!(contract.contains("# Notes"));
    assert!(contract.contains("Elasticsearch"));
    assert!(contract.contains("# Doer Output"));
    assert!(contract.contains("# Verdict"));
}

#[test]
fn rubric_contract_includes_gate_results() {
    let contract = CheckerContract {
        doer_result: "Output".to_string(),
        iteration: 1,
        gate_results: vec![
            GateResult {
                command: "pytest tests/".to_string(),
                verdict: GateVerdict::Fail,
                output: "2 tests failed".to_string(),
            },
            GateResult {
                command: "ruff check".to_string(),
                verdict: GateVerdict::Pass,
                output: String::new(),
            },
        ],
        criteria: strings(&["Code is correct"]),
        ..Default::default()
    }
    .render();

    assert!(contract.contains("# Gate Results"));
    assert!(contract.contains("`pytest tests/`"));
    assert!(contract.contains("FAIL"));
    assert!(contract.contains("`ruff check`"));
    assert!(contract.contains("PASS"));
    assert!(contract.contains("## Gate Output"));
    assert!(contract.contains("2 tests failed"));
}

#[test]
fn rubric_contract_without_gates_omits_gate_section() {
    let contract = CheckerContract {
        doer_result: "Output".to_string(),
        criteria: strings(&["Code works"]),
        ..Default::default()
    }
    .render();
    assert!(!contract.contains("# Gate Results"));
    assert!(contract.contains("# Must-Have Criteria"));
}

#[test]
fn criteria_only_contract_omits_nice_to_have() {
    let contract = CheckerContract {
        doer_result: "Output".to_string(),
        criteria: strings(&["Criterion 1"]),
        ..Default::default()
    }
    .render();
    assert!(contract.contains("# Must-Have Criteria"));
    assert!(!contract.contains("# Nice-to-Have"));
}

#[test]
fn nice_to_have_only_contract() {
    let contract = CheckerContract {
        doer_result: "Output".to_string(),
        nice_to_have: strings(&["Good style"]),
        ..Default::default()
    }
    .render();
    assert!(contract.contains("# Nice-to-Have Criteria"));
    assert!(!contract.contains("# Must-Have"));
}

#[test]
fn legacy_contract_keeps_checker_criteria_section() {
    let contract = CheckerContract {
        checker_prompt: "Verify the code is correct".to_string(),
        doer_result: "I wrote a hello world function.".to_string(),
        ..Default::default()
    }
    .render();

    assert!(contract.contains("# Role"));
    assert!(contract.contains("# Checker Criteria"));
    assert!(contract.contains("Verify the code is correct"));
    assert!(contract.contains("# Doer Output"));
    assert!(!contract.contains("# Must-Have Criteria"));
    assert!(!contract.contains("# Verdict"));
}

#[test]
fn contract_includes_history() {
    let contract = CheckerContract {
        doer_result: "Output".to_string(),
        iteration: 1,
        history: vec![IterationRecord {
            iteration: 0,
            doer_session: "0".to_string(),
            checker_session: None,
            verdict: Verdict::Retry,
            feedback: "Failed tests".to_string(),
            gates: None,
            criteria_summary: None,
            rubric_hash: None,
        }],
        criteria: strings(&["Tests pass"]),
        ..Default::default()
    }
    .render();

    assert!(contract.contains("# Prior Iterations"));
    assert!(contract.contains("Iteration 0"));
    assert!(contract.contains("RETRY"));
}

#[test]
fn checker_sections_are_in_fixed_order() {
    let contract = CheckerContract {
        doer_result: "Output".to_string(),
        iteration: 1,
        history: vec![IterationRecord {
            iteration: 0,
            doer_session: "0".to_string(),
            checker_session: None,
            verdict: Verdict::Retry,
            feedback: "Fix it".to_string(),
            gates: None,
            criteria_summary: None,
            rubric_hash: None,
        }],
        gate_results: vec![GateResult {
            command: "pytest".to_string(),
            verdict: GateVerdict::Pass,
            output: "ok".to_string(),
        }],
        criteria: strings(&["Code works"]),
        nice_to_have: strings(&["Good style"]),
        notes: "Context here".to_string(),
        ..Default::default()
    }
    .render();

    let order = [
        "# Role",
        "# Gate Results",
        "# Must-Have Criteria",
        "# Nice-to-Have Criteria",
        "# Notes",
        "# Doer Output",
        "# Iteration",
        "# Prior Iterations",
        "# Verdict",
    ];
    let mut last = 0;
    for heading in order {
        let idx = contract.find(heading).unwrap_or_else(|| panic!("missing {}", heading));
        assert!(idx >= last, "{} out of order", heading);
        last = idx;
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract generation.
//!
//! Contracts are the markdown prompts delivered to freshly spawned agents.
//! Section order is user-visible and must stay bit-stable:
//! Dependencies, Phase, Pattern Commitment, Parent Intent, Prior Results,
//! Task, File Scope, Verification, Termination Criteria.

use crate::loop_state::IterationRecord;
use crate::pattern::pattern_phases;
use crate::verdict::GateResult;

/// Inputs for a doer contract. Empty fields omit their section.
#[derive(Debug, Clone, Default)]
pub struct ContractSpec {
    pub prompt: String,
    pub depends_on: Vec<String>,
    pub phase: String,
    pub pattern: String,
    pub parent_intent: String,
    pub prior_results: Vec<String>,
    pub file_scope: Vec<String>,
    pub verify: Vec<String>,
    pub termination: Vec<String>,
    pub max_iterations: Option<u32>,
}

impl ContractSpec {
    pub fn new(prompt: impl Into<String>) -> Self {
        ContractSpec {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Render the contract markdown.
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        if !self.depends_on.is_empty() {
            let deps = self.depends_on.join(" ");
            sections.push(format!(
                "# Dependencies\n\n\
                 Before starting, wait for your dependencies to complete:\n\
                 ```bash\ncorral wait {}\n```\n\n\
                 Use the results from these sessions to inform your work.",
                deps
            ));
        }

        if !self.phase.is_empty() {
            sections.push(format!("# Phase\n\nYou are in the **{}** phase.", self.phase));
        }

        if !self.pattern.is_empty() {
            sections.push(render_pattern_commitment(&self.pattern));
        }

        if !self.parent_intent.is_empty() {
            sections.push(format!("# Parent Intent\n\n{}", self.parent_intent));
        }

        if !self.prior_results.is_empty() {
            let body = self.prior_results.join("\n\n---\n\n");
            sections.push(format!("# Prior Results\n\n{}", body));
        }

        sections.push(format!("# Task\n{}", self.prompt));

        if !self.file_scope.is_empty() {
            let constraints = bulleted_code(&self.file_scope);
            sections.push(format!(
                "# File Scope\n\nOnly modify files within the following paths:\n{}",
                constraints
            ));
        }

        if !self.verify.is_empty() {
            let checks = bulleted(&self.verify);
            sections.push(format!(
                "# Verification\n\nYour output will be verified against these criteria:\n{}",
                checks
            ));
        }

        if !self.termination.is_empty() {
            let criteria = bulleted(&self.termination);
            let bound = self
                .max_iterations
                .map(|n| format!(" (max {} iterations)", n))
                .unwrap_or_default();
            sections.push(format!(
                "# Termination Criteria\n\n\
                 This session is part of a feedback loop{}. \
                 The loop completes when:\n{}\n\n\
                 After each iteration, these criteria will be checked and the orchestrator \
                 will receive a recommendation to terminate or continue.",
                bound, criteria
            ));
        }

        sections.join("\n\n")
    }
}

fn render_pattern_commitment(pattern: &str) -> String {
    let phases = pattern_phases(pattern).unwrap_or(&[]);
    if phases.is_empty() {
        format!(
            "# Pattern Commitment\n\n\
             You are committed to the **{}** pattern.\n\n\
             Follow this pattern's workflow. If you need to deviate, \
             you MUST explicitly state why before doing so. Drift must be conscious, not accidental.",
            pattern
        )
    } else {
        format!(
            "# Pattern Commitment\n\n\
             You are committed to the **{}** pattern.\n\n\
             Phases: {}\n\n\
             Follow this pattern's phases in order. If you need to deviate, \
             you MUST explicitly state why before doing so. Drift must be conscious, not accidental.",
            pattern,
            phases.join(" -> ")
        )
    }
}

/// Inputs for a checker contract.
///
/// Legacy mode (`checker_prompt` set, no criteria) renders a
/// `# Checker Criteria` section; rubric mode renders numbered must-have /
/// nice-to-have lists plus gate results and an explicit `# Verdict`
/// section.
#[derive(Debug, Clone, Default)]
pub struct CheckerContract {
    pub checker_prompt: String,
    pub doer_result: String,
    pub iteration: u32,
    pub history: Vec<IterationRecord>,
    pub gate_results: Vec<GateResult>,
    pub criteria: Vec<String>,
    pub nice_to_have: Vec<String>,
    pub notes: String,
}

impl CheckerContract {
    fn is_rubric_mode(&self) -> bool {
        !self.criteria.is_empty() || !self.nice_to_have.is_empty()
    }

    /// Render the checker contract markdown.
    ///
    /// Section order: Role, Gate Results, Must-Have Criteria, Nice-to-Have
    /// Criteria, Notes, Doer Output, Iteration, Prior Iterations, Verdict.
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        if self.is_rubric_mode() {
            sections.push(
                "# Role\n\n\
                 You are a checker. Evaluate the doer's output against the criteria below. \
                 Judge only what is listed; do not invent additional requirements."
                    .to_string(),
            );

            if !self.gate_results.is_empty() {
                sections.push(render_gate_results(&self.gate_results));
            }

            if !self.criteria.is_empty() {
                sections.push(format!(
                    "# Must-Have Criteria\n\n\
                     Every item must pass for the output to be accepted.\n\n{}",
                    numbered(&self.criteria)
                ));
            }

            if !self.nice_to_have.is_empty() {
                sections.push(format!(
                    "# Nice-to-Have Criteria\n\n\
                     Advisory only; note failures as feedback but do not reject for them.\n\n{}",
                    numbered(&self.nice_to_have)
                ));
            }

            if !self.notes.is_empty() {
                sections.push(format!("# Notes\n\n{}", self.notes));
            }
        } else {
            sections.push(
                "# Role\n\n\
                 You are a checker. Review the doer's output against the criteria below \
                 and end your response with a single verdict word: ACCEPT, RETRY, or TERMINATE."
                    .to_string(),
            );
            if !self.checker_prompt.is_empty() {
                sections.push(format!("# Checker Criteria\n\n{}", self.checker_prompt));
            }
        }

        sections.push(format!("# Doer Output\n\n{}", self.doer_result));
        sections.push(format!("# Iteration\n\nThis is iteration {}.", self.iteration));

        if !self.history.is_empty() {
            sections.push(render_prior_iterations(&self.history));
        }

        if self.is_rubric_mode() {
            sections.push(
                "# Verdict\n\n\
                 For each Must-Have criterion, output a numbered line ending in PASS or FAIL. \
                 Do the same for Nice-to-Have criteria. Then end your response with exactly one \
                 verdict word on its own line:\n\n\
                 - ACCEPT — all must-have criteria pass\n\
                 - RETRY — fixable problems remain; explain what to fix\n\
                 - TERMINATE — the task cannot succeed as specified; explain why"
                    .to_string(),
            );
        }

        sections.join("\n\n")
    }
}

fn render_gate_results(gates: &[GateResult]) -> String {
    let mut lines = vec!["# Gate Results".to_string(), String::new()];
    for gate in gates {
        let status = if gate.passed() { "PASS" } else { "FAIL" };
        lines.push(format!("- `{}`: {}", gate.command, status));
    }
    for gate in gates {
        if gate.output.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("## Gate Output: `{}`", gate.command));
        lines.push(String::new());
        lines.push(clip(&gate.output, 1000).to_string());
    }
    lines.join("\n")
}

fn render_prior_iterations(history: &[IterationRecord]) -> String {
    let mut lines = vec!["# Prior Iterations".to_string()];
    for entry in history {
        lines.push(String::new());
        lines.push(format!(
            "Iteration {} — {}: {}",
            entry.iteration,
            entry.verdict.as_str().to_uppercase(),
            clip(&entry.feedback, 500)
        ));
    }
    lines.join("\n")
}

fn bulleted(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bulleted_code(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- `{}`", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
#[path = "contract_tests.rs"]
mod tests;

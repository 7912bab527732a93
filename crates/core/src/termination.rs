// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination-criteria types.
//!
//! Criteria are either shell commands (auto-verified by the engine) or
//! descriptive prose (reported, never auto-verified). The orchestrator
//! retains authority to override recommendations; these are signals, not
//! enforcement.

use serde::{Deserialize, Serialize};

/// Result of checking a single criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationCheck {
    pub criterion: String,
    pub passed: bool,
    #[serde(default)]
    pub detail: String,
}

/// Result of evaluating all termination criteria for an iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationResult {
    pub checks: Vec<TerminationCheck>,
    pub iteration: u32,
    pub max_iterations: u32,
    pub recommend_terminate: bool,
    pub reason: String,
}

impl TerminationResult {
    /// Human-readable summary of the evaluation.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("Iteration {}/{}", self.iteration, self.max_iterations), String::new()];

        for check in &self.checks {
            let status = if check.passed { "PASS" } else { "FAIL" };
            let mut line = format!("  [{}] {}", status, check.criterion);
            if !check.detail.is_empty() {
                line.push_str(&format!(" — {}", check.detail));
            }
            parts.push(line);
        }

        parts.push(String::new());
        let recommendation = if self.recommend_terminate { "TERMINATE" } else { "ITERATE" };
        parts.push(format!("Recommendation: {} — {}", recommendation, self.reason));

        parts.join("\n")
    }
}

/// Heuristic: does this criterion look like a shell command?
pub fn is_command(criterion: &str) -> bool {
    const COMMAND_INDICATORS: &[&str] = &[
        "pytest", "ruff", "mypy", "black", "cargo", "npm", "make", "go ", "python", "node",
        "bash", "sh ", "test ", "./",
    ];
    let lower = criterion.trim().to_lowercase();
    COMMAND_INDICATORS.iter().any(|prefix| lower.starts_with(prefix))
}

#[cfg(test)]
#[path = "termination_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checker verdicts and verdict parsing.

use serde::{Deserialize, Serialize};

/// Per-iteration verdict rendered by a checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accept,
    Retry,
    Terminate,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Accept => "accept",
            Verdict::Retry => "retry",
            Verdict::Terminate => "terminate",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail outcome of a single gate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateVerdict {
    Pass,
    Fail,
}

/// Result of running one gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub command: String,
    pub verdict: GateVerdict,
    pub output: String,
}

impl GateResult {
    pub fn passed(&self) -> bool {
        self.verdict == GateVerdict::Pass
    }
}

/// Parse a verdict from an agent checker's response.
///
/// Scans from the last line to the first; the first line containing a
/// verdict token wins. When multiple tokens share a line the priority is
/// `TERMINATE > ACCEPT > RETRY`. A missing verdict defaults to retry. The
/// feedback is always the full response text.
pub fn parse_verdict(response: &str) -> (Verdict, String) {
    for line in response.trim().lines().rev() {
        let upper = line.to_uppercase();
        if upper.contains("TERMINATE") {
            return (Verdict::Terminate, response.to_string());
        }
        if upper.contains("ACCEPT") {
            return (Verdict::Accept, response.to_string());
        }
        if upper.contains("RETRY") {
            return (Verdict::Retry, response.to_string());
        }
    }
    (Verdict::Retry, response.to_string())
}

/// Parse per-criterion PASS/FAIL counts from an agent checker response.
///
/// Best effort: scans numbered items under the Must-Have and Nice-to-Have
/// headings and returns a summary like `"2/3 must  1/2 nice"`. Falls back
/// to the provided counts when no numbered items are found, and to an
/// empty string when there is nothing to report.
pub fn parse_criteria_summary(response: &str, num_criteria: usize, num_nice: usize) -> String {
    #[derive(PartialEq)]
    enum Block {
        None,
        Must,
        Nice,
    }

    let mut block = Block::None;
    let mut must_count = 0usize;
    let mut must_pass = 0usize;
    let mut nice_count = 0usize;
    let mut nice_pass = 0usize;

    for line in response.lines() {
        let trimmed = line.trim();
        let upper = trimmed.to_uppercase();
        if upper.contains("MUST-HAVE") || upper.contains("MUST HAVE") {
            block = Block::Must;
            continue;
        }
        if upper.contains("NICE-TO-HAVE") || upper.contains("NICE TO HAVE") {
            block = Block::Nice;
            continue;
        }
        if upper.starts_with('#') {
            block = Block::None;
            continue;
        }

        if !is_numbered_item(trimmed) {
            continue;
        }
        let passed = upper.contains("PASS");
        match block {
            Block::Must => {
                must_count += 1;
                if passed {
                    must_pass += 1;
                }
            }
            Block::Nice => {
                nice_count += 1;
                if passed {
                    nice_pass += 1;
                }
            }
            Block::None => {}
        }
    }

    let total_must = if must_count > 0 { must_count } else { num_criteria };
    let total_nice = if nice_count > 0 { nice_count } else { num_nice };

    let mut parts = Vec::new();
    if total_must > 0 {
        parts.push(format!("{}/{} must", must_pass, total_must));
    }
    if total_nice > 0 {
        parts.push(format!("{}/{} nice", nice_pass, total_nice));
    }
    parts.join("  ")
}

fn is_numbered_item(line: &str) -> bool {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with('.')
}

#[cfg(test)]
#[path = "verdict_tests.rs"]
mod tests;

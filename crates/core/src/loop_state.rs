// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent loop state and loop results.
//!
//! `LoopState` is the `loop_state.json` payload for a session that drives
//! a doer→checker loop. History is append-only and densely indexed: entry
//! `i` records the verdict rendered after doer iteration `i` was checked.

use crate::verdict::{GateResult, Verdict};
use serde::{Deserialize, Serialize};

/// One completed iteration of a doer→checker loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub doer_session: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker_session: Option<String>,
    pub verdict: Verdict,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gates: Option<Vec<GateResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric_hash: Option<String>,
}

/// Loop configuration and history, persisted as `loop_state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopState {
    /// Checker spec as given: shell command, `agent:` prompt, or file path.
    pub checker: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rubric_path: String,
    pub max_iterations: u32,
    /// 0-based index of the last completed iteration.
    pub current_iteration: u32,
    #[serde(default)]
    pub history: Vec<IterationRecord>,
}

impl LoopState {
    /// Fresh state with an empty history.
    pub fn new(checker: impl Into<String>, max_iterations: u32) -> Self {
        LoopState {
            checker: checker.into(),
            rubric_path: String::new(),
            max_iterations,
            current_iteration: 0,
            history: Vec::new(),
        }
    }

    /// Verdict of the last completed iteration, if any.
    pub fn last_verdict(&self) -> Option<Verdict> {
        self.history.last().map(|entry| entry.verdict)
    }
}

/// Final outcome of a loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopVerdict {
    Accept,
    Terminate,
    MaxIterations,
    Exit,
}

impl LoopVerdict {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopVerdict::Accept => "accept",
            LoopVerdict::Terminate => "terminate",
            LoopVerdict::MaxIterations => "max_iterations",
            LoopVerdict::Exit => "exit",
        }
    }
}

impl std::fmt::Display for LoopVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a doer→checker loop execution.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopResult {
    pub session_id: String,
    pub verdict: LoopVerdict,
    pub iterations: u32,
    pub history: Vec<IterationRecord>,
    pub result_text: String,
    pub exit_reason: String,
}

impl LoopResult {
    pub fn new(session_id: impl Into<String>, verdict: LoopVerdict, iterations: u32) -> Self {
        LoopResult {
            session_id: session_id.into(),
            verdict,
            iterations,
            history: Vec::new(),
            result_text: String::new(),
            exit_reason: String::new(),
        }
    }
}

#[cfg(test)]
#[path = "loop_state_tests.rs"]
mod tests;

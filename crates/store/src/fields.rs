// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-field accessors beyond the core session record.
//!
//! These are the single-file reads and writes that the hook handler, loop
//! engine, and termination evaluator use without touching the rest of a
//! session. Writers require the session directory to exist; writing a
//! field for a missing session is an invariant violation, not a create.

use crate::atomic::read_optional;
use crate::error::StoreError;
use crate::store::Store;
use corral_core::loop_state::LoopState;
use corral_core::pattern::PatternState;
use std::fs::OpenOptions;
use std::io::Write;

/// Default termination bound when no `max_iterations` file is present.
pub(crate) const DEFAULT_MAX_ITERATIONS: u32 = 10;

impl Store {
    fn read_session_field(&self, session_id: &str, name: &str) -> Result<Option<String>, StoreError> {
        let path = self.session_dir(session_id).join(name);
        read_optional(&path).map_err(|e| StoreError::io(&path, e))
    }

    fn write_session_field(&self, session_id: &str, name: &str, value: &str) -> Result<(), StoreError> {
        let dir = self.require_dir(session_id)?;
        self.write_field(&dir, name, value)
    }

    // --- result / ready / activity ---

    pub fn save_result(&self, session_id: &str, result: &str) -> Result<(), StoreError> {
        self.write_session_field(session_id, "result", result)
    }

    pub fn load_result(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .read_session_field(session_id, "result")?
            .map(|raw| raw.trim().to_string()))
    }

    /// Create the readiness marker the spawner polls for.
    pub fn mark_ready(&self, session_id: &str) -> Result<(), StoreError> {
        self.write_session_field(session_id, "ready", "")
    }

    pub fn is_ready(&self, session_id: &str) -> bool {
        self.session_dir(session_id).join("ready").exists()
    }

    pub fn save_activity(&self, session_id: &str, activity: &str) -> Result<(), StoreError> {
        self.write_session_field(session_id, "activity", activity)
    }

    pub fn load_activity(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .read_session_field(session_id, "activity")?
            .map(|raw| raw.trim().to_string())
            .filter(|activity| !activity.is_empty()))
    }

    pub fn save_task(&self, session_id: &str, task: &str) -> Result<(), StoreError> {
        self.write_session_field(session_id, "task", task)
    }

    pub fn load_task(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .read_session_field(session_id, "task")?
            .map(|raw| raw.trim().to_string()))
    }

    // --- exit reason / contract ---

    pub fn save_exit_reason(&self, session_id: &str, reason: &str) -> Result<(), StoreError> {
        self.write_session_field(session_id, "exit_reason", reason)
    }

    pub fn load_exit_reason(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .read_session_field(session_id, "exit_reason")?
            .map(|raw| raw.trim().to_string()))
    }

    pub fn save_contract(&self, session_id: &str, contract: &str) -> Result<(), StoreError> {
        self.write_session_field(session_id, "contract.md", contract)
    }

    pub fn load_contract(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        self.read_session_field(session_id, "contract.md")
    }

    // --- trajectory ---

    /// Append one JSON line to the session's trajectory log.
    ///
    /// Plain append, not atomic rename: the hook handler is the single
    /// writer and lines are small enough to land in one write.
    pub fn append_trajectory(&self, session_id: &str, entry: &serde_json::Value) -> Result<(), StoreError> {
        let dir = self.require_dir(session_id)?;
        let path = dir.join("trajectory.jsonl");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{}", line).map_err(|e| StoreError::io(&path, e))
    }

    // --- loop state ---

    pub fn save_loop_state(&self, session_id: &str, state: &LoopState) -> Result<(), StoreError> {
        self.write_session_field(session_id, "loop_state.json", &serde_json::to_string(state)?)
    }

    pub fn load_loop_state(&self, session_id: &str) -> Result<Option<LoopState>, StoreError> {
        match self.read_session_field(session_id, "loop_state.json")? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    // --- termination criteria ---

    pub fn save_termination_criteria(&self, session_id: &str, criteria: &[String]) -> Result<(), StoreError> {
        self.write_session_field(session_id, "termination_criteria", &criteria.join("\n"))
    }

    /// Criteria as lines, or `None` when unset or empty.
    pub fn load_termination_criteria(&self, session_id: &str) -> Result<Option<Vec<String>>, StoreError> {
        let Some(raw) = self.read_session_field(session_id, "termination_criteria")? else {
            return Ok(None);
        };
        let criteria: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok((!criteria.is_empty()).then_some(criteria))
    }

    pub fn save_max_iterations(&self, session_id: &str, max_iterations: u32) -> Result<(), StoreError> {
        self.write_session_field(session_id, "max_iterations", &max_iterations.to_string())
    }

    pub fn load_max_iterations(&self, session_id: &str) -> Result<u32, StoreError> {
        Ok(self
            .read_session_field(session_id, "max_iterations")?
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_ITERATIONS))
    }

    pub fn save_iteration_count(&self, session_id: &str, iteration: u32) -> Result<(), StoreError> {
        self.write_session_field(session_id, "iteration", &iteration.to_string())
    }

    pub fn load_iteration_count(&self, session_id: &str) -> Result<u32, StoreError> {
        Ok(self
            .read_session_field(session_id, "iteration")?
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0))
    }

    // --- pattern commitment ---

    pub fn save_pattern_state(&self, session_id: &str, state: &PatternState) -> Result<(), StoreError> {
        let dir = self.require_dir(session_id)?;
        self.write_field(&dir, "pattern_name", &state.pattern)?;
        self.write_field(&dir, "pattern_phases", &serde_json::to_string(&state.phases)?)?;
        self.write_field(&dir, "pattern_current", &state.current)?;
        self.write_field(&dir, "pattern_completed", &serde_json::to_string(&state.completed)?)
    }

    pub fn load_pattern_state(&self, session_id: &str) -> Result<Option<PatternState>, StoreError> {
        let Some(pattern) = self.read_session_field(session_id, "pattern_name")? else {
            return Ok(None);
        };
        let phases = match self.read_session_field(session_id, "pattern_phases")? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        let completed = match self.read_session_field(session_id, "pattern_completed")? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        let current = self
            .read_session_field(session_id, "pattern_current")?
            .unwrap_or_default();
        Ok(Some(PatternState {
            pattern: pattern.trim().to_string(),
            phases,
            current: current.trim().to_string(),
            completed,
        }))
    }

    /// Advance the committed pattern to its next phase.
    ///
    /// Returns the updated state, or `None` when no pattern is committed
    /// or there is nothing left to advance.
    pub fn advance_pattern(&self, session_id: &str) -> Result<Option<PatternState>, StoreError> {
        let Some(mut state) = self.load_pattern_state(session_id)? else {
            return Ok(None);
        };
        if state.advance().is_none() {
            return Ok(None);
        }
        self.save_pattern_state(session_id, &state)?;
        Ok(Some(state))
    }
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;

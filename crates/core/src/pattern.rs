// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pattern commitment: named multi-phase working patterns a session can
//! commit to (`corral commit tdd`) and advance through (`corral advance`).

/// Phases of a known pattern, or `None` for unknown patterns.
///
/// `dag` is known but has no fixed phases; its phases are task-specific.
pub fn pattern_phases(pattern: &str) -> Option<&'static [&'static str]> {
    let phases: &'static [&'static str] = match pattern {
        "tdd" => &["red", "green", "refactor"],
        "ralph" => &["critique", "improve"],
        "map-reduce" => &["map", "wait", "reduce"],
        "maker-checker" => &["make", "check", "fix"],
        "dag" => &[],
        "rlm" => &["peek", "grep", "dive"],
        _ => return None,
    };
    Some(phases)
}

/// All known pattern names, for diagnostics.
pub fn known_patterns() -> &'static [&'static str] {
    &["tdd", "ralph", "map-reduce", "maker-checker", "dag", "rlm"]
}

/// A session's pattern commitment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternState {
    pub pattern: String,
    pub phases: Vec<String>,
    /// Current phase, empty once all phases are complete (or for patterns
    /// without fixed phases).
    pub current: String,
    pub completed: Vec<String>,
}

impl PatternState {
    /// Commit to a pattern; the current phase starts at the first phase.
    pub fn new(pattern: impl Into<String>, phases: Vec<String>) -> Self {
        let current = phases.first().cloned().unwrap_or_default();
        PatternState {
            pattern: pattern.into(),
            phases,
            current,
            completed: Vec::new(),
        }
    }

    /// Mark the current phase complete and move to the next one.
    ///
    /// Returns the phase that was completed, or `None` when there is no
    /// current phase to advance from. After the final phase, `current`
    /// becomes empty.
    pub fn advance(&mut self) -> Option<String> {
        if self.current.is_empty() {
            return None;
        }
        let finished = std::mem::take(&mut self.current);
        let next = self
            .phases
            .iter()
            .position(|p| *p == finished)
            .and_then(|idx| self.phases.get(idx + 1))
            .cloned()
            .unwrap_or_default();
        self.completed.push(finished.clone());
        self.current = next;
        Some(finished)
    }

    pub fn is_complete(&self) -> bool {
        self.current.is_empty() && !self.completed.is_empty()
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;

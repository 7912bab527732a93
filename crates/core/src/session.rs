// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session record and lifecycle states.
//!
//! A session is one sub-agent running in a tmux window. Sessions form a
//! tree via dotted IDs (`2.1` is a child of `2`); loop children carry an
//! iteration suffix (`2.1-0-do`). See the [`crate::id`] module for the ID
//! algebra.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder task text until the first user prompt is observed.
pub const PENDING_TASK: &str = "(pending...)";

/// Lifecycle state of a session.
///
/// `Running` is the only non-terminal state. The exit hook, the stop hook,
/// and the abort command each flip a running session to exactly one of the
/// terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Running,
    Done,
    Aborted,
    Failed,
    Exited,
    Skipped,
}

/// Error for unrecognized state file contents.
#[derive(Debug, Error)]
#[error("unknown session state: {0}")]
pub struct UnknownState(pub String);

impl SessionState {
    /// Whether this state is terminal (the session will never run again).
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionState::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Running => "running",
            SessionState::Done => "done",
            SessionState::Aborted => "aborted",
            SessionState::Failed => "failed",
            SessionState::Exited => "exited",
            SessionState::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "running" => Ok(SessionState::Running),
            "done" => Ok(SessionState::Done),
            "aborted" => Ok(SessionState::Aborted),
            "failed" => Ok(SessionState::Failed),
            "exited" => Ok(SessionState::Exited),
            "skipped" => Ok(SessionState::Skipped),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

/// A single session record as persisted under `sessions/<id>/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Hierarchical ID: dotted tree segment plus optional iteration suffix.
    pub id: String,
    /// One-line task description.
    pub task: String,
    /// Parent session ID, empty for roots. Equals `parent_of(id)`.
    pub parent: String,
    pub state: SessionState,
    /// tmux window name, empty for sessions that never got a window
    /// (e.g. skipped conditional branches).
    pub tmux_window: String,
    pub created_at: DateTime<Utc>,
    /// Optional human-unique alias.
    #[serde(default)]
    pub alias: String,
    /// Session IDs this session is conditionally gated on.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Session {
    /// A fresh running session with the pending-task placeholder.
    pub fn new(id: impl Into<String>, parent: impl Into<String>, tmux_window: impl Into<String>) -> Self {
        Session {
            id: id.into(),
            task: PENDING_TASK.to_string(),
            parent: parent.into(),
            state: SessionState::Running,
            tmux_window: tmux_window.into(),
            created_at: Utc::now(),
            alias: String::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handlers: agent lifecycle hooks and the tmux pane-died hook.

use corral_core::pattern::PatternState;
use corral_core::session::{SessionState, PENDING_TASK};
use corral_mux::Mux;
use corral_store::{Store, StoreError};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("CORRAL_SESSION_ID not set")]
    MissingSessionId,
    #[error("pane-died hook got no session id")]
    MissingPaneSession,
}

/// SessionStart: create the readiness marker the spawner polls for.
pub fn handle_ready(store: &Store, session_id: &str) -> Result<(), HookError> {
    store.mark_ready(session_id)?;
    Ok(())
}

/// UserPromptSubmit: the first prompt rewrites the pending placeholder
/// into a one-line task description. Later prompts leave it alone.
pub fn handle_task(store: &Store, session_id: &str, payload: &Value) -> Result<(), HookError> {
    let current = store.load_task(session_id)?;
    if current.as_deref() != Some(PENDING_TASK) {
        return Ok(());
    }
    let Some(prompt) = payload.get("prompt").and_then(Value::as_str) else {
        return Ok(());
    };
    let task = one_line(prompt, 80);
    if task.is_empty() {
        return Ok(());
    }
    store.save_task(session_id, &task)?;
    Ok(())
}

/// UserPromptSubmit companion to `handle_task`: re-emit the committed
/// pattern state after every prompt so the agent cannot drift from it
/// silently. Returns `None` (stay quiet) when no pattern is committed.
pub fn handle_pattern_reinject(store: &Store, session_id: &str) -> Result<Option<String>, HookError> {
    let Some(state) = store.load_pattern_state(session_id)? else {
        return Ok(None);
    };
    Ok(Some(render_pattern_state(&state)))
}

fn render_pattern_state(state: &PatternState) -> String {
    let mut lines = vec![format!("[pattern-state] Pattern: {}", state.pattern)];
    if !state.phases.is_empty() {
        lines.push(format!("Phases: {}", state.phases.join(" -> ")));
    }
    if !state.completed.is_empty() {
        lines.push(format!("Completed: {}", state.completed.join(", ")));
    }
    if !state.current.is_empty() {
        lines.push(format!("Next: {}", state.current));
    } else if state.is_complete() {
        lines.push("All phases complete.".to_string());
    }
    lines.push(
        "Stay on the committed pattern. If you must deviate, state why explicitly before doing so."
            .to_string(),
    );
    lines.join("\n")
}

/// PostToolUse: record current activity and append to the trajectory log.
pub fn handle_activity(store: &Store, session_id: &str, payload: &Value) -> Result<(), HookError> {
    let tool = payload
        .get("tool_name")
        .and_then(Value::as_str)
        .unwrap_or("tool");
    let detail = tool_detail(payload.get("tool_input"));

    let activity = if detail.is_empty() {
        tool.to_string()
    } else {
        format!("{}: {}", tool, one_line(&detail, 60))
    };
    store.save_activity(session_id, &activity)?;

    store.append_trajectory(
        session_id,
        &serde_json::json!({
            "ts": chrono::Utc::now().to_rfc3339(),
            "tool": tool,
            "detail": detail,
        }),
    )?;
    Ok(())
}

/// Stop: persist the agent's final message as the result and flip
/// `running` to `done`. A session already terminal is left untouched.
pub fn handle_stop(store: &Store, session_id: &str, payload: &Value) -> Result<(), HookError> {
    if let Some(result) = extract_result(payload) {
        if !result.trim().is_empty() {
            store.save_result(session_id, &result)?;
        }
    }
    if let Some(session) = store.load(session_id)? {
        if session.state == SessionState::Running {
            store.update_state(session_id, SessionState::Done)?;
        }
    }
    Ok(())
}

/// Pane-died: flip a still-running session to a terminal state, exactly
/// once, then kill the lingering pane. A zero exit status means the
/// agent went away without completing (aborted); non-zero means failed.
pub async fn handle_pane_died(
    store: &Store,
    mux: &Mux,
    session_id: &str,
    dead_status: &str,
) -> Result<(), HookError> {
    if session_id.is_empty() {
        return Err(HookError::MissingPaneSession);
    }
    let Some(session) = store.load(session_id)? else {
        // Aborted and already deleted; nothing to record
        return Ok(());
    };

    if !session.is_terminal() {
        let state = match dead_status.trim() {
            "" | "0" => SessionState::Aborted,
            _ => SessionState::Failed,
        };
        store.update_state(session_id, state)?;
        tracing::info!(session_id, state = %state, dead_status, "pane died");
    }

    if !session.tmux_window.is_empty() {
        if let Err(err) = mux.kill_window(&session.tmux_window).await {
            tracing::debug!(error = %err, "could not kill dead pane window");
        }
    }
    Ok(())
}

fn one_line(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    match line.char_indices().nth(max) {
        Some((idx, _)) => line[..idx].to_string(),
        None => line.to_string(),
    }
}

/// Pick the most descriptive field out of a tool-input payload.
fn tool_detail(input: Option<&Value>) -> String {
    let Some(input) = input else {
        return String::new();
    };
    for key in ["file_path", "command", "pattern", "description", "prompt"] {
        if let Some(value) = input.get(key).and_then(Value::as_str) {
            return value.to_string();
        }
    }
    String::new()
}

/// The final assistant message: an inline field when present, otherwise
/// the last assistant entry of the transcript file.
fn extract_result(payload: &Value) -> Option<String> {
    if let Some(text) = payload.get("last_message").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let path = payload.get("transcript_path").and_then(Value::as_str)?;
    let raw = std::fs::read_to_string(path).ok()?;
    for line in raw.lines().rev() {
        let Ok(entry) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if entry.get("type").and_then(Value::as_str) != Some("assistant") {
            continue;
        }
        let content = entry.pointer("/message/content")?;
        let text = match content {
            Value::String(text) => text.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => continue,
        };
        if !text.trim().is_empty() {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tmux window and pane operations.
//!
//! One corral tmux session hosts one window per corral session. Windows
//! keep their pane alive after exit (`remain-on-exit`) so the pane-died
//! hook can still read the `@corral_session_id` pane option before the
//! hook handler kills the window.

use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Payloads above this size are pasted in chunks without submitting,
/// then submitted with a trailing Enter after a dwell.
pub const CONTRACT_CHUNK_SIZE: usize = 2000;

/// tmux window name for a session.
pub fn window_name(session_id: &str) -> String {
    format!("corral-{}", session_id)
}

/// Errors from tmux operations, with actionable remediation text.
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("tmux is not installed")]
    NotInstalled,
    #[error("tmux window '{0}' already exists")]
    WindowExists(String),
    #[error("failed to create tmux window: {0}")]
    WindowCreateFailed(String),
    #[error("tmux send failed: {0}")]
    SendFailed(String),
    #[error("tmux {what} failed: {detail}")]
    CommandFailed { what: String, detail: String },
}

impl MuxError {
    /// Cause and fix lines for the three-line CLI diagnostic.
    pub fn remediation(&self) -> (String, String) {
        match self {
            MuxError::NotInstalled => (
                "tmux is not installed or not on PATH.".to_string(),
                "Install tmux:\n    brew install tmux   # macOS\n    apt install tmux    # Linux".to_string(),
            ),
            MuxError::WindowExists(name) => (
                format!("A window named '{}' already exists.", name),
                "Abort the stale session or pick a different alias.".to_string(),
            ),
            MuxError::WindowCreateFailed(detail) => {
                if detail.to_lowercase().contains("session") {
                    (
                        "The tmux server is not running or is inaccessible.".to_string(),
                        "Start tmux and verify it works:\n    tmux new-session -d -s test && tmux kill-session -t test".to_string(),
                    )
                } else {
                    (
                        "Could not create a tmux window for this session.".to_string(),
                        "Verify tmux is running:\n    tmux list-sessions".to_string(),
                    )
                }
            }
            MuxError::SendFailed(_) => (
                "The tmux window may have closed unexpectedly.".to_string(),
                "Check that the agent binary is installed and working:\n    claude --version".to_string(),
            ),
            MuxError::CommandFailed { .. } => (
                "tmux may not be installed or is not running.".to_string(),
                "Verify tmux is running:\n    tmux list-sessions".to_string(),
            ),
        }
    }
}

/// Handle to one tmux server/session pair.
#[derive(Debug, Clone)]
pub struct Mux {
    socket: Option<String>,
    session: String,
}

impl Mux {
    pub fn new(socket: Option<String>, session: impl Into<String>) -> Mux {
        Mux {
            socket,
            session: session.into(),
        }
    }

    /// Socket and session from `CORRAL_TMUX_SOCKET` / `CORRAL_TMUX_SESSION`.
    pub fn from_env() -> Mux {
        let socket = std::env::var("CORRAL_TMUX_SOCKET")
            .ok()
            .filter(|value| !value.is_empty());
        let session = std::env::var("CORRAL_TMUX_SESSION")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "corral".to_string());
        Mux::new(socket, session)
    }

    pub fn session_name(&self) -> &str {
        &self.session
    }

    pub fn socket(&self) -> Option<&str> {
        self.socket.as_deref()
    }

    /// Whether this process runs inside a tmux client.
    pub fn in_mux() -> bool {
        std::env::var_os("TMUX").is_some()
    }

    /// send-keys target for a window: relative when already inside tmux,
    /// fully qualified otherwise.
    pub fn target_for_window(&self, window: &str) -> String {
        if Mux::in_mux() {
            format!(":{}", window)
        } else {
            format!("{}:{}", self.session, window)
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("tmux");
        if let Some(socket) = &self.socket {
            cmd.arg("-L").arg(socket);
        }
        cmd
    }

    async fn run(&self, args: &[&str], what: &str) -> Result<Output, MuxError> {
        let mut cmd = self.command();
        cmd.args(args);
        run_with_timeout(cmd, TMUX_TIMEOUT, what)
            .await
            .map_err(|detail| {
                if detail.contains("No such file or directory") {
                    MuxError::NotInstalled
                } else {
                    MuxError::CommandFailed {
                        what: what.to_string(),
                        detail,
                    }
                }
            })
    }

    pub async fn has_session(&self) -> Result<bool, MuxError> {
        let output = self
            .run(&["has-session", "-t", &self.session], "has-session")
            .await?;
        Ok(output.status.success())
    }

    pub async fn has_window(&self, window: &str) -> Result<bool, MuxError> {
        let output = self
            .run(
                &["list-windows", "-t", &self.session, "-F", "#{window_name}"],
                "list-windows",
            )
            .await?;
        if !output.status.success() {
            // No session yet means no windows either
            return Ok(false);
        }
        let names = String::from_utf8_lossy(&output.stdout);
        Ok(names.lines().any(|name| name == window))
    }

    /// Create a detached window running `command`.
    ///
    /// Fails with [`MuxError::WindowExists`] when the name is taken;
    /// callers handle collisions by regenerating names.
    pub async fn create_window(
        &self,
        window: &str,
        command: &str,
        cwd: &Path,
        env: &[(String, String)],
    ) -> Result<(), MuxError> {
        if self.has_window(window).await? {
            return Err(MuxError::WindowExists(window.to_string()));
        }

        let cwd_str = cwd.display().to_string();
        let mut args: Vec<String> = if self.has_session().await? {
            vec![
                "new-window".to_string(),
                "-d".to_string(),
                "-t".to_string(),
                format!("{}:", self.session),
            ]
        } else {
            vec![
                "new-session".to_string(),
                "-d".to_string(),
                "-s".to_string(),
                self.session.clone(),
            ]
        };
        args.push("-n".to_string());
        args.push(window.to_string());
        args.push("-c".to_string());
        args.push(cwd_str);
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(command.to_string());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run(&arg_refs, "create-window").await?;
        if !output.status.success() {
            return Err(MuxError::WindowCreateFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        tracing::debug!(window, "created tmux window");
        Ok(())
    }

    pub async fn kill_window(&self, window: &str) -> Result<(), MuxError> {
        let target = format!("{}:{}", self.session, window);
        let output = self.run(&["kill-window", "-t", &target], "kill-window").await?;
        if !output.status.success() {
            return Err(MuxError::CommandFailed {
                what: "kill-window".to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Send text to a pane.
    ///
    /// `submit` appends an Enter keypress; `verify` checks the target
    /// still exists before sending.
    pub async fn send_keys(
        &self,
        target: &str,
        text: &str,
        submit: bool,
        verify: bool,
    ) -> Result<(), MuxError> {
        if verify {
            let output = self.run(&["list-panes", "-t", target], "list-panes").await?;
            if !output.status.success() {
                return Err(MuxError::SendFailed(format!("target '{}' not found", target)));
            }
        }
        if !text.is_empty() {
            let output = self
                .run(&["send-keys", "-t", target, "-l", "--", text], "send-keys")
                .await?;
            if !output.status.success() {
                return Err(MuxError::SendFailed(
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                ));
            }
        }
        if submit {
            let output = self
                .run(&["send-keys", "-t", target, "Enter"], "send-keys")
                .await?;
            if !output.status.success() {
                return Err(MuxError::SendFailed(
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Deliver a payload, chunking large ones.
    ///
    /// Small payloads are sent and submitted in one shot. Large ones are
    /// pasted in chunks without submit, followed by a dwell proportional
    /// to the payload size and a bare Enter, so the receiving client can
    /// finish processing the paste before submission.
    pub async fn send_text(&self, target: &str, payload: &str) -> Result<(), MuxError> {
        if payload.len() <= CONTRACT_CHUNK_SIZE {
            return self.send_keys(target, payload, true, false).await;
        }
        for chunk in chunk_at_char_boundaries(payload, CONTRACT_CHUNK_SIZE) {
            self.send_keys(target, chunk, false, false).await?;
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let dwell = (payload.len() as f64 / 5000.0).clamp(0.2, 2.0);
        tokio::time::sleep(Duration::from_secs_f64(dwell)).await;
        self.send_keys(target, "", true, false).await
    }

    /// Tag a pane with a user option (e.g. the owning session ID).
    pub async fn set_pane_option(&self, target: &str, key: &str, value: &str) -> Result<(), MuxError> {
        let output = self
            .run(&["set-option", "-p", "-t", target, key, value], "set-option")
            .await?;
        if !output.status.success() {
            return Err(MuxError::CommandFailed {
                what: "set-option".to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Whether the window's pane has exited (remain-on-exit keeps it
    /// visible until the hook handler kills it).
    pub async fn is_window_dead(&self, window: &str) -> Result<bool, MuxError> {
        let target = format!("{}:{}", self.session, window);
        let output = self
            .run(&["list-panes", "-t", &target, "-F", "#{pane_dead}"], "list-panes")
            .await?;
        if !output.status.success() {
            // Window is gone entirely
            return Ok(true);
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.trim() == "1"))
    }

    /// Install the global pane-died hook and remain-on-exit.
    ///
    /// Idempotent: setting the same hook twice replaces it.
    pub async fn install_hooks(&self, handler_command: &str) -> Result<(), MuxError> {
        let hook = format!(
            "run-shell \"{} pane-died '#{{@corral_session_id}}' '#{{pane_dead_status}}'\"",
            handler_command
        );
        let output = self
            .run(&["set-hook", "-g", "pane-died", &hook], "set-hook")
            .await?;
        if !output.status.success() {
            return Err(MuxError::CommandFailed {
                what: "set-hook".to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let output = self
            .run(&["set-option", "-g", "remain-on-exit", "on"], "set-option")
            .await?;
        if !output.status.success() {
            return Err(MuxError::CommandFailed {
                what: "set-option".to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Name of the tmux session this process is attached to, if any.
    pub async fn get_current_session(&self) -> Option<String> {
        let output = self
            .run(&["display-message", "-p", "#{session_name}"], "display-message")
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!name.is_empty()).then_some(name)
    }
}

/// Split a payload into chunks of at most `size` bytes, never splitting
/// a UTF-8 character.
fn chunk_at_char_boundaries(payload: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < payload.len() {
        let mut end = (start + size).min(payload.len());
        while !payload.is_char_boundary(end) {
            end -= 1;
        }
        chunks.push(&payload[start..end]);
        start = end;
    }
    chunks
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;

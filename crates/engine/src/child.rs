// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning corral sessions from inside the engine.
//!
//! Retry doers and agent checkers are real corral sessions, spawned
//! through the CLI so each becomes a tmux window the user can inspect
//! and steer. Inner spawns never run their own loop; the outer loop is
//! the verification mechanism.

use crate::error::EngineError;
use corral_mux::subprocess::{run_with_timeout, SPAWN_TIMEOUT};
use std::path::PathBuf;
use tokio::process::Command;

/// Resolve the corral binary: `CORRAL_BIN` override, then this
/// executable (the engine runs inside the corral CLI), then PATH.
pub(crate) fn corral_binary() -> PathBuf {
    if let Ok(bin) = std::env::var("CORRAL_BIN") {
        if !bin.is_empty() {
            return PathBuf::from(bin);
        }
    }
    std::env::current_exe().unwrap_or_else(|_| PathBuf::from("corral"))
}

/// The corral-hook binary is installed next to the corral binary.
pub(crate) fn hook_binary() -> PathBuf {
    let corral = corral_binary();
    match corral.parent() {
        Some(dir) if dir.as_os_str().is_empty() => PathBuf::from("corral-hook"),
        Some(dir) => dir.join("corral-hook"),
        None => PathBuf::from("corral-hook"),
    }
}

/// Spawn a corral session and return its ID.
///
/// The child gets `--checker true` and `CORRAL_SKIP_LOOP=1`.
pub(crate) async fn spawn_session(
    prompt: &str,
    model: &str,
    skip_permissions: bool,
    parent_session_id: &str,
    session_id: &str,
) -> Result<String, EngineError> {
    let mut cmd = Command::new(corral_binary());
    cmd.arg("spawn").arg(prompt);
    if !model.is_empty() {
        cmd.arg("--model").arg(model);
    }
    if skip_permissions {
        cmd.arg("--dangerously-skip-permissions");
    }
    if !session_id.is_empty() {
        cmd.arg("--session-id").arg(session_id);
    }
    cmd.arg("--checker").arg("true");
    if !parent_session_id.is_empty() {
        cmd.env("CORRAL_SESSION_ID", parent_session_id);
    }
    cmd.env("CORRAL_SKIP_LOOP", "1");

    let output = run_with_timeout(cmd, SPAWN_TIMEOUT, "corral spawn")
        .await
        .map_err(EngineError::SpawnFailed)?;
    if !output.status.success() {
        return Err(EngineError::SpawnFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let id = stdout.lines().next().unwrap_or("").trim().to_string();
    if id.is_empty() {
        return Err(EngineError::SpawnFailed(
            "spawn produced no session id".to_string(),
        ));
    }
    Ok(id)
}

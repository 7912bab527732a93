// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Three-line diagnostics (Error / Cause / Fix) for command failures.

use corral_engine::EngineError;
use corral_store::StoreError;
use std::process::ExitCode;

pub fn fail(error: &str, cause: &str, fix: &str) -> ExitCode {
    eprintln!("Error: {}", error);
    if !cause.is_empty() {
        eprintln!("  Cause: {}", cause);
    }
    if !fix.is_empty() {
        eprintln!("  Fix: {}", fix);
    }
    ExitCode::from(1)
}

pub fn not_found(what: &str) -> ExitCode {
    fail(
        &format!("session not found: {}", what),
        "No session with that ID or alias exists in this scope.",
        "List live sessions:\n    corral poll",
    )
}

/// Map an engine error to a diagnostic with remediation.
pub fn engine_error(err: EngineError) -> ExitCode {
    match err {
        EngineError::Mux(mux_err) => {
            let (cause, fix) = mux_err.remediation();
            fail(&format!("tmux operation failed: {}", mux_err), &cause, &fix)
        }
        EngineError::Store(StoreError::AliasConflict { alias, holder }) => fail(
            &format!("alias '{}' is already used by session {}", alias, holder),
            "Session aliases must be unique across all sessions.",
            &format!(
                "Choose a different alias:\n    corral spawn --id {}-2 \"your prompt here\"",
                alias
            ),
        ),
        EngineError::Store(StoreError::NotFound(id)) => not_found(&id),
        EngineError::DependencyNotFound { flag, id } => fail(
            &format!("--{} session '{}' not found", flag, id),
            "Conditional and pipe flags must reference an existing session.",
            "List live sessions:\n    corral poll",
        ),
        EngineError::RubricNotFound(path) => fail(
            &format!("rubric file not found: {}", path.display()),
            "The checker spec points at a rubric file that does not exist.",
            "Create the rubric file or pass a shell/agent checker instead.",
        ),
        other => fail(&other.to_string(), "", ""),
    }
}

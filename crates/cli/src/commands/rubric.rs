// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The rubric command opens a session's rubric in $EDITOR.
//!
//! The rubric file is re-read each iteration, so edits take effect on
//! the next checker run.

use crate::diag;
use anyhow::Result;
use corral_store::Store;
use std::path::Path;
use std::process::ExitCode;

pub fn run(session_id: &str) -> Result<ExitCode> {
    let store = Store::from_env();

    let Some(resolved) = store.resolve_id(session_id)? else {
        return Ok(diag::not_found(session_id));
    };
    let Some(loop_state) = store.load_loop_state(&resolved)? else {
        return Ok(diag::fail(
            &format!("no loop state for session {}", resolved),
            "Only loop sessions have rubrics.",
            "Spawn with a rubric file:\n    corral spawn \"task\" --checker rubric.md",
        ));
    };
    if loop_state.rubric_path.is_empty() {
        return Ok(diag::fail(
            &format!("no rubric file for session {}", resolved),
            "This session uses a command or agent checker, not a rubric file.",
            "Spawn with a rubric file:\n    corral spawn \"task\" --checker rubric.md",
        ));
    }
    if !Path::new(&loop_state.rubric_path).exists() {
        return Ok(diag::fail(
            &format!("rubric file not found: {}", loop_state.rubric_path),
            "The rubric file was moved or deleted after spawn.",
            "Recreate the file, then rerun corral rubric.",
        ));
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = std::process::Command::new(editor)
        .arg(&loop_state.rubric_path)
        .status()?;
    if status.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The commit and advance commands: pattern-commitment lifecycle.
//!
//! Once committed, the pattern-reinject hook re-emits the pattern state
//! after each prompt to prevent drift.

use crate::diag;
use anyhow::Result;
use corral_core::{known_patterns, pattern_phases, PatternState};
use corral_store::{Store, StoreError};
use std::process::ExitCode;

fn current_session() -> Option<String> {
    std::env::var("CORRAL_SESSION_ID")
        .ok()
        .filter(|id| !id.is_empty())
}

pub fn commit(pattern: &str) -> Result<ExitCode> {
    let Some(session_id) = current_session() else {
        return Ok(diag::fail(
            "not in a corral session (CORRAL_SESSION_ID not set)",
            "corral commit must be run from within a corral session.",
            "Use corral spawn to create a session first.",
        ));
    };

    let pattern = pattern.to_lowercase();
    let Some(phases) = pattern_phases(&pattern) else {
        return Ok(diag::fail(
            &format!("unknown pattern '{}'", pattern),
            &format!("Known patterns: {}", known_patterns().join(", ")),
            "Use one of the known patterns:\n    corral commit tdd",
        ));
    };

    let store = Store::from_env();
    let state = PatternState::new(&pattern, phases.iter().map(|p| p.to_string()).collect());
    match store.save_pattern_state(&session_id, &state) {
        Ok(()) => {}
        Err(StoreError::NotFound(_)) => return Ok(diag::not_found(&session_id)),
        Err(err) => return Err(err.into()),
    }

    if phases.is_empty() {
        println!("Committed to {}", pattern);
    } else {
        println!("Committed to {} ({})", pattern, phases.join(" -> "));
    }
    Ok(ExitCode::SUCCESS)
}

pub fn advance() -> Result<ExitCode> {
    let Some(session_id) = current_session() else {
        return Ok(diag::fail(
            "not in a corral session (CORRAL_SESSION_ID not set)",
            "corral advance must be run from within a corral session.",
            "Use corral spawn to create a session first.",
        ));
    };

    let store = Store::from_env();
    let Some(previous) = store.load_pattern_state(&session_id)? else {
        return Ok(diag::fail(
            "no pattern committed for this session",
            "You must commit to a pattern before advancing.",
            "Commit first:\n    corral commit tdd",
        ));
    };

    let Some(updated) = store.advance_pattern(&session_id)? else {
        println!("No more phases to advance to.");
        return Ok(ExitCode::SUCCESS);
    };

    if updated.current.is_empty() {
        println!("All phases complete ({}).", updated.completed.join(", "));
    } else {
        println!(
            "Advanced: completed {}. Now in {} phase.",
            previous.current, updated.current
        );
    }
    Ok(ExitCode::SUCCESS)
}

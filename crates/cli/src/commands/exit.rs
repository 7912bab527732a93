// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The exit command: end the current session with a reason.

use crate::diag;
use anyhow::Result;
use corral_core::session::SessionState;
use corral_store::{Store, StoreError};
use std::process::ExitCode;

pub fn run(reason: &str) -> Result<ExitCode> {
    let Ok(session_id) = std::env::var("CORRAL_SESSION_ID") else {
        return Ok(diag::fail(
            "CORRAL_SESSION_ID not set",
            "corral exit must be run from within a corral session.",
            "Use corral spawn to create a session first.",
        ));
    };
    if session_id.is_empty() {
        return Ok(diag::fail(
            "CORRAL_SESSION_ID not set",
            "corral exit must be run from within a corral session.",
            "Use corral spawn to create a session first.",
        ));
    }

    let store = Store::from_env();
    match store.update_state(&session_id, SessionState::Exited) {
        Ok(()) => {}
        Err(StoreError::NotFound(_)) => return Ok(diag::not_found(&session_id)),
        Err(err) => return Err(err.into()),
    }
    store.save_exit_reason(&session_id, reason)?;

    println!("Session {} exited: {}", session_id, reason);
    Ok(ExitCode::SUCCESS)
}

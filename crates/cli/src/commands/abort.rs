// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The abort command: kill a session's window and delete it.
//!
//! Does not cascade to descendants; callers that want a cascade walk
//! `get_descendants` themselves (deepest first).

use crate::diag;
use anyhow::Result;
use corral_mux::Mux;
use corral_store::{Store, StoreError};
use std::process::ExitCode;

pub async fn run(session_id: &str) -> Result<ExitCode> {
    let store = Store::from_env();
    let mux = Mux::from_env();

    let Some(resolved) = store.resolve_id(session_id)? else {
        return Ok(diag::not_found(session_id));
    };
    let Some(session) = store.load(&resolved)? else {
        return Ok(diag::not_found(session_id));
    };

    if !session.tmux_window.is_empty() {
        match mux.has_window(&session.tmux_window).await {
            Ok(true) => {
                if let Err(err) = mux.kill_window(&session.tmux_window).await {
                    eprintln!("Warning: {}", err);
                }
            }
            Ok(false) => {}
            Err(err) => eprintln!("Warning: {}", err),
        }
    }

    match store.delete(&resolved) {
        Ok(()) | Err(StoreError::NotFound(_)) => {}
        Err(err) => return Err(err.into()),
    }

    println!("Aborted session {}", resolved);
    Ok(ExitCode::SUCCESS)
}

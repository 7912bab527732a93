// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The poll command: non-blocking session status.

use crate::diag;
use anyhow::Result;
use corral_store::Store;
use std::process::ExitCode;

pub fn run(session_id: Option<&str>) -> Result<ExitCode> {
    let store = Store::from_env();

    match session_id {
        Some(id_or_alias) => {
            let Some(id) = store.resolve_id(id_or_alias)? else {
                return Ok(diag::not_found(id_or_alias));
            };
            let Some(session) = store.load(&id)? else {
                return Ok(diag::not_found(id_or_alias));
            };
            println!("{}\t{}\t{}", session.id, session.state, session.task);
        }
        None => {
            for session in store.load_all()? {
                println!("{}\t{}\t{}", session.id, session.state, session.task);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

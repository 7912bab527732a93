// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wait command blocks until sessions are terminal.

use crate::diag;
use anyhow::Result;
use corral_engine::wait_for_sessions;
use corral_store::Store;
use std::process::ExitCode;

pub async fn run(session_ids: &[String]) -> Result<ExitCode> {
    let store = Store::from_env();

    let mut resolved = Vec::with_capacity(session_ids.len());
    for id_or_alias in session_ids {
        match store.resolve_id(id_or_alias)? {
            Some(id) => resolved.push(id),
            None => return Ok(diag::not_found(id_or_alias)),
        }
    }

    wait_for_sessions(&store, &resolved).await.map_err(anyhow::Error::from)?;

    for id in &resolved {
        if let Some(session) = store.load(id)? {
            println!("{}\t{}", id, session.state);
        }
    }
    Ok(ExitCode::SUCCESS)
}

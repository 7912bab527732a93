// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking wait for sessions to reach a terminal state.
//!
//! The primary signal is a filesystem watch on the sessions directory
//! (state transitions are single-file writes); a polling interval backs
//! it up so a missed event can only delay completion, never hang it.

use crate::error::EngineError;
use corral_store::Store;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

const FALLBACK_POLL: Duration = Duration::from_millis(500);

/// Block until every given session is terminal.
///
/// Sessions that do not exist (or get deleted while waiting) count as
/// settled: an aborted session may be gone by the time we look.
pub async fn wait_for_sessions(store: &Store, session_ids: &[String]) -> Result<(), EngineError> {
    let mut pending: HashSet<String> = session_ids.iter().cloned().collect();
    prune_settled(store, &mut pending);
    if pending.is_empty() {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel::<()>(16);
    let watcher = create_fs_watcher(&store.sessions_dir(), tx.clone());
    if watcher.is_none() {
        tracing::warn!("file watcher unavailable, falling back to polling");
    }
    // Keeping a sender alive stops rx from resolving once the watcher is
    // gone; without it a failed watcher would spin the select loop.
    let _tx_guard = tx;

    let mut interval = tokio::time::interval(FALLBACK_POLL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        prune_settled(store, &mut pending);
        if pending.is_empty() {
            return Ok(());
        }
        tokio::select! {
            _ = rx.recv() => {}
            _ = interval.tick() => {}
        }
    }
}

fn prune_settled(store: &Store, pending: &mut HashSet<String>) {
    pending.retain(|id| match store.load(id) {
        Ok(Some(session)) => !session.is_terminal(),
        Ok(None) => false,
        // Transient read failures keep the session pending
        Err(_) => true,
    });
}

fn create_fs_watcher(path: &Path, tx: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if res.is_ok() {
            let _ = tx.try_send(());
        }
    })
    .ok()?;
    watcher.watch(path, RecursiveMode::Recursive).ok()?;
    Some(watcher)
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;

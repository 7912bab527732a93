// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LRU eviction of terminal sessions.
//!
//! A configurable cap bounds the number of session directories. When the
//! cap is exceeded the oldest terminal sessions are deleted, never a
//! running session and never a session with a live descendant. A
//! session's terminal descendants are deleted with it (deepest first) so
//! a child directory never outlives its parent.

use crate::error::StoreError;
use crate::store::Store;
use corral_core::id;
use std::sync::OnceLock;

/// Default cap on total session directories.
pub const DEFAULT_SESSION_CAP: usize = 200;

/// Process-wide session cap, read once from `CORRAL_SESSION_CAP`.
pub fn session_cap() -> usize {
    static CAP: OnceLock<usize> = OnceLock::new();
    *CAP.get_or_init(|| {
        std::env::var("CORRAL_SESSION_CAP")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_SESSION_CAP)
    })
}

impl Store {
    /// Evict oldest terminal sessions while over the configured cap.
    pub fn check_and_evict(&self) -> Result<Vec<String>, StoreError> {
        self.evict_to_cap(session_cap())
    }

    /// Evict oldest terminal sessions while over `cap`. Returns the IDs
    /// deleted, in deletion order.
    pub fn evict_to_cap(&self, cap: usize) -> Result<Vec<String>, StoreError> {
        let sessions = self.load_all()?;
        if sessions.len() <= cap {
            return Ok(Vec::new());
        }

        let mut remaining = sessions.clone();
        let mut evicted = Vec::new();

        // load_all is oldest-first already
        for candidate in &sessions {
            if remaining.len() <= cap {
                break;
            }
            if !candidate.is_terminal() {
                continue;
            }
            if evicted.contains(&candidate.id) {
                continue;
            }
            let has_live_descendant = remaining.iter().any(|other| {
                !other.is_terminal() && id::is_descendant_of(&other.id, &candidate.id)
            });
            if has_live_descendant {
                continue;
            }

            // Terminal descendants go first so no child outlives its parent.
            let mut doomed: Vec<String> = remaining
                .iter()
                .filter(|other| id::is_descendant_of(&other.id, &candidate.id))
                .map(|other| other.id.clone())
                .collect();
            doomed.sort_by_key(|victim| std::cmp::Reverse(id::depth(victim)));
            doomed.push(candidate.id.clone());

            for victim in doomed {
                match self.delete(&victim) {
                    Ok(()) | Err(StoreError::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }
                remaining.retain(|s| s.id != victim);
                tracing::debug!(session_id = %victim, "evicted terminal session");
                evicted.push(victim);
            }
        }

        Ok(evicted)
    }
}

#[cfg(test)]
#[path = "evict_tests.rs"]
mod tests;

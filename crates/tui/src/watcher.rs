// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem refresh feed for the TUI.
//!
//! Watches the sessions directory and coalesces change notifications
//! into a "refresh needed" signal the draw loop polls between frames.
//! When the watcher cannot be created the app falls back to its
//! periodic refresh alone.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc;

pub struct RefreshWatcher {
    _watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<()>,
}

impl RefreshWatcher {
    pub fn new(path: &Path) -> RefreshWatcher {
        let (tx, rx) = mpsc::channel();
        let watcher = create(path, tx);
        if watcher.is_none() {
            tracing::warn!(path = %path.display(), "session watcher unavailable, periodic refresh only");
        }
        RefreshWatcher {
            _watcher: watcher,
            rx,
        }
    }

    /// Drain pending notifications; true when anything changed.
    pub fn should_refresh(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

fn create(path: &Path, tx: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if res.is_ok() {
            let _ = tx.send(());
        }
    })
    .ok()?;
    watcher.watch(path, RecursiveMode::Recursive).ok()?;
    Some(watcher)
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;

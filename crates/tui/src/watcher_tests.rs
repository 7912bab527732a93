// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[test]
fn signals_on_file_changes() {
    let dir = TempDir::new().unwrap();
    let watcher = RefreshWatcher::new(dir.path());

    std::fs::write(dir.path().join("state"), "running").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut refreshed = false;
    while Instant::now() < deadline {
        if watcher.should_refresh() {
            refreshed = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(refreshed);
}

#[test]
fn quiet_directory_does_not_signal() {
    let dir = TempDir::new().unwrap();
    let watcher = RefreshWatcher::new(dir.path());
    std::thread::sleep(Duration::from_millis(100));
    assert!(!watcher.should_refresh());
}

#[test]
fn missing_path_degrades_gracefully() {
    let watcher = RefreshWatcher::new(Path::new("/nonexistent/corral/sessions"));
    assert!(!watcher.should_refresh());
}

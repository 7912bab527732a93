// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replace-style atomic file writes and retrying reads.
//!
//! Atomic rename is the only synchronization primitive in the store: a
//! writer writes a temp sibling and renames it over the destination, so
//! readers see either the old content or the new, never a partial write.
//! Readers may still hit the brief missing-file window between renames of
//! a freshly created field; `read_retry` absorbs it with a single retry.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_millis(10);

/// Write `contents` to `path` via a temp sibling + rename.
///
/// The temp name carries the writer's pid so concurrent writers of the
/// same field never collide on the temp file.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let tmp = dir.join(format!(
        ".{}.{}.tmp",
        name.to_string_lossy(),
        std::process::id()
    ));
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// Read a file that is expected to exist, retrying once on NotFound to
/// tolerate the rename window.
pub fn read_retry(path: &Path) -> io::Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            std::thread::sleep(RETRY_DELAY);
            fs::read_to_string(path)
        }
        Err(err) => Err(err),
    }
}

/// Read a field that may legitimately be absent.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;

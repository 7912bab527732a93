// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session directory layout, ID allocation, and session CRUD.

use crate::atomic::{read_optional, read_retry, write_atomic};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use corral_core::id;
use corral_core::session::{Session, SessionState};
use fs2::FileExt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Attempts at reserving a child ID before giving up.
const CHILD_ID_ATTEMPTS: u32 = 16;

/// Handle to one scope root.
///
/// All methods take `&self`; cross-process coordination happens through
/// the filesystem (atomic renames, plus an exclusive lock for the root
/// `next_id` counter).
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Store {
        Store { root: root.into() }
    }

    /// Project scope root: `$CORRAL_DIR`, or `<cwd>/.corral`.
    pub fn from_env() -> Store {
        if let Ok(dir) = std::env::var("CORRAL_DIR") {
            if !dir.is_empty() {
                return Store::open(dir);
            }
        }
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Store::open(cwd.join(".corral"))
    }

    /// Global scope root (`<home>/.corral`) for cross-project artifacts.
    pub fn global() -> Option<Store> {
        dirs::home_dir().map(|home| Store::open(home.join(".corral")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(session_id)
    }

    /// Idempotent root creation.
    pub fn ensure_scope_dir(&self) -> Result<(), StoreError> {
        let sessions = self.sessions_dir();
        fs::create_dir_all(&sessions).map_err(|e| StoreError::io(&sessions, e))
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.session_dir(session_id).is_dir()
    }

    /// Require a session directory, mapping absence to [`StoreError::NotFound`].
    pub(crate) fn require_dir(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.session_dir(session_id);
        if !dir.is_dir() {
            return Err(StoreError::NotFound(session_id.to_string()));
        }
        Ok(dir)
    }

    /// Allocate the next session ID.
    ///
    /// Roots come from the `next_id` counter file, read-modify-written
    /// under an exclusive file lock so no ID is ever reused. Children
    /// scan existing sibling directories for `max + 1` and reserve the
    /// directory eagerly, retrying on a racy collision.
    pub fn next_id(&self, parent: &str) -> Result<String, StoreError> {
        self.ensure_scope_dir()?;
        if parent.is_empty() {
            self.next_root_id()
        } else {
            self.next_child_id(parent)
        }
    }

    fn next_root_id(&self) -> Result<String, StoreError> {
        let lock_path = self.root.join("next_id.lock");
        let lock = fs::File::create(&lock_path).map_err(|e| StoreError::io(&lock_path, e))?;
        lock.lock_exclusive()
            .map_err(|e| StoreError::io(&lock_path, e))?;

        let counter_path = self.root.join("next_id");
        let current: u64 = match read_optional(&counter_path).map_err(|e| StoreError::io(&counter_path, e))? {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| StoreError::corrupt(&counter_path, format!("{}", e)))?,
            None => 0,
        };
        write_atomic(&counter_path, &(current + 1).to_string())
            .map_err(|e| StoreError::io(&counter_path, e))?;

        let _ = fs2::FileExt::unlock(&lock);
        Ok(current.to_string())
    }

    fn next_child_id(&self, parent: &str) -> Result<String, StoreError> {
        let sessions = self.sessions_dir();
        let prefix = format!("{}.", parent);

        for _ in 0..CHILD_ID_ATTEMPTS {
            let mut max_child: i64 = -1;
            let entries = fs::read_dir(&sessions).map_err(|e| StoreError::io(&sessions, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| StoreError::io(&sessions, e))?;
                let name = entry.file_name();
                let Some(suffix) = name.to_string_lossy().strip_prefix(&prefix).map(str::to_string)
                else {
                    continue;
                };
                // Direct children only: "0.1.2" under parent "0.1" has
                // suffix "2"; "0.1.2.3" has a dot and is skipped, and
                // iteration children fail the numeric parse.
                if suffix.contains('.') {
                    continue;
                }
                if let Ok(idx) = suffix.parse::<i64>() {
                    max_child = max_child.max(idx);
                }
            }

            let candidate = format!("{}.{}", parent, max_child + 1);
            let dir = self.session_dir(&candidate);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(candidate),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(StoreError::io(&dir, err)),
            }
        }
        Err(StoreError::Race(format!(
            "gave up reserving a child of {} after {} attempts",
            parent, CHILD_ID_ATTEMPTS
        )))
    }

    /// Persist a session, one field per file.
    ///
    /// The `state` file is written last so that observers never see a
    /// session whose other required fields are still missing.
    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.ensure_scope_dir()?;
        let dir = self.session_dir(&session.id);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        self.write_field(&dir, "task", &session.task)?;
        self.write_field(&dir, "parent", &session.parent)?;
        self.write_field(&dir, "tmux", &session.tmux_window)?;
        self.write_field(&dir, "created_at", &session.created_at.to_rfc3339())?;
        self.write_field(&dir, "alias", &session.alias)?;
        self.write_field(&dir, "depends_on", &serde_json::to_string(&session.depends_on)?)?;
        self.write_field(&dir, "state", session.state.as_str())?;
        Ok(())
    }

    pub(crate) fn write_field(&self, dir: &Path, name: &str, value: &str) -> Result<(), StoreError> {
        let path = dir.join(name);
        write_atomic(&path, value).map_err(|e| StoreError::io(&path, e))
    }

    /// Load a session by ID.
    ///
    /// Returns `None` for a missing directory and for a directory that
    /// has been reserved by `next_id` but not yet saved (no `state` file).
    pub fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let dir = self.session_dir(session_id);
        if !dir.is_dir() {
            return Ok(None);
        }
        let state_path = dir.join("state");
        let Some(state_raw) = read_optional(&state_path).map_err(|e| StoreError::io(&state_path, e))?
        else {
            return Ok(None);
        };
        let state: SessionState = state_raw
            .parse()
            .map_err(|e| StoreError::corrupt(&state_path, format!("{}", e)))?;

        let created_path = dir.join("created_at");
        let created_raw = read_retry(&created_path).map_err(|e| StoreError::io(&created_path, e))?;
        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(created_raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::corrupt(&created_path, format!("{}", e)))?;

        let depends_path = dir.join("depends_on");
        let depends_on = match read_optional(&depends_path).map_err(|e| StoreError::io(&depends_path, e))? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)?,
            _ => Vec::new(),
        };

        Ok(Some(Session {
            id: session_id.to_string(),
            task: self.read_required(&dir, "task")?,
            parent: self.read_required(&dir, "parent")?,
            state,
            tmux_window: self.read_required(&dir, "tmux")?,
            created_at,
            alias: self.read_default(&dir, "alias")?,
            depends_on,
        }))
    }

    fn read_required(&self, dir: &Path, name: &str) -> Result<String, StoreError> {
        let path = dir.join(name);
        read_retry(&path).map_err(|e| StoreError::io(&path, e))
    }

    fn read_default(&self, dir: &Path, name: &str) -> Result<String, StoreError> {
        let path = dir.join(name);
        Ok(read_optional(&path)
            .map_err(|e| StoreError::io(&path, e))?
            .unwrap_or_default())
    }

    /// Load every session, sorted by `created_at` (oldest first).
    ///
    /// Sessions that fail to load are skipped with a warning so that one
    /// corrupt directory cannot blind the watcher.
    pub fn load_all(&self) -> Result<Vec<Session>, StoreError> {
        let sessions_dir = self.sessions_dir();
        if !sessions_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut sessions = Vec::new();
        let entries = fs::read_dir(&sessions_dir).map_err(|e| StoreError::io(&sessions_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&sessions_dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            match self.load(&id) {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(session_id = %id, error = %err, "skipping unreadable session");
                }
            }
        }
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }

    /// Flip a session's state.
    pub fn update_state(&self, session_id: &str, state: SessionState) -> Result<(), StoreError> {
        let dir = self.require_dir(session_id)?;
        self.write_field(&dir, "state", state.as_str())
    }

    /// Delete a session directory.
    pub fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let dir = self.require_dir(session_id)?;
        fs::remove_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))
    }

    /// Find the live session holding an alias, if any.
    pub fn load_by_alias(&self, alias: &str) -> Result<Option<Session>, StoreError> {
        if alias.is_empty() {
            return Ok(None);
        }
        Ok(self
            .load_all()?
            .into_iter()
            .find(|session| session.alias == alias))
    }

    /// Ensure an alias is free before assigning it.
    pub fn assert_alias_free(&self, alias: &str) -> Result<(), StoreError> {
        match self.load_by_alias(alias)? {
            Some(holder) => Err(StoreError::AliasConflict {
                alias: alias.to_string(),
                holder: holder.id,
            }),
            None => Ok(()),
        }
    }

    /// Resolve an ID or alias to a session ID.
    pub fn resolve_id(&self, id_or_alias: &str) -> Result<Option<String>, StoreError> {
        if self.exists(id_or_alias) {
            return Ok(Some(id_or_alias.to_string()));
        }
        Ok(self.load_by_alias(id_or_alias)?.map(|session| session.id))
    }

    /// All descendants of a session, sorted deepest-first (safe deletion
    /// order). Covers both dotted children and iteration children.
    pub fn get_descendants(&self, session_id: &str) -> Result<Vec<Session>, StoreError> {
        let mut descendants: Vec<Session> = self
            .load_all()?
            .into_iter()
            .filter(|session| id::is_descendant_of(&session.id, session_id))
            .collect();
        descendants.sort_by(|a, b| {
            id::depth(&b.id)
                .cmp(&id::depth(&a.id))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(descendants)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

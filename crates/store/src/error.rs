// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the state store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("alias '{alias}' is already used by session {holder}")]
    AliasConflict { alias: String, holder: String },
    #[error("could not allocate a session id: {0}")]
    Race(String),
    #[error("corrupt state file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}

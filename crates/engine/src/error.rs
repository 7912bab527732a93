// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while spawning or looping.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] corral_store::StoreError),
    #[error(transparent)]
    Mux(#[from] corral_mux::MuxError),
    #[error("--{flag} session '{id}' not found")]
    DependencyNotFound { flag: &'static str, id: String },
    #[error("failed to spawn session: {0}")]
    SpawnFailed(String),
    #[error("rubric file not found: {0}")]
    RubricNotFound(PathBuf),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid workflow: {0}")]
    Workflow(String),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}

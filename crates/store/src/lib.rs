// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-store: the on-disk state store.
//!
//! All session state lives under a scope root (`<cwd>/.corral` by default)
//! with one field per file, so any component can read a single field
//! without deserializing the whole session and the watcher observes
//! changes at file granularity. Writes are replace-style atomic (temp
//! sibling + rename); readers tolerate the transient missing-file window
//! between renames by retrying once.

pub mod atomic;
mod error;
mod evict;
mod fields;
mod store;

pub use error::StoreError;
pub use evict::{session_cap, DEFAULT_SESSION_CAP};
pub use store::Store;

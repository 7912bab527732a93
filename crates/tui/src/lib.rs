// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-tui: the watcher-driven session tree viewer (`corral top`).

mod app;
mod tree;
mod watcher;

pub use app::App;
pub use tree::{build_rows, restore_selection, Row, RowKind};
pub use watcher::RefreshWatcher;

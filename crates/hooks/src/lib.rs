// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-hooks: agent-event handling and integration installation.
//!
//! The `corral-hook` binary is invoked by the agent's lifecycle hooks
//! (ready/task/pattern-reinject/activity/stop) and by the tmux pane-died
//! hook; it translates those events into state-store mutations (and, for
//! pattern-reinject, back into prompt context). The installer merges the
//! hook configuration into the agent's settings with version-hash
//! idempotence.

mod handler;
mod install;

pub use handler::{
    handle_activity, handle_pane_died, handle_pattern_reinject, handle_ready, handle_stop,
    handle_task, HookError,
};
pub use install::{component_hash, Installer, CLAUDE_MD_MARKER};

//! Behavioral specifications for the corral CLI.
//!
//! These tests are black-box: they invoke the built binaries and verify
//! stdout, stderr, exit codes, and the on-disk state they leave behind.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/cli/conditional.rs"]
mod cli_conditional;
#[path = "specs/cli/errors.rs"]
mod cli_errors;
#[path = "specs/cli/exit.rs"]
mod cli_exit;
#[path = "specs/cli/spawn.rs"]
mod cli_spawn;
#[path = "specs/cli/termination.rs"]
mod cli_termination;
#[path = "specs/cli/wait_poll.rs"]
mod cli_wait_poll;

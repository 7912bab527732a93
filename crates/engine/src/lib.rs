// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-engine: spawner, doer→checker loop, checkers, termination
//! evaluation, and the workflow runner.

mod checker;
mod child;
mod error;
mod loop_runner;
mod spawner;
mod summarize;
mod termination;
mod wait;
mod workflow;

pub use checker::{load_rubric, run_checker, run_command_checker, run_gates, CheckerEnv, CheckerOutcome};
pub use error::EngineError;
pub use loop_runner::{run_loop, LoopConfig};
pub use spawner::{spawn, SpawnOptions, SpawnOutcome};
pub use summarize::{summarize, PROGRESS_GOAL};
pub use termination::{evaluate_termination, run_criterion};
pub use wait::wait_for_sessions;
pub use workflow::{OnFail, Phase, PhaseResult, Workflow};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The check-termination command evaluates a session's termination
//! criteria and signals the recommendation through the exit code:
//! 0 = terminate, 2 = iterate, 1 = error.

use crate::diag;
use anyhow::Result;
use corral_engine::evaluate_termination;
use corral_store::Store;
use std::process::ExitCode;

#[derive(clap::Args)]
pub struct CheckTerminationArgs {
    /// Session ID or alias
    pub session_id: String,

    /// Increment the iteration counter before checking
    #[arg(long)]
    pub increment: bool,

    /// Output JSON instead of a human-readable summary
    #[arg(long = "json")]
    pub json: bool,
}

pub async fn run(args: CheckTerminationArgs) -> Result<ExitCode> {
    let store = Store::from_env();

    let Some(resolved) = store.resolve_id(&args.session_id)? else {
        return Ok(diag::not_found(&args.session_id));
    };

    let Some(criteria) = store.load_termination_criteria(&resolved)? else {
        return Ok(diag::fail(
            &format!("no termination criteria set for session {}", args.session_id),
            "check-termination needs criteria recorded at spawn time.",
            "Spawn with --terminate-when to set criteria:\n    corral spawn --terminate-when \"cargo test\" \"your prompt\" --checker true",
        ));
    };

    if args.increment {
        let current = store.load_iteration_count(&resolved)?;
        store.save_iteration_count(&resolved, current + 1)?;
    }

    let iteration = store.load_iteration_count(&resolved)?;
    let max_iterations = store.load_max_iterations(&resolved)?;
    let cwd = std::env::current_dir()?;

    let result = evaluate_termination(&criteria, iteration, max_iterations, &cwd).await;

    if args.json {
        let payload = serde_json::json!({
            "session": resolved,
            "iteration": result.iteration,
            "max_iterations": result.max_iterations,
            "recommend_terminate": result.recommend_terminate,
            "reason": result.reason,
            "checks": result.checks,
        });
        println!("{}", payload);
    } else {
        println!("{}", result.summary());
    }

    // Exit code is the recommendation
    if result.recommend_terminate {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

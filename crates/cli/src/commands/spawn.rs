// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The spawn command: create a session and run its loop.

use crate::commands::env_flag;
use crate::diag;
use anyhow::Result;
use corral_engine::{run_loop, spawn, LoopConfig, SpawnOptions};
use corral_mux::Mux;
use corral_store::Store;
use std::process::ExitCode;

#[derive(clap::Args)]
pub struct SpawnArgs {
    /// Initial prompt for the doer
    pub prompt: String,

    /// Human-readable alias for the session (must be unique)
    #[arg(long = "id", default_value = "")]
    pub alias: String,

    /// Start the agent in plan mode
    #[arg(long)]
    pub plan: bool,

    /// Model for the doer (e.g. sonnet, opus, haiku)
    #[arg(long, default_value = "")]
    pub model: String,

    /// Pass --dangerously-skip-permissions to the spawned agent
    #[arg(long, env = "CORRAL_DANGEROUSLY_SKIP_PERMISSIONS")]
    pub dangerously_skip_permissions: bool,

    /// REQUIRED. Checker spec: shell command (exit 0 = pass), "agent: <prompt>",
    /// or a rubric markdown file path
    #[arg(long)]
    pub checker: String,

    /// Maximum loop iterations before terminating
    #[arg(long, default_value_t = 3)]
    pub max_iterations: u32,

    /// Model for the agent checker (default: same as the doer)
    #[arg(long, default_value = "")]
    pub checker_model: String,

    /// Run only if this session passed; skip otherwise
    #[arg(long = "on-pass", value_name = "ID", default_value = "")]
    pub on_pass: String,

    /// Run only if this session failed or aborted; skip otherwise
    #[arg(long = "on-fail", value_name = "ID", default_value = "")]
    pub on_fail: String,

    /// Inject the result of these sessions as Prior Results
    #[arg(long = "pipe", value_name = "ID")]
    pub pipe: Vec<String>,

    /// Restrict the doer to these paths
    #[arg(long = "file-scope", value_name = "PATH")]
    pub file_scope: Vec<String>,

    /// Verification criteria rendered into the contract
    #[arg(long = "verify", value_name = "CRITERION")]
    pub verify: Vec<String>,

    /// Termination criteria for check-termination
    #[arg(long = "terminate-when", value_name = "CRITERION")]
    pub terminate_when: Vec<String>,

    /// Commit the session to a working pattern up front
    #[arg(long, default_value = "")]
    pub pattern: String,

    #[arg(long = "session-id", hide = true, default_value = "")]
    pub session_id: String,
}

pub async fn run(args: SpawnArgs) -> Result<ExitCode> {
    let store = Store::from_env();
    let mux = Mux::from_env();

    let opts = SpawnOptions {
        prompt: args.prompt.clone(),
        alias: args.alias,
        plan: args.plan,
        model: args.model.clone(),
        checker: args.checker.clone(),
        checker_model: args.checker_model.clone(),
        max_iterations: args.max_iterations,
        skip_permissions: args.dangerously_skip_permissions,
        on_fail: args.on_fail,
        on_pass: args.on_pass,
        pipe_from: args.pipe,
        file_scope: args.file_scope,
        verify: args.verify,
        termination: args.terminate_when,
        pattern: args.pattern,
        phase: String::new(),
        parent_intent: String::new(),
        session_id: args.session_id,
    };

    let outcome = match spawn(&store, &mux, &opts).await {
        Ok(outcome) => outcome,
        Err(err) => return Ok(diag::engine_error(err)),
    };

    // Printed before the loop starts so callers can track the session
    println!("{}", outcome.session_id);

    if outcome.skipped || env_flag("CORRAL_SKIP_LOOP") {
        return Ok(ExitCode::SUCCESS);
    }

    let config = LoopConfig {
        session_id: outcome.session_id.clone(),
        prompt: args.prompt,
        checker: args.checker,
        max_iterations: args.max_iterations,
        checker_model: if args.checker_model.is_empty() {
            args.model
        } else {
            args.checker_model
        },
        skip_permissions: args.dangerously_skip_permissions,
        rubric_path: outcome.rubric_path,
        cwd: std::env::current_dir()?,
    };
    match run_loop(&store, &config).await {
        Ok(result) => {
            eprintln!(
                "Loop finished: {} after {} iteration(s).",
                result.verdict, result.iterations
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(diag::engine_error(err)),
    }
}

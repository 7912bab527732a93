// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral - doer/checker loops for coding agents

mod commands;
mod diag;

use clap::{Parser, Subcommand};
use commands::{
    abort, check_termination, exit as exit_cmd, pattern, poll, rubric, setup, spawn, top, wait,
    workflow,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "corral",
    version,
    about = "Corral - verified doer/checker loops for coding agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn a session and run its doer/checker loop
    Spawn(spawn::SpawnArgs),
    /// Kill a session's window and delete it
    Abort {
        /// Session ID or alias
        session_id: String,
    },
    /// Exit the current session with a reason (reads CORRAL_SESSION_ID)
    Exit {
        /// Why the session is exiting
        reason: String,
    },
    /// Block until the given sessions reach a terminal state
    Wait {
        /// Session IDs or aliases
        #[arg(required = true)]
        session_ids: Vec<String>,
    },
    /// Non-blocking status of one session or all of them
    Poll {
        /// Session ID or alias
        session_id: Option<String>,
    },
    /// Evaluate a session's termination criteria
    CheckTermination(check_termination::CheckTerminationArgs),
    /// Run a workflow description file
    Workflow {
        /// Path to the workflow TOML file
        file: PathBuf,
    },
    /// Commit the current session to a working pattern
    Commit {
        /// Pattern name (tdd, ralph, map-reduce, maker-checker, dag, rlm)
        pattern: String,
    },
    /// Advance the committed pattern to its next phase
    Advance,
    /// Open a session's rubric file in $EDITOR
    Rubric {
        /// Session ID or alias
        session_id: String,
    },
    /// Launch the session tree TUI
    Top,
    /// Install agent-side hooks and integration artifacts
    Setup,
    /// Remove installed integration artifacts
    Uninstall,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    let result = match cli.command {
        Commands::Spawn(args) => spawn::run(args).await,
        Commands::Abort { session_id } => abort::run(&session_id).await,
        Commands::Exit { reason } => exit_cmd::run(&reason),
        Commands::Wait { session_ids } => wait::run(&session_ids).await,
        Commands::Poll { session_id } => poll::run(session_id.as_deref()),
        Commands::CheckTermination(args) => check_termination::run(args).await,
        Commands::Workflow { file } => workflow::run(&file).await,
        Commands::Commit { pattern } => pattern::commit(&pattern),
        Commands::Advance => pattern::advance(),
        Commands::Rubric { session_id } => rubric::run(&session_id),
        Commands::Top => top::run().await,
        Commands::Setup => setup::setup().await,
        Commands::Uninstall => setup::uninstall(),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(1)
        }
    }
}

/// Log to `.corral/corral.log`; stderr stays clean for command output
/// and the TUI. `CORRAL_LOG` sets the filter.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("CORRAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let root = corral_store::Store::from_env().root().to_path_buf();
    if std::fs::create_dir_all(&root).is_err() {
        return None;
    }
    let appender = tracing_appender::rolling::never(&root, "corral.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-hook: event receiver for agent and tmux hooks.
//!
//! Invoked as `corral-hook <event>` with the hook payload on stdin.
//! Agent events resolve their session from `CORRAL_SESSION_ID`; the
//! pane-died event gets its session id and exit status as arguments
//! from the tmux hook format expansion.
//!
//! Failures are reported on stderr but exit 0: a broken hook must never
//! break the agent it observes.

use corral_hooks::{
    handle_activity, handle_pane_died, handle_pattern_reinject, handle_ready, handle_stop,
    handle_task,
};
use corral_mux::Mux;
use corral_store::Store;
use std::io::Read;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(event) = args.first().map(String::as_str) else {
        eprintln!("usage: corral-hook <ready|task|pattern-reinject|activity|stop|pane-died> [args]");
        return ExitCode::from(1);
    };

    let store = Store::from_env();

    if event == "pane-died" {
        let session_id = args.get(1).map(String::as_str).unwrap_or("");
        let dead_status = args.get(2).map(String::as_str).unwrap_or("");
        let mux = Mux::from_env();
        if let Err(err) = handle_pane_died(&store, &mux, session_id, dead_status).await {
            eprintln!("corral-hook: {}", err);
        }
        return ExitCode::SUCCESS;
    }

    let Ok(session_id) = std::env::var("CORRAL_SESSION_ID") else {
        // Not inside a corral session; nothing to record
        return ExitCode::SUCCESS;
    };
    if session_id.is_empty() {
        return ExitCode::SUCCESS;
    }

    let mut raw = String::new();
    let _ = std::io::stdin().read_to_string(&mut raw);
    let payload: serde_json::Value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);

    let result = match event {
        "ready" => handle_ready(&store, &session_id),
        "task" => handle_task(&store, &session_id, &payload),
        // Stdout of a UserPromptSubmit hook is injected as context, so
        // the pattern state lands in front of the agent on every prompt
        "pattern-reinject" => handle_pattern_reinject(&store, &session_id).map(|state| {
            if let Some(state) = state {
                println!("{}", state);
            }
        }),
        "activity" => handle_activity(&store, &session_id, &payload),
        "stop" => handle_stop(&store, &session_id, &payload),
        other => {
            eprintln!("corral-hook: unknown event '{}'", other);
            return ExitCode::from(1);
        }
    };

    if let Err(err) = result {
        eprintln!("corral-hook: {}", err);
    }
    ExitCode::SUCCESS
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result summarization via an external one-shot agent.
//!
//! Summaries feed retry prompts and checkers so downstream context stays
//! small. The summarizer is best-effort: any failure, timeout, or empty
//! output falls back to a truncation of the raw input.

use corral_mux::subprocess::{run_with_timeout, SUMMARY_TIMEOUT};
use tokio::process::Command;

/// `CORRAL_SUMMARY_COMMAND` override; set to empty to disable.
const SUMMARY_COMMAND_VAR: &str = "CORRAL_SUMMARY_COMMAND";

const DEFAULT_SUMMARY_COMMAND: &str = "claude -p";

/// Goal prompt for doer-result summaries.
pub const PROGRESS_GOAL: &str = "You are a progress summarizer. Given a task and its result, \
     output a 1-2 sentence summary of what was accomplished and what is left to do. \
     Be specific and concise. No quotes, no markdown.";

/// Summarize `input` under `goal`, truncated to `max_len` chars.
///
/// Returns a truncation of `fallback` when summarization is disabled,
/// fails, times out, or produces nothing.
pub async fn summarize(input: &str, goal: &str, max_len: usize, fallback: &str) -> String {
    let command = match std::env::var(SUMMARY_COMMAND_VAR) {
        Ok(cmd) if cmd.trim().is_empty() => return clip(fallback, max_len),
        Ok(cmd) => cmd,
        Err(_) => DEFAULT_SUMMARY_COMMAND.to_string(),
    };

    let prompt = format!("{}\n\n{}", goal, input);
    let mut cmd = Command::new("sh");
    // The prompt rides in as $0 so it needs no shell quoting
    cmd.arg("-c").arg(format!("{} \"$0\"", command)).arg(&prompt);

    match run_with_timeout(cmd, SUMMARY_TIMEOUT, "summarizer").await {
        Ok(output) if output.status.success() => {
            let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if text.is_empty() {
                clip(fallback, max_len)
            } else {
                clip(&text, max_len)
            }
        }
        Ok(_) | Err(_) => clip(fallback, max_len),
    }
}

/// Truncate to at most `max` chars on a char boundary.
pub(crate) fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "summarize_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The doer→checker loop.
//!
//! Waits for the current doer to reach a terminal state, summarizes its
//! result, runs the checker, and either accepts, terminates, or spawns
//! the next doer iteration with feedback. The rubric file (when any) is
//! re-read at the start of each iteration so mid-loop edits take effect
//! on the next check; the parse is frozen for the rest of the iteration.

use crate::checker::{load_rubric, run_checker, CheckerEnv};
use crate::child;
use crate::error::EngineError;
use crate::summarize::{clip, summarize, PROGRESS_GOAL};
use crate::wait::wait_for_sessions;
use corral_core::id::{iter_session_id, Role};
use corral_core::loop_state::{IterationRecord, LoopResult, LoopState, LoopVerdict};
use corral_core::rubric::Rubric;
use corral_core::session::SessionState;
use corral_store::Store;
use std::path::{Path, PathBuf};

/// Configuration for one loop run.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Root session of the loop (the iteration-0 doer).
    pub session_id: String,
    /// Original prompt, re-used as the base of retry prompts.
    pub prompt: String,
    pub checker: String,
    pub max_iterations: u32,
    pub checker_model: String,
    pub skip_permissions: bool,
    /// Rubric file for hot reload; empty when the checker is not a file.
    pub rubric_path: String,
    /// Working directory for gates and checker commands.
    pub cwd: PathBuf,
}

/// Execute the doer→checker loop to completion.
pub async fn run_loop(store: &Store, config: &LoopConfig) -> Result<LoopResult, EngineError> {
    let mut history: Vec<IterationRecord> = Vec::new();
    let mut current_doer = config.session_id.clone();

    for iteration in 0..config.max_iterations {
        wait_for_sessions(store, std::slice::from_ref(&current_doer)).await?;

        let doer_result = store.load_result(&current_doer)?.unwrap_or_default();
        let session = store.load(&current_doer)?;

        if let Some(session) = &session {
            match session.state {
                SessionState::Aborted | SessionState::Failed => {
                    tracing::info!(
                        session_id = %current_doer,
                        state = %session.state,
                        iteration,
                        "doer ended, terminating loop"
                    );
                    return Ok(LoopResult {
                        session_id: config.session_id.clone(),
                        verdict: LoopVerdict::Terminate,
                        iterations: iteration + 1,
                        history,
                        result_text: doer_result,
                        exit_reason: String::new(),
                    });
                }
                SessionState::Exited => {
                    let reason = store.load_exit_reason(&current_doer)?.unwrap_or_default();
                    tracing::info!(
                        session_id = %current_doer,
                        iteration,
                        reason = %reason,
                        "doer exited"
                    );
                    return Ok(LoopResult {
                        session_id: config.session_id.clone(),
                        verdict: LoopVerdict::Exit,
                        iterations: iteration + 1,
                        history,
                        result_text: doer_result,
                        exit_reason: reason,
                    });
                }
                _ => {}
            }
        }

        let task_name = session
            .as_ref()
            .map(|s| s.task.clone())
            .filter(|task| !task.is_empty())
            .unwrap_or_else(|| clip(&config.prompt, 80));
        let fallback = if doer_result.is_empty() {
            task_name.clone()
        } else {
            clip(&doer_result, 300)
        };
        let doer_summary = summarize(
            &format!("Task: {}\n\nResult:\n{}\n\nSummary:", task_name, clip(&doer_result, 2000)),
            PROGRESS_GOAL,
            300,
            &fallback,
        )
        .await;

        // Hot reload: one read per iteration pins both the parse and the
        // hash recorded in history.
        let (rubric, iter_rubric_hash) = load_iteration_rubric(&config.rubric_path)?;

        let env = CheckerEnv {
            store,
            cwd: &config.cwd,
            checker_model: config.checker_model.clone(),
            skip_permissions: config.skip_permissions,
            parent_session: config.session_id.clone(),
        };
        let outcome = run_checker(
            &env,
            &config.checker,
            rubric.as_ref(),
            &doer_summary,
            iteration,
            &history,
        )
        .await?;

        history.push(IterationRecord {
            iteration,
            doer_session: current_doer.clone(),
            checker_session: (!outcome.checker_session.is_empty())
                .then(|| outcome.checker_session.clone()),
            verdict: outcome.verdict,
            feedback: outcome.feedback.clone(),
            gates: (!outcome.gates.is_empty()).then(|| outcome.gates.clone()),
            criteria_summary: (!outcome.criteria_summary.is_empty())
                .then(|| outcome.criteria_summary.clone()),
            rubric_hash: iter_rubric_hash,
        });

        store.save_loop_state(
            &config.session_id,
            &LoopState {
                checker: config.checker.clone(),
                rubric_path: config.rubric_path.clone(),
                max_iterations: config.max_iterations,
                current_iteration: iteration,
                history: history.clone(),
            },
        )?;

        match outcome.verdict {
            corral_core::Verdict::Accept => {
                tracing::info!(session_id = %config.session_id, iteration, "checker accepted");
                return Ok(LoopResult {
                    session_id: config.session_id.clone(),
                    verdict: LoopVerdict::Accept,
                    iterations: iteration + 1,
                    history,
                    result_text: doer_result,
                    exit_reason: String::new(),
                });
            }
            corral_core::Verdict::Terminate => {
                tracing::info!(
                    session_id = %config.session_id,
                    iteration,
                    feedback = %outcome.feedback,
                    "checker terminated"
                );
                return Ok(LoopResult {
                    session_id: config.session_id.clone(),
                    verdict: LoopVerdict::Terminate,
                    iterations: iteration + 1,
                    history,
                    result_text: doer_result,
                    exit_reason: String::new(),
                });
            }
            corral_core::Verdict::Retry => {}
        }

        if iteration + 1 >= config.max_iterations {
            tracing::info!(
                session_id = %config.session_id,
                max_iterations = config.max_iterations,
                "max iterations reached without acceptance"
            );
            return Ok(LoopResult {
                session_id: config.session_id.clone(),
                verdict: LoopVerdict::MaxIterations,
                iterations: iteration + 1,
                history,
                result_text: doer_result,
                exit_reason: String::new(),
            });
        }

        let retry_prompt = format!(
            "{}\n\n\
             # Previous Attempt Summary (iteration {})\n\n{}\n\n\
             # Checker Feedback\n\n\
             The checker reviewed your previous output and requested a retry:\n\n{}\n\n\
             Please address this feedback and try again.",
            config.prompt, iteration, doer_summary, outcome.feedback
        );

        let next_id = iter_session_id(&config.session_id, iteration + 1, Role::Do);
        current_doer = child::spawn_session(
            &retry_prompt,
            "",
            config.skip_permissions,
            &config.session_id,
            &next_id,
        )
        .await?;
    }

    // max_iterations == 0 or an exhausted range without an early return
    Ok(LoopResult {
        session_id: config.session_id.clone(),
        verdict: LoopVerdict::MaxIterations,
        iterations: config.max_iterations,
        history,
        result_text: String::new(),
        exit_reason: String::new(),
    })
}

fn load_iteration_rubric(rubric_path: &str) -> Result<(Option<Rubric>, Option<String>), EngineError> {
    if rubric_path.is_empty() {
        return Ok((None, None));
    }
    let path = Path::new(rubric_path);
    if !path.exists() {
        return Ok((None, None));
    }
    let (rubric, _content, hash) = load_rubric(path)?;
    Ok((Some(rubric), Some(hash)))
}

#[cfg(test)]
#[path = "loop_runner_tests.rs"]
mod tests;

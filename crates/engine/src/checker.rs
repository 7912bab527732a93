// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gate execution, agent checkers, and composite rubric verification.

use crate::child;
use crate::error::EngineError;
use crate::summarize::clip;
use crate::wait::wait_for_sessions;
use corral_core::id::{iter_session_id, Role};
use corral_core::loop_state::IterationRecord;
use corral_core::rubric::{parse_rubric, rubric_hash, CheckerSpec, Rubric};
use corral_core::session::SessionState;
use corral_core::verdict::{parse_criteria_summary, parse_verdict, GateResult, GateVerdict, Verdict};
use corral_core::CheckerContract;
use corral_mux::subprocess::GATE_TIMEOUT;
use corral_store::Store;
use std::path::Path;
use tokio::process::Command;

/// Everything a checker run needs from its surroundings.
pub struct CheckerEnv<'a> {
    pub store: &'a Store,
    pub cwd: &'a Path,
    pub checker_model: String,
    pub skip_permissions: bool,
    /// Loop session that owns this check; used for iteration-indexed
    /// checker IDs. Empty outside a loop.
    pub parent_session: String,
}

/// Outcome of one checker run.
#[derive(Debug, Clone)]
pub struct CheckerOutcome {
    pub verdict: Verdict,
    pub feedback: String,
    /// Checker sub-session ID, empty for gates-only and command checkers.
    pub checker_session: String,
    pub gates: Vec<GateResult>,
    pub criteria_summary: String,
}

impl CheckerOutcome {
    fn plain(verdict: Verdict, feedback: impl Into<String>) -> Self {
        CheckerOutcome {
            verdict,
            feedback: feedback.into(),
            checker_session: String::new(),
            gates: Vec::new(),
            criteria_summary: String::new(),
        }
    }
}

/// Load and parse a rubric file.
///
/// Returns the parsed rubric, raw content, and content hash.
pub fn load_rubric(path: &Path) -> Result<(Rubric, String, String), EngineError> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            EngineError::RubricNotFound(path.to_path_buf())
        } else {
            EngineError::io(path, err)
        }
    })?;
    let parsed = parse_rubric(&content);
    let hash = rubric_hash(&content);
    Ok((parsed, content, hash))
}

/// Run a shell-command checker. Exit 0 accepts; non-zero retries with the
/// combined output as feedback; an OS-level failure terminates.
pub async fn run_command_checker(command: &str, cwd: &Path) -> (Verdict, String) {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).current_dir(cwd);
    match tokio::time::timeout(GATE_TIMEOUT, cmd.output()).await {
        Err(_elapsed) => (
            Verdict::Retry,
            format!("Checker command timed out after {} seconds", GATE_TIMEOUT.as_secs()),
        ),
        Ok(Err(os_err)) => (
            Verdict::Terminate,
            format!("Checker command failed to execute: {}", os_err),
        ),
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if output.status.success() {
                (Verdict::Accept, stdout)
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let mut parts = Vec::new();
                if !stdout.is_empty() {
                    parts.push(stdout);
                }
                if !stderr.is_empty() {
                    parts.push(stderr);
                }
                let feedback = if parts.is_empty() {
                    format!("Command exited with code {}", output.status.code().unwrap_or(-1))
                } else {
                    parts.join("\n")
                };
                (Verdict::Retry, feedback)
            }
        }
    }
}

/// Run every gate in order, collecting structured results.
pub async fn run_gates(gates: &[String], cwd: &Path) -> Vec<GateResult> {
    let mut results = Vec::with_capacity(gates.len());
    for command in gates {
        let (verdict, output) = run_command_checker(command, cwd).await;
        results.push(GateResult {
            command: command.clone(),
            verdict: if verdict == Verdict::Accept {
                GateVerdict::Pass
            } else {
                GateVerdict::Fail
            },
            output,
        });
    }
    results
}

/// Run the checker for one iteration.
///
/// With a parsed rubric, runs composite verification; otherwise the
/// checker string is interpreted as an `agent:` prompt or shell command.
pub async fn run_checker(
    env: &CheckerEnv<'_>,
    checker: &str,
    rubric: Option<&Rubric>,
    doer_result: &str,
    iteration: u32,
    history: &[IterationRecord],
) -> Result<CheckerOutcome, EngineError> {
    if let Some(rubric) = rubric {
        return run_rubric_checker(env, rubric, doer_result, iteration, history).await;
    }
    match CheckerSpec::detect(checker) {
        CheckerSpec::RubricFile(path) => {
            let (rubric, _content, _hash) = load_rubric(&path)?;
            run_rubric_checker(env, &rubric, doer_result, iteration, history).await
        }
        CheckerSpec::Agent(prompt) => {
            run_agent_checker(env, &prompt, doer_result, iteration, history).await
        }
        CheckerSpec::Shell(command) => {
            let (verdict, feedback) = run_command_checker(&command, env.cwd).await;
            Ok(CheckerOutcome::plain(verdict, feedback))
        }
    }
}

/// Composite rubric verification: gates first, then an agent checker for
/// criteria, then verdict composition.
async fn run_rubric_checker(
    env: &CheckerEnv<'_>,
    rubric: &Rubric,
    doer_result: &str,
    iteration: u32,
    history: &[IterationRecord],
) -> Result<CheckerOutcome, EngineError> {
    let gates = if rubric.has_gates() {
        run_gates(&rubric.gates, env.cwd).await
    } else {
        Vec::new()
    };

    if !rubric.has_criteria() {
        return Ok(compose_gates_only(gates));
    }

    let contract = CheckerContract {
        doer_result: doer_result.to_string(),
        iteration,
        history: history.to_vec(),
        gate_results: gates.clone(),
        criteria: rubric.criteria.clone(),
        nice_to_have: rubric.nice_to_have.clone(),
        notes: rubric.notes.clone(),
        ..Default::default()
    }
    .render();

    let (checker_session, response) = run_checker_session(env, &contract, iteration).await?;
    let response = match response {
        Ok(text) => text,
        Err(feedback) => {
            return Ok(CheckerOutcome {
                verdict: Verdict::Retry,
                feedback,
                checker_session,
                gates,
                criteria_summary: String::new(),
            });
        }
    };

    let criteria_summary =
        parse_criteria_summary(&response, rubric.criteria.len(), rubric.nice_to_have.len());
    let (agent_verdict, agent_feedback) = parse_verdict(&response);
    let gates_pass = gates.iter().all(GateResult::passed);

    let (verdict, feedback) = if agent_verdict == Verdict::Terminate {
        (Verdict::Terminate, agent_feedback)
    } else if !gates_pass {
        let failed = gates
            .iter()
            .filter(|gate| !gate.passed())
            .map(|gate| format!("- `{}`: {}", gate.command, clip(&gate.output, 500)))
            .collect::<Vec<_>>()
            .join("\n");
        (
            Verdict::Retry,
            format!("Failed gates:\n{}\n\nAgent feedback:\n{}", failed, agent_feedback),
        )
    } else {
        (agent_verdict, agent_feedback)
    };

    Ok(CheckerOutcome {
        verdict,
        feedback,
        checker_session,
        gates,
        criteria_summary,
    })
}

fn compose_gates_only(gates: Vec<GateResult>) -> CheckerOutcome {
    if gates.is_empty() {
        return CheckerOutcome::plain(Verdict::Accept, "Empty rubric — no checks to run");
    }
    if gates.iter().all(GateResult::passed) {
        let summary = gates
            .iter()
            .map(|gate| format!("- `{}`: PASS", gate.command))
            .collect::<Vec<_>>()
            .join("\n");
        CheckerOutcome {
            verdict: Verdict::Accept,
            feedback: summary,
            checker_session: String::new(),
            gates,
            criteria_summary: String::new(),
        }
    } else {
        let feedback = gates
            .iter()
            .filter(|gate| !gate.passed())
            .map(|gate| format!("- `{}`: FAIL\n{}", gate.command, clip(&gate.output, 500)))
            .collect::<Vec<_>>()
            .join("\n");
        CheckerOutcome {
            verdict: Verdict::Retry,
            feedback,
            checker_session: String::new(),
            gates,
            criteria_summary: String::new(),
        }
    }
}

/// Legacy agent checker without a rubric.
async fn run_agent_checker(
    env: &CheckerEnv<'_>,
    checker_prompt: &str,
    doer_result: &str,
    iteration: u32,
    history: &[IterationRecord],
) -> Result<CheckerOutcome, EngineError> {
    let contract = CheckerContract {
        checker_prompt: checker_prompt.to_string(),
        doer_result: doer_result.to_string(),
        iteration,
        history: history.to_vec(),
        ..Default::default()
    }
    .render();

    let (checker_session, response) = run_checker_session(env, &contract, iteration).await?;
    let (verdict, feedback) = match response {
        Ok(text) => parse_verdict(&text),
        Err(feedback) => (Verdict::Retry, feedback),
    };
    Ok(CheckerOutcome {
        verdict,
        feedback,
        checker_session,
        gates: Vec::new(),
        criteria_summary: String::new(),
    })
}

/// Spawn a checker sub-session, wait for it, and read its result.
///
/// Returns the session ID plus either the response text or a retry
/// feedback message when the checker died or produced nothing.
async fn run_checker_session(
    env: &CheckerEnv<'_>,
    contract: &str,
    iteration: u32,
) -> Result<(String, Result<String, String>), EngineError> {
    let id_hint = if env.parent_session.is_empty() {
        String::new()
    } else {
        iter_session_id(&env.parent_session, iteration, Role::Check)
    };
    let checker_id = child::spawn_session(
        contract,
        &env.checker_model,
        env.skip_permissions,
        &env.parent_session,
        &id_hint,
    )
    .await?;

    wait_for_sessions(env.store, std::slice::from_ref(&checker_id)).await?;

    if let Some(session) = env.store.load(&checker_id)? {
        if matches!(
            session.state,
            SessionState::Aborted | SessionState::Failed | SessionState::Exited
        ) {
            let feedback = format!(
                "Checker session {} ended with state '{}'",
                checker_id, session.state
            );
            return Ok((checker_id, Err(feedback)));
        }
    }

    match env.store.load_result(&checker_id)? {
        Some(response) if !response.is_empty() => Ok((checker_id, Ok(response))),
        _ => {
            let feedback = format!("Checker session {} produced no output", checker_id);
            Ok((checker_id, Err(feedback)))
        }
    }
}

#[cfg(test)]
#[path = "checker_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow runner: ordered doer→checker loops with result piping.
//!
//! Each phase spawns a full `corral spawn` loop as a subprocess and
//! reads the resulting loop state back from the store. By default a
//! phase receives the result of the immediately preceding phase;
//! `pipe_from` overrides the sources explicitly.

use crate::child;
use crate::error::EngineError;
use corral_core::loop_state::{LoopResult, LoopVerdict};
use corral_core::session::SessionState;
use corral_core::Verdict;
use corral_store::Store;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::process::Command;

/// Failure policy for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnFail {
    #[default]
    Stop,
    Continue,
    Retry(u32),
}

impl std::str::FromStr for OnFail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stop" => Ok(OnFail::Stop),
            "continue" => Ok(OnFail::Continue),
            other => match other.strip_prefix("retry:") {
                Some(count) => count
                    .parse()
                    .map(OnFail::Retry)
                    .map_err(|_| format!("invalid retry count in '{}'", other)),
                None => Err(format!("unknown on_fail policy '{}'", other)),
            },
        }
    }
}

/// One workflow phase.
#[derive(Debug, Clone)]
pub struct Phase {
    pub name: String,
    pub task: String,
    pub checker: String,
    pub max_iterations: u32,
    pub checker_model: String,
    pub model: String,
    pub on_fail: OnFail,
    pub pipe_from: Vec<String>,
    pub file_scope: Vec<String>,
    pub verify: Vec<String>,
}

impl Phase {
    pub fn new(name: impl Into<String>, task: impl Into<String>, checker: impl Into<String>) -> Self {
        Phase {
            name: name.into(),
            task: task.into(),
            checker: checker.into(),
            max_iterations: 3,
            checker_model: String::new(),
            model: String::new(),
            on_fail: OnFail::Stop,
            pipe_from: Vec::new(),
            file_scope: Vec::new(),
            verify: Vec::new(),
        }
    }
}

/// Result of one phase.
#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub phase: String,
    pub loop_result: LoopResult,
    pub passed: bool,
}

impl PhaseResult {
    pub fn result_text(&self) -> &str {
        &self.loop_result.result_text
    }

    pub fn verdict(&self) -> LoopVerdict {
        self.loop_result.verdict
    }
}

/// An ordered list of phases with unique names.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    phases: Vec<Phase>,
}

const fn default_max_iterations() -> u32 {
    3
}

#[derive(Debug, Deserialize)]
struct WorkflowFile {
    name: String,
    #[serde(default, rename = "phase")]
    phases: Vec<PhaseFile>,
}

#[derive(Debug, Deserialize)]
struct PhaseFile {
    name: String,
    task: String,
    checker: String,
    #[serde(default = "default_max_iterations")]
    max_iterations: u32,
    #[serde(default)]
    checker_model: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    on_fail: Option<String>,
    #[serde(default)]
    pipe_from: Vec<String>,
    #[serde(default)]
    file_scope: Vec<String>,
    #[serde(default)]
    verify: Vec<String>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Workflow {
        Workflow {
            name: name.into(),
            phases: Vec::new(),
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Register a phase. Names must be unique and `pipe_from` may only
    /// reference previously registered phases.
    pub fn phase(&mut self, phase: Phase) -> Result<(), EngineError> {
        if self.phases.iter().any(|existing| existing.name == phase.name) {
            return Err(EngineError::Workflow(format!(
                "duplicate phase name: {}",
                phase.name
            )));
        }
        for source in &phase.pipe_from {
            if !self.phases.iter().any(|existing| existing.name == *source) {
                return Err(EngineError::Workflow(format!(
                    "phase '{}' pipes from unknown phase '{}'",
                    phase.name, source
                )));
            }
        }
        self.phases.push(phase);
        Ok(())
    }

    /// Parse a TOML workflow description.
    pub fn from_toml_str(raw: &str) -> Result<Workflow, EngineError> {
        let file: WorkflowFile =
            toml::from_str(raw).map_err(|err| EngineError::Workflow(err.to_string()))?;
        let mut workflow = Workflow::new(file.name);
        for phase_file in file.phases {
            let on_fail = match &phase_file.on_fail {
                Some(raw) => raw.parse().map_err(EngineError::Workflow)?,
                None => OnFail::Stop,
            };
            workflow.phase(Phase {
                name: phase_file.name,
                task: phase_file.task,
                checker: phase_file.checker,
                max_iterations: phase_file.max_iterations,
                checker_model: phase_file.checker_model,
                model: phase_file.model,
                on_fail,
                pipe_from: phase_file.pipe_from,
                file_scope: phase_file.file_scope,
                verify: phase_file.verify,
            })?;
        }
        Ok(workflow)
    }

    /// Load a workflow file from disk.
    pub fn load(path: &Path) -> Result<Workflow, EngineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        Workflow::from_toml_str(&raw)
    }

    /// Execute all phases sequentially.
    pub async fn run(&self, store: &Store) -> Result<Vec<PhaseResult>, EngineError> {
        let mut results: Vec<PhaseResult> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for (index, phase) in self.phases.iter().enumerate() {
            tracing::info!(workflow = %self.name, phase = %phase.name, "starting phase");
            let task = build_phase_task(phase, index, &self.phases, &results, &by_name);

            let mut attempts = match phase.on_fail {
                OnFail::Retry(n) => n + 1,
                _ => 1,
            };
            let phase_result = loop {
                let loop_result = run_phase_once(store, phase, &task).await?;
                let passed = loop_result.verdict == LoopVerdict::Accept;
                attempts -= 1;
                if passed || attempts == 0 {
                    break PhaseResult {
                        phase: phase.name.clone(),
                        loop_result,
                        passed,
                    };
                }
                tracing::info!(
                    phase = %phase.name,
                    attempts_left = attempts,
                    "phase failed, retrying"
                );
            };

            let exited = phase_result.verdict() == LoopVerdict::Exit;
            let passed = phase_result.passed;
            by_name.insert(phase.name.clone(), results.len());
            results.push(phase_result);

            if exited {
                // An explicit exit stops the workflow regardless of policy
                tracing::info!(phase = %phase.name, "phase exited, stopping workflow");
                break;
            }
            if !passed && phase.on_fail != OnFail::Continue {
                tracing::info!(phase = %phase.name, "phase failed, stopping workflow");
                break;
            }
        }

        Ok(results)
    }
}

async fn run_phase_once(store: &Store, phase: &Phase, task: &str) -> Result<LoopResult, EngineError> {
    let mut cmd = Command::new(child::corral_binary());
    cmd.arg("spawn")
        .arg(task)
        .arg("--checker")
        .arg(&phase.checker)
        .arg("--max-iterations")
        .arg(phase.max_iterations.to_string());
    if !phase.model.is_empty() {
        cmd.arg("--model").arg(&phase.model);
    }
    if !phase.checker_model.is_empty() {
        cmd.arg("--checker-model").arg(&phase.checker_model);
    }

    // Blocks until the phase's whole loop completes
    let output = cmd
        .output()
        .await
        .map_err(|err| EngineError::SpawnFailed(err.to_string()))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let session_id = stdout.lines().next().unwrap_or("").trim().to_string();

    Ok(read_loop_result(store, &session_id))
}

fn build_phase_task(
    phase: &Phase,
    index: usize,
    phases: &[Phase],
    results: &[PhaseResult],
    by_name: &HashMap<String, usize>,
) -> String {
    let mut sections = vec![phase.task.clone()];

    let mut prior: Vec<String> = Vec::new();
    if !phase.pipe_from.is_empty() {
        for source in &phase.pipe_from {
            if let Some(result) = by_name.get(source).map(|&i| &results[i]) {
                if !result.result_text().is_empty() {
                    prior.push(format!("**{}**: {}", source, result.result_text()));
                }
            }
        }
    } else if index > 0 {
        let previous = &phases[index - 1].name;
        if let Some(result) = by_name.get(previous).map(|&i| &results[i]) {
            if !result.result_text().is_empty() {
                prior.push(format!("**{}**: {}", previous, result.result_text()));
            }
        }
    }
    if !prior.is_empty() {
        sections.push(format!("# Prior Phase Results\n\n{}", prior.join("\n\n---\n\n")));
    }

    if !phase.file_scope.is_empty() {
        let constraints = phase
            .file_scope
            .iter()
            .map(|path| format!("- `{}`", path))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("# File Scope\n\nOnly modify files within:\n{}", constraints));
    }

    if !phase.verify.is_empty() {
        let checks = phase
            .verify
            .iter()
            .map(|criterion| format!("- {}", criterion))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!(
            "# Verification\n\nYour output will be verified against:\n{}",
            checks
        ));
    }

    sections.join("\n\n")
}

/// Reconstruct a [`LoopResult`] from persisted session state.
fn read_loop_result(store: &Store, session_id: &str) -> LoopResult {
    if session_id.is_empty() {
        let mut result = LoopResult::new("", LoopVerdict::Terminate, 0);
        result.result_text = "spawn failed".to_string();
        return result;
    }

    let result_text = store.load_result(session_id).ok().flatten().unwrap_or_default();
    let loop_state = store.load_loop_state(session_id).ok().flatten();
    let (history, iterations) = match &loop_state {
        Some(state) => (state.history.clone(), state.history.len() as u32),
        None => (Vec::new(), 0),
    };
    let session = store.load(session_id).ok().flatten();

    if let Some(session) = &session {
        if session.state == SessionState::Exited {
            return LoopResult {
                session_id: session_id.to_string(),
                verdict: LoopVerdict::Exit,
                iterations,
                history,
                result_text,
                exit_reason: store
                    .load_exit_reason(session_id)
                    .ok()
                    .flatten()
                    .unwrap_or_default(),
            };
        }
        if matches!(session.state, SessionState::Aborted | SessionState::Failed) {
            return LoopResult {
                session_id: session_id.to_string(),
                verdict: LoopVerdict::Terminate,
                iterations,
                history,
                result_text,
                exit_reason: String::new(),
            };
        }
    }

    let verdict = match history.last().map(|entry| entry.verdict) {
        Some(Verdict::Accept) => LoopVerdict::Accept,
        Some(Verdict::Terminate) => LoopVerdict::Terminate,
        // A trailing retry means the loop ran out of budget
        Some(Verdict::Retry) | None => LoopVerdict::MaxIterations,
    };

    LoopResult {
        session_id: session_id.to_string(),
        verdict,
        iterations: iterations.max(1),
        history,
        result_text,
        exit_reason: String::new(),
    }
}

impl std::fmt::Display for OnFail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnFail::Stop => f.write_str("stop"),
            OnFail::Continue => f.write_str("continue"),
            OnFail::Retry(n) => write!(f, "retry:{}", n),
        }
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;

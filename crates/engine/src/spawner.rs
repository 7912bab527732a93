// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session spawner.
//!
//! Order matters here: the tmux window is created before the session
//! record is saved, so a state-store observer can never see a running
//! session whose pane does not exist yet (it would be misread as
//! aborted). Conditional gates short-circuit before any window exists.

use crate::child;
use crate::error::EngineError;
use crate::summarize::clip;
use corral_core::rubric::CheckerSpec;
use corral_core::session::{Session, SessionState};
use corral_core::{ContractSpec, LoopState, PENDING_TASK};
use corral_mux::{window_name, Mux};
use corral_store::Store;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long to wait for the agent's startup hook to write `ready`.
const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Submit retries when the task file stays on the pending placeholder.
const SUBMIT_RETRIES: u32 = 5;

/// Options for [`spawn`].
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub prompt: String,
    pub alias: String,
    pub plan: bool,
    pub model: String,
    pub checker: String,
    pub checker_model: String,
    pub max_iterations: u32,
    pub skip_permissions: bool,
    /// Run only if this session failed or aborted; skip otherwise.
    pub on_fail: String,
    /// Run only if this session succeeded; skip otherwise.
    pub on_pass: String,
    /// Sessions whose results are injected as Prior Results.
    pub pipe_from: Vec<String>,
    pub file_scope: Vec<String>,
    pub verify: Vec<String>,
    pub termination: Vec<String>,
    pub pattern: String,
    pub phase: String,
    pub parent_intent: String,
    /// Forced session ID (iteration-indexed loop children).
    pub session_id: String,
}

impl SpawnOptions {
    pub fn new(prompt: impl Into<String>, checker: impl Into<String>) -> Self {
        SpawnOptions {
            prompt: prompt.into(),
            alias: String::new(),
            plan: false,
            model: String::new(),
            checker: checker.into(),
            checker_model: String::new(),
            max_iterations: 3,
            skip_permissions: false,
            on_fail: String::new(),
            on_pass: String::new(),
            pipe_from: Vec::new(),
            file_scope: Vec::new(),
            verify: Vec::new(),
            termination: Vec::new(),
            pattern: String::new(),
            phase: String::new(),
            parent_intent: String::new(),
            session_id: String::new(),
        }
    }
}

/// What spawn produced.
#[derive(Debug, Clone)]
pub struct SpawnOutcome {
    pub session_id: String,
    /// True when a conditional gate fired and no window was created.
    pub skipped: bool,
    /// Rubric file path when the checker spec is a file, for hot reload.
    pub rubric_path: String,
}

/// Create a session: conditional gate, alias check, ID allocation,
/// pane-first window creation, record save, eviction, contract delivery,
/// readiness wait. The loop itself is run by the caller.
pub async fn spawn(store: &Store, mux: &Mux, opts: &SpawnOptions) -> Result<SpawnOutcome, EngineError> {
    if !opts.on_fail.is_empty() {
        let (dep_id, dep_state) = load_dependency(store, "on-fail", &opts.on_fail)?;
        if dep_state == SessionState::Done {
            return create_skipped(store, opts, dep_id);
        }
    }
    if !opts.on_pass.is_empty() {
        let (dep_id, dep_state) = load_dependency(store, "on-pass", &opts.on_pass)?;
        if matches!(dep_state, SessionState::Failed | SessionState::Aborted) {
            return create_skipped(store, opts, dep_id);
        }
    }

    if !opts.alias.is_empty() {
        store.assert_alias_free(&opts.alias)?;
    }

    let parent = parent_from_env();
    let session_id = if opts.session_id.is_empty() {
        store.next_id(&parent)?
    } else {
        opts.session_id.clone()
    };

    let window = window_name(&session_id);
    let cwd = std::env::current_dir().map_err(|e| EngineError::io(PathBuf::from("."), e))?;
    let command = build_agent_command(opts);
    let window_env = build_window_env(&session_id, opts.skip_permissions);

    // Pane first, then the record
    mux.create_window(&window, &command, &cwd, &window_env).await?;
    let target = mux.target_for_window(&window);
    if let Err(err) = mux
        .set_pane_option(&target, "@corral_session_id", &session_id)
        .await
    {
        tracing::debug!(error = %err, "could not tag pane with session id");
    }
    let hook_cmd = child::hook_binary().display().to_string();
    if let Err(err) = mux.install_hooks(&hook_cmd).await {
        tracing::warn!(error = %err, "could not install tmux hooks");
    }

    let mut session = Session::new(session_id.clone(), parent, window.clone());
    session.alias = opts.alias.clone();
    store.save(&session)?;

    if let Err(err) = store.check_and_evict() {
        tracing::warn!(error = %err, "session eviction failed");
    }

    let contract = build_contract(store, opts)?;
    store.save_contract(&session_id, &contract)?;

    let rubric_path = match CheckerSpec::detect(&opts.checker) {
        CheckerSpec::RubricFile(path) => path.display().to_string(),
        _ => String::new(),
    };
    let mut loop_state = LoopState::new(opts.checker.clone(), opts.max_iterations);
    loop_state.rubric_path = rubric_path.clone();
    store.save_loop_state(&session_id, &loop_state)?;

    if !opts.termination.is_empty() {
        store.save_termination_criteria(&session_id, &opts.termination)?;
        store.save_max_iterations(&session_id, opts.max_iterations)?;
    }

    wait_for_ready(store, mux, &session_id, &window).await;

    // The priming command goes in as its own message so the agent runs
    // it as a command instead of reading it as prompt text.
    if mux.send_keys(&target, "/corral", true, false).await.is_ok() {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    mux.send_text(&target, &contract).await?;

    if !skip_ready_check() && task_still_pending(store, &session_id) {
        for _ in 0..SUBMIT_RETRIES {
            if wait_for_task_update(store, &session_id, Duration::from_secs(1)).await {
                break;
            }
            let _ = mux.send_keys(&target, "", true, false).await;
        }
        wait_for_task_update(store, &session_id, Duration::from_secs(1)).await;
    }

    Ok(SpawnOutcome {
        session_id,
        skipped: false,
        rubric_path,
    })
}

fn load_dependency(
    store: &Store,
    flag: &'static str,
    id_or_alias: &str,
) -> Result<(String, SessionState), EngineError> {
    let not_found = || EngineError::DependencyNotFound {
        flag,
        id: id_or_alias.to_string(),
    };
    let dep_id = store.resolve_id(id_or_alias)?.ok_or_else(not_found)?;
    let dep = store.load(&dep_id)?.ok_or_else(not_found)?;
    Ok((dep_id, dep.state))
}

/// A conditional gate fired: record the decision without a window and
/// without loop state, so a skipped session can never become a doer.
fn create_skipped(store: &Store, opts: &SpawnOptions, dep_id: String) -> Result<SpawnOutcome, EngineError> {
    if !opts.alias.is_empty() {
        store.assert_alias_free(&opts.alias)?;
    }
    let parent = parent_from_env();
    let session_id = if opts.session_id.is_empty() {
        store.next_id(&parent)?
    } else {
        opts.session_id.clone()
    };

    let mut session = Session::new(session_id.clone(), parent, "");
    session.task = first_line(&opts.prompt);
    session.state = SessionState::Skipped;
    session.alias = opts.alias.clone();
    session.depends_on = vec![dep_id];
    store.save(&session)?;

    Ok(SpawnOutcome {
        session_id,
        skipped: true,
        rubric_path: String::new(),
    })
}

fn parent_from_env() -> String {
    std::env::var("CORRAL_SESSION_ID").unwrap_or_default()
}

fn skip_ready_check() -> bool {
    env_flag("CORRAL_SKIP_READY_CHECK")
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn first_line(text: &str) -> String {
    clip(text.lines().next().unwrap_or(""), 80)
}

fn build_agent_command(opts: &SpawnOptions) -> String {
    let mut command =
        std::env::var("CORRAL_SPAWN_COMMAND").unwrap_or_else(|_| "claude".to_string());
    if command == "claude" {
        if opts.plan {
            command.push_str(" --permission-mode plan");
        }
        if !opts.model.is_empty() {
            command.push_str(&format!(" --model {}", shell_quote(&opts.model)));
        }
        if opts.skip_permissions {
            command.push_str(" --dangerously-skip-permissions");
        }
    }
    command
}

fn build_window_env(session_id: &str, skip_permissions: bool) -> Vec<(String, String)> {
    let mut env = vec![("CORRAL_SESSION_ID".to_string(), session_id.to_string())];
    if skip_permissions {
        env.push(("CORRAL_DANGEROUSLY_SKIP_PERMISSIONS".to_string(), "1".to_string()));
    }
    if let Ok(path) = std::env::var("PATH") {
        env.push(("PATH".to_string(), path));
    }
    for (key, value) in std::env::vars() {
        if key.starts_with("CLAUDE") || key.starts_with("ANTHROPIC") {
            env.push((key, value));
        }
    }
    env
}

fn build_contract(store: &Store, opts: &SpawnOptions) -> Result<String, EngineError> {
    let mut prior_results = Vec::new();
    for source in &opts.pipe_from {
        let Some(source_id) = store.resolve_id(source)? else {
            return Err(EngineError::DependencyNotFound {
                flag: "pipe",
                id: source.clone(),
            });
        };
        if let Some(result) = store.load_result(&source_id)? {
            if !result.is_empty() {
                prior_results.push(format!("**{}**: {}", source, result));
            }
        }
    }

    Ok(ContractSpec {
        prompt: opts.prompt.clone(),
        depends_on: Vec::new(),
        phase: opts.phase.clone(),
        pattern: opts.pattern.clone(),
        parent_intent: opts.parent_intent.clone(),
        prior_results,
        file_scope: opts.file_scope.clone(),
        verify: opts.verify.clone(),
        termination: opts.termination.clone(),
        max_iterations: (!opts.termination.is_empty()).then_some(opts.max_iterations),
    }
    .render())
}

async fn wait_for_ready(store: &Store, mux: &Mux, session_id: &str, window: &str) {
    if skip_ready_check() {
        tokio::time::sleep(Duration::from_millis(500)).await;
        return;
    }
    let deadline = Instant::now() + READY_TIMEOUT;
    while !store.is_ready(session_id) {
        if Instant::now() >= deadline {
            eprintln!(
                "Warning: agent did not signal ready within {}s\n\
                 \x20 Sending prompt anyway, but the session may not receive it correctly.\n\
                 \x20 Possible causes and fixes:\n\
                 \x20   - Agent slow to start: wait and retry\n\
                 \x20   - SessionStart hook not installed: run `corral setup`\n\
                 \x20   - Agent crashed: check window `tmux select-window -t {}:{}`",
                READY_TIMEOUT.as_secs(),
                mux.session_name(),
                window
            );
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    // The start hook fires before the input prompt is usable
    tokio::time::sleep(Duration::from_millis(300)).await;
}

fn task_still_pending(store: &Store, session_id: &str) -> bool {
    matches!(
        store.load_task(session_id),
        Ok(Some(task)) if task == PENDING_TASK
    )
}

async fn wait_for_task_update(store: &Store, session_id: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !task_still_pending(store, session_id) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    !task_still_pending(store, session_id)
}

/// Quote a string for inclusion in a /bin/sh command line.
fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;

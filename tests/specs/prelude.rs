//! Test helpers for the behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

/// Path to a built workspace binary, or `None` when it has not been
/// built (e.g. `cargo test -p` on just this package).
pub fn binary_path(name: &str) -> Option<PathBuf> {
    let candidate = assert_cmd::cargo::cargo_bin(name);
    candidate.exists().then_some(candidate)
}

/// An isolated corral invocation: fresh scope root, isolated tmux
/// socket, loop and readiness checks disabled, long-lived dummy agent.
pub struct Scope {
    pub dir: tempfile::TempDir,
    pub socket: String,
}

static SCOPE_COUNTER: AtomicU64 = AtomicU64::new(0);

impl Scope {
    pub fn new() -> Scope {
        let n = SCOPE_COUNTER.fetch_add(1, Ordering::SeqCst);
        Scope {
            dir: tempfile::TempDir::new().unwrap(),
            socket: format!("corral-spec-{}-{}", std::process::id(), n),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join(".corral")
    }

    pub fn session_dir(&self, id: &str) -> PathBuf {
        self.root().join("sessions").join(id)
    }

    /// A corral command in this scope, or `None` when the binary is not
    /// built (callers skip the spec).
    pub fn corral(&self) -> Option<Command> {
        let mut cmd = Command::new(binary_path("corral")?);
        cmd.current_dir(self.dir.path())
            .env("CORRAL_DIR", self.root())
            .env("CORRAL_SKIP_LOOP", "1")
            .env("CORRAL_SKIP_READY_CHECK", "1")
            .env("CORRAL_SUMMARY_COMMAND", "")
            .env("CORRAL_SPAWN_COMMAND", "sleep 60")
            .env("CORRAL_TMUX_SOCKET", &self.socket)
            .env("CORRAL_TMUX_SESSION", "corral-spec")
            .env_remove("CORRAL_SESSION_ID")
            .env_remove("TMUX");
        Some(cmd)
    }

    /// Write a session fixture directly through the store contract:
    /// one field per file, `state` last.
    pub fn write_session(&self, id: &str, state: &str) {
        let dir = self.session_dir(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("task"), "Build").unwrap();
        std::fs::write(dir.join("parent"), parent_of(id)).unwrap();
        std::fs::write(dir.join("tmux"), format!("corral-{}", id)).unwrap();
        std::fs::write(dir.join("created_at"), "2026-01-01T00:00:00Z").unwrap();
        std::fs::write(dir.join("state"), state).unwrap();
    }

    pub fn write_field(&self, id: &str, field: &str, value: &str) {
        std::fs::write(self.session_dir(id).join(field), value).unwrap();
    }

    pub fn read_field(&self, id: &str, field: &str) -> String {
        std::fs::read_to_string(self.session_dir(id).join(field)).unwrap()
    }

    pub fn set_next_id(&self, value: u64) {
        std::fs::create_dir_all(self.root()).unwrap();
        std::fs::write(self.root().join("next_id"), value.to_string()).unwrap();
    }

    pub fn kill_tmux(&self) {
        let _ = Command::new("tmux")
            .args(["-L", &self.socket, "kill-server"])
            .output();
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.kill_tmux();
    }
}

fn parent_of(id: &str) -> &str {
    // Mirrors the ID contract: iteration suffix first, then dotted tree
    if let Some(rest) = id.rfind('-').map(|i| &id[..i]) {
        if id.ends_with("-do") || id.ends_with("-check") {
            if let Some(base_end) = rest.rfind('-') {
                return &rest[..base_end];
            }
        }
    }
    match id.rfind('.') {
        Some(i) => &id[..i],
        None => "",
    }
}

/// Whether tmux can actually create sessions here (CI containers often
/// cannot). Specs that need a window skip when it cannot.
pub fn tmux_works() -> bool {
    let socket = format!("corral-spec-check-{}", std::process::id());
    let created = Command::new("tmux")
        .args(["-L", &socket, "new-session", "-d", "-s", "check"])
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    let _ = Command::new("tmux")
        .args(["-L", &socket, "kill-server"])
        .output();
    created
}

pub fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

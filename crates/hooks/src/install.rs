// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installation of agent-side integration artifacts.
//!
//! `corral setup` merges hook entries into the agent's settings file,
//! appends an orchestrator guide to the global CLAUDE.md, and installs
//! the `/corral` priming command. Each component's content hash is
//! stored under the global scope root; re-running setup skips
//! components whose hash matches.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Marker heading identifying the corral block in CLAUDE.md.
pub const CLAUDE_MD_MARKER: &str = "# Context Management with Corral";

const HOOK_BIN: &str = "corral-hook";

const CLAUDE_MD_CONTENT: &str = r#"# Context Management with Corral

## You Are an Orchestrator

Your primary role is to orchestrate subagents, not to do everything
yourself. Only perform a task in-session if it is trivial; anything that
needs exploration, multiple files, or multi-step implementation goes to a
subagent.

## Rules

1. NEVER use the Task tool; it is blocked and will fail
2. ALWAYS use `corral spawn` via Bash for subagent work
3. ALWAYS parallelize independent tasks by spawning multiple sessions
4. Every spawn declares its verification with --checker

## Commands

```bash
# Spawn a subagent (returns session ID)
id=$(corral spawn "implement user authentication" --checker "cargo test")

# Block until complete
corral wait $id

# Check progress without blocking
corral poll $id
```

## Nesting

Subagents can spawn children; the hierarchy is automatic. Session 0
spawns 0.0, 0.1, 0.2; session 0.0 spawns 0.0.0 and so on. A parent
completes only when all children complete.
"#;

const COMMAND_FILE_CONTENT: &str = r#"You are running inside a corral session. Your work is verified by a
checker after you finish; end with a clear summary of what you did.

- Use `corral spawn "<task>" --checker "<cmd>"` for subtasks
- Use `corral wait <id>` to block on spawned sessions
- Use `corral exit "<reason>"` if the task cannot succeed as specified
- Use `corral commit <pattern>` to commit to a working pattern
"#;

/// Settings fragment merged into the agent's settings.json.
fn hook_settings_fragment() -> Value {
    let entry = |matcher: &str, command: &str| {
        json!({
            "matcher": matcher,
            "hooks": [{"type": "command", "command": command}],
        })
    };
    json!({
        "PreToolUse": [entry(
            "Task",
            "echo 'BLOCKED: Use corral spawn instead of the Task tool.' && exit 1",
        )],
        "PostToolUse": [entry("*", &format!("{} activity", HOOK_BIN))],
        // task rewrites the pending placeholder; pattern-reinject emits
        // the committed pattern state back into context on every prompt
        "UserPromptSubmit": [
            entry("*", &format!("{} task", HOOK_BIN)),
            entry("*", &format!("{} pattern-reinject", HOOK_BIN)),
        ],
        "SessionStart": [entry("*", &format!("{} ready", HOOK_BIN))],
        "Stop": [entry("*", &format!("{} stop", HOOK_BIN))],
    })
}

/// Short content hash for installed-component version tracking.
pub fn component_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Installer rooted at the agent config dir and the global scope root.
#[derive(Debug, Clone)]
pub struct Installer {
    claude_dir: PathBuf,
    global_root: PathBuf,
}

impl Installer {
    pub fn new(claude_dir: impl Into<PathBuf>, global_root: impl Into<PathBuf>) -> Installer {
        Installer {
            claude_dir: claude_dir.into(),
            global_root: global_root.into(),
        }
    }

    /// Standard locations: `~/.claude` and `~/.corral`.
    pub fn from_home() -> Option<Installer> {
        let home = dirs::home_dir()?;
        Some(Installer::new(home.join(".claude"), home.join(".corral")))
    }

    pub fn settings_path(&self) -> PathBuf {
        self.claude_dir.join("settings.json")
    }

    pub fn claude_md_path(&self) -> PathBuf {
        self.claude_dir.join("CLAUDE.md")
    }

    pub fn command_file_path(&self) -> PathBuf {
        self.claude_dir.join("commands").join("corral.md")
    }

    fn hash_path(&self, component: &str) -> PathBuf {
        self.global_root.join("installed").join(component)
    }

    /// Install all components. Returns the names of components that
    /// actually changed; up-to-date ones are skipped by hash.
    pub fn setup(&self) -> io::Result<Vec<String>> {
        let mut installed = Vec::new();

        let fragment = hook_settings_fragment();
        let settings_content = fragment.to_string();
        if self.install_component("settings-hooks", &settings_content, |this| {
            this.install_settings_hooks(&fragment)
        })? {
            installed.push("settings-hooks".to_string());
        }

        if self.install_component("claude-md", CLAUDE_MD_CONTENT, |this| {
            this.install_claude_md()
        })? {
            installed.push("claude-md".to_string());
        }

        if self.install_component("command-file", COMMAND_FILE_CONTENT, |this| {
            this.install_command_file()
        })? {
            installed.push("command-file".to_string());
        }

        Ok(installed)
    }

    /// Remove corral-owned entries, leaving everything else intact.
    pub fn uninstall(&self) -> io::Result<()> {
        self.uninstall_settings_hooks()?;
        self.uninstall_claude_md()?;
        let command_file = self.command_file_path();
        if command_file.exists() {
            fs::remove_file(&command_file)?;
        }
        let installed_dir = self.global_root.join("installed");
        if installed_dir.exists() {
            fs::remove_dir_all(&installed_dir)?;
        }
        Ok(())
    }

    fn install_component(
        &self,
        name: &str,
        content: &str,
        apply: impl FnOnce(&Installer) -> io::Result<()>,
    ) -> io::Result<bool> {
        let hash = component_hash(content);
        let hash_path = self.hash_path(name);
        if let Ok(stored) = fs::read_to_string(&hash_path) {
            if stored.trim() == hash {
                return Ok(false);
            }
        }
        apply(self)?;
        if let Some(parent) = hash_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&hash_path, &hash)?;
        Ok(true)
    }

    fn install_settings_hooks(&self, fragment: &Value) -> io::Result<()> {
        fs::create_dir_all(&self.claude_dir)?;
        let settings_path = self.settings_path();
        let mut settings: Value = match fs::read_to_string(&settings_path) {
            Ok(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?,
            _ => json!({}),
        };

        let hooks = settings
            .as_object_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "settings is not an object"))?
            .entry("hooks")
            .or_insert_with(|| json!({}));
        merge_hook_fragment(hooks, fragment);

        fs::write(&settings_path, serde_json::to_string_pretty(&settings)?)
    }

    fn uninstall_settings_hooks(&self) -> io::Result<()> {
        let settings_path = self.settings_path();
        let Ok(raw) = fs::read_to_string(&settings_path) else {
            return Ok(());
        };
        if raw.trim().is_empty() {
            return Ok(());
        }
        let mut settings: Value = serde_json::from_str(&raw)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let mut drop_hooks_key = false;
        if let Some(hooks) = settings.get_mut("hooks").and_then(Value::as_object_mut) {
            remove_corral_entries(hooks);
            drop_hooks_key = hooks.is_empty();
        }
        if drop_hooks_key {
            if let Some(obj) = settings.as_object_mut() {
                obj.remove("hooks");
            }
        }
        fs::write(&settings_path, serde_json::to_string_pretty(&settings)?)
    }

    fn install_claude_md(&self) -> io::Result<()> {
        fs::create_dir_all(&self.claude_dir)?;
        let path = self.claude_md_path();
        let content = match fs::read_to_string(&path) {
            Ok(existing) if existing.contains(CLAUDE_MD_MARKER) => return Ok(()),
            Ok(existing) => format!("{}\n\n{}", existing.trim_end(), CLAUDE_MD_CONTENT),
            Err(_) => CLAUDE_MD_CONTENT.to_string(),
        };
        fs::write(&path, content)
    }

    fn uninstall_claude_md(&self) -> io::Result<()> {
        let path = self.claude_md_path();
        let Ok(existing) = fs::read_to_string(&path) else {
            return Ok(());
        };
        let Some(start) = existing.find(CLAUDE_MD_MARKER) else {
            return Ok(());
        };
        let remaining = existing[..start].trim_end();
        if remaining.is_empty() {
            fs::remove_file(&path)
        } else {
            fs::write(&path, format!("{}\n", remaining))
        }
    }

    fn install_command_file(&self) -> io::Result<()> {
        let path = self.command_file_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, COMMAND_FILE_CONTENT)
    }
}

/// Merge the fragment's per-event entries, skipping commands that are
/// already present so repeated setup never duplicates hooks.
fn merge_hook_fragment(hooks: &mut Value, fragment: &Value) {
    let Some(fragment) = fragment.as_object() else {
        return;
    };
    let Some(hooks) = hooks.as_object_mut() else {
        return;
    };
    for (event, entries) in fragment {
        let existing = hooks.entry(event.clone()).or_insert_with(|| json!([]));
        let Some(existing) = existing.as_array_mut() else {
            continue;
        };
        let known: Vec<String> = existing.iter().filter_map(entry_command).collect();
        if let Some(entries) = entries.as_array() {
            for entry in entries {
                match entry_command(entry) {
                    Some(command) if known.contains(&command) => {}
                    _ => existing.push(entry.clone()),
                }
            }
        }
    }
}

fn remove_corral_entries(hooks: &mut Map<String, Value>) {
    let events: Vec<String> = hooks.keys().cloned().collect();
    for event in events {
        if let Some(entries) = hooks.get_mut(&event).and_then(Value::as_array_mut) {
            entries.retain(|entry| {
                !entry_command(entry)
                    .map(|command| command.contains(HOOK_BIN) || command.contains("corral spawn"))
                    .unwrap_or(false)
            });
            if entries.is_empty() {
                hooks.remove(&event);
            }
        }
    }
}

fn entry_command(entry: &Value) -> Option<String> {
    entry
        .pointer("/hooks/0/command")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;

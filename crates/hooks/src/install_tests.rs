// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn installer() -> (TempDir, Installer) {
    let dir = TempDir::new().unwrap();
    let installer = Installer::new(dir.path().join(".claude"), dir.path().join(".corral"));
    (dir, installer)
}

fn settings(installer: &Installer) -> Value {
    serde_json::from_str(&std::fs::read_to_string(installer.settings_path()).unwrap()).unwrap()
}

#[test]
fn setup_installs_all_components() {
    let (_dir, installer) = installer();
    let installed = installer.setup().unwrap();
    assert_eq!(installed, ["settings-hooks", "claude-md", "command-file"]);

    let settings = settings(&installer);
    for event in ["PreToolUse", "PostToolUse", "UserPromptSubmit", "SessionStart", "Stop"] {
        assert!(settings["hooks"][event].is_array(), "{} missing", event);
    }
    // UserPromptSubmit carries both the task rewrite and the
    // pattern-reinject drift guard
    let prompt_hooks = settings["hooks"]["UserPromptSubmit"].as_array().unwrap();
    assert_eq!(prompt_hooks.len(), 2);
    assert_eq!(prompt_hooks[0]["hooks"][0]["command"], "corral-hook task");
    assert_eq!(
        prompt_hooks[1]["hooks"][0]["command"],
        "corral-hook pattern-reinject"
    );
    assert!(std::fs::read_to_string(installer.claude_md_path())
        .unwrap()
        .contains(CLAUDE_MD_MARKER));
    assert!(installer.command_file_path().exists());
}

#[test]
fn setup_is_a_noop_when_hashes_match() {
    let (_dir, installer) = installer();
    installer.setup().unwrap();
    let second = installer.setup().unwrap();
    assert!(second.is_empty());
}

#[test]
fn setup_preserves_foreign_hooks() {
    let (_dir, installer) = installer();
    std::fs::create_dir_all(installer.settings_path().parent().unwrap()).unwrap();
    std::fs::write(
        installer.settings_path(),
        serde_json::json!({
            "hooks": {
                "Stop": [{"matcher": "*", "hooks": [{"type": "command", "command": "my-other-tool"}]}]
            },
            "theme": "dark"
        })
        .to_string(),
    )
    .unwrap();

    installer.setup().unwrap();
    let settings = settings(&installer);
    assert_eq!(settings["theme"], "dark");
    let stop = settings["hooks"]["Stop"].as_array().unwrap();
    assert_eq!(stop.len(), 2);
}

#[test]
fn repeated_install_does_not_duplicate_hooks() {
    let (_dir, installer) = installer();
    installer.setup().unwrap();
    // Force a reinstall by clearing the stored hash
    std::fs::remove_dir_all(installer.hash_path("settings-hooks").parent().unwrap()).unwrap();
    installer.setup().unwrap();

    let settings = settings(&installer);
    assert_eq!(settings["hooks"]["Stop"].as_array().unwrap().len(), 1);
    assert_eq!(settings["hooks"]["UserPromptSubmit"].as_array().unwrap().len(), 2);
}

#[test]
fn claude_md_appends_to_existing_content() {
    let (_dir, installer) = installer();
    std::fs::create_dir_all(installer.claude_md_path().parent().unwrap()).unwrap();
    std::fs::write(installer.claude_md_path(), "# My Rules\n\nBe kind.\n").unwrap();

    installer.setup().unwrap();
    let content = std::fs::read_to_string(installer.claude_md_path()).unwrap();
    assert!(content.starts_with("# My Rules"));
    assert!(content.contains(CLAUDE_MD_MARKER));
}

#[test]
fn uninstall_removes_only_corral_artifacts() {
    let (_dir, installer) = installer();
    std::fs::create_dir_all(installer.settings_path().parent().unwrap()).unwrap();
    std::fs::write(
        installer.settings_path(),
        serde_json::json!({
            "hooks": {
                "Stop": [{"matcher": "*", "hooks": [{"type": "command", "command": "my-other-tool"}]}]
            }
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(installer.claude_md_path(), "# My Rules\n").unwrap();

    installer.setup().unwrap();
    installer.uninstall().unwrap();

    let settings = settings(&installer);
    let stop = settings["hooks"]["Stop"].as_array().unwrap();
    assert_eq!(stop.len(), 1);
    assert_eq!(stop[0]["hooks"][0]["command"], "my-other-tool");
    assert!(settings["hooks"].get("PostToolUse").is_none());

    let claude_md = std::fs::read_to_string(installer.claude_md_path()).unwrap();
    assert!(claude_md.contains("# My Rules"));
    assert!(!claude_md.contains(CLAUDE_MD_MARKER));

    assert!(!installer.command_file_path().exists());
}

#[test]
fn uninstall_without_install_is_a_noop() {
    let (_dir, installer) = installer();
    installer.uninstall().unwrap();
}

#[test]
fn component_hash_is_stable_and_short() {
    assert_eq!(component_hash("abc"), component_hash("abc"));
    assert_ne!(component_hash("abc"), component_hash("abd"));
    assert_eq!(component_hash("abc").len(), 16);
}

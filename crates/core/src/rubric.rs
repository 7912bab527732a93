// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rubric parsing and checker-spec sugar.
//!
//! A rubric is a markdown file with optional `## Gates`, `## Criteria`,
//! `## Nice to Have`, and `## Notes` sections. Bare shell-command and
//! `agent:` checkers are sugar for single-section rubrics.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Parsed rubric with optional sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rubric {
    pub title: String,
    /// Shell commands from backtick-wrapped list items under `## Gates`.
    pub gates: Vec<String>,
    /// Must-have natural-language criteria.
    pub criteria: Vec<String>,
    /// Advisory criteria.
    pub nice_to_have: Vec<String>,
    /// Free-form context.
    pub notes: String,
}

impl Rubric {
    pub fn has_gates(&self) -> bool {
        !self.gates.is_empty()
    }

    pub fn has_criteria(&self) -> bool {
        !self.criteria.is_empty() || !self.nice_to_have.is_empty()
    }
}

/// Tagged checker specification.
///
/// Detection rules: `agent:` prefix wins, then `.md`/`.markdown` extension
/// or an existing file, then shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckerSpec {
    Shell(String),
    Agent(String),
    RubricFile(PathBuf),
}

impl CheckerSpec {
    pub fn detect(raw: &str) -> CheckerSpec {
        if let Some(prompt) = raw.strip_prefix("agent:") {
            return CheckerSpec::Agent(prompt.trim().to_string());
        }
        let path = Path::new(raw);
        let looks_like_rubric = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("md") | Some("markdown")
        );
        if looks_like_rubric || path.is_file() {
            return CheckerSpec::RubricFile(path.to_path_buf());
        }
        CheckerSpec::Shell(raw.to_string())
    }
}

/// Convert checker sugar to rubric markdown.
///
/// A shell command becomes a one-gate rubric; an `agent:` prompt becomes a
/// one-criterion rubric. File paths are read directly, not converted, so
/// they return `None`.
pub fn sugar_to_rubric(checker: &str) -> Option<String> {
    match CheckerSpec::detect(checker) {
        CheckerSpec::Agent(prompt) => Some(format!("## Criteria\n- {}\n", prompt)),
        CheckerSpec::Shell(command) => Some(format!("## Gates\n- `{}`\n", command)),
        CheckerSpec::RubricFile(_) => None,
    }
}

/// Short content hash for rubric change tracking (first 8 hex chars of
/// SHA-256 over the raw bytes).
pub fn rubric_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        // 4 bytes -> 8 hex chars
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Parse rubric markdown into structured sections.
///
/// Gate items must be `` - `command` ``; items without backticks are
/// ignored. Unknown `##` sections are ignored. An optional leading
/// `# Title` becomes the title.
pub fn parse_rubric(text: &str) -> Rubric {
    let mut rubric = Rubric::default();

    let trimmed = text.trim();
    if let Some(first) = trimmed.lines().next() {
        if let Some(title) = heading_text(first, "# ") {
            rubric.title = title.to_string();
        }
    }

    let mut section: Option<String> = None;
    for line in text.lines() {
        if let Some(heading) = heading_text(line, "## ") {
            section = Some(heading.to_lowercase());
            continue;
        }
        let Some(name) = section.as_deref() else {
            continue;
        };
        match name {
            "gates" => {
                if let Some(command) = backtick_item(line) {
                    rubric.gates.push(command.to_string());
                }
            }
            "criteria" => {
                if let Some(item) = list_item(line) {
                    rubric.criteria.push(item.to_string());
                }
            }
            "nice to have" | "nice-to-have" => {
                if let Some(item) = list_item(line) {
                    rubric.nice_to_have.push(item.to_string());
                }
            }
            "notes" => {
                if !rubric.notes.is_empty() {
                    rubric.notes.push('\n');
                }
                rubric.notes.push_str(line);
            }
            _ => {}
        }
    }
    rubric.notes = rubric.notes.trim().to_string();
    rubric
}

fn heading_text<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.trim().strip_prefix(marker)?;
    // "# Title" but not "## Section"
    let rest = rest.trim();
    (!rest.is_empty() && !rest.starts_with('#')).then_some(rest)
}

fn list_item(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("- ")?.trim();
    (!rest.is_empty()).then_some(rest)
}

fn backtick_item(line: &str) -> Option<&str> {
    let rest = list_item(line)?.strip_prefix('`')?;
    let end = rest.find('`')?;
    (end > 0).then(|| &rest[..end])
}

#[cfg(test)]
#[path = "rubric_tests.rs"]
mod tests;

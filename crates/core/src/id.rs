// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session ID algebra.
//!
//! IDs have two layers: a dotted tree segment (`0`, `2.1`, `2.1.3`) and an
//! optional iteration suffix `-<iter>-<role>` used for loop children
//! (`2.1-0-check`, `2.1-1-do`). The suffix never nests: a loop child is
//! itself a plain session.

use serde::{Deserialize, Serialize};

/// Role of a loop child session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Do,
    Check,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Do => "do",
            Role::Check => "check",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "do" => Some(Role::Do),
            "check" => Some(Role::Check),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build an iteration-indexed session ID for a loop child.
///
/// `iter_session_id("2.1", 0, Role::Check)` is `"2.1-0-check"`.
pub fn iter_session_id(loop_id: &str, iteration: u32, role: Role) -> String {
    format!("{}-{}-{}", loop_id, iteration, role.as_str())
}

/// Split an iteration suffix off an ID, if present.
///
/// Returns `(base, iteration, role)` for IDs like `"2.1-0-check"`, `None`
/// for plain dotted IDs.
pub fn iter_suffix(id: &str) -> Option<(&str, u32, Role)> {
    let (rest, role_str) = id.rsplit_once('-')?;
    let role = Role::parse(role_str)?;
    let (base, iter_str) = rest.rsplit_once('-')?;
    if base.is_empty() {
        return None;
    }
    let iteration: u32 = iter_str.parse().ok()?;
    Some((base, iteration, role))
}

/// Parent of a session ID; empty string for roots.
///
/// Understands both layers: `parent_of("2.1-0-check") == "2.1"`,
/// `parent_of("2.1") == "2"`, `parent_of("0") == ""`.
pub fn parent_of(id: &str) -> &str {
    if let Some((base, _, _)) = iter_suffix(id) {
        return base;
    }
    match id.rsplit_once('.') {
        Some((parent, _)) => parent,
        None => "",
    }
}

/// Sort key for sibling ordering in the session tree.
///
/// The tuple is the tree integers followed by `(iteration, role)`; plain
/// IDs use `(-1, "")` as their final pair so they precede every iteration
/// child of the same base: `"2.1" < "2.1-0-check" < "2.1-0-do" <
/// "2.1-1-check"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    tree: Vec<u64>,
    iter: i64,
    role: &'static str,
}

pub fn sort_key(id: &str) -> SortKey {
    let (base, iter, role) = match iter_suffix(id) {
        Some((base, iteration, role)) => (base, i64::from(iteration), role.as_str()),
        None => (id, -1, ""),
    };
    let tree = base
        .split('.')
        // Non-numeric segments sort last; IDs are numeric by construction.
        .map(|seg| seg.parse().unwrap_or(u64::MAX))
        .collect();
    SortKey { tree, iter, role }
}

/// Nesting depth: number of ancestors between this ID and a root.
pub fn depth(id: &str) -> usize {
    let mut current = parent_of(id);
    let mut n = 0;
    while !current.is_empty() {
        n += 1;
        current = parent_of(current);
    }
    n
}

/// Whether `id` is a descendant of `ancestor` (transitively, through
/// either dotted children or iteration children).
pub fn is_descendant_of(id: &str, ancestor: &str) -> bool {
    let mut current = parent_of(id);
    while !current.is_empty() {
        if current == ancestor {
            return true;
        }
        current = parent_of(current);
    }
    false
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

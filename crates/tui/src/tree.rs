// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session tree model.
//!
//! Rebuilt from the store on every refresh: sessions grouped by parent,
//! siblings ordered by the composite sort key, loop sessions expanded
//! into a loop header plus one row per iteration. Loop children
//! (`<id>-<n>-do` / `-check`) are represented by their iteration row,
//! not as plain children.

use corral_core::id::{parent_of, sort_key};
use corral_core::loop_state::LoopState;
use corral_core::session::Session;
use std::collections::{HashMap, HashSet};

const TASK_WIDTH: usize = 40;
const ACTIVITY_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Session,
    LoopHeader,
    Iteration,
}

/// One display row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Stable selection key (`<id>`, `<id>/loop`, `<id>/iter/<n>`).
    pub key: String,
    /// Session the row belongs to (target of abort/attach actions).
    pub session_id: String,
    pub kind: RowKind,
    pub depth: usize,
    pub id_text: String,
    pub task: String,
    pub state: String,
    pub activity: String,
}

/// Build display rows from a session snapshot.
pub fn build_rows(
    sessions: &[Session],
    loops: &HashMap<String, LoopState>,
    activities: &HashMap<String, String>,
    collapsed: &HashSet<String>,
) -> Vec<Row> {
    let by_id: HashMap<&str, &Session> = sessions.iter().map(|s| (s.id.as_str(), s)).collect();

    // Children keyed by parent; sessions whose parent is not loaded
    // (evicted or foreign) surface as roots.
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut roots: Vec<&str> = Vec::new();
    for session in sessions {
        let parent = parent_of(&session.id);
        if !parent.is_empty() && by_id.contains_key(parent) {
            children.entry(parent).or_default().push(&session.id);
        } else {
            roots.push(&session.id);
        }
    }
    roots.sort_by_key(|id| sort_key(id));
    for siblings in children.values_mut() {
        siblings.sort_by_key(|id| sort_key(id));
    }

    let mut rows = Vec::new();
    for root in roots {
        emit(root, 0, &by_id, &children, loops, activities, collapsed, &mut rows);
    }
    rows
}

#[allow(clippy::too_many_arguments)]
fn emit(
    id: &str,
    depth: usize,
    by_id: &HashMap<&str, &Session>,
    children: &HashMap<&str, Vec<&str>>,
    loops: &HashMap<String, LoopState>,
    activities: &HashMap<String, String>,
    collapsed: &HashSet<String>,
    rows: &mut Vec<Row>,
) {
    let Some(session) = by_id.get(id) else {
        return;
    };

    rows.push(Row {
        key: id.to_string(),
        session_id: id.to_string(),
        kind: RowKind::Session,
        depth,
        id_text: id.to_string(),
        task: truncate(non_empty_task(&session.task), TASK_WIDTH),
        state: session.state.to_string(),
        activity: activities
            .get(id)
            .map(|activity| truncate(activity, ACTIVITY_WIDTH))
            .unwrap_or_else(|| "-".to_string()),
    });

    if collapsed.contains(id) {
        return;
    }

    // Sessions represented by iteration rows instead of plain child rows
    let mut covered: HashSet<&str> = HashSet::new();

    if let Some(loop_state) = loops.get(id) {
        if !loop_state.history.is_empty() {
            rows.push(Row {
                key: format!("{}/loop", id),
                session_id: id.to_string(),
                kind: RowKind::LoopHeader,
                depth: depth + 1,
                id_text: "loop".to_string(),
                task: truncate(&loop_state.checker, TASK_WIDTH),
                state: format!(
                    "{}/{}",
                    loop_state.current_iteration + 1,
                    loop_state.max_iterations
                ),
                activity: "-".to_string(),
            });

            for entry in &loop_state.history {
                if entry.doer_session != id {
                    covered.insert(entry.doer_session.as_str());
                }
                let detail = match &entry.checker_session {
                    Some(checker) => {
                        covered.insert(checker.as_str());
                        entry
                            .criteria_summary
                            .clone()
                            .unwrap_or_else(|| checker.clone())
                    }
                    None => {
                        // Gates-only: no child session, show the gate tally
                        let gates = entry.gates.as_deref().unwrap_or(&[]);
                        let passed = gates.iter().filter(|gate| gate.passed()).count();
                        let mut summary = format!("{}/{} gates", passed, gates.len());
                        if let Some(criteria) = &entry.criteria_summary {
                            summary.push_str("  ");
                            summary.push_str(criteria);
                        }
                        summary
                    }
                };
                rows.push(Row {
                    key: format!("{}/iter/{}", id, entry.iteration),
                    session_id: entry.doer_session.clone(),
                    kind: RowKind::Iteration,
                    depth: depth + 2,
                    id_text: format!("iter {}", entry.iteration),
                    task: truncate(&detail, TASK_WIDTH),
                    state: entry.verdict.to_string(),
                    activity: "-".to_string(),
                });
            }
        }
    }

    if let Some(kids) = children.get(id) {
        for kid in kids {
            if covered.contains(kid) {
                continue;
            }
            emit(kid, depth + 1, by_id, children, loops, activities, collapsed, rows);
        }
    }
}

/// Index of the row to select after a refresh.
///
/// Prefers the exact previous key, then walks up the parent chain of
/// the key's session, then falls back to the top.
pub fn restore_selection(rows: &[Row], previous_key: &str) -> usize {
    if previous_key.is_empty() {
        return 0;
    }
    if let Some(index) = rows.iter().position(|row| row.key == previous_key) {
        return index;
    }
    let mut ancestor = previous_key.split('/').next().unwrap_or("");
    while !ancestor.is_empty() {
        if let Some(index) = rows.iter().position(|row| row.key == ancestor) {
            return index;
        }
        ancestor = parent_of(ancestor);
    }
    0
}

fn non_empty_task(task: &str) -> &str {
    if task.is_empty() {
        corral_core::PENDING_TASK
    } else {
        task
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let clipped: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", clipped)
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;

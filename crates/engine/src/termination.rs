// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination-criteria evaluation.
//!
//! Command criteria run as subprocesses with a bounded timeout;
//! descriptive criteria always fail with an explanatory detail. The
//! recommendation is terminate when everything passes or the iteration
//! budget is spent, iterate otherwise.

use corral_core::termination::{is_command, TerminationCheck, TerminationResult};
use corral_mux::subprocess::CRITERION_TIMEOUT;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Check a single criterion.
pub async fn run_criterion(criterion: &str, cwd: &Path) -> TerminationCheck {
    run_criterion_with_timeout(criterion, cwd, CRITERION_TIMEOUT).await
}

pub(crate) async fn run_criterion_with_timeout(
    criterion: &str,
    cwd: &Path,
    timeout: Duration,
) -> TerminationCheck {
    if !is_command(criterion) {
        return TerminationCheck {
            criterion: criterion.to_string(),
            passed: false,
            detail: "descriptive criterion — cannot be automatically verified".to_string(),
        };
    }

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(criterion).current_dir(cwd);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_elapsed) => TerminationCheck {
            criterion: criterion.to_string(),
            passed: false,
            detail: "command timed out".to_string(),
        },
        Ok(Err(os_err)) => TerminationCheck {
            criterion: criterion.to_string(),
            passed: false,
            detail: format!("execution error: {}", os_err),
        },
        Ok(Ok(output)) => {
            let passed = output.status.success();
            let detail = if passed {
                String::new()
            } else {
                // Last line of stderr (or stdout) as a one-line diagnostic
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let text = if stderr.is_empty() {
                    String::from_utf8_lossy(&output.stdout).trim().to_string()
                } else {
                    stderr
                };
                text.lines()
                    .last()
                    .map(|line| crate::summarize::clip(line, 200))
                    .unwrap_or_default()
            };
            TerminationCheck {
                criterion: criterion.to_string(),
                passed,
                detail,
            }
        }
    }
}

/// Evaluate all criteria and produce a recommendation.
pub async fn evaluate_termination(
    criteria: &[String],
    iteration: u32,
    max_iterations: u32,
    cwd: &Path,
) -> TerminationResult {
    let mut checks = Vec::with_capacity(criteria.len());
    for criterion in criteria {
        checks.push(run_criterion(criterion, cwd).await);
    }

    let all_passed = checks.iter().all(|check| check.passed);
    let failed: Vec<&str> = checks
        .iter()
        .filter(|check| !check.passed)
        .map(|check| check.criterion.as_str())
        .collect();

    let (recommend_terminate, reason) = if all_passed {
        (true, "all criteria passed".to_string())
    } else if iteration >= max_iterations {
        (
            true,
            format!(
                "max iterations ({}) reached; still failing: {}",
                max_iterations,
                failed.join(", ")
            ),
        )
    } else {
        (false, format!("criteria not met: {}", failed.join(", ")))
    };

    TerminationResult {
        checks,
        iteration,
        max_iterations,
        recommend_terminate,
        reason,
    }
}

#[cfg(test)]
#[path = "termination_tests.rs"]
mod tests;

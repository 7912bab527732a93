// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow command executes a workflow description file.

use crate::diag;
use anyhow::Result;
use corral_engine::Workflow;
use corral_store::Store;
use std::path::Path;
use std::process::ExitCode;

pub async fn run(file: &Path) -> Result<ExitCode> {
    let workflow = match Workflow::load(file) {
        Ok(workflow) => workflow,
        Err(err) => return Ok(diag::engine_error(err)),
    };

    let store = Store::from_env();
    eprintln!("Workflow '{}': {} phase(s)", workflow.name, workflow.phases().len());

    let results = match workflow.run(&store).await {
        Ok(results) => results,
        Err(err) => return Ok(diag::engine_error(err)),
    };

    let mut all_passed = results.len() == workflow.phases().len();
    for result in &results {
        let status = if result.passed { "passed" } else { "failed" };
        eprintln!(
            "Phase '{}': {} (verdict: {}, session {})",
            result.phase,
            status,
            result.verdict(),
            result.loop_result.session_id
        );
        if !result.passed {
            all_passed = false;
        }
    }

    if all_passed {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The setup and uninstall commands for agent-side integration.

use anyhow::Result;
use corral_hooks::Installer;
use corral_mux::Mux;
use std::process::ExitCode;

pub async fn setup() -> Result<ExitCode> {
    let Some(installer) = Installer::from_home() else {
        anyhow::bail!("could not determine the home directory");
    };

    let installed = installer.setup()?;
    if installed.is_empty() {
        println!("Everything up to date.");
    } else {
        for component in &installed {
            println!("Installed {}", component);
        }
    }

    // Best effort: the tmux hook needs a running server and is
    // reinstalled on every spawn anyway
    let mux = Mux::from_env();
    if mux.has_session().await.unwrap_or(false) {
        let hook_bin = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("corral-hook")))
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "corral-hook".to_string());
        if let Err(err) = mux.install_hooks(&hook_bin).await {
            eprintln!("Warning: could not install tmux hooks: {}", err);
        } else {
            println!("Installed tmux hooks");
        }
    }

    Ok(ExitCode::SUCCESS)
}

pub fn uninstall() -> Result<ExitCode> {
    let Some(installer) = Installer::from_home() else {
        anyhow::bail!("could not determine the home directory");
    };
    installer.uninstall()?;
    println!("Removed corral integration artifacts.");
    Ok(ExitCode::SUCCESS)
}

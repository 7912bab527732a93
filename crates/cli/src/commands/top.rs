// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top command launches the TUI, wrapping into tmux when necessary.

use anyhow::Result;
use corral_mux::Mux;
use corral_store::Store;
use corral_tui::App;
use std::process::ExitCode;

pub async fn run() -> Result<ExitCode> {
    let mux = Mux::from_env();

    // Outside tmux: exec into a tmux client running `corral top`
    if std::env::var_os("TMUX").is_none() {
        return exec_into_tmux(&mux).await;
    }

    let mut app = App::new(Store::from_env());
    app.run()?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(unix)]
async fn exec_into_tmux(mux: &Mux) -> Result<ExitCode> {
    use std::os::unix::process::CommandExt;

    let mut command = std::process::Command::new("tmux");
    if let Some(socket) = mux.socket() {
        command.args(["-L", socket]);
    }
    if mux.has_session().await.unwrap_or(false) {
        command.args(["attach-session", "-t", mux.session_name()]);
    } else {
        let corral = std::env::current_exe()?;
        command.args(["new-session", "-s", mux.session_name()]);
        command.arg(corral);
        command.arg("top");
    }
    // Only returns on failure
    let err = command.exec();
    Err(err.into())
}

#[cfg(not(unix))]
async fn exec_into_tmux(_mux: &Mux) -> Result<ExitCode> {
    anyhow::bail!("corral top requires tmux")
}

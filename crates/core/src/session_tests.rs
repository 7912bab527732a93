// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_session_is_running_with_pending_task() {
    let session = Session::new("0", "", "corral-0");
    assert_eq!(session.id, "0");
    assert_eq!(session.task, PENDING_TASK);
    assert_eq!(session.parent, "");
    assert_eq!(session.state, SessionState::Running);
    assert_eq!(session.tmux_window, "corral-0");
    assert!(session.alias.is_empty());
    assert!(session.depends_on.is_empty());
    assert!(!session.is_terminal());
}

#[yare::parameterized(
    running = { SessionState::Running, false },
    done    = { SessionState::Done,    true },
    aborted = { SessionState::Aborted, true },
    failed  = { SessionState::Failed,  true },
    exited  = { SessionState::Exited,  true },
    skipped = { SessionState::Skipped, true },
)]
fn terminal_states(state: SessionState, expected: bool) {
    assert_eq!(state.is_terminal(), expected);
}

#[test]
fn state_roundtrips_through_str() {
    for state in [
        SessionState::Running,
        SessionState::Done,
        SessionState::Aborted,
        SessionState::Failed,
        SessionState::Exited,
        SessionState::Skipped,
    ] {
        assert_eq!(state.as_str().parse::<SessionState>().unwrap(), state);
    }
}

#[test]
fn state_parse_trims_whitespace() {
    assert_eq!("running\n".parse::<SessionState>().unwrap(), SessionState::Running);
}

#[test]
fn state_parse_rejects_unknown() {
    let err = "bogus".parse::<SessionState>().unwrap_err();
    assert!(err.to_string().contains("bogus"));
}

#[test]
fn state_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&SessionState::Skipped).unwrap(), "\"skipped\"");
}

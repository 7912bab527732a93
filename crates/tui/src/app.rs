// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `corral top` application.
//!
//! A ratatui table over the session tree, refreshed from the store when
//! the filesystem watcher fires (or every couple of seconds as a
//! backstop). Selection and collapse state survive refreshes.

use crate::tree::{build_rows, restore_selection, Row, RowKind};
use crate::watcher::RefreshWatcher;
use corral_core::session::SessionState;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use corral_store::Store;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Row as TableRow, Table, TableState};
use ratatui::Terminal;
use std::collections::{HashMap, HashSet};
use std::io;
use std::time::{Duration, Instant};

const FRAME_POLL: Duration = Duration::from_millis(250);
const PERIODIC_REFRESH: Duration = Duration::from_secs(2);

pub struct App {
    store: Store,
    rows: Vec<Row>,
    selected: usize,
    selected_key: String,
    collapsed: HashSet<String>,
    running_count: usize,
    last_refresh: Instant,
}

impl App {
    pub fn new(store: Store) -> App {
        let mut app = App {
            store,
            rows: Vec::new(),
            selected: 0,
            selected_key: String::new(),
            collapsed: HashSet::new(),
            running_count: 0,
            last_refresh: Instant::now(),
        };
        app.refresh();
        app
    }

    /// Rebuild rows from the store, preserving selection.
    pub fn refresh(&mut self) {
        let sessions = match self.store.load_all() {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::warn!(error = %err, "could not load sessions");
                return;
            }
        };
        self.running_count = sessions
            .iter()
            .filter(|s| s.state == SessionState::Running)
            .count();

        let mut loops = HashMap::new();
        let mut activities = HashMap::new();
        for session in &sessions {
            if let Ok(Some(state)) = self.store.load_loop_state(&session.id) {
                loops.insert(session.id.clone(), state);
            }
            if let Ok(Some(activity)) = self.store.load_activity(&session.id) {
                activities.insert(session.id.clone(), activity);
            }
        }

        self.rows = build_rows(&sessions, &loops, &activities, &self.collapsed);
        self.selected = restore_selection(&self.rows, &self.selected_key);
        self.remember_selection();
        self.last_refresh = Instant::now();
    }

    fn remember_selection(&mut self) {
        self.selected_key = self
            .rows
            .get(self.selected)
            .map(|row| row.key.clone())
            .unwrap_or_default();
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        let next = self.selected.saturating_add_signed(delta).min(last);
        self.selected = next;
        self.remember_selection();
    }

    fn toggle_collapse(&mut self) {
        let Some(row) = self.rows.get(self.selected) else {
            return;
        };
        if row.kind != RowKind::Session {
            return;
        }
        let id = row.session_id.clone();
        if !self.collapsed.remove(&id) {
            self.collapsed.insert(id);
        }
        self.refresh();
    }

    fn abort_selected(&self) {
        let Some(row) = self.rows.get(self.selected) else {
            return;
        };
        let Ok(corral) = std::env::current_exe() else {
            return;
        };
        // Fire and forget; the refresh loop picks up the state change
        let _ = std::process::Command::new(corral)
            .arg("abort")
            .arg(&row.session_id)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();
    }

    /// Run the TUI until the user quits.
    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        let watcher = RefreshWatcher::new(&self.store.sessions_dir());

        let result = self.event_loop(&mut terminal, &watcher);

        terminal::disable_raw_mode()?;
        io::stdout().execute(LeaveAlternateScreen)?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        watcher: &RefreshWatcher,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(FRAME_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
                        KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
                        KeyCode::Char('g') => {
                            self.selected = 0;
                            self.remember_selection();
                        }
                        KeyCode::Char('G') => {
                            self.selected = self.rows.len().saturating_sub(1);
                            self.remember_selection();
                        }
                        KeyCode::Char(' ') | KeyCode::Enter => self.toggle_collapse(),
                        KeyCode::Char('a') => self.abort_selected(),
                        KeyCode::Char('r') => self.refresh(),
                        _ => {}
                    }
                }
            }

            if watcher.should_refresh() || self.last_refresh.elapsed() >= PERIODIC_REFRESH {
                self.refresh();
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let title = format!(" corral — {} running ", self.running_count);
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.rows.is_empty() {
            let empty = ratatui::widgets::Paragraph::new(
                "No sessions. Spawn one:\n\n  corral spawn \"your task\" --checker \"cargo test\"",
            )
            .block(block);
            frame.render_widget(empty, frame.area());
            return;
        }

        let table_rows: Vec<TableRow> = self
            .rows
            .iter()
            .map(|row| {
                let indent = "  ".repeat(row.depth);
                let style = match row.kind {
                    RowKind::Session => Style::default(),
                    RowKind::LoopHeader => Style::default().fg(Color::Cyan),
                    RowKind::Iteration => Style::default().fg(Color::DarkGray),
                };
                TableRow::new(vec![
                    format!("{}{}", indent, row.id_text),
                    row.task.clone(),
                    row.state.clone(),
                    row.activity.clone(),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(24),
            Constraint::Min(30),
            Constraint::Length(10),
            Constraint::Length(32),
        ];
        let table = Table::new(table_rows, widths)
            .header(
                TableRow::new(vec!["ID", "Task", "State", "Activity"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .block(block);

        let mut state = TableState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(table, frame.area(), &mut state);
    }
}

//! Application state and main event loop.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use taskscope_core::{TaskId, TaskStatus};

use crate::event::{BackendCommand, UiEvent};
use crate::state::{next_filter, UiState, View};
use crate::ui;

/// Main application with UI state and channel handles.
pub struct App {
    /// Current UI state snapshot for rendering.
    state: UiState,

    /// Receiver for events from the backend.
    ui_rx: mpsc::Receiver<UiEvent>,

    /// Sender for commands to the backend.
    cmd_tx: mpsc::Sender<BackendCommand>,
}

impl App {
    pub fn new(
        ui_rx: mpsc::Receiver<UiEvent>,
        cmd_tx: mpsc::Sender<BackendCommand>,
        status_filter: Option<TaskStatus>,
        initial_task: Option<TaskId>,
    ) -> Self {
        let mut state = UiState {
            status_filter,
            ..UiState::default()
        };
        if let Some(task_id) = initial_task {
            state.open_task(task_id);
        }

        Self {
            state,
            ui_rx,
            cmd_tx,
        }
    }

    /// Run the main event loop.
    ///
    /// This runs on the main thread and handles:
    /// - Drawing the UI
    /// - Processing keyboard input
    /// - Receiving updates from the backend
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> std::io::Result<()> {
        loop {
            terminal.draw(|frame| ui::render(frame, &self.state))?;

            // Poll terminal events (non-blocking with short timeout)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key.code) {
                        break;
                    }
                }
            }

            while let Ok(event) = self.ui_rx.try_recv() {
                self.apply_event(event);
            }
        }

        let _ = self.cmd_tx.blocking_send(BackendCommand::Quit);

        Ok(())
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::TasksUpdated(tasks) => self.state.set_tasks(tasks),
            UiEvent::TaskListError(msg) => self.state.list_error = Some(msg),
            UiEvent::DetailUpdated(snapshot) => {
                self.state.apply_detail(snapshot);
            }
            UiEvent::Health(healthy) => self.state.gateway_healthy = Some(healthy),
            UiEvent::Fatal(msg) => self.state.fatal_error = Some(msg),
        }
    }

    fn send(&self, cmd: BackendCommand) {
        let _ = self.cmd_tx.try_send(cmd);
    }

    /// Handle a key press.
    ///
    /// Returns true if the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if code == KeyCode::Char('q') {
            return true;
        }

        match self.state.current_view {
            View::Tasks => match code {
                KeyCode::Esc => return true,
                KeyCode::Up | KeyCode::Char('k') => self.state.select_prev_task(),
                KeyCode::Down | KeyCode::Char('j') => self.state.select_next_task(),
                KeyCode::Enter => {
                    if let Some(task_id) = self.state.selected_task().map(|t| t.task_id.clone()) {
                        self.state.open_task(task_id.clone());
                        self.send(BackendCommand::OpenTask(task_id));
                    }
                }
                KeyCode::Char('r') => self.send(BackendCommand::RefreshTasks),
                KeyCode::Char('f') => {
                    self.state.status_filter = next_filter(self.state.status_filter);
                    self.state.selected_task_index = 0;
                    self.send(BackendCommand::SetStatusFilter(self.state.status_filter));
                }
                _ => {}
            },
            View::Detail => match code {
                KeyCode::Esc | KeyCode::Backspace => {
                    self.state.close_task();
                    self.send(BackendCommand::CloseTask);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.state.detail_scroll = self.state.detail_scroll.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.state.detail_scroll = self.state.detail_scroll.saturating_add(1);
                }
                KeyCode::Home | KeyCode::Char('g') => self.state.detail_scroll = 0,
                _ => {}
            },
        }
        false
    }
}

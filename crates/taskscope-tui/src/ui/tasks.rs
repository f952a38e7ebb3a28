//! Tasks view.

use chrono::Utc;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::state::UiState;
use crate::theme::Theme;
use crate::utils::{format_ago, truncate};

pub fn render_tasks_view(f: &mut Frame, state: &UiState, theme: &Theme, area: Rect) {
    let title = match &state.list_error {
        Some(_) => format!(" Tasks ({}) - refresh failed ", state.tasks.len()),
        None => format!(" Tasks ({}) ", state.tasks.len()),
    };

    if state.tasks.is_empty() {
        let text = match &state.list_error {
            Some(error) => format!("Failed to load tasks: {}", error),
            None => "No tasks.".to_string(),
        };
        let para = Paragraph::new(text)
            .style(if state.list_error.is_some() {
                theme.error_style()
            } else {
                theme.muted_style()
            })
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(para, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Task ID"),
        Cell::from("Title"),
        Cell::from("Status"),
        Cell::from("Risk"),
        Cell::from("Created"),
        Cell::from("Updated"),
    ])
    .style(theme.bold())
    .height(1);

    let now = Utc::now();
    let title_width = area.width.saturating_sub(10 + 18 + 8 + 10 + 10 + 8) as usize;

    let rows: Vec<Row> = state
        .tasks
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(t.task_id.short().to_string()),
                Cell::from(truncate(&t.title, title_width.max(8))),
                Cell::from(t.status.to_string()).style(theme.status_style(t.status)),
                Cell::from(t.risk_level.to_string()),
                Cell::from(format_ago(&t.created_at, now)).style(theme.muted_style()),
                Cell::from(format_ago(&t.updated_at, now)).style(theme.muted_style()),
            ])
            .height(1)
        })
        .collect();

    let widths = [
        Constraint::Length(10), // Task ID
        Constraint::Min(8),     // Title
        Constraint::Length(18), // Status
        Constraint::Length(8),  // Risk
        Constraint::Length(10), // Created
        Constraint::Length(10), // Updated
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut table_state = TableState::default();
    table_state.select(Some(state.selected_task_index));

    f.render_stateful_widget(table, area, &mut table_state);
}

//! Main render function that dispatches to view renderers.

mod detail;
mod tasks;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::state::{UiState, View};
use crate::theme::Theme;

/// Render the entire UI.
pub fn render(f: &mut Frame, state: &UiState) {
    let theme = Theme::default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_header(f, state, &theme, chunks[0]);

    if let Some(error) = &state.fatal_error {
        let para = Paragraph::new(format!("Backend failed to start: {}", error))
            .style(theme.error_style())
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(para, chunks[1]);
    } else {
        match state.current_view {
            View::Tasks => tasks::render_tasks_view(f, state, &theme, chunks[1]),
            View::Detail => detail::render_detail_view(f, state, &theme, chunks[1]),
        }
    }

    render_footer(f, state, &theme, chunks[2]);
}

fn render_header(f: &mut Frame, state: &UiState, theme: &Theme, area: Rect) {
    let location = match (state.current_view, &state.viewing) {
        (View::Detail, Some(task_id)) => format!("Tasks > {}", task_id.short()),
        _ => match state.status_filter {
            Some(status) => format!("Tasks [{}]", status),
            None => "Tasks [all]".to_string(),
        },
    };

    let line = Line::from(vec![
        Span::styled(" TaskScope ", theme.title_style()),
        Span::raw(" "),
        Span::raw(location),
    ]);

    let para = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.muted_style()),
    );
    f.render_widget(para, area);
}

fn render_footer(f: &mut Frame, state: &UiState, theme: &Theme, area: Rect) {
    let (health, health_style) = match state.gateway_healthy {
        Some(true) => ("gateway ok", theme.success_style()),
        Some(false) => ("gateway down", theme.error_style()),
        None => ("gateway ?", theme.muted_style()),
    };

    let help = match state.current_view {
        View::Tasks => " q: quit | j/k: select | Enter: open | f: filter | r: refresh ",
        View::Detail => " q: quit | Esc: back | j/k: scroll | g: top ",
    };

    let footer = Line::from(vec![
        Span::styled(health, health_style),
        Span::raw(" |"),
        Span::styled(help, theme.muted_style()),
    ]);

    f.render_widget(Paragraph::new(footer), area);
}

//! Task detail view.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use taskscope_client::{DetailPhase, DetailSnapshot, LoadError, StreamStatus};
use taskscope_core::{Artifact, Task, TaskEvent};

use crate::state::UiState;
use crate::theme::Theme;
use crate::utils::{format_size, format_timestamp, payload_summary, truncate};

pub fn render_detail_view(f: &mut Frame, state: &UiState, theme: &Theme, area: Rect) {
    let detail = match &state.detail {
        Some(d) if d.phase == DetailPhase::Ready => d,
        _ => {
            let para = Paragraph::new("Loading...")
                .style(theme.muted_style())
                .block(Block::default().borders(Borders::ALL).title(" Task "));
            f.render_widget(para, area);
            return;
        }
    };

    let task = match (&detail.task, &detail.error) {
        (Some(task), _) => task,
        (None, error) => {
            render_load_error(f, theme, error.as_ref(), area);
            return;
        }
    };

    let artifact_lines = artifact_lines(&detail.artifacts, theme);
    let artifacts_height = if artifact_lines.is_empty() {
        0
    } else {
        (artifact_lines.len() as u16 + 2).min(area.height / 3)
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),                 // Task header
            Constraint::Min(0),                    // Event timeline
            Constraint::Length(artifacts_height),  // Artifacts
        ])
        .split(area);

    render_task_header(f, task, detail, theme, chunks[0]);
    render_timeline(f, &detail.events, state.detail_scroll, theme, chunks[1]);

    if artifacts_height > 0 {
        let para = Paragraph::new(artifact_lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Artifacts ({}) ", detail.artifacts.len())),
            );
        f.render_widget(para, chunks[2]);
    }
}

fn render_load_error(f: &mut Frame, theme: &Theme, error: Option<&LoadError>, area: Rect) {
    let text = match error {
        Some(LoadError::NotFound(message)) => format!("Task not found. {}", message),
        Some(LoadError::Transport(message)) => format!("Failed to load task: {}", message),
        None => "Task unavailable.".to_string(),
    };
    let para = Paragraph::new(text)
        .style(theme.error_style())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Task "));
    f.render_widget(para, area);
}

fn stream_indicator(status: Option<StreamStatus>, theme: &Theme) -> Span<'static> {
    match status {
        Some(status) => Span::styled(format!("● {}", status), theme.stream_style(status)),
        None => Span::styled("● idle", theme.muted_style()),
    }
}

fn render_task_header(f: &mut Frame, task: &Task, detail: &DetailSnapshot, theme: &Theme, area: Rect) {
    let mut status_line = vec![
        Span::styled("Status: ", theme.bold()),
        Span::styled(format!(" {} ", task.status), theme.status_style(task.status)),
    ];
    // No live indicator once terminal.
    if !task.is_terminal() {
        status_line.push(Span::raw("   "));
        status_line.push(stream_indicator(detail.stream_status, theme));
    }
    status_line.push(Span::raw("   "));
    status_line.push(Span::styled("Risk: ", theme.bold()));
    status_line.push(Span::raw(task.risk_level.to_string()));

    let lines = vec![
        Line::from(vec![
            Span::styled("Task ID: ", theme.bold()),
            Span::raw(task.task_id.to_string()),
        ]),
        Line::from(status_line),
        Line::from(vec![
            Span::styled("Channel: ", theme.bold()),
            Span::raw(task.requester.channel.clone()),
            Span::raw("   "),
            Span::styled("Thread: ", theme.bold()),
            Span::raw(task.thread_id.clone()),
        ]),
        Line::from(vec![
            Span::styled("Created: ", theme.bold()),
            Span::raw(format_timestamp(&task.created_at)),
            Span::raw("   "),
            Span::styled("Updated: ", theme.bold()),
            Span::raw(format_timestamp(&task.updated_at)),
        ]),
    ];

    let title = format!(" {} ", truncate(&task.title, area.width.saturating_sub(4) as usize));
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(theme.title_style()),
    );

    f.render_widget(paragraph, area);
}

fn event_lines<'a>(event: &'a TaskEvent, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("#{:<4}", event.task_seq), theme.muted_style()),
        Span::styled(event.ts.format("%H:%M:%S ").to_string(), theme.muted_style()),
        Span::styled(event.event_type.as_str(), theme.event_style(event.event_type)),
        Span::raw("  "),
        Span::styled(event.actor.as_str(), theme.muted_style()),
    ])];

    for (key, value) in payload_summary(&event.payload) {
        lines.push(Line::from(vec![
            Span::raw("      "),
            Span::styled(format!("{}: ", key), theme.muted_style()),
            Span::raw(value),
        ]));
    }

    lines
}

fn render_timeline(f: &mut Frame, events: &[TaskEvent], scroll: usize, theme: &Theme, area: Rect) {
    let mut lines: Vec<Line> = events.iter().flat_map(|e| event_lines(e, theme)).collect();
    if lines.is_empty() {
        lines.push(Line::styled("No events yet...", theme.muted_style()));
    }

    let inner_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(inner_height);
    let scroll = scroll.min(max_scroll);

    let para = Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Events ({}) ", events.len())),
        );
    f.render_widget(para, area);
}

fn artifact_lines<'a>(artifacts: &'a [Artifact], theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = Vec::new();

    for artifact in artifacts {
        lines.push(Line::from(vec![
            Span::styled(artifact.name.as_str(), theme.bold()),
            Span::raw("  "),
            Span::styled(format_size(artifact.size), theme.muted_style()),
        ]));

        for part in &artifact.parts {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(part.part_type.as_str(), theme.muted_style()),
            ]));

            // Spans drop newlines, so each content line gets its own Line.
            match (&part.content, &part.uri) {
                (Some(content), _) => {
                    lines.extend(content.lines().map(|text| Line::from(vec![Span::raw("    "), Span::raw(text)])));
                }
                (None, Some(uri)) => lines.push(Line::from(vec![Span::raw("    "), Span::raw(uri.as_str())])),
                (None, None) => lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("[{}]", part.mime), theme.muted_style()),
                ])),
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use taskscope_core::{ArtifactId, ArtifactPart, PartType, RequesterInfo, RiskLevel, TaskId, TaskStatus};

    fn part(part_type: PartType, content: Option<&str>, uri: Option<&str>) -> ArtifactPart {
        ArtifactPart {
            part_type,
            mime: "application/octet-stream".to_string(),
            content: content.map(str::to_string),
            uri: uri.map(str::to_string),
        }
    }

    fn artifact(parts: Vec<ArtifactPart>) -> Artifact {
        Artifact {
            artifact_id: ArtifactId::from("a1"),
            name: "llm-response".to_string(),
            size: 17,
            parts,
        }
    }

    fn ready_state(artifacts: Vec<Artifact>) -> UiState {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let task_id = TaskId::from("t1");
        let task = Task {
            task_id: task_id.clone(),
            created_at: at,
            updated_at: at,
            status: TaskStatus::Succeeded,
            title: "Summarize".to_string(),
            thread_id: "th".to_string(),
            scope_id: "sc".to_string(),
            requester: RequesterInfo::default(),
            risk_level: RiskLevel::Low,
        };

        let mut state = UiState::default();
        state.open_task(task_id.clone());
        state.apply_detail(DetailSnapshot {
            task_id,
            phase: DetailPhase::Ready,
            task: Some(task),
            events: Vec::new(),
            artifacts,
            error: None,
            stream_status: None,
            stream_enabled: false,
        });
        state
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn render_rows(state: &UiState) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(60, 40)).unwrap();
        terminal
            .draw(|f| render_detail_view(f, state, &Theme::default(), f.area()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| (0..buffer.area.width).map(|x| buffer[(x, y)].symbol()).collect())
            .collect()
    }

    #[test]
    fn test_artifact_content_keeps_line_breaks() {
        let artifacts = vec![artifact(vec![part(PartType::Text, Some("line one\nline two"), None)])];

        let lines: Vec<String> = artifact_lines(&artifacts, &Theme::default()).iter().map(text).collect();

        assert_eq!(lines, vec!["llm-response  17 B", "  text", "    line one", "    line two"]);
    }

    #[test]
    fn test_artifact_content_shown_for_any_part_type() {
        let artifacts = vec![artifact(vec![
            part(PartType::File, Some("%PDF preview"), Some("s3://bucket/report.pdf")),
            part(PartType::Image, None, Some("s3://bucket/chart.png")),
            part(PartType::Json, None, None),
        ])];

        let lines: Vec<String> = artifact_lines(&artifacts, &Theme::default()).iter().map(text).collect();

        assert_eq!(
            lines[1..],
            [
                "  file",
                "    %PDF preview",
                "  image",
                "    s3://bucket/chart.png",
                "  json",
                "    [application/octet-stream]",
            ]
        );
    }

    #[test]
    fn test_multiline_artifact_renders_on_separate_rows() {
        let state = ready_state(vec![artifact(vec![part(PartType::Text, Some("line one\nline two"), None)])]);

        let rows = render_rows(&state);

        assert!(rows.iter().any(|row| row.contains("line one") && !row.contains("line two")));
        assert!(rows.iter().any(|row| row.contains("line two") && !row.contains("line one")));
    }
}

//! Theme and style definitions.

use ratatui::style::{Color, Modifier, Style};

use taskscope_client::StreamStatus;
use taskscope_core::{EventType, TaskStatus};

/// Colors used across views.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary accent color (titles, selection)
    pub accent: Color,
    /// Success color (succeeded, connected)
    pub success: Color,
    /// Warning color (waiting, connecting)
    pub warning: Color,
    /// Error color (failed, closed)
    pub error: Color,
    /// Active color (running)
    pub active: Color,
    /// Muted color (timestamps, secondary info)
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            active: Color::Blue,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn title_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn bold(&self) -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    /// Status badge color.
    pub fn status_style(&self, status: TaskStatus) -> Style {
        let color = match status {
            TaskStatus::Created | TaskStatus::Queued => self.muted,
            TaskStatus::Running => self.active,
            TaskStatus::WaitingInput | TaskStatus::WaitingApproval | TaskStatus::Paused => {
                self.warning
            }
            TaskStatus::Succeeded => self.success,
            TaskStatus::Failed | TaskStatus::Rejected => self.error,
            TaskStatus::Cancelled => self.warning,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Stream indicator color.
    pub fn stream_style(&self, status: StreamStatus) -> Style {
        let color = match status {
            StreamStatus::Connected => self.success,
            StreamStatus::Connecting => self.warning,
            StreamStatus::Disconnected => self.muted,
            StreamStatus::Closed => self.error,
        };
        Style::default().fg(color)
    }

    /// Timeline marker color per event type.
    pub fn event_style(&self, event_type: EventType) -> Style {
        let color = match event_type {
            EventType::TaskCreated => self.accent,
            EventType::UserMessage => self.active,
            EventType::ModelCallStarted | EventType::ModelCallCompleted => self.success,
            EventType::ModelCallFailed | EventType::Error => self.error,
            EventType::StateTransition => self.warning,
            EventType::ArtifactCreated => self.accent,
        };
        Style::default().fg(color)
    }
}

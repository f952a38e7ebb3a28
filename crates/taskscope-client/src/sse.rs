//! Incremental decoder for `text/event-stream` bodies.
//!
//! A chunk may end anywhere, even inside a multi-byte character; the decoder
//! only interprets complete lines. Lines may end with `\n`, `\r\n` or `\r`.

/// Event name used when a frame carries no `event:` field.
pub const DEFAULT_EVENT: &str = "message";

/// One dispatched SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
    /// Value of the last `id:` field, if any.
    pub id: Option<String>,
    /// Reconnection time in milliseconds from a `retry:` field.
    pub retry: Option<u64>,
}

impl SseFrame {
    /// Channel name the frame is delivered on.
    pub fn event_name(&self) -> &str {
        self.event.as_deref().unwrap_or(DEFAULT_EVENT)
    }

    /// Frames with data are messages; the rest only update stream metadata.
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Stateful SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current incomplete line.
    line: Vec<u8>,
    /// Fields of the frame being assembled.
    pending: SseFrame,
    /// Data lines seen for the pending frame (an empty `data:` still counts).
    data_lines: usize,
    /// Previous chunk ended in `\r`; a leading `\n` belongs to that line ending.
    after_cr: bool,
}

impl SseDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();

        for &byte in chunk {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => self.end_line(&mut frames),
                b'\r' => {
                    self.after_cr = true;
                    self.end_line(&mut frames);
                }
                _ => self.line.push(byte),
            }
        }

        frames
    }

    fn end_line(&mut self, frames: &mut Vec<SseFrame>) {
        let line = std::mem::take(&mut self.line);

        if line.is_empty() {
            if let Some(frame) = self.dispatch() {
                frames.push(frame);
            }
            return;
        }

        let line = String::from_utf8_lossy(&line);

        // Comment lines carry heartbeats.
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };

        match field {
            "event" => self.pending.event = Some(value.to_string()),
            "data" => {
                if self.data_lines > 0 {
                    self.pending.data.push('\n');
                }
                self.pending.data.push_str(value);
                self.data_lines += 1;
            }
            // An id containing NUL is ignored.
            "id" if !value.contains('\0') => self.pending.id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.pending.retry = Some(ms);
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let frame = std::mem::take(&mut self.pending);
        self.data_lines = 0;

        if frame == SseFrame::default() {
            None
        } else {
            Some(frame)
        }
    }
}

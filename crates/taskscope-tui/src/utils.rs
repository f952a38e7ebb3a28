//! Text utilities for TUI rendering.

use chrono::{DateTime, Utc};
use serde_json::Value;
use unicode_width::UnicodeWidthChar;

use taskscope_core::EventPayload;

/// Payload entries shown per event.
pub const PAYLOAD_PREVIEW_ENTRIES: usize = 4;

/// Width a payload value is truncated to.
pub const PAYLOAD_VALUE_WIDTH: usize = 60;

/// Truncate a string to fit within a given width, adding ellipsis if needed.
pub fn truncate(text: &str, max_width: usize) -> String {
    if max_width < 3 {
        return text.chars().take(max_width).collect();
    }

    let total: usize = text.chars().map(|c| UnicodeWidthChar::width(c).unwrap_or(1)).sum();
    if total <= max_width {
        return text.to_string();
    }

    let mut width = 0;
    let mut result = String::new();

    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if width + ch_width > max_width - 3 {
            break;
        }
        result.push(ch);
        width += ch_width;
    }

    result.push_str("...");
    result
}

/// First payload entries, in wire order, as `(key, value)` pairs ready for
/// display.
///
/// Strings are shown as-is, other values as compact JSON. Newlines are
/// flattened so each entry fits on one line.
pub fn payload_summary(payload: &EventPayload) -> Vec<(String, String)> {
    payload
        .iter()
        .take(PAYLOAD_PREVIEW_ENTRIES)
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let flat = text.replace(['\n', '\r'], " ");
            (key.clone(), truncate(&flat, PAYLOAD_VALUE_WIDTH))
        })
        .collect()
}

/// Absolute timestamp, seconds precision.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Relative age such as `42s ago`.
pub fn format_ago(ts: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(*ts).num_seconds().max(0);
    if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}

/// Byte count in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello world", 8), "Hello...");
        assert_eq!(truncate("Hi", 10), "Hi");
        assert_eq!(truncate("exactly8", 8), "exactly8");
        assert_eq!(truncate("任务状态更新", 7), "任务...");
    }

    #[test]
    fn test_payload_summary_limits_entries_and_width() {
        let payload = json!({
            "a": "x".repeat(100),
            "b": 1,
            "c": {"nested": true},
            "d": "line\nbreak",
            "e": "dropped",
        });
        let payload = payload.as_object().unwrap();

        let summary = payload_summary(payload);
        assert_eq!(summary.len(), 4);
        assert_eq!(summary[0].1.chars().count(), PAYLOAD_VALUE_WIDTH);
        assert!(summary[0].1.ends_with("..."));
        assert_eq!(summary[1], ("b".to_string(), "1".to_string()));
        assert_eq!(summary[2].1, "{\"nested\":true}");
        assert_eq!(summary[3].1, "line break");
    }

    #[test]
    fn test_payload_summary_follows_wire_key_order() {
        let payload: Value = serde_json::from_str(
            r#"{"to_status": "RUNNING", "from_status": "QUEUED", "reason": "picked up", "actor": "worker", "attempt": 1}"#,
        )
        .unwrap();
        let payload = payload.as_object().unwrap();

        let keys: Vec<String> = payload_summary(payload).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["to_status", "from_status", "reason", "actor"]);
    }

    #[test]
    fn test_format_ago() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let at = |s: i64| now - chrono::Duration::seconds(s);

        assert_eq!(format_ago(&at(30), now), "30s ago");
        assert_eq!(format_ago(&at(90), now), "1m ago");
        assert_eq!(format_ago(&at(7200), now), "2h ago");
        assert_eq!(format_ago(&at(-5), now), "0s ago");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(11), "11 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}

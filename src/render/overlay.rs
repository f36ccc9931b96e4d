//! Screen overlays composed on top of the window canvas: notifications,
//! the log viewer, the which-key hint panel, the dock, and the welcome
//! screen shown when no window is visible.

use crate::logging::{LogEntry, Notification};

/// One line per active notification, top-right, newest last.
pub fn render_notifications(notifications: &[Notification]) -> Vec<String> {
    notifications.iter().map(|n| format!("[{}] {}", n.kind.icon(), n.text)).collect()
}

/// The most recent `max_lines` log entries, oldest first, level-tagged.
pub fn render_log_viewer(entries: &[LogEntry], max_lines: usize) -> Vec<String> {
    let skip = entries.len().saturating_sub(max_lines);
    entries.iter().skip(skip).map(|e| format!("{:<5} {}", e.level.as_str(), e.message)).collect()
}

/// The which-key hint panel: `action` bound to the first key surfaces as
/// `key  action`, sorted by key for a stable display.
pub fn render_which_key(bindings: &[(String, String)]) -> Vec<String> {
    let mut sorted: Vec<&(String, String)> = bindings.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted.into_iter().map(|(key, action)| format!("{key:<12} {action}")).collect()
}

/// The one-row dock footer listing minimized window names.
pub fn render_dock(minimized_names: &[String], width: u16) -> String {
    if minimized_names.is_empty() {
        return " ".repeat(width as usize);
    }
    let items: Vec<String> = minimized_names.iter().map(|n| format!("[{n}]")).collect();
    let mut line = items.join(" ");
    if line.chars().count() > width as usize {
        line = line.chars().take(width as usize).collect();
    } else {
        line.push_str(&" ".repeat(width as usize - line.chars().count()));
    }
    line
}

/// Centered placeholder shown when the current workspace has no visible
/// window.
pub fn render_welcome(width: u16, height: u16) -> Vec<String> {
    let message = "no windows -- press the leader key, then c, to open one";
    let pad_top = height / 2;
    let mut lines = Vec::new();
    for _ in 0..pad_top {
        lines.push(" ".repeat(width as usize));
    }
    let text_len = message.chars().count().min(width as usize);
    let left_pad = (width as usize).saturating_sub(text_len) / 2;
    let mut centered = " ".repeat(left_pad);
    centered.push_str(&message.chars().take(text_len).collect::<String>());
    centered.push_str(&" ".repeat((width as usize).saturating_sub(centered.chars().count())));
    lines.push(centered);
    for _ in (pad_top + 1)..height {
        lines.push(" ".repeat(width as usize));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, NotificationKind};
    use std::time::{Duration, Instant};

    #[test]
    fn notifications_include_kind_icon() {
        let notifications =
            vec![Notification { kind: NotificationKind::Warn, text: "careful".into(), created_at: Instant::now(), duration: Duration::from_secs(1) }];
        let lines = render_notifications(&notifications);
        assert_eq!(lines, vec!["[!] careful".to_string()]);
    }

    #[test]
    fn log_viewer_caps_at_max_lines() {
        let entries: Vec<LogEntry> =
            (0..10).map(|i| LogEntry { level: LogLevel::Info, message: format!("line {i}"), at: Instant::now() }).collect();
        let lines = render_log_viewer(&entries, 3);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("line 7"));
    }

    #[test]
    fn dock_lists_minimized_windows_and_pads_to_width() {
        let names = vec!["logs".to_string(), "build".to_string()];
        let line = render_dock(&names, 30);
        assert!(line.starts_with("[logs] [build]"));
        assert_eq!(line.chars().count(), 30);
    }

    #[test]
    fn empty_dock_is_blank() {
        let line = render_dock(&[], 10);
        assert_eq!(line, " ".repeat(10));
    }

    #[test]
    fn welcome_screen_has_correct_line_count_and_width() {
        let lines = render_welcome(40, 10);
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| l.chars().count() == 40));
    }
}

//! In-memory log ring buffer and transient notification queue.
//!
//! Mirrors the level/category idiom of the file-backed session logger this
//! codebase already uses, but keeps everything in memory: the log viewer
//! overlay reads the buffer directly, it never touches disk.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub at: Instant,
}

/// Rolling buffer of the most recent `MAX_LOG_ENTRIES` log lines.
#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        if self.entries.len() >= MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry { level, message: message.into(), at: Instant::now() });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Warn,
    Error,
    Success,
}

impl NotificationKind {
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Info => "i",
            NotificationKind::Warn => "!",
            NotificationKind::Error => "x",
            NotificationKind::Success => "v",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub text: String,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notification {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.duration
    }
}

/// Transient on-screen notifications, pruned once their duration elapses.
#[derive(Debug, Default)]
pub struct NotificationBuffer {
    notifications: Vec<Notification>,
    default_duration: Duration,
}

impl NotificationBuffer {
    pub fn new(default_duration: Duration) -> Self {
        Self { notifications: Vec::new(), default_duration }
    }

    pub fn push(&mut self, kind: NotificationKind, text: impl Into<String>) {
        self.notifications.push(Notification {
            kind,
            text: text.into(),
            created_at: Instant::now(),
            duration: self.default_duration,
        });
    }

    /// Drops expired notifications. Call once per tick.
    pub fn prune(&mut self) {
        self.notifications.retain(|n| !n.is_expired());
    }

    pub fn active(&self) -> &[Notification] {
        &self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_buffer_caps_at_100() {
        let mut buf = LogBuffer::new();
        for i in 0..150 {
            buf.info(format!("line {i}"));
        }
        assert_eq!(buf.len(), MAX_LOG_ENTRIES);
        assert_eq!(buf.iter().next().unwrap().message, "line 50");
    }

    #[test]
    fn notification_prune_removes_expired() {
        let mut buf = NotificationBuffer::new(Duration::from_millis(0));
        buf.push(NotificationKind::Warn, "careful");
        std::thread::sleep(Duration::from_millis(5));
        buf.prune();
        assert!(buf.active().is_empty());
    }
}

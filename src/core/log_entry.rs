//! Log entry structure

use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::panic::Location;

// Thread-local cache for the rendered thread label
thread_local! {
    static THREAD_LABEL_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Thread name if set, otherwise the `ThreadId` debug form
fn thread_label() -> String {
    THREAD_LABEL_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let current = std::thread::current();
                match current.name() {
                    Some(name) => name.to_string(),
                    None => format!("{:?}", current.id()),
                }
            })
            .clone()
    })
}

/// One logging event as seen by destinations
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
    /// Name of the logger the event was emitted on
    pub logger: String,
    pub thread: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so one event always renders as one record.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, logger: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            timestamp: Local::now(),
            logger: logger.into(),
            thread: thread_label(),
            file: None,
            line: None,
        }
    }

    pub fn with_location(mut self, file: &str, line: u32) -> Self {
        self.file = Some(file.to_string());
        self.line = Some(line);
        self
    }

    pub fn with_caller(self, location: &Location<'_>) -> Self {
        self.with_location(location.file(), location.line())
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// File name component of the caller location, `?` when unknown
    pub fn file_name(&self) -> &str {
        match self.file.as_deref() {
            Some(path) => path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path),
            None => "?",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_sanitized() {
        let entry = LogEntry::new(LogLevel::Info, "svc", "line one\nline two\tend");
        assert_eq!(entry.message, "line one\\nline two\\tend");
    }

    #[test]
    fn test_file_name() {
        let entry = LogEntry::new(LogLevel::Info, "svc", "m").with_location("src/core/registry.rs", 7);
        assert_eq!(entry.file_name(), "registry.rs");
        assert_eq!(entry.line, Some(7));

        let entry = LogEntry::new(LogLevel::Info, "svc", "m");
        assert_eq!(entry.file_name(), "?");
    }

    #[test]
    fn test_thread_label_named() {
        let handle = std::thread::Builder::new()
            .name("worker-1".to_string())
            .spawn(|| LogEntry::new(LogLevel::Debug, "svc", "m").thread)
            .unwrap();
        assert_eq!(handle.join().unwrap(), "worker-1");
    }
}

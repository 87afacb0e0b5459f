//! Console appender implementation

use super::stream::StreamAppender;
use crate::core::{Appender, DestinationKind, LifecycleState, LogEntry, LogLevel, Result};
#[cfg(feature = "color")]
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Which standard stream the console appender writes to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

pub struct ConsoleAppender {
    inner: StreamAppender,
    target: ConsoleTarget,
    use_colors: bool,
}

impl ConsoleAppender {
    /// Console appender on stdout with `pattern` or the default template
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        Self::with_target(ConsoleTarget::Stdout, pattern)
    }

    pub fn with_target(target: ConsoleTarget, pattern: Option<&str>) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match target {
            ConsoleTarget::Stdout => Box::new(std::io::stdout()),
            ConsoleTarget::Stderr => Box::new(std::io::stderr()),
        };
        Ok(Self {
            inner: StreamAppender::from_boxed(writer, pattern)?.as_kind(DestinationKind::Console),
            target,
            use_colors: false,
        })
    }

    /// Redirect output to another sink, keeping the console destination kind
    ///
    /// # Example
    ///
    /// ```
    /// use rust_logger_registry::appenders::ConsoleAppender;
    ///
    /// let appender = ConsoleAppender::new(None)
    ///     .unwrap()
    ///     .with_writer(Vec::<u8>::new())
    ///     .unwrap();
    /// ```
    pub fn with_writer(self, writer: impl Write + Send + 'static) -> Result<Self> {
        let pattern = self.inner.layout().as_str().to_string();
        Ok(Self {
            inner: StreamAppender::new(writer, Some(&pattern))?.as_kind(DestinationKind::Console),
            target: self.target,
            use_colors: self.use_colors,
        })
    }

    /// Colorize each record by level
    #[cfg(feature = "color")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn format_record(&self, entry: &LogEntry) -> String {
        let record = self.inner.layout().render(entry);
        if self.use_colors {
            colorize(record, entry.level)
        } else {
            record
        }
    }
}

#[cfg(feature = "color")]
fn colorize(record: String, level: LogLevel) -> String {
    let body = record.strip_suffix('\n').unwrap_or(&record);
    let mut colored = body.color(level.color_code()).to_string();
    if body.len() != record.len() {
        colored.push('\n');
    }
    colored
}

#[cfg(not(feature = "color"))]
fn colorize(record: String, _level: LogLevel) -> String {
    record
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let record = self.format_record(entry);
        self.inner.write_record(record.as_bytes())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn stop(&mut self) -> Result<()> {
        self.inner.stop()
    }

    fn state(&self) -> LifecycleState {
        self.inner.state()
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::Console
    }
}

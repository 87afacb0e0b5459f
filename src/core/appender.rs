//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination variant; a logger holds at most one destination per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    Console,
    RollingFile,
    Syslog,
    Stream,
}

impl DestinationKind {
    pub fn name(&self) -> &'static str {
        match self {
            DestinationKind::Console => "ConsoleAppender",
            DestinationKind::RollingFile => "RollingFileAppender",
            DestinationKind::Syslog => "SyslogAppender",
            DestinationKind::Stream => "OutputStreamAppender",
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Destination lifecycle: `Constructed -> Started -> Stopped`
///
/// Constructors return started appenders. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Constructed,
    Started,
    Stopped,
}

pub trait Appender: Send {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    /// Flush and release the underlying resource; further appends fail
    fn stop(&mut self) -> Result<()>;
    fn state(&self) -> LifecycleState;
    fn kind(&self) -> DestinationKind;

    fn name(&self) -> &str {
        self.kind().name()
    }

    fn is_started(&self) -> bool {
        self.state() == LifecycleState::Started
    }
}

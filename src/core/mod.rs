//! Core logger types and traits

pub mod appender;
pub mod error;
pub mod file_size;
pub mod log_entry;
pub mod log_level;
pub mod metrics;
pub mod pattern;
pub mod registry;
pub mod timestamp;

pub use appender::{Appender, DestinationKind, LifecycleState};
pub use error::{LoggerError, Result};
pub use file_size::FileSize;
pub use log_entry::LogEntry;
pub use log_level::{LevelFilter, LogLevel};
pub use metrics::{RegistryMetrics, StatusCallback, StatusReporter};
pub use pattern::{PatternLayout, DEFAULT_PATTERN, SYSLOG_PATTERN};
pub use registry::{Logger, LoggerRegistry, LoggerSnapshot, ROOT_LOGGER};
pub use timestamp::TimestampFormat;

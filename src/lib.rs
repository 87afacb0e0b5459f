//! # Rust Logger Registry
//!
//! A registry of named, hierarchical loggers whose output destinations can be
//! attached and detached at runtime.
//!
//! ## Features
//!
//! - **Named Loggers**: dotted hierarchy with inherited thresholds and additivity
//! - **Destinations**: console, size-and-time rolling files with gzip archives,
//!   UDP syslog, and any caller-supplied `Write` stream
//! - **Pattern Layouts**: `[%-5level] %date [%thread] %logger{10} [%file:%line] %msg%n`
//! - **Thread Safe**: one locked write per record, so records never interleave
//! - **Failure Isolation**: destination errors and panics are reported on a
//!   status channel and never reach the logging call
//!
//! ## Example
//!
//! ```
//! use rust_logger_registry::prelude::*;
//!
//! let registry = LoggerRegistry::new();
//! registry.reset();
//! registry.add_console_destination("svc.core", LevelFilter::Info, None).unwrap();
//!
//! let log = registry.logger("svc.core");
//! log.info("service started");
//! log.debug("not shown");
//!
//! registry
//!     .detach_destination("svc.core", DestinationKind::Console)
//!     .unwrap();
//! assert!(!registry.contains_logger("svc.core"));
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{
        ConsoleAppender, ConsoleTarget, Facility, RollingFileAppender, RollingFileConfig,
        StreamAppender, SyslogAppender,
    };
    pub use crate::config::RegistryConfig;
    pub use crate::core::{
        Appender, DestinationKind, FileSize, LevelFilter, LifecycleState, LogEntry, LogLevel,
        Logger, LoggerError, LoggerRegistry, LoggerSnapshot, PatternLayout, RegistryMetrics,
        Result, DEFAULT_PATTERN, SYSLOG_PATTERN,
    };
}

pub use crate::appenders::{ConsoleAppender, RollingFileAppender, StreamAppender, SyslogAppender};
pub use crate::config::RegistryConfig;
pub use crate::core::{
    Appender, DestinationKind, FileSize, LevelFilter, LifecycleState, LogEntry, LogLevel, Logger,
    LoggerError, LoggerRegistry, LoggerSnapshot, PatternLayout, RegistryMetrics, Result,
    StatusCallback, TimestampFormat, DEFAULT_PATTERN, SYSLOG_PATTERN,
};

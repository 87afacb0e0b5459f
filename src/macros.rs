//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. The caller's file
//! and line are recorded at the macro invocation site.
//!
//! # Examples
//!
//! ```
//! use rust_logger_registry::prelude::*;
//! use rust_logger_registry::info;
//!
//! let registry = LoggerRegistry::initialized();
//! let logger = registry.logger("server");
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_logger_registry::prelude::*;
/// # let logger = LoggerRegistry::initialized().logger("app");
/// use rust_logger_registry::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_registry::prelude::*;
/// # let logger = LoggerRegistry::initialized().logger("app");
/// use rust_logger_registry::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_registry::prelude::*;
/// # let logger = LoggerRegistry::initialized().logger("app");
/// use rust_logger_registry::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::appenders::stream::test_support::SharedBuffer;
    use crate::core::{LevelFilter, LogLevel, LoggerRegistry};

    fn capture(level: LevelFilter) -> (LoggerRegistry, SharedBuffer) {
        let registry = LoggerRegistry::initialized();
        let buffer = SharedBuffer::default();
        registry
            .add_stream_destination(buffer.clone(), "app", level, Some("%level %file:%line %msg%n"))
            .unwrap();
        (registry, buffer)
    }

    #[test]
    fn test_log_macro() {
        let (registry, buffer) = capture(LevelFilter::Info);
        let logger = registry.logger("app");
        log!(logger, LogLevel::Info, "Formatted: {}", 42);
        assert!(buffer.contents().ends_with(" Formatted: 42\n"));
    }

    #[test]
    fn test_level_macros() {
        let (registry, buffer) = capture(LevelFilter::All);
        let logger = registry.logger("app");
        trace!(logger, "Trace message");
        debug!(logger, "Count: {}", 5);
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500);

        let levels: Vec<_> = buffer
            .contents()
            .lines()
            .map(|line| line.split(' ').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(levels, vec!["TRACE", "DEBUG", "INFO", "WARN", "ERROR"]);
    }

    #[test]
    fn test_macro_records_call_site() {
        let (registry, buffer) = capture(LevelFilter::Info);
        let logger = registry.logger("app");
        let line = line!() + 1;
        info!(logger, "here");
        assert_eq!(buffer.contents(), format!("INFO macros.rs:{} here\n", line));
    }
}

//! Error types for the logger registry

use super::appender::DestinationKind;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Byte-size literal could not be parsed
    #[error("Invalid size specification '{input}': expected a value like '512KB', '10MB' or '1GB'")]
    InvalidSizeSpec { input: String },

    /// Detach requested for a destination kind the logger never had
    #[error("No {kind} destination attached to logger '{logger}'")]
    DestinationNotFound {
        logger: String,
        kind: DestinationKind,
    },

    /// Remote endpoint could not be resolved or reached
    #[error("Transport unavailable for {endpoint}: {message}")]
    TransportUnavailable { endpoint: String, message: String },

    /// Log file or directory could not be created, rotated or deleted
    #[error("File system error for '{path}' while {operation}: {source}")]
    FileSystem {
        path: String,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Pattern template failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Registry used before `reset()`
    #[error("Logger registry not initialized; call reset() first")]
    NotInitialized,

    /// Destination already stopped
    #[error("Destination '{0}' is stopped")]
    AppenderStopped(DestinationKind),

    /// Destination panicked while handling an event
    #[error("Destination '{kind}' panicked: {message}")]
    AppenderPanicked {
        kind: DestinationKind,
        message: String,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl LoggerError {
    /// Create an invalid size error
    pub fn invalid_size(input: impl Into<String>) -> Self {
        LoggerError::InvalidSizeSpec {
            input: input.into(),
        }
    }

    /// Create a destination-not-found error
    pub fn destination_not_found(logger: impl Into<String>, kind: DestinationKind) -> Self {
        LoggerError::DestinationNotFound {
            logger: logger.into(),
            kind,
        }
    }

    /// Create a transport error
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::TransportUnavailable {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a file system error with context
    pub fn file_system(
        path: impl Into<String>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a pattern compilation error
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::invalid_size("10XB");
        assert!(matches!(err, LoggerError::InvalidSizeSpec { .. }));

        let err = LoggerError::destination_not_found("svc.core", DestinationKind::Console);
        assert!(matches!(err, LoggerError::DestinationNotFound { .. }));

        let err = LoggerError::config("SyslogAppender", "unknown facility");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::invalid_size("10XB");
        assert_eq!(
            err.to_string(),
            "Invalid size specification '10XB': expected a value like '512KB', '10MB' or '1GB'"
        );

        let err = LoggerError::destination_not_found("svc.core", DestinationKind::RollingFile);
        assert_eq!(
            err.to_string(),
            "No RollingFileAppender destination attached to logger 'svc.core'"
        );

        let err = LoggerError::transport("localhost:514", "connection refused");
        assert_eq!(
            err.to_string(),
            "Transport unavailable for localhost:514: connection refused"
        );
    }

    #[test]
    fn test_file_system_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::file_system("/var/log/app.log", "opening active file", io_err);

        assert!(matches!(err, LoggerError::FileSystem { .. }));
        assert!(err.to_string().contains("opening active file"));
        assert!(err.to_string().contains("/var/log/app.log"));
    }
}

//! Appender implementations

pub mod console;
pub mod rolling_file;
pub mod stream;
pub mod syslog;

pub use console::{ConsoleAppender, ConsoleTarget};
pub use rolling_file::{Clock, FileNamePattern, RollingFileAppender, RollingFileConfig};
pub use stream::StreamAppender;
pub use syslog::{Facility, SyslogAppender};

pub use crate::core::Appender;

//! Log level definitions
//!
//! [`LogLevel`] is the severity carried by an event. [`LevelFilter`] is the
//! threshold configured on a logger; it adds `All` below every severity and
//! `Off` above every severity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Syslog severity code (RFC 3164 table 2)
    pub fn syslog_severity(&self) -> u8 {
        match self {
            LogLevel::Error => 3,
            LogLevel::Warn => 4,
            LogLevel::Info => 6,
            LogLevel::Debug | LogLevel::Trace => 7,
        }
    }

    #[cfg(feature = "color")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Trace => BrightBlack,
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width/alignment flags work: format!("{:<5}", level)
        f.pad(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Threshold configured on a logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelFilter {
    All = 0,
    Trace = 1,
    #[default]
    Debug = 2,
    Info = 3,
    Warn = 4,
    Error = 5,
    Off = 6,
}

impl LevelFilter {
    /// Whether an event of `level` passes this threshold
    #[inline]
    pub fn admits(self, level: LogLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Off => false,
            threshold => LevelFilter::from(level) >= threshold,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LevelFilter::All => "ALL",
            LevelFilter::Trace => "TRACE",
            LevelFilter::Debug => "DEBUG",
            LevelFilter::Info => "INFO",
            LevelFilter::Warn => "WARN",
            LevelFilter::Error => "ERROR",
            LevelFilter::Off => "OFF",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.to_str())
    }
}

impl FromStr for LevelFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(LevelFilter::All),
            "OFF" => Ok(LevelFilter::Off),
            other => other
                .parse::<LogLevel>()
                .map(LevelFilter::from)
                .map_err(|_| format!("Invalid level filter: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LevelFilter::All < LevelFilter::Trace);
        assert!(LevelFilter::Error < LevelFilter::Off);
    }

    #[test]
    fn test_warn_threshold() {
        let threshold = LevelFilter::Warn;
        assert!(!threshold.admits(LogLevel::Trace));
        assert!(!threshold.admits(LogLevel::Debug));
        assert!(!threshold.admits(LogLevel::Info));
        assert!(threshold.admits(LogLevel::Warn));
        assert!(threshold.admits(LogLevel::Error));
    }

    #[test]
    fn test_all_and_off() {
        for level in LogLevel::ALL {
            assert!(LevelFilter::All.admits(level));
            assert!(!LevelFilter::Off.admits(level));
        }
    }

    #[test]
    fn test_padded_display() {
        assert_eq!(format!("{:<5}", LogLevel::Info), "INFO ");
        assert_eq!(format!("{:>5}", LogLevel::Warn), " WARN");
        assert_eq!(format!("{:<5}", LogLevel::Error), "ERROR");
    }

    #[test]
    fn test_parse() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("all".parse::<LevelFilter>().unwrap(), LevelFilter::All);
        assert_eq!("Off".parse::<LevelFilter>().unwrap(), LevelFilter::Off);
        assert_eq!("info".parse::<LevelFilter>().unwrap(), LevelFilter::Info);
        assert!("fatal".parse::<LevelFilter>().is_err());
    }

    #[test]
    fn test_syslog_severity() {
        assert_eq!(LogLevel::Error.syslog_severity(), 3);
        assert_eq!(LogLevel::Warn.syslog_severity(), 4);
        assert_eq!(LogLevel::Info.syslog_severity(), 6);
        assert_eq!(LogLevel::Trace.syslog_severity(), 7);
    }
}

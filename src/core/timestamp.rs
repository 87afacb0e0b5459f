//! Timestamp formatting for the `%date` conversion word
//!
//! `%date` alone renders [`TimestampFormat::Default`]; `%d{NAME}` selects a
//! named format. Any other option is a date pattern: a chrono strftime string
//! when it contains `%`, otherwise a Java-style pattern such as `yyyy-MM-dd`.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_logger_registry::core::TimestampFormat;
///
/// assert_eq!(TimestampFormat::from_option("ISO8601").unwrap(), TimestampFormat::Iso8601);
/// assert_eq!(
///     TimestampFormat::from_option("HH:mm").unwrap(),
///     TimestampFormat::Custom("%H:%M".to_string())
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Local time with milliseconds: `2025-01-08 10:30:45,123`
    #[default]
    Default,

    /// ISO 8601 in UTC with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// RFC 3339 with the local offset: `2025-01-08T10:30:45.123+01:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Resolve the `{...}` option of a `%d` conversion word
    pub fn from_option(option: &str) -> std::result::Result<Self, String> {
        let format = match option.trim() {
            "" | "DEFAULT" => TimestampFormat::Default,
            "ISO8601" => TimestampFormat::Iso8601,
            "RFC3339" => TimestampFormat::Rfc3339,
            "UNIX_MILLIS" => TimestampFormat::UnixMillis,
            other if other.contains('%') => TimestampFormat::Custom(other.to_string()),
            other => TimestampFormat::Custom(java_to_strftime(other)?),
        };
        format.validate()?;
        Ok(format)
    }

    /// Format a timestamp according to this format
    #[must_use]
    pub fn format<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match self {
            TimestampFormat::Default => datetime
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S,%3f")
                .to_string(),
            TimestampFormat::Iso8601 => datetime
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            TimestampFormat::Rfc3339 => datetime
                .with_timezone(&Local)
                .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
                .to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime
                .with_timezone(&Local)
                .format(format_str)
                .to_string(),
        }
    }

    /// Validate a custom strftime string up front so rendering never fails
    fn validate(&self) -> std::result::Result<(), String> {
        if let TimestampFormat::Custom(format_str) = self {
            use chrono::format::{Item, StrftimeItems};
            if StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error)) {
                return Err(format!("invalid date format '{}'", format_str));
            }
        }
        Ok(())
    }
}

/// Convert a Java `SimpleDateFormat`-style pattern to a chrono strftime string
///
/// Supported letters: `yyyy`/`yy`, `MM`/`MMM`/`M`, `dd`/`d`, `HH`/`H`,
/// `mm`/`m`, `ss`/`s`, `SSS`. Text between single quotes and any
/// non-letter character is copied literally.
pub fn java_to_strftime(pattern: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            for q in chars.by_ref() {
                if q == '\'' {
                    break;
                }
                push_literal(&mut out, q);
            }
            continue;
        }
        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            continue;
        }

        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', _) => "%b",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            _ => return Err(format!("unsupported date letter '{}' in '{}'", c, pattern)),
        };
        out.push_str(spec);
    }
    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

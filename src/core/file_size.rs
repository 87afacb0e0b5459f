//! Human-readable byte sizes ("512KB", "10MB", "1GB")

use super::error::{LoggerError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// A byte count parsed from a size literal
///
/// Accepted forms: a number (integer or decimal) optionally followed by
/// whitespace and one of `KB`, `MB`, `GB` (case-insensitive, optional
/// trailing `s`). Multipliers are binary. A bare number is bytes.
///
/// # Examples
///
/// ```
/// use rust_logger_registry::FileSize;
///
/// assert_eq!(FileSize::parse("512KB").unwrap().bytes(), 512 * 1024);
/// assert_eq!(FileSize::parse("10MB").unwrap().bytes(), 10 * 1024 * 1024);
/// assert!(FileSize::parse("10XB").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileSize(u64);

impl FileSize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn from_kb(kb: u64) -> Self {
        Self(kb * KB)
    }

    pub const fn from_mb(mb: u64) -> Self {
        Self(mb * MB)
    }

    #[inline]
    pub const fn bytes(self) -> u64 {
        self.0
    }

    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let invalid = || LoggerError::invalid_size(input);
        if s.is_empty() {
            return Err(invalid());
        }

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (num_str, unit) = s.split_at(split);
        if num_str.is_empty() {
            return Err(invalid());
        }

        let unit = unit.trim().to_ascii_lowercase();
        let unit = unit.strip_suffix('s').unwrap_or(&unit);
        let multiplier = match unit {
            "" | "b" => 1,
            "kb" => KB,
            "mb" => MB,
            "gb" => GB,
            _ => return Err(invalid()),
        };

        if num_str.contains('.') {
            let value: f64 = num_str.parse().map_err(|_| invalid())?;
            let bytes = value * multiplier as f64;
            if !bytes.is_finite() || bytes > u64::MAX as f64 {
                return Err(invalid());
            }
            Ok(Self(bytes as u64))
        } else {
            let value: u64 = num_str.parse().map_err(|_| invalid())?;
            value.checked_mul(multiplier).map(Self).ok_or_else(invalid)
        }
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes >= GB && bytes % GB == 0 {
            write!(f, "{}GB", bytes / GB)
        } else if bytes >= MB && bytes % MB == 0 {
            write!(f, "{}MB", bytes / MB)
        } else if bytes >= KB && bytes % KB == 0 {
            write!(f, "{}KB", bytes / KB)
        } else {
            write!(f, "{}", bytes)
        }
    }
}

impl FromStr for FileSize {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for FileSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FileSize {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum SizeValue {
            Number(u64),
            String(String),
        }

        match SizeValue::deserialize(deserializer)? {
            SizeValue::Number(n) => Ok(FileSize(n)),
            SizeValue::String(s) => FileSize::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

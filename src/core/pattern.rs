//! Pattern layout: compiles a template once, renders it per event
//!
//! Supported conversion words:
//!
//! | Word | Aliases | Renders |
//! |------|---------|---------|
//! | `level` | `le`, `p` | event severity |
//! | `date` | `d` | timestamp, option selects the [`TimestampFormat`] |
//! | `thread` | `t` | thread name or id |
//! | `logger` | `lo`, `c` | logger name, option keeps the last N segments (default 10) |
//! | `file` | `F` | caller file name |
//! | `line` | `L` | caller line |
//! | `msg` | `m`, `message` | message body |
//! | `n` | | record separator |
//!
//! `%%` is a literal percent sign. A format modifier between `%` and the word
//! pads (`%-5level` left-aligns, `%5level` right-aligns) and truncates
//! (`%.10msg` keeps the last 10 chars, `%.-10msg` keeps the first 10).

use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;
use std::fmt::Write as _;

/// Default template for console, file and stream destinations
pub const DEFAULT_PATTERN: &str = "[%-5level] %date [%thread] %logger{10} [%file:%line] %msg%n";

/// Default template for syslog; the datagram supplies the record boundary
pub const SYSLOG_PATTERN: &str = "[%-5level] [%thread] %logger{10} [%file:%line] %msg";

const DEFAULT_LOGGER_SEGMENTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
enum Field {
    Level,
    Date(TimestampFormat),
    Thread,
    Logger { segments: usize },
    File,
    Line,
    Message,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FormatModifier {
    min_width: usize,
    max_width: Option<usize>,
    left_align: bool,
    /// Truncate from the end instead of the beginning
    truncate_end: bool,
}

impl FormatModifier {
    fn is_identity(&self) -> bool {
        self.min_width == 0 && self.max_width.is_none()
    }

    fn apply(&self, value: &str, out: &mut String) {
        let len = value.chars().count();
        let value = match self.max_width {
            Some(max) if len > max => {
                if self.truncate_end {
                    value.chars().take(max).collect::<String>()
                } else {
                    value.chars().skip(len - max).collect::<String>()
                }
            }
            _ => value.to_string(),
        };

        let width = value.chars().count();
        let padding = self.min_width.saturating_sub(width);
        if !self.left_align {
            out.extend(std::iter::repeat(' ').take(padding));
        }
        out.push_str(&value);
        if self.left_align {
            out.extend(std::iter::repeat(' ').take(padding));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Newline,
    Field(Field, FormatModifier),
}

/// A compiled pattern template
///
/// # Examples
///
/// ```
/// use rust_logger_registry::core::{LogEntry, LogLevel, PatternLayout};
///
/// let layout = PatternLayout::compile("[%-5level] %logger{1} - %msg%n").unwrap();
/// let entry = LogEntry::new(LogLevel::Info, "svc.core", "ready");
/// assert_eq!(layout.render(&entry), "[INFO ] core - ready\n");
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    source: String,
    tokens: Vec<Token>,
}

impl PatternLayout {
    /// Compile a template, failing with `InvalidPattern` on malformed input
    pub fn compile(pattern: &str) -> Result<Self> {
        let tokens = Parser::new(pattern).parse()?;
        Ok(Self {
            source: pattern.to_string(),
            tokens,
        })
    }

    /// Compile `pattern` or fall back to `default`
    pub fn compile_or(pattern: Option<&str>, default: &str) -> Result<Self> {
        Self::compile(pattern.unwrap_or(default))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the template ends with `%n`
    pub fn ends_with_newline(&self) -> bool {
        matches!(self.tokens.last(), Some(Token::Newline))
    }

    pub fn render(&self, entry: &LogEntry) -> String {
        let mut out = String::with_capacity(self.source.len() + entry.message.len() + 64);
        self.render_into(entry, &mut out);
        out
    }

    pub fn render_into(&self, entry: &LogEntry, out: &mut String) {
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Newline => out.push('\n'),
                Token::Field(field, modifier) => {
                    if modifier.is_identity() {
                        Self::write_field(field, entry, out);
                    } else {
                        let mut value = String::new();
                        Self::write_field(field, entry, &mut value);
                        modifier.apply(&value, out);
                    }
                }
            }
        }
    }

    fn write_field(field: &Field, entry: &LogEntry, out: &mut String) {
        match field {
            Field::Level => out.push_str(entry.level.to_str()),
            Field::Date(format) => out.push_str(&format.format(&entry.timestamp)),
            Field::Thread => out.push_str(&entry.thread),
            Field::Logger { segments } => out.push_str(abbreviate_logger(&entry.logger, *segments)),
            Field::File => out.push_str(entry.file_name()),
            Field::Line => match entry.line {
                Some(line) => {
                    let _ = write!(out, "{}", line);
                }
                None => out.push('?'),
            },
            Field::Message => out.push_str(&entry.message),
        }
    }
}

/// Keep the last `segments` dot-separated segments of a logger name
fn abbreviate_logger(name: &str, segments: usize) -> &str {
    let segments = segments.max(1);
    match name.rmatch_indices('.').nth(segments - 1) {
        Some((idx, _)) => &name[idx + 1..],
        None => name,
    }
}

struct Parser<'a> {
    pattern: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            chars: pattern.char_indices().peekable(),
        }
    }

    fn error(&self, message: impl Into<String>) -> LoggerError {
        LoggerError::pattern(self.pattern, message)
    }

    fn parse(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut literal = String::new();

        while let Some((_, c)) = self.chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if let Some((_, '%')) = self.chars.peek() {
                self.chars.next();
                literal.push('%');
                continue;
            }

            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(self.parse_conversion()?);
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        Ok(tokens)
    }

    fn parse_conversion(&mut self) -> Result<Token> {
        let modifier = self.parse_modifier()?;

        let mut word = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphabetic() {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if word.is_empty() {
            return Err(self.error("missing conversion word after '%'"));
        }

        let option = self.parse_option()?;

        let field = match word.as_str() {
            "n" => {
                if option.is_some() || !modifier.is_identity() {
                    return Err(self.error("'%n' takes no option or modifier"));
                }
                return Ok(Token::Newline);
            }
            "level" | "le" | "p" => Field::Level,
            "date" | "d" => {
                let format = TimestampFormat::from_option(option.as_deref().unwrap_or(""))
                    .map_err(|e| self.error(e))?;
                Field::Date(format)
            }
            "thread" | "t" => Field::Thread,
            "logger" | "lo" | "c" => {
                let segments = match option.as_deref().map(str::trim) {
                    None | Some("") => DEFAULT_LOGGER_SEGMENTS,
                    Some(value) => value.parse::<usize>().map_err(|_| {
                        self.error(format!("logger segment count '{}' is not a number", value))
                    })?,
                };
                Field::Logger { segments }
            }
            "file" | "F" => Field::File,
            "line" | "L" => Field::Line,
            "msg" | "m" | "message" => Field::Message,
            other => return Err(self.error(format!("unknown conversion word '%{}'", other))),
        };

        Ok(Token::Field(field, modifier))
    }

    fn parse_modifier(&mut self) -> Result<FormatModifier> {
        let mut modifier = FormatModifier::default();

        if let Some((_, '-')) = self.chars.peek() {
            self.chars.next();
            modifier.left_align = true;
        }
        modifier.min_width = self.parse_number().unwrap_or(0);

        if let Some((_, '.')) = self.chars.peek() {
            self.chars.next();
            if let Some((_, '-')) = self.chars.peek() {
                self.chars.next();
                modifier.truncate_end = true;
            }
            let max = self
                .parse_number()
                .ok_or_else(|| self.error("expected a number after '.' in format modifier"))?;
            modifier.max_width = Some(max);
        }
        Ok(modifier)
    }

    fn parse_number(&mut self) -> Option<usize> {
        let mut digits = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        digits.parse().ok()
    }

    fn parse_option(&mut self) -> Result<Option<String>> {
        if !matches!(self.chars.peek(), Some((_, '{'))) {
            return Ok(None);
        }
        self.chars.next();

        let mut option = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == '}' {
                return Ok(Some(option));
            }
            option.push(c);
        }
        Err(self.error("unterminated '{' in option"))
    }
}

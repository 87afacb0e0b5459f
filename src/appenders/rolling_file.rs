//! Rolling file appender with size-and-time based rollover
//!
//! The active file is rolled into an archive named by a file-name pattern
//! such as `/var/log/app.%d{yyyy-MM-dd}.%i.log.gz`:
//!
//! - `%d{...}` renders the period of the archived data (Java-style date
//!   letters, default `yyyy-MM-dd`). A new period starts whenever the rendered
//!   date changes, so the finest unit in the pattern is the rollover period.
//! - `%i` disambiguates several archives within one period. It starts at 0 and
//!   resets when the period changes.
//! - A `.gz` suffix gzip-compresses each archive.
//!
//! After every rollover the oldest archives are deleted until at most
//! `max_history` remain and their total size fits `total_size_cap`.

use crate::core::{
    Appender, DestinationKind, FileSize, LifecycleState, LogEntry, LoggerError, PatternLayout,
    Result, StatusReporter, DEFAULT_PATTERN,
};
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of the current time, replaceable for deterministic rollover
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

const GZIP_SUFFIX: &str = ".gz";
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateUnit {
    Year4,
    Year2,
    Month2,
    MonthName,
    Day2,
    Hour2,
    Minute2,
    Second2,
}

impl DateUnit {
    fn width(self) -> usize {
        match self {
            DateUnit::Year4 => 4,
            DateUnit::MonthName => 3,
            _ => 2,
        }
    }

    /// Position in the chronological sort key
    fn rank(self) -> usize {
        match self {
            DateUnit::Year4 | DateUnit::Year2 => 0,
            DateUnit::Month2 | DateUnit::MonthName => 1,
            DateUnit::Day2 => 2,
            DateUnit::Hour2 => 3,
            DateUnit::Minute2 => 4,
            DateUnit::Second2 => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateItem {
    Literal(char),
    Unit(DateUnit),
}

/// Fixed-width date layout used inside archive names
#[derive(Debug, Clone, PartialEq, Eq)]
struct DateLayout {
    items: Vec<DateItem>,
}

impl DateLayout {
    fn parse(pattern: &str) -> std::result::Result<Self, String> {
        let mut items = Vec::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if !c.is_ascii_alphabetic() {
                if c == '/' || c == '\\' || c == '%' {
                    return Err(format!("character '{}' not allowed in date '{}'", c, pattern));
                }
                items.push(DateItem::Literal(c));
                continue;
            }
            let mut run = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                run += 1;
            }
            let unit = match (c, run) {
                ('y', 4) => DateUnit::Year4,
                ('y', 2) => DateUnit::Year2,
                ('M', 2) => DateUnit::Month2,
                ('M', 3) => DateUnit::MonthName,
                ('d', 2) => DateUnit::Day2,
                ('H', 2) => DateUnit::Hour2,
                ('m', 2) => DateUnit::Minute2,
                ('s', 2) => DateUnit::Second2,
                _ => {
                    return Err(format!(
                        "unsupported date field '{}' in '{}'; use yyyy, yy, MM, MMM, dd, HH, mm or ss",
                        c.to_string().repeat(run),
                        pattern
                    ))
                }
            };
            items.push(DateItem::Unit(unit));
        }

        if !items.iter().any(|item| matches!(item, DateItem::Unit(_))) {
            return Err(format!("date '{}' has no date fields", pattern));
        }
        Ok(Self { items })
    }

    fn width(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                DateItem::Literal(c) => c.len_utf8(),
                DateItem::Unit(unit) => unit.width(),
            })
            .sum()
    }

    fn render<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> String {
        let mut out = String::with_capacity(self.width());
        for item in &self.items {
            match item {
                DateItem::Literal(c) => out.push(*c),
                DateItem::Unit(unit) => {
                    let text = match unit {
                        DateUnit::Year4 => format!("{:04}", date.year()),
                        DateUnit::Year2 => format!("{:02}", date.year().rem_euclid(100)),
                        DateUnit::Month2 => format!("{:02}", date.month()),
                        DateUnit::MonthName => MONTH_NAMES[date.month0() as usize].to_string(),
                        DateUnit::Day2 => format!("{:02}", date.day()),
                        DateUnit::Hour2 => format!("{:02}", date.hour()),
                        DateUnit::Minute2 => format!("{:02}", date.minute()),
                        DateUnit::Second2 => format!("{:02}", date.second()),
                    };
                    out.push_str(&text);
                }
            }
        }
        out
    }

    /// Chronological sort key (year, month, day, hour, minute, second)
    fn sort_key(&self, text: &str) -> Option<[u32; 6]> {
        let mut key = [0u32; 6];
        let mut rest = text;

        for item in &self.items {
            match item {
                DateItem::Literal(c) => rest = rest.strip_prefix(*c)?,
                DateItem::Unit(unit) => {
                    let width = unit.width();
                    let field = rest.get(..width)?;
                    rest = &rest[width..];
                    let value = match unit {
                        DateUnit::MonthName => {
                            MONTH_NAMES.iter().position(|m| *m == field)? as u32 + 1
                        }
                        DateUnit::Year2 => 2000 + parse_digits(field)?,
                        _ => parse_digits(field)?,
                    };
                    key[unit.rank()] = value;
                }
            }
        }
        rest.is_empty().then_some(key)
    }
}

fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameToken {
    Literal(String),
    Date,
    Index,
}

/// Identity of one archive found on disk
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ArchiveKey {
    date: [u32; 6],
    index: u32,
}

/// Parsed archive file-name pattern
///
/// # Examples
///
/// ```
/// use rust_logger_registry::appenders::FileNamePattern;
///
/// let pattern = FileNamePattern::parse("/tmp/sample.%d{yyyy-MM-dd}.%i.log.gz").unwrap();
/// assert!(pattern.is_compressed());
/// assert_eq!(pattern.derive_active_file(), std::path::PathBuf::from("/tmp/sample.log"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNamePattern {
    source: String,
    directory: PathBuf,
    tokens: Vec<NameToken>,
    date: DateLayout,
    compressed: bool,
}

impl FileNamePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |message: String| LoggerError::config("RollingFileAppender", message);

        let path = Path::new(pattern);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid(format!("file name pattern '{}' has no file name", pattern)))?;
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if directory.to_string_lossy().contains('%') {
            return Err(invalid(format!(
                "tokens are only supported in the file name component of '{}'",
                pattern
            )));
        }

        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut date = None;
        let mut has_index = false;
        let mut chars = file_name.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let token = match chars.next() {
                Some('%') => {
                    literal.push('%');
                    continue;
                }
                Some('d') => {
                    let mut option = String::new();
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        let mut closed = false;
                        for c in chars.by_ref() {
                            if c == '}' {
                                closed = true;
                                break;
                            }
                            option.push(c);
                        }
                        if !closed {
                            return Err(invalid(format!("unterminated '{{' in '{}'", pattern)));
                        }
                    }
                    if date.is_some() {
                        return Err(invalid(format!("'{}' has more than one %d token", pattern)));
                    }
                    let option = if option.trim().is_empty() { "yyyy-MM-dd" } else { option.trim() };
                    date = Some(DateLayout::parse(option).map_err(invalid)?);
                    NameToken::Date
                }
                Some('i') => {
                    if has_index {
                        return Err(invalid(format!("'{}' has more than one %i token", pattern)));
                    }
                    has_index = true;
                    NameToken::Index
                }
                other => {
                    return Err(invalid(format!(
                        "unknown token '%{}' in '{}'",
                        other.map(String::from).unwrap_or_default(),
                        pattern
                    )))
                }
            };
            if !literal.is_empty() {
                tokens.push(NameToken::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(token);
        }
        if !literal.is_empty() {
            tokens.push(NameToken::Literal(literal));
        }

        let date = date.ok_or_else(|| invalid(format!("'{}' is missing the %d date token", pattern)))?;
        if !has_index {
            return Err(invalid(format!("'{}' is missing the %i index token", pattern)));
        }
        if file_name.ends_with(".zip") {
            return Err(invalid("zip compression is not supported; use a .gz suffix".to_string()));
        }

        Ok(Self {
            source: pattern.to_string(),
            directory,
            tokens,
            date,
            compressed: file_name.ends_with(GZIP_SUFFIX),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Rendered period of `date`; a change means a time boundary was crossed
    pub fn period_key<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> String {
        self.date.render(date)
    }

    /// File name of the archive for `date` and `index`, including any `.gz`
    pub fn archive_name<Tz: TimeZone>(&self, date: &DateTime<Tz>, index: u32) -> String {
        let mut name = String::new();
        for token in &self.tokens {
            match token {
                NameToken::Literal(text) => name.push_str(text),
                NameToken::Date => name.push_str(&self.date.render(date)),
                NameToken::Index => name.push_str(&index.to_string()),
            }
        }
        name
    }

    pub fn archive_path<Tz: TimeZone>(&self, date: &DateTime<Tz>, index: u32) -> PathBuf {
        self.directory.join(self.archive_name(date, index))
    }

    /// Active file path implied by the pattern: tokens and `.gz` removed
    pub fn derive_active_file(&self) -> PathBuf {
        let mut stripped = String::new();
        for token in &self.tokens {
            if let NameToken::Literal(text) = token {
                stripped.push_str(text);
            }
        }
        if self.compressed {
            stripped.truncate(stripped.len() - GZIP_SUFFIX.len());
        }

        // Collapse separator runs left behind by the removed tokens
        let mut name = String::with_capacity(stripped.len());
        let mut chars = stripped.chars().peekable();
        while let Some(c) = chars.next() {
            let is_sep = |c: char| c == '.' || c == '-' || c == '_';
            if is_sep(c) && chars.peek().copied().is_some_and(is_sep) {
                continue;
            }
            name.push(c);
        }
        let name = name.trim_matches(|c: char| c == '-' || c == '_');
        let name = name.trim_end_matches('.');
        let name = if name.is_empty() { "application.log" } else { name };
        self.directory.join(name)
    }

    fn match_name(&self, file_name: &str) -> Option<ArchiveKey> {
        let mut rest = file_name;
        let mut date = None;
        let mut index = None;

        for token in &self.tokens {
            match token {
                NameToken::Literal(text) => rest = rest.strip_prefix(text.as_str())?,
                NameToken::Date => {
                    let width = self.date.width();
                    date = Some(self.date.sort_key(rest.get(..width)?)?);
                    rest = &rest[width..];
                }
                NameToken::Index => {
                    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
                    index = Some(parse_digits(&rest[..digits])?);
                    rest = &rest[digits..];
                }
            }
        }
        if !rest.is_empty() {
            return None;
        }
        Some(ArchiveKey {
            date: date?,
            index: index?,
        })
    }

    /// Archive key for a file name; uncompressed leftovers count when `.gz` is configured
    fn parse_archive(&self, file_name: &str) -> Option<ArchiveKey> {
        self.match_name(file_name).or_else(|| {
            if self.compressed && !file_name.ends_with(GZIP_SUFFIX) {
                self.match_name(&format!("{}{}", file_name, GZIP_SUFFIX))
            } else {
                None
            }
        })
    }
}

/// Configuration for a rolling file destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingFileConfig {
    /// Active file; derived from the pattern when `None`
    #[serde(default)]
    pub file: Option<PathBuf>,
    pub file_name_pattern: String,
    pub max_file_size: FileSize,
    /// Aggregate archive size limit; zero disables the cap
    #[serde(default)]
    pub total_size_cap: FileSize,
    /// Number of archives kept; zero keeps all
    #[serde(default)]
    pub max_history: usize,
}

impl RollingFileConfig {
    pub fn new(
        file_name_pattern: impl Into<String>,
        max_file_size: FileSize,
        total_size_cap: FileSize,
        max_history: usize,
    ) -> Self {
        Self {
            file: None,
            file_name_pattern: file_name_pattern.into(),
            max_file_size,
            total_size_cap,
            max_history,
        }
    }

    /// Build from size literals such as `"10MB"`
    ///
    /// # Errors
    ///
    /// Returns `InvalidSizeSpec` if either size does not parse.
    pub fn from_literals(
        file_name_pattern: impl Into<String>,
        max_file_size: &str,
        total_size_cap: &str,
        max_history: usize,
    ) -> Result<Self> {
        Ok(Self::new(
            file_name_pattern,
            FileSize::parse(max_file_size)?,
            FileSize::parse(total_size_cap)?,
            max_history,
        ))
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Rolling file appender
///
/// # Examples
///
/// ```no_run
/// use rust_logger_registry::appenders::{RollingFileAppender, RollingFileConfig};
///
/// let config = RollingFileConfig::from_literals(
///     "/var/log/app.%d{yyyy-MM-dd}.%i.log.gz",
///     "10MB",
///     "100MB",
///     7,
/// )
/// .unwrap();
/// let appender = RollingFileAppender::new(config, None).unwrap();
/// assert_eq!(appender.path(), std::path::Path::new("/var/log/app.log"));
/// ```
pub struct RollingFileAppender {
    active_path: PathBuf,
    pattern: FileNamePattern,
    max_file_size: u64,
    total_size_cap: u64,
    max_history: usize,
    layout: PatternLayout,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    /// A timestamp inside the period the active file belongs to
    period_start: DateTime<Local>,
    period_key: String,
    index: u32,
    immediate_flush: bool,
    clock: Clock,
    status: Option<StatusReporter>,
    state: LifecycleState,
}

impl RollingFileAppender {
    /// Create the appender and open (or create) the active file
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for a bad file-name pattern or zero max size,
    /// `InvalidPattern` for a bad layout, `FileSystem` if the directories or
    /// the active file cannot be created.
    pub fn new(config: RollingFileConfig, pattern: Option<&str>) -> Result<Self> {
        let name_pattern = FileNamePattern::parse(&config.file_name_pattern)?;
        if config.max_file_size.bytes() == 0 {
            return Err(LoggerError::config(
                "RollingFileAppender",
                "max_file_size must be greater than zero",
            ));
        }
        let layout = PatternLayout::compile_or(pattern, DEFAULT_PATTERN)?;
        let active_path = config
            .file
            .clone()
            .unwrap_or_else(|| name_pattern.derive_active_file());

        for dir in [active_path.parent(), Some(name_pattern.directory())]
            .into_iter()
            .flatten()
            .filter(|d| !d.as_os_str().is_empty())
        {
            fs::create_dir_all(dir).map_err(|e| {
                LoggerError::file_system(dir.display().to_string(), "creating log directory", e)
            })?;
        }

        let (file, current_size, modified) = Self::open_active(&active_path)?;
        let now = Local::now();
        let period_start = match modified {
            Some(modified) if current_size > 0 => modified,
            _ => now,
        };

        let mut appender = Self {
            period_key: name_pattern.period_key(&period_start),
            active_path,
            pattern: name_pattern,
            max_file_size: config.max_file_size.bytes(),
            total_size_cap: config.total_size_cap.bytes(),
            max_history: config.max_history,
            layout,
            writer: Some(BufWriter::new(file)),
            current_size,
            period_start,
            index: 0,
            immediate_flush: true,
            clock: Arc::new(Local::now),
            status: None,
            state: LifecycleState::Constructed,
        };
        appender.index = appender.next_free_index();
        appender.state = LifecycleState::Started;
        Ok(appender)
    }

    /// Replace the time source; the current period is re-derived from it
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        if self.current_size == 0 {
            self.period_start = clock();
            self.period_key = self.pattern.period_key(&self.period_start);
            self.index = self.next_free_index();
        }
        self.clock = clock;
        self
    }

    /// Route rollover failures and counters to a status channel
    #[must_use]
    pub fn with_status(mut self, status: StatusReporter) -> Self {
        self.status = Some(status);
        self
    }

    /// Flush after every record (default: true)
    #[must_use]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.active_path
    }

    #[must_use]
    pub fn file_name_pattern(&self) -> &FileNamePattern {
        &self.pattern
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Index the next size-triggered archive will use
    #[must_use]
    pub fn current_index(&self) -> u32 {
        self.index
    }

    /// Archives on disk, oldest first
    pub fn archives(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .list_archives()?
            .into_iter()
            .map(|(_, path, _)| path)
            .collect())
    }

    fn open_active(path: &Path) -> Result<(File, u64, Option<DateTime<Local>>)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LoggerError::file_system(path.display().to_string(), "opening active file", e))?;
        let metadata = file.metadata().map_err(|e| {
            LoggerError::file_system(path.display().to_string(), "reading file metadata", e)
        })?;
        let modified = metadata.modified().ok().map(DateTime::<Local>::from);
        Ok((file, metadata.len(), modified))
    }

    /// First index not yet used by an archive of the current period
    fn next_free_index(&self) -> u32 {
        let period = self.pattern.date.sort_key(&self.period_key);
        self.list_archives()
            .unwrap_or_default()
            .into_iter()
            .filter(|(key, _, _)| Some(key.date) == period)
            .map(|(key, _, _)| key.index + 1)
            .max()
            .unwrap_or(0)
    }

    fn list_archives(&self) -> Result<Vec<(ArchiveKey, PathBuf, u64)>> {
        let dir = self.pattern.directory();
        let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
        let entries = fs::read_dir(dir).map_err(|e| {
            LoggerError::file_system(dir.display().to_string(), "listing archives", e)
        })?;

        let mut archives: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path == self.active_path {
                    return None;
                }
                let name = entry.file_name();
                let key = self.pattern.parse_archive(name.to_str()?)?;
                let size = entry.metadata().ok()?.len();
                Some((key, path, size))
            })
            .collect();
        archives.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(archives)
    }

    /// Decide whether `now` requires a rollover before the next write
    fn check_trigger(&self, now: &DateTime<Local>) -> Option<bool> {
        let key = self.pattern.period_key(now);
        if key != self.period_key {
            return Some(true);
        }
        (self.current_size >= self.max_file_size).then_some(false)
    }

    /// Archive the active file and open a fresh one
    fn rollover(&mut self, now: DateTime<Local>, time_boundary: bool) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_system(
                    self.active_path.display().to_string(),
                    "flushing before rollover",
                    e,
                )
            })?;
        }

        // A staging file left by a failed compression still holds an archive
        let mut index = self.index;
        let mut target = self.pattern.archive_path(&self.period_start, index);
        while target.exists() || (self.pattern.is_compressed() && staging_path(&target).exists()) {
            index += 1;
            target = self.pattern.archive_path(&self.period_start, index);
        }

        if self.active_path.exists() {
            if self.pattern.is_compressed() {
                let staging = staging_path(&target);
                fs::rename(&self.active_path, &staging).map_err(|e| {
                    LoggerError::file_system(staging.display().to_string(), "archiving active file", e)
                })?;
                compress_file(&staging, &target)?;
            } else {
                fs::rename(&self.active_path, &target).map_err(|e| {
                    LoggerError::file_system(target.display().to_string(), "archiving active file", e)
                })?;
            }
        }

        let (file, size, _) = Self::open_active(&self.active_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;

        if time_boundary {
            self.period_start = now;
            self.period_key = self.pattern.period_key(&now);
            self.index = self.next_free_index();
        } else {
            self.index = index + 1;
        }

        if let Some(ref status) = self.status {
            status.metrics().record_rollover();
        }
        self.enforce_retention()
    }

    /// Delete oldest archives beyond `max_history` or `total_size_cap`
    fn enforce_retention(&self) -> Result<()> {
        let archives = self.list_archives()?;
        let mut total: u64 = archives.iter().map(|(_, _, size)| size).sum();
        let mut excess = if self.max_history > 0 {
            archives.len().saturating_sub(self.max_history)
        } else {
            0
        };

        for (_, path, size) in &archives {
            let over_cap = self.total_size_cap > 0 && total > self.total_size_cap;
            if excess == 0 && !over_cap {
                break;
            }
            fs::remove_file(path).map_err(|e| {
                LoggerError::file_system(path.display().to_string(), "deleting old archive", e)
            })?;
            total -= size;
            excess = excess.saturating_sub(1);
        }
        Ok(())
    }

    /// Reopen the active file after a failed rollover
    fn recover_writer(&mut self) -> Result<()> {
        if self.writer.is_none() {
            let (file, size, _) = Self::open_active(&self.active_path)?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = size;
        }
        Ok(())
    }
}

impl Appender for RollingFileAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        if self.state != LifecycleState::Started {
            return Err(LoggerError::AppenderStopped(DestinationKind::RollingFile));
        }

        let now = (self.clock)();
        if let Some(time_boundary) = self.check_trigger(&now) {
            if let Err(e) = self.rollover(now, time_boundary) {
                match self.status {
                    Some(ref status) => status.defer("rollover failed, continuing with active file", e),
                    None => eprintln!("[WARN] Log rollover failed: {}. Continuing with active file.", e),
                }
                self.recover_writer()?;
                // Avoid retrying on every event; the file may outgrow the limit
                self.current_size = 0;
                if time_boundary {
                    self.period_start = now;
                    self.period_key = self.pattern.period_key(&now);
                }
            }
        }

        let record = self.layout.render(entry);
        let writer = self
            .writer
            .as_mut()
            .ok_or(LoggerError::AppenderStopped(DestinationKind::RollingFile))?;
        writer.write_all(record.as_bytes())?;
        if self.immediate_flush {
            writer.flush()?;
        }
        self.current_size += record.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_system(self.active_path.display().to_string(), "flushing", e)
            })?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.state == LifecycleState::Stopped {
            return Ok(());
        }
        self.state = LifecycleState::Stopped;
        // Dropping the writer releases the file handle
        match self.writer.take() {
            Some(mut writer) => writer.flush().map_err(Into::into),
            None => Ok(()),
        }
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::RollingFile
    }
}

impl Drop for RollingFileAppender {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Uncompressed name an archive has while it is being gzipped
fn staging_path(target: &Path) -> PathBuf {
    target.with_extension("")
}

/// Gzip `source` into `target` using streaming I/O
///
/// The compressed file is written to a temporary path and renamed into
/// place; `source` is removed only after that succeeds.
fn compress_file(source: &Path, target: &Path) -> Result<()> {
    use std::io::{BufReader, Read};

    let temp_path = {
        let mut name = target.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    };
    let fail = |path: &Path, operation: &str, e: std::io::Error| {
        let _ = fs::remove_file(&temp_path);
        LoggerError::file_system(path.display().to_string(), operation, e)
    };

    let input = File::open(source).map_err(|e| fail(source, "opening file for compression", e))?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_path).map_err(|e| fail(&temp_path, "creating compressed file", e))?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| fail(source, "reading file for compression", e))?;
        if bytes_read == 0 {
            break;
        }
        encoder
            .write_all(&buffer[..bytes_read])
            .map_err(|e| fail(&temp_path, "compressing data", e))?;
    }

    let mut writer = encoder
        .finish()
        .map_err(|e| fail(&temp_path, "finishing compression", e))?;
    writer
        .flush()
        .map_err(|e| fail(&temp_path, "finishing compression", e))?;
    drop(writer);

    fs::rename(&temp_path, target).map_err(|e| fail(target, "renaming compressed file", e))?;

    if let Err(e) = fs::remove_file(source) {
        eprintln!(
            "[WARN] Compression succeeded but failed to remove original file {}: {}",
            source.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use chrono::Duration;
    use parking_lot::Mutex;
    use std::io::Read;
    use tempfile::tempdir;

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(LogLevel::Info, "svc.core", message)
    }

    fn fixed_clock(start: DateTime<Local>) -> (Clock, Arc<Mutex<DateTime<Local>>>) {
        let now = Arc::new(Mutex::new(start));
        let handle = Arc::clone(&now);
        let clock: Clock = Arc::new(move || *handle.lock());
        (clock, now)
    }

    fn start_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 1, 8, 10, 0, 0)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_parse_pattern() {
        let pattern = FileNamePattern::parse("/tmp/sample.%d{yyyy-MM-dd}.%i.log.gz").unwrap();
        assert!(pattern.is_compressed());
        assert_eq!(pattern.directory(), Path::new("/tmp"));

        let date = start_time();
        assert_eq!(pattern.archive_name(&date, 3), "sample.2025-01-08.3.log.gz");
        assert_eq!(pattern.period_key(&date), "2025-01-08");
    }

    #[test]
    fn test_parse_pattern_default_date() {
        let pattern = FileNamePattern::parse("logs/app-%d-%i.log").unwrap();
        assert!(!pattern.is_compressed());
        assert_eq!(pattern.archive_name(&start_time(), 0), "app-2025-01-08-0.log");
        assert_eq!(pattern.derive_active_file(), PathBuf::from("logs/app.log"));
    }

    #[test]
    fn test_parse_pattern_errors() {
        for bad in [
            "/tmp/app.log",
            "/tmp/app.%d.log",
            "/tmp/app.%i.log",
            "/tmp/%d/app.%i.log",
            "/tmp/app.%d{yyyy-ww}.%i.log",
            "/tmp/app.%d{yyyy.%i.log",
            "/tmp/app.%x.%d.%i.log",
            "/tmp/app.%d.%i.log.zip",
        ] {
            let err = FileNamePattern::parse(bad).unwrap_err();
            assert!(
                matches!(err, LoggerError::InvalidConfiguration { .. }),
                "expected InvalidConfiguration for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_match_archive_names() {
        let pattern = FileNamePattern::parse("/tmp/sample.%d{yyyy-MM-dd}.%i.log.gz").unwrap();
        let key = pattern.parse_archive("sample.2025-01-08.12.log.gz").unwrap();
        assert_eq!(key.index, 12);
        assert_eq!(key.date[..3], [2025, 1, 8]);

        // Uncompressed leftover of an interrupted compression
        assert!(pattern.parse_archive("sample.2025-01-08.1.log").is_some());
        assert!(pattern.parse_archive("sample.log").is_none());
        assert!(pattern.parse_archive("sample.2025-1-08.1.log.gz").is_none());
        assert!(pattern.parse_archive("sample.2025-01-08..log.gz").is_none());
    }

    #[test]
    fn test_archive_ordering_uses_date_fields() {
        let pattern = FileNamePattern::parse("/tmp/app.%d{dd-MM-yyyy}.%i.log").unwrap();
        let older = pattern.parse_archive("app.31-12-2024.5.log").unwrap();
        let newer = pattern.parse_archive("app.01-01-2025.0.log").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_size_rollover_creates_archive() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.%d{yyyy-MM-dd}.%i.log");
        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "1KB", "0", 0).unwrap();
        let (clock, _) = fixed_clock(start_time());
        let mut appender = RollingFileAppender::new(config, Some("%msg%n"))
            .unwrap()
            .with_clock(clock);

        let line = "x".repeat(99);
        // The twelfth record sees 1100 bytes and rolls the file first
        for _ in 0..12 {
            appender.append(&entry(&line)).unwrap();
        }
        appender.flush().unwrap();

        let archive = dir.path().join("app.2025-01-08.0.log");
        assert!(archive.exists());
        assert_eq!(fs::read_to_string(&archive).unwrap().len(), 1100);
        assert_eq!(fs::read_to_string(dir.path().join("app.log")).unwrap().len(), 100);
        assert_eq!(appender.current_index(), 1);
    }

    #[test]
    fn test_max_history_keeps_newest() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.%d{yyyy-MM-dd}.%i.log");
        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "10", "0", 3).unwrap();
        let (clock, _) = fixed_clock(start_time());
        let mut appender = RollingFileAppender::new(config, Some("%msg%n"))
            .unwrap()
            .with_clock(clock);

        // Each record fills the file, so every following append rolls over
        for i in 0..6 {
            appender.append(&entry(&format!("record-{:03}", i))).unwrap();
        }

        let archives = appender.archives().unwrap();
        let names: Vec<_> = archives
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["app.2025-01-08.2.log", "app.2025-01-08.3.log", "app.2025-01-08.4.log"]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log")).unwrap(),
            "record-005\n"
        );
    }

    #[test]
    fn test_total_size_cap() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("cap.%d{yyyy-MM-dd}.%i.log");
        // Each archive holds 100 bytes; the cap leaves room for two
        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "100", "250", 0).unwrap();
        let (clock, _) = fixed_clock(start_time());
        let mut appender = RollingFileAppender::new(config, Some("%msg%n"))
            .unwrap()
            .with_clock(clock);

        let line = "y".repeat(99);
        for _ in 0..6 {
            appender.append(&entry(&line)).unwrap();
        }

        let archives = appender.archives().unwrap();
        assert_eq!(archives.len(), 2);
        let total: u64 = archives.iter().map(|p| fs::metadata(p).unwrap().len()).sum();
        assert!(total <= 250);
        assert!(archives[1].ends_with("cap.2025-01-08.4.log"));
    }

    #[test]
    fn test_time_rollover_resets_index() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("t.%d{yyyy-MM-dd}.%i.log");
        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "10", "0", 0).unwrap();
        let (clock, now) = fixed_clock(start_time());
        let mut appender = RollingFileAppender::new(config, Some("%msg%n"))
            .unwrap()
            .with_clock(clock);

        appender.append(&entry("day-one-a")).unwrap();
        appender.append(&entry("day-one-b")).unwrap();
        assert_eq!(appender.current_index(), 1);

        *now.lock() = start_time() + Duration::days(1);
        appender.append(&entry("day-two")).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("t.2025-01-08.0.log")).unwrap(),
            "day-one-a\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("t.2025-01-08.1.log")).unwrap(),
            "day-one-b\n"
        );
        assert_eq!(appender.current_index(), 0);
        assert_eq!(fs::read_to_string(dir.path().join("t.log")).unwrap(), "day-two\n");
    }

    #[test]
    fn test_gzip_archives() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("z.%d{yyyy-MM-dd}.%i.log.gz");
        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "10", "0", 0).unwrap();
        let (clock, _) = fixed_clock(start_time());
        let mut appender = RollingFileAppender::new(config, Some("%msg%n"))
            .unwrap()
            .with_clock(clock);

        appender.append(&entry("compressed-line")).unwrap();
        appender.append(&entry("next")).unwrap();

        let archive = dir.path().join("z.2025-01-08.0.log.gz");
        assert!(archive.exists());
        assert!(!dir.path().join("z.2025-01-08.0.log").exists());

        let mut decoder = flate2::read::GzDecoder::new(File::open(&archive).unwrap());
        let mut content = String::new();
        decoder.read_to_string(&mut content).unwrap();
        assert_eq!(content, "compressed-line\n");
    }

    #[test]
    fn test_failed_compression_keeps_staged_archive() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("z.%d{yyyy-MM-dd}.%i.log.gz");
        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "10", "0", 0).unwrap();
        let (clock, _) = fixed_clock(start_time());
        let mut appender = RollingFileAppender::new(config, Some("%msg%n"))
            .unwrap()
            .with_clock(clock);

        // A directory at the temp path makes the first gzip fail
        let blocker = dir.path().join("z.2025-01-08.0.log.gz.tmp");
        fs::create_dir(&blocker).unwrap();

        appender.append(&entry("first-batch")).unwrap();
        appender.append(&entry("second-batch")).unwrap();
        let staged = dir.path().join("z.2025-01-08.0.log");
        assert_eq!(fs::read_to_string(&staged).unwrap(), "first-batch\n");

        fs::remove_dir(&blocker).unwrap();
        appender.append(&entry("third")).unwrap();

        assert_eq!(fs::read_to_string(&staged).unwrap(), "first-batch\n");
        let archive = dir.path().join("z.2025-01-08.1.log.gz");
        let mut decoder = flate2::read::GzDecoder::new(File::open(&archive).unwrap());
        let mut content = String::new();
        decoder.read_to_string(&mut content).unwrap();
        assert_eq!(content, "second-batch\n");
        assert_eq!(fs::read_to_string(dir.path().join("z.log")).unwrap(), "third\n");
    }

    #[test]
    fn test_resume_index_after_restart() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("r.%d{yyyy-MM-dd}.%i.log");
        fs::write(dir.path().join("r.2025-01-08.0.log"), "old\n").unwrap();
        fs::write(dir.path().join("r.2025-01-08.1.log"), "old\n").unwrap();

        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "1KB", "0", 0).unwrap();
        let (clock, _) = fixed_clock(start_time());
        let appender = RollingFileAppender::new(config, None).unwrap().with_clock(clock);
        assert_eq!(appender.current_index(), 2);
    }

    #[test]
    fn test_explicit_active_file() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("archive").join("e.%d{yyyy-MM-dd}.%i.log");
        let active = dir.path().join("current").join("e.log");
        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "1MB", "0", 0)
            .unwrap()
            .with_file(&active);

        let appender = RollingFileAppender::new(config, None).unwrap();
        assert_eq!(appender.path(), active);
        assert!(active.exists());
        assert!(dir.path().join("archive").is_dir());
    }

    #[test]
    fn test_invalid_sizes() {
        let err = RollingFileConfig::from_literals("/tmp/a.%d.%i.log", "10XB", "1GB", 3).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidSizeSpec { .. }));
        let err = RollingFileConfig::from_literals("/tmp/a.%d.%i.log", "10MB", "", 3).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidSizeSpec { .. }));
    }

    #[test]
    fn test_stop_releases_file() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("s.%d.%i.log");
        let config = RollingFileConfig::from_literals(pattern.to_str().unwrap(), "1MB", "0", 0).unwrap();
        let mut appender = RollingFileAppender::new(config, Some("%msg%n")).unwrap();

        appender.append(&entry("before stop")).unwrap();
        appender.stop().unwrap();
        assert_eq!(appender.state(), LifecycleState::Stopped);
        assert!(appender.append(&entry("after stop")).is_err());
        assert_eq!(fs::read_to_string(dir.path().join("s.log")).unwrap(), "before stop\n");
    }
}

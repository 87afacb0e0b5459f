//! Logger registry: named loggers, their thresholds and attached destinations
//!
//! Loggers form a dotted hierarchy (`"a.b.c"` is a child of `"a.b"`) under an
//! implicit root logger `""`. An event emitted on a name is handled by the
//! nearest configured logger:
//!
//! - the effective threshold is the nearest explicitly set level on the
//!   chain towards the root;
//! - the event is written to that logger's destinations and then to each
//!   ancestor's, stopping after the first logger that is not additive.
//!
//! Every `add_*_destination` sets the logger's threshold and turns additivity
//! off, so a logger configured through them only writes to its own
//! destinations.

use super::appender::{Appender, DestinationKind};
use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use super::log_level::{LevelFilter, LogLevel};
use super::metrics::{RegistryMetrics, StatusCallback, StatusReporter};
use crate::appenders::{
    ConsoleAppender, Facility, RollingFileAppender, RollingFileConfig, StreamAppender,
    SyslogAppender,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Name of the implicit root logger
pub const ROOT_LOGGER: &str = "";

type SharedAppender = Arc<Mutex<Box<dyn Appender>>>;

/// Immutable logger configuration; replaced wholesale on every change
#[derive(Clone)]
struct LoggerNode {
    name: String,
    level: Option<LevelFilter>,
    additive: bool,
    destinations: Vec<(DestinationKind, SharedAppender)>,
}

impl LoggerNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: None,
            additive: true,
            destinations: Vec::new(),
        }
    }

    fn root() -> Self {
        Self {
            level: Some(LevelFilter::Debug),
            ..Self::new(ROOT_LOGGER)
        }
    }

    fn has(&self, kind: DestinationKind) -> bool {
        self.destinations.iter().any(|(k, _)| *k == kind)
    }
}

/// Read-only view of one configured logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerSnapshot {
    pub name: String,
    /// Explicit threshold; `None` inherits from the nearest ancestor
    pub level: Option<LevelFilter>,
    pub additive: bool,
    pub destinations: Vec<DestinationKind>,
}

struct RegistryState {
    initialized: AtomicBool,
    loggers: RwLock<HashMap<String, Arc<LoggerNode>>>,
    status: StatusReporter,
}

impl RegistryState {
    fn take_all(&self) -> Vec<Arc<LoggerNode>> {
        self.loggers.write().drain().map(|(_, node)| node).collect()
    }

    fn stop_node(&self, node: &LoggerNode) {
        for (kind, appender) in &node.destinations {
            self.stop_destination(&node.name, *kind, appender);
        }
    }

    fn stop_destination(&self, logger: &str, kind: DestinationKind, appender: &SharedAppender) {
        let result = catch_unwind(AssertUnwindSafe(|| appender.lock().stop()));
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self
                .status
                .report(&format!("{} on logger '{}' failed to stop", kind, logger), &e),
            Err(panic_info) => eprintln!(
                "[LOGGER CRITICAL] {} on logger '{}' panicked while stopping: {}",
                kind,
                logger,
                panic_message(&*panic_info)
            ),
        }
    }
}

impl Drop for RegistryState {
    fn drop(&mut self) {
        for node in self.take_all() {
            self.stop_node(&node);
        }
        let metrics = self.status.metrics();
        let failures = metrics.write_failures() + metrics.transport_failures();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] Registry shutting down after {} failed deliveries",
                failures
            );
        }
    }
}

/// Shared handle to the logger configuration
///
/// Clones share the same state. Destinations are stopped by
/// [`shutdown`](Self::shutdown) or when the last handle is dropped.
///
/// # Example
///
/// ```
/// use rust_logger_registry::{LevelFilter, LoggerRegistry};
///
/// let registry = LoggerRegistry::new();
/// registry.reset();
/// registry
///     .add_stream_destination(Vec::<u8>::new(), "svc.core", LevelFilter::Info, Some("%level %msg%n"))
///     .unwrap();
///
/// let log = registry.logger("svc.core");
/// log.debug("suppressed");
/// log.error("written");
/// assert_eq!(registry.metrics().filtered_count(), 1);
/// ```
#[derive(Clone)]
pub struct LoggerRegistry {
    inner: Arc<RegistryState>,
}

impl LoggerRegistry {
    /// Uninitialized registry; call [`reset`](Self::reset) before configuring
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryState {
                initialized: AtomicBool::new(false),
                loggers: RwLock::new(HashMap::new()),
                status: StatusReporter::new(),
            }),
        }
    }

    /// A registry that is ready for configuration
    pub fn initialized() -> Self {
        let registry = Self::new();
        registry.reset();
        registry
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    /// Stop every destination and return to the baseline: only the root
    /// logger, at DEBUG, with no destinations
    pub fn reset(&self) {
        let old = {
            let mut loggers = self.inner.loggers.write();
            let old: Vec<_> = loggers.drain().map(|(_, node)| node).collect();
            loggers.insert(ROOT_LOGGER.to_string(), Arc::new(LoggerNode::root()));
            old
        };
        self.inner.initialized.store(true, Ordering::Release);
        for node in old {
            self.inner.stop_node(&node);
        }
    }

    /// Stop and flush all destinations; the registry must be reset before reuse
    pub fn shutdown(&self) {
        self.inner.initialized.store(false, Ordering::Release);
        for node in self.inner.take_all() {
            self.inner.stop_node(&node);
        }
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(LoggerError::NotInitialized)
        }
    }

    /// Copy-on-write update of one logger entry
    fn update<R>(&self, name: &str, f: impl FnOnce(&mut LoggerNode) -> R) -> Result<R> {
        self.ensure_initialized()?;
        let mut loggers = self.inner.loggers.write();
        let mut node = loggers
            .get(name)
            .map(|node| LoggerNode::clone(node))
            .unwrap_or_else(|| LoggerNode::new(name));
        let result = f(&mut node);
        loggers.insert(name.to_string(), Arc::new(node));
        Ok(result)
    }

    /// Attach a started destination to `name`
    ///
    /// Sets the logger's threshold to `level` and its additivity to false. A
    /// destination of the same kind already on the logger is stopped and
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before [`reset`](Self::reset).
    pub fn attach_destination(
        &self,
        name: &str,
        level: impl Into<LevelFilter>,
        appender: Box<dyn Appender>,
    ) -> Result<()> {
        let level = level.into();
        let kind = appender.kind();
        let appender: SharedAppender = Arc::new(Mutex::new(appender));

        let replaced = self.update(name, |node| {
            node.level = Some(level);
            node.additive = false;
            match node.destinations.iter_mut().find(|(k, _)| *k == kind) {
                Some(slot) => Some(std::mem::replace(&mut slot.1, appender)),
                None => {
                    node.destinations.push((kind, appender));
                    None
                }
            }
        })?;

        if let Some(old) = replaced {
            self.inner.stop_destination(name, kind, &old);
        }
        Ok(())
    }

    /// Console destination on stdout using `pattern` or the default template
    pub fn add_console_destination(
        &self,
        name: &str,
        level: impl Into<LevelFilter>,
        pattern: Option<&str>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        let appender = ConsoleAppender::new(pattern)?;
        self.attach_destination(name, level, Box::new(appender))
    }

    /// Rolling file destination; the active file is derived from `file_name_pattern`
    ///
    /// # Errors
    ///
    /// `InvalidSizeSpec` for malformed size literals, `InvalidConfiguration`
    /// for a bad file-name pattern, `FileSystem` if the file cannot be created.
    #[allow(clippy::too_many_arguments)]
    pub fn add_file_destination(
        &self,
        name: &str,
        level: impl Into<LevelFilter>,
        pattern: Option<&str>,
        file_name_pattern: &str,
        max_file_size: &str,
        total_size_cap: &str,
        max_history: usize,
    ) -> Result<()> {
        let config = RollingFileConfig::from_literals(
            file_name_pattern,
            max_file_size,
            total_size_cap,
            max_history,
        )?;
        self.add_file_destination_with(name, level, pattern, config)
    }

    pub fn add_file_destination_with(
        &self,
        name: &str,
        level: impl Into<LevelFilter>,
        pattern: Option<&str>,
        config: RollingFileConfig,
    ) -> Result<()> {
        self.ensure_initialized()?;
        let appender = RollingFileAppender::new(config, pattern)?.with_status(self.inner.status.clone());
        self.attach_destination(name, level, Box::new(appender))
    }

    /// Syslog destination sending UDP datagrams to `host:port`
    ///
    /// An unresolvable host does not fail the call. It is reported on the
    /// status channel and resolution is retried at most once per
    /// [`RESOLVE_RETRY_INTERVAL`](crate::appenders::syslog::RESOLVE_RETRY_INTERVAL).
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an unknown facility name.
    pub fn add_syslog_destination(
        &self,
        name: &str,
        level: impl Into<LevelFilter>,
        host: &str,
        port: u16,
        facility: &str,
        pattern: Option<&str>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        let facility: Facility = facility.parse()?;
        let mut appender = SyslogAppender::new(host, port, facility, pattern)?;
        if let Err(e) = appender.resolve() {
            self.inner
                .status
                .report(&format!("SyslogAppender for logger '{}'", name), &e);
        }
        self.attach_destination(name, level, Box::new(appender))
    }

    /// Destination writing to a caller-supplied stream
    pub fn add_stream_destination(
        &self,
        stream: impl Write + Send + 'static,
        name: &str,
        level: impl Into<LevelFilter>,
        pattern: Option<&str>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        let appender = StreamAppender::new(stream, pattern)?;
        self.attach_destination(name, level, Box::new(appender))
    }

    /// Stop the `kind` destination of `name` and remove the logger entry
    ///
    /// The whole entry goes away: its threshold and any other destinations
    /// are discarded too, and the destinations are stopped. Detaching from
    /// the root logger resets it to the baseline instead.
    ///
    /// # Errors
    ///
    /// `DestinationNotFound` if the logger exists without a `kind`
    /// destination. A missing logger is not an error.
    pub fn detach_destination(&self, name: &str, kind: DestinationKind) -> Result<()> {
        self.ensure_initialized()?;
        let removed = {
            let mut loggers = self.inner.loggers.write();
            let has_kind = match loggers.get(name) {
                None => return Ok(()),
                Some(node) => node.has(kind),
            };
            if !has_kind {
                return Err(LoggerError::destination_not_found(name, kind));
            }
            if name == ROOT_LOGGER {
                loggers.insert(ROOT_LOGGER.to_string(), Arc::new(LoggerNode::root()))
            } else {
                loggers.remove(name)
            }
        };

        let Some(node) = removed else {
            return Ok(());
        };
        let mut result = Ok(());
        for (k, appender) in &node.destinations {
            if *k == kind {
                result = appender.lock().stop();
            } else {
                self.inner.stop_destination(name, *k, appender);
            }
        }
        result
    }

    /// Set the threshold of `name`, creating the logger if needed
    pub fn set_level(&self, name: &str, level: impl Into<LevelFilter>) -> Result<()> {
        let level = level.into();
        self.update(name, |node| node.level = Some(level))
    }

    /// Set whether events on `name` also reach its ancestors' destinations
    pub fn set_additive(&self, name: &str, additive: bool) -> Result<()> {
        self.update(name, |node| node.additive = additive)
    }

    pub fn logger_snapshot(&self, name: &str) -> Option<LoggerSnapshot> {
        let loggers = self.inner.loggers.read();
        loggers.get(name).map(|node| LoggerSnapshot {
            name: node.name.clone(),
            level: node.level,
            additive: node.additive,
            destinations: node.destinations.iter().map(|(kind, _)| *kind).collect(),
        })
    }

    pub fn contains_logger(&self, name: &str) -> bool {
        self.inner.loggers.read().contains_key(name)
    }

    /// Configured logger names, sorted, without the root
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .inner
            .loggers
            .read()
            .keys()
            .filter(|name| !name.is_empty())
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Threshold applied to events emitted on `name`
    pub fn effective_level(&self, name: &str) -> LevelFilter {
        Self::threshold(&self.chain(name))
    }

    /// Emission handle for `name`
    pub fn logger(&self, name: &str) -> Logger {
        Logger {
            name: Arc::from(name),
            registry: self.clone(),
        }
    }

    pub fn metrics(&self) -> &RegistryMetrics {
        self.inner.status.metrics()
    }

    /// Receive every error swallowed on the emission path
    ///
    /// The callback runs on the emitting thread with no destination locked,
    /// so it may log through this registry.
    pub fn on_status(&self, callback: impl Fn(&LoggerError) + Send + Sync + 'static) {
        let callback: StatusCallback = Arc::new(callback);
        self.inner.status.set_callback(Some(callback));
    }

    /// Flush every destination
    ///
    /// # Errors
    ///
    /// Returns the first flush error; the remaining destinations are still flushed.
    pub fn flush(&self) -> Result<()> {
        let nodes: Vec<_> = self.inner.loggers.read().values().cloned().collect();
        let mut first_error = None;
        for node in nodes {
            for (_, appender) in &node.destinations {
                if let Err(e) = appender.lock().flush() {
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Configured loggers from `name` towards the root, nearest first
    fn chain(&self, name: &str) -> Vec<Arc<LoggerNode>> {
        let loggers = self.inner.loggers.read();
        let mut chain = Vec::new();
        let mut current = name;
        loop {
            if let Some(node) = loggers.get(current) {
                chain.push(Arc::clone(node));
            }
            if current.is_empty() {
                break;
            }
            current = match current.rfind('.') {
                Some(idx) => &current[..idx],
                None => ROOT_LOGGER,
            };
        }
        chain
    }

    fn threshold(chain: &[Arc<LoggerNode>]) -> LevelFilter {
        chain
            .iter()
            .find_map(|node| node.level)
            .unwrap_or_default()
    }

    fn emit(&self, name: &str, level: LogLevel, message: &str, location: &Location<'_>) {
        if !self.is_initialized() {
            return;
        }
        let metrics = self.inner.status.metrics();
        let chain = self.chain(name);
        if !Self::threshold(&chain).admits(level) {
            metrics.record_filtered();
            return;
        }

        let entry = LogEntry::new(level, name, message).with_caller(location);
        let mut delivered = false;

        for node in &chain {
            for (kind, appender) in &node.destinations {
                let result = catch_unwind(AssertUnwindSafe(|| appender.lock().append(&entry)));
                match result {
                    Ok(Ok(())) => delivered = true,
                    Ok(Err(e)) => self
                        .inner
                        .status
                        .report(&format!("{} on logger '{}' failed", kind, node.name), &e),
                    Err(panic_info) => {
                        let error = LoggerError::AppenderPanicked {
                            kind: *kind,
                            message: panic_message(&*panic_info),
                        };
                        self.inner.status.report(
                            &format!(
                                "{} on logger '{}' panicked; other destinations continue",
                                kind, node.name
                            ),
                            &error,
                        );
                    }
                }
            }
            if !node.additive {
                break;
            }
        }

        self.inner.status.dispatch_deferred();
        if delivered {
            metrics.record_delivered();
        }
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("initialized", &self.is_initialized())
            .field("loggers", &self.logger_names())
            .finish()
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Emission handle for one logger name
///
/// Cheap to clone. Each call records the caller's file and line.
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    registry: LoggerRegistry,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.registry.is_initialized() && self.registry.effective_level(&self.name).admits(level)
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.registry
            .emit(&self.name, level, message.as_ref(), Location::caller());
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

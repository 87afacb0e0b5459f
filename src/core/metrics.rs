//! Registry metrics and the status channel for emission-time failures
//!
//! Errors that happen while delivering an event never reach the code that
//! logged it. They are counted here, printed to stderr and handed to an
//! optional [`StatusCallback`].

use super::error::LoggerError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked for every swallowed emission-time error
pub type StatusCallback = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Counters for registry observability
///
/// # Example
///
/// ```
/// use rust_logger_registry::RegistryMetrics;
///
/// let metrics = RegistryMetrics::new();
/// metrics.record_delivered();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.delivered_count(), 1);
/// assert_eq!(metrics.filtered_count(), 1);
/// ```
#[derive(Debug)]
pub struct RegistryMetrics {
    /// Events written to at least one destination without error
    delivered: AtomicU64,

    /// Events rejected by the effective threshold
    filtered: AtomicU64,

    /// Destination writes that failed or panicked
    write_failures: AtomicU64,

    /// Syslog sends that could not reach the endpoint
    transport_failures: AtomicU64,

    /// Completed file rollovers
    rollovers: AtomicU64,
}

impl RegistryMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            rollovers: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rollovers(&self) -> u64 {
        self.rollovers.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rollover(&self) -> u64 {
        self.rollovers.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an emission-time failure under the matching counter
    pub fn record_failure(&self, error: &LoggerError) {
        match error {
            LoggerError::TransportUnavailable { .. } => {
                self.transport_failures.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.delivered.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.transport_failures.store(0, Ordering::Relaxed);
        self.rollovers.store(0, Ordering::Relaxed);
    }
}

impl Default for RegistryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RegistryMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            delivered: AtomicU64::new(self.delivered_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            write_failures: AtomicU64::new(self.write_failures()),
            transport_failures: AtomicU64::new(self.transport_failures()),
            rollovers: AtomicU64::new(self.rollovers()),
        }
    }
}

/// Fallback channel shared by the registry and its destinations
#[derive(Clone, Default)]
pub struct StatusReporter {
    metrics: Arc<RegistryMetrics>,
    callback: Arc<parking_lot::RwLock<Option<StatusCallback>>>,
    /// Errors raised under a destination lock, awaiting the callback
    deferred: Arc<parking_lot::Mutex<Vec<LoggerError>>>,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &Arc<RegistryMetrics> {
        &self.metrics
    }

    pub fn set_callback(&self, callback: Option<StatusCallback>) {
        *self.callback.write() = callback;
    }

    /// Report a swallowed error: count it, print it, forward it
    pub fn report(&self, context: &str, error: &LoggerError) {
        self.record(context, error);
        let callback = self.callback.read().clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }

    /// Like [`report`](Self::report), but the callback runs on the next
    /// [`dispatch_deferred`](Self::dispatch_deferred)
    ///
    /// Destinations use this while their lock is held, so a callback that
    /// logs cannot re-enter the same destination.
    pub fn defer(&self, context: &str, error: LoggerError) {
        self.record(context, &error);
        if self.callback.read().is_some() {
            self.deferred.lock().push(error);
        }
    }

    /// Hand deferred errors to the callback; call with no destination locked
    pub fn dispatch_deferred(&self) {
        let pending = std::mem::take(&mut *self.deferred.lock());
        if pending.is_empty() {
            return;
        }
        let callback = self.callback.read().clone();
        if let Some(callback) = callback {
            for error in &pending {
                callback(error);
            }
        }
    }

    fn record(&self, context: &str, error: &LoggerError) {
        self.metrics.record_failure(error);
        match error {
            LoggerError::TransportUnavailable { .. } => {
                eprintln!("[LOGGER WARNING] {}: {}", context, error)
            }
            _ => eprintln!("[LOGGER ERROR] {}: {}", context, error),
        }
    }
}

impl std::fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReporter")
            .field("metrics", &self.metrics)
            .field("has_callback", &self.callback.read().is_some())
            .finish()
    }
}

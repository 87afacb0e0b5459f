//! Syslog appender for remote logging
//!
//! Sends one RFC 3164 datagram per event over UDP:
//! `<PRI>Mmm dd hh:mm:ss HOSTNAME message`, where `PRI = facility * 8 + severity`.

use crate::core::{
    Appender, DestinationKind, LifecycleState, LogEntry, LoggerError, PatternLayout, Result,
    SYSLOG_PATTERN,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Largest message body sent in one datagram
pub const MAX_MESSAGE_BYTES: usize = 65_000;

/// Default delay between lookups of an unresolved host
pub const RESOLVE_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Standard syslog facilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Facility {
    Kern,
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    AuthPriv,
    Ftp,
    Ntp,
    Audit,
    Alert,
    Clock,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    const ALL: [Facility; 24] = [
        Facility::Kern,
        Facility::User,
        Facility::Mail,
        Facility::Daemon,
        Facility::Auth,
        Facility::Syslog,
        Facility::Lpr,
        Facility::News,
        Facility::Uucp,
        Facility::Cron,
        Facility::AuthPriv,
        Facility::Ftp,
        Facility::Ntp,
        Facility::Audit,
        Facility::Alert,
        Facility::Clock,
        Facility::Local0,
        Facility::Local1,
        Facility::Local2,
        Facility::Local3,
        Facility::Local4,
        Facility::Local5,
        Facility::Local6,
        Facility::Local7,
    ];

    /// Numeric facility code
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Facility::Kern => "KERN",
            Facility::User => "USER",
            Facility::Mail => "MAIL",
            Facility::Daemon => "DAEMON",
            Facility::Auth => "AUTH",
            Facility::Syslog => "SYSLOG",
            Facility::Lpr => "LPR",
            Facility::News => "NEWS",
            Facility::Uucp => "UUCP",
            Facility::Cron => "CRON",
            Facility::AuthPriv => "AUTHPRIV",
            Facility::Ftp => "FTP",
            Facility::Ntp => "NTP",
            Facility::Audit => "AUDIT",
            Facility::Alert => "ALERT",
            Facility::Clock => "CLOCK",
            Facility::Local0 => "LOCAL0",
            Facility::Local1 => "LOCAL1",
            Facility::Local2 => "LOCAL2",
            Facility::Local3 => "LOCAL3",
            Facility::Local4 => "LOCAL4",
            Facility::Local5 => "LOCAL5",
            Facility::Local6 => "LOCAL6",
            Facility::Local7 => "LOCAL7",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facility {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                LoggerError::config("SyslogAppender", format!("unknown syslog facility '{}'", s))
            })
    }
}

/// Syslog appender sending UDP datagrams
///
/// Host resolution failure is not fatal: the appender stays usable and
/// retries the lookup at most once per retry interval. Events sent while
/// the host is unresolved fail with `TransportUnavailable` without a lookup.
///
/// # Example
///
/// ```no_run
/// use rust_logger_registry::appenders::{Facility, SyslogAppender};
///
/// let mut appender = SyslogAppender::new("localhost", 514, Facility::User, None).unwrap();
/// appender.resolve().unwrap();
/// ```
pub struct SyslogAppender {
    socket: Option<UdpSocket>,
    host: String,
    port: u16,
    address: Option<SocketAddr>,
    retry_interval: Duration,
    last_lookup: Option<Instant>,
    lookups: u64,
    facility: Facility,
    hostname: String,
    layout: PatternLayout,
    state: LifecycleState,
}

impl SyslogAppender {
    /// Bind a local UDP socket for sending to `host:port`
    ///
    /// The host is not resolved here; call [`resolve`](Self::resolve) to
    /// find out early whether it can be reached.
    ///
    /// # Errors
    ///
    /// `InvalidPattern` for a bad layout, `TransportUnavailable` if no local
    /// socket can be bound.
    pub fn new(host: impl Into<String>, port: u16, facility: Facility, pattern: Option<&str>) -> Result<Self> {
        let host = host.into();
        let layout = PatternLayout::compile_or(pattern, SYSLOG_PATTERN)?;
        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .map_err(|e| LoggerError::transport(format!("{}:{}", host, port), e.to_string()))?;

        Ok(Self {
            socket: Some(socket),
            host,
            port,
            address: None,
            retry_interval: RESOLVE_RETRY_INTERVAL,
            last_lookup: None,
            lookups: 0,
            facility,
            hostname: local_hostname(),
            layout,
            state: LifecycleState::Started,
        })
    }

    /// Override the HOSTNAME field of outgoing datagrams
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Minimum delay between host lookups while the host is unresolved
    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn facility(&self) -> Facility {
        self.facility
    }

    pub fn is_resolved(&self) -> bool {
        self.address.is_some()
    }

    /// Number of host lookups performed so far
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    /// Resolve the endpoint, caching the first address found
    ///
    /// # Errors
    ///
    /// Returns `TransportUnavailable` if the host cannot be resolved.
    pub fn resolve(&mut self) -> Result<SocketAddr> {
        if let Some(address) = self.address {
            return Ok(address);
        }
        let endpoint = self.endpoint();
        self.lookups += 1;
        self.last_lookup = Some(Instant::now());
        let address = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| LoggerError::transport(&endpoint, e.to_string()))?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| LoggerError::transport(&endpoint, "no IPv4 address for host"))?;
        self.address = Some(address);
        Ok(address)
    }

    /// Cached address, or a lookup if the retry interval has elapsed
    fn address_for_send(&mut self) -> Result<SocketAddr> {
        if self.address.is_none() {
            if let Some(last) = self.last_lookup {
                if last.elapsed() < self.retry_interval {
                    return Err(LoggerError::transport(
                        self.endpoint(),
                        "host unresolved; waiting before the next lookup",
                    ));
                }
            }
        }
        self.resolve()
    }

    /// Build the datagram payload for `entry`
    pub fn format_datagram(&self, entry: &LogEntry) -> String {
        let priority = u16::from(self.facility.code()) * 8 + u16::from(entry.level.syslog_severity());

        let rendered = self.layout.render(entry);
        let mut body = rendered.trim_end_matches(['\r', '\n']);
        if body.len() > MAX_MESSAGE_BYTES {
            let mut cut = MAX_MESSAGE_BYTES;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body = &body[..cut];
        }

        format!(
            "<{}>{} {} {}",
            priority,
            entry.timestamp.format("%b %e %H:%M:%S"),
            self.hostname,
            body
        )
    }
}

impl Appender for SyslogAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        if self.state != LifecycleState::Started {
            return Err(LoggerError::AppenderStopped(DestinationKind::Syslog));
        }
        let address = self.address_for_send()?;
        let datagram = self.format_datagram(entry);

        let socket = self
            .socket
            .as_ref()
            .ok_or(LoggerError::AppenderStopped(DestinationKind::Syslog))?;
        socket
            .send_to(datagram.as_bytes(), address)
            .map_err(|e| LoggerError::transport(self.endpoint(), e.to_string()))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.state = LifecycleState::Stopped;
        self.socket = None;
        Ok(())
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::Syslog
    }
}

fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty() && !h.contains(' '))
        .unwrap_or_else(|| "localhost".to_string())
}

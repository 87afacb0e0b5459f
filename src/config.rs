//! Declarative registry configuration
//!
//! A [`RegistryConfig`] lists loggers and their destinations and is replayed
//! onto a [`LoggerRegistry`] through the same operations used in code.
//!
//! ```
//! use rust_logger_registry::config::RegistryConfig;
//!
//! let config = RegistryConfig::from_json_str(r#"{
//!     "loggers": [
//!         {
//!             "name": "svc.core",
//!             "level": "INFO",
//!             "destinations": [{ "kind": "console", "target": "stderr" }]
//!         },
//!         { "name": "svc.noisy", "level": "OFF" }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(config.loggers.len(), 2);
//! ```

use crate::appenders::{ConsoleAppender, ConsoleTarget, RollingFileConfig};
use crate::core::{LevelFilter, LoggerError, LoggerRegistry, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub loggers: Vec<LoggerConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub name: String,
    #[serde(default)]
    pub level: LevelFilter,
    /// Applied after the destinations, which otherwise turn additivity off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additive: Option<bool>,
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationConfig {
    Console {
        #[serde(default)]
        pattern: Option<String>,
        #[serde(default)]
        target: ConsoleTarget,
    },
    File {
        #[serde(default)]
        pattern: Option<String>,
        #[serde(flatten)]
        rolling: RollingFileConfig,
    },
    Syslog {
        #[serde(default)]
        pattern: Option<String>,
        host: String,
        #[serde(default = "default_syslog_port")]
        port: u16,
        facility: String,
    },
}

fn default_syslog_port() -> u16 {
    514
}

impl RegistryConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::file_system(path.display().to_string(), "reading configuration", e)
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl LoggerRegistry {
    /// Replay `config` onto this registry
    ///
    /// Loggers are applied in order. The first failing operation stops the
    /// replay and is returned; loggers applied before it stay configured.
    pub fn apply_config(&self, config: &RegistryConfig) -> Result<()> {
        for logger in &config.loggers {
            let name = logger.name.as_str();
            if logger.destinations.is_empty() {
                self.set_level(name, logger.level)?;
            }
            for destination in &logger.destinations {
                match destination {
                    DestinationConfig::Console { pattern, target } => {
                        let appender = ConsoleAppender::with_target(*target, pattern.as_deref())?;
                        self.attach_destination(name, logger.level, Box::new(appender))?;
                    }
                    DestinationConfig::File { pattern, rolling } => {
                        self.add_file_destination_with(
                            name,
                            logger.level,
                            pattern.as_deref(),
                            rolling.clone(),
                        )?;
                    }
                    DestinationConfig::Syslog {
                        pattern,
                        host,
                        port,
                        facility,
                    } => {
                        self.add_syslog_destination(
                            name,
                            logger.level,
                            host,
                            *port,
                            facility,
                            pattern.as_deref(),
                        )?;
                    }
                }
            }
            if let Some(additive) = logger.additive {
                self.set_additive(name, additive)?;
            }
        }
        Ok(())
    }
}

//! Check definitions as they appear in configuration, and their resolved form.

use crate::types::CheckType;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP request timeout (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: f64 = 5.0;
/// Default ping timeout (seconds)
pub const DEFAULT_PING_TIMEOUT_SECS: f64 = 2.0;
/// Default TCP connect timeout (seconds)
pub const DEFAULT_TCP_TIMEOUT_SECS: f64 = 3.0;
/// Default number of echo requests per ping check
pub const DEFAULT_PING_COUNT: u32 = 3;
/// Default expected HTTP status
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;
/// Check tag used when a network entry has no `type`
pub const DEFAULT_NETWORK_TYPE: &str = "ping";

/// A check entry that cannot be turned into a probe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid timeout {0}: must be a positive number of seconds")]
    InvalidTimeout(f64),

    #[error("invalid ping count 0: must be at least 1")]
    InvalidCount,
}

/// HTTP service entry (`services:` list).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceCheck {
    pub name: Option<String>,
    pub url: Option<String>,
    pub expected_status: Option<u16>,
    /// Seconds
    pub timeout: Option<f64>,
}

/// Network entry (`network_checks:` list).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NetworkCheck {
    pub name: Option<String>,
    /// `ping`, `dns` or `tcp`; `ping` when absent
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Seconds
    pub timeout: Option<f64>,
    pub count: Option<u32>,
}

/// Probe to run, with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Http {
        url: String,
        expected_status: u16,
        timeout: Duration,
    },
    Ping {
        host: String,
        count: u32,
        timeout: Duration,
    },
    Dns {
        host: String,
    },
    Tcp {
        host: String,
        port: u16,
        timeout: Duration,
    },
    /// The entry's tag names no probe.
    Unknown {
        kind: String,
        host: String,
    },
}

/// A resolved check: display name plus probe.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckDefinition {
    pub name: String,
    pub probe: Probe,
}

/// A configuration entry that resolves into a [`CheckDefinition`].
pub trait CheckEntry {
    /// Configuration section the entry lives in, used in error messages.
    const SECTION: &'static str;

    fn resolve(&self) -> Result<CheckDefinition, DefinitionError>;
}

impl CheckEntry for ServiceCheck {
    const SECTION: &'static str = "services";

    fn resolve(&self) -> Result<CheckDefinition, DefinitionError> {
        let url = required(&self.url, "url")?;
        let timeout = seconds(self.timeout, DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(CheckDefinition {
            name: self.name.clone().unwrap_or_else(|| url.clone()),
            probe: Probe::Http {
                url,
                expected_status: self.expected_status.unwrap_or(DEFAULT_EXPECTED_STATUS),
                timeout,
            },
        })
    }
}

impl CheckEntry for NetworkCheck {
    const SECTION: &'static str = "network_checks";

    fn resolve(&self) -> Result<CheckDefinition, DefinitionError> {
        let tag = self.kind.as_deref().unwrap_or(DEFAULT_NETWORK_TYPE);
        let host = required(&self.host, "host")?;
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{tag} {host}"));

        // HTTP checks belong under `services`; here the tag names no probe.
        let probe = match CheckType::from(tag) {
            CheckType::Ping => {
                let count = self.count.unwrap_or(DEFAULT_PING_COUNT);
                if count == 0 {
                    return Err(DefinitionError::InvalidCount);
                }
                Probe::Ping {
                    host,
                    count,
                    timeout: seconds(self.timeout, DEFAULT_PING_TIMEOUT_SECS)?,
                }
            }
            CheckType::Dns => Probe::Dns { host },
            CheckType::Tcp => Probe::Tcp {
                port: self.port.ok_or(DefinitionError::MissingField("port"))?,
                timeout: seconds(self.timeout, DEFAULT_TCP_TIMEOUT_SECS)?,
                host,
            },
            CheckType::Http | CheckType::Unknown(_) => Probe::Unknown {
                kind: tag.to_string(),
                host,
            },
        };

        Ok(CheckDefinition { name, probe })
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, DefinitionError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DefinitionError::MissingField(field)),
    }
}

fn seconds(value: Option<f64>, default: f64) -> Result<Duration, DefinitionError> {
    let secs = value.unwrap_or(default);
    if secs.is_nan() || secs <= 0.0 {
        return Err(DefinitionError::InvalidTimeout(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| DefinitionError::InvalidTimeout(secs))
}

//! Health check result types.

use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Kind of probe that produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CheckType {
    /// HTTP GET against a URL
    Http,
    /// ICMP ping through the system `ping` utility
    Ping,
    /// IPv4 resolution through the system resolver
    Dns,
    /// TCP connect
    Tcp,
    /// Tag that names no known probe; kept verbatim for reporting.
    Unknown(String),
}

impl CheckType {
    pub fn as_str(&self) -> &str {
        match self {
            CheckType::Http => "http",
            CheckType::Ping => "ping",
            CheckType::Dns => "dns",
            CheckType::Tcp => "tcp",
            CheckType::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for CheckType {
    fn from(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "http" => CheckType::Http,
            "ping" => CheckType::Ping,
            "dns" => CheckType::Dns,
            "tcp" => CheckType::Tcp,
            _ => CheckType::Unknown(tag.to_string()),
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CheckType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of a single probe.
///
/// `ok`, `kind` and `response_time_ms` are always populated, whichever path
/// produced the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    /// Display name of the check
    pub name: String,

    /// Probe kind
    #[serde(rename = "type")]
    pub kind: CheckType,

    /// URL for HTTP checks, host otherwise
    pub target: String,

    /// Port (TCP checks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Resolved address (DNS checks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,

    /// Whether the probe met its success criterion
    pub ok: bool,

    /// Response code (HTTP checks)
    pub status_code: Option<u16>,

    /// Wall-clock duration of the attempt, rounded to two decimals
    pub response_time_ms: f64,

    /// Proximate cause of a failure
    pub error: Option<String>,
}

impl CheckResult {
    fn new(kind: CheckType, target: impl Into<String>, elapsed: Duration, ok: bool) -> Self {
        Self {
            name: String::new(),
            kind,
            target: target.into(),
            port: None,
            ip: None,
            ok,
            status_code: None,
            response_time_ms: round_ms(elapsed),
            error: None,
        }
    }

    /// Create a passing result
    pub fn passed(kind: CheckType, target: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(kind, target, elapsed, true)
    }

    /// Create a failing result with a cause
    pub fn failed(
        kind: CheckType,
        target: impl Into<String>,
        elapsed: Duration,
        error: impl Into<String>,
    ) -> Self {
        let mut result = Self::new(kind, target, elapsed, false);
        result.error = Some(error.into());
        result
    }

    /// Create a failing result whose cause is implied by other fields
    /// (e.g. an unexpected HTTP status code).
    pub fn rejected(kind: CheckType, target: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(kind, target, elapsed, false)
    }

    /// Result for a check tag that names no probe. No I/O happened, so the
    /// recorded time is zero.
    pub fn unknown_kind(tag: &str, target: impl Into<String>) -> Self {
        Self::failed(
            CheckType::Unknown(tag.to_string()),
            target,
            Duration::ZERO,
            format!("Unknown check type: {tag}"),
        )
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_ip(mut self, ip: Ipv4Addr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Short failure description: the error text, else the status code.
    pub fn failure_detail(&self) -> String {
        match (&self.error, self.status_code) {
            (Some(error), _) => error.clone(),
            (None, Some(code)) => format!("status={code}"),
            (None, None) => String::new(),
        }
    }
}

/// Milliseconds with two decimals.
pub fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

/// Aggregate statistics for one batch of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    /// Total checks performed
    pub total: u64,

    /// Passing checks
    pub passed: u64,

    /// Failing checks
    pub failed: u64,

    /// Average response time (milliseconds)
    pub avg_response_time_ms: f64,
}

impl BatchStats {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut stats = Self::default();
        for result in results {
            stats.update(result);
        }
        stats
    }

    /// Update stats with a check result
    pub fn update(&mut self, result: &CheckResult) {
        self.total += 1;

        if result.ok {
            self.passed += 1;
        } else {
            self.failed += 1;
        }

        self.avg_response_time_ms = (self.avg_response_time_ms * (self.total - 1) as f64
            + result.response_time_ms)
            / self.total as f64;
    }

    /// True when no check failed (including an empty batch).
    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }
}

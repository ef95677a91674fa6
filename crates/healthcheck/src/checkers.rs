//! Health check implementations.
//!
//! Each checker owns the resource it probes with (request, subprocess,
//! socket) and releases it before `check` returns. Failures are always
//! reported through the returned [`CheckResult`], never as errors.

use crate::types::{CheckResult, CheckType};
use async_trait::async_trait;
use common::error_chain;
use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Health checker trait
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Perform a health check
    async fn check(&self) -> CheckResult;

    /// Kind of probe this checker runs
    fn kind(&self) -> CheckType;
}

/// TCP health checker
pub struct TcpChecker {
    host: String,
    port: u16,
    timeout_duration: Duration,
}

impl TcpChecker {
    /// Create a new TCP health checker
    pub fn new(host: impl Into<String>, port: u16, timeout_duration: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout_duration,
        }
    }
}

#[async_trait]
impl HealthChecker for TcpChecker {
    async fn check(&self) -> CheckResult {
        let start = Instant::now();

        let outcome = timeout(
            self.timeout_duration,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await;
        let duration = start.elapsed();

        // The stream, if any, is dropped (and the socket closed) at the end of its arm.
        let result = match outcome {
            Ok(Ok(_stream)) => {
                debug!(host = %self.host, port = self.port, duration_ms = duration.as_millis(), "TCP check successful");
                CheckResult::passed(self.kind(), &self.host, duration)
            }
            Ok(Err(e)) => {
                warn!(host = %self.host, port = self.port, error = %e, "TCP check failed");
                CheckResult::failed(self.kind(), &self.host, duration, e.to_string())
            }
            Err(_) => {
                warn!(host = %self.host, port = self.port, "TCP check timed out");
                CheckResult::failed(
                    self.kind(),
                    &self.host,
                    duration,
                    format!("connection timed out after {:.1}s", self.timeout_duration.as_secs_f64()),
                )
            }
        };

        result.with_port(self.port)
    }

    fn kind(&self) -> CheckType {
        CheckType::Tcp
    }
}

/// HTTP health checker
pub struct HttpChecker {
    url: String,
    expected_status: u16,
    timeout_duration: Duration,
    client: reqwest::Client,
}

impl HttpChecker {
    /// Create a new HTTP health checker on a shared client
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        expected_status: u16,
        timeout_duration: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            expected_status,
            timeout_duration,
            client,
        }
    }
}

#[async_trait]
impl HealthChecker for HttpChecker {
    async fn check(&self) -> CheckResult {
        let start = Instant::now();

        let request = self.client.get(&self.url).timeout(self.timeout_duration);

        match timeout(self.timeout_duration, request.send()).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                let status_code = response.status().as_u16();

                if status_code == self.expected_status {
                    debug!(url = %self.url, status = status_code, duration_ms = duration.as_millis(),
                           "HTTP check successful");
                    CheckResult::passed(self.kind(), &self.url, duration).with_status_code(status_code)
                } else {
                    warn!(url = %self.url, status = status_code, expected = self.expected_status,
                          "HTTP check failed: unexpected status code");
                    CheckResult::rejected(self.kind(), &self.url, duration).with_status_code(status_code)
                }
            }
            Ok(Err(e)) => {
                let duration = start.elapsed();
                let message = error_chain(&e);
                warn!(url = %self.url, error = %message, "HTTP check failed");
                CheckResult::failed(self.kind(), &self.url, duration, message)
            }
            Err(_) => {
                let duration = start.elapsed();
                warn!(url = %self.url, "HTTP check timed out");
                CheckResult::failed(
                    self.kind(),
                    &self.url,
                    duration,
                    format!("request timed out after {:.1}s", self.timeout_duration.as_secs_f64()),
                )
            }
        }
    }

    fn kind(&self) -> CheckType {
        CheckType::Http
    }
}

/// ICMP ping checker backed by the system `ping` utility
pub struct PingChecker {
    host: String,
    count: u32,
    timeout_duration: Duration,
}

impl PingChecker {
    /// Create a new ping checker
    pub fn new(host: impl Into<String>, count: u32, timeout_duration: Duration) -> Self {
        Self {
            host: host.into(),
            count,
            timeout_duration,
        }
    }

    /// Arguments for `ping` on the current platform.
    pub fn args(&self) -> Vec<String> {
        ping_args(&self.host, self.count, self.timeout_duration, cfg!(windows))
    }
}

/// Windows `ping` takes a count via `-n` and a per-reply timeout in
/// milliseconds via `-w`; POSIX `ping` takes `-c` and whole seconds via `-W`.
/// Seconds are rounded up so a sub-second timeout never becomes `-W 0`.
pub fn ping_args(host: &str, count: u32, timeout_duration: Duration, windows: bool) -> Vec<String> {
    let mut args = if windows {
        vec![
            "-n".to_string(),
            count.to_string(),
            "-w".to_string(),
            timeout_duration.as_millis().to_string(),
        ]
    } else {
        let secs = timeout_duration.as_secs_f64().ceil().max(1.0) as u64;
        vec![
            "-c".to_string(),
            count.to_string(),
            "-W".to_string(),
            secs.to_string(),
        ]
    };
    args.push(host.to_string());
    args
}

/// Failure text for a `ping` run: trimmed stderr, else trimmed stdout, else
/// the exit status.
pub fn ping_failure_message(stderr: &[u8], stdout: &[u8], status: impl fmt::Display) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stdout = String::from_utf8_lossy(stdout);
    [stderr.trim(), stdout.trim()]
        .into_iter()
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("ping exited with {status}"))
}

#[async_trait]
impl HealthChecker for PingChecker {
    async fn check(&self) -> CheckResult {
        let start = Instant::now();

        let output = Command::new("ping")
            .args(self.args())
            .kill_on_drop(true)
            .output()
            .await;
        let duration = start.elapsed();

        match output {
            Ok(output) if output.status.success() => {
                debug!(host = %self.host, duration_ms = duration.as_millis(), "Ping check successful");
                CheckResult::passed(self.kind(), &self.host, duration)
            }
            Ok(output) => {
                let message = ping_failure_message(&output.stderr, &output.stdout, output.status);
                warn!(host = %self.host, status = %output.status, "Ping check failed");
                CheckResult::failed(self.kind(), &self.host, duration, message)
            }
            Err(e) => {
                warn!(host = %self.host, error = %e, "Failed to run ping");
                CheckResult::failed(self.kind(), &self.host, duration, format!("failed to run ping: {e}"))
            }
        }
    }

    fn kind(&self) -> CheckType {
        CheckType::Ping
    }
}

/// DNS health checker
pub struct DnsChecker {
    host: String,
}

impl DnsChecker {
    /// Create a new DNS health checker
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

#[async_trait]
impl HealthChecker for DnsChecker {
    async fn check(&self) -> CheckResult {
        let start = Instant::now();

        // Use system DNS resolver
        match tokio::net::lookup_host((self.host.as_str(), 0)).await {
            Ok(addrs) => {
                let duration = start.elapsed();
                let ipv4 = addrs
                    .filter_map(|addr| match addr.ip() {
                        IpAddr::V4(ip) => Some(ip),
                        IpAddr::V6(_) => None,
                    })
                    .next();

                match ipv4 {
                    Some(ip) => {
                        debug!(host = %self.host, %ip, "DNS check successful");
                        CheckResult::passed(self.kind(), &self.host, duration).with_ip(ip)
                    }
                    None => {
                        warn!(host = %self.host, "DNS check failed: no IPv4 address");
                        CheckResult::failed(
                            self.kind(),
                            &self.host,
                            duration,
                            format!("no IPv4 address found for {}", self.host),
                        )
                    }
                }
            }
            Err(e) => {
                let duration = start.elapsed();
                warn!(host = %self.host, error = %e, "DNS check failed");
                CheckResult::failed(self.kind(), &self.host, duration, e.to_string())
            }
        }
    }

    fn kind(&self) -> CheckType {
        CheckType::Dns
    }
}

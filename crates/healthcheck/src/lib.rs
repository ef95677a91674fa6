//! One-shot health checking of services and network endpoints.
//!
//! This crate turns check definitions into probe results. Supported probes:
//! - HTTP GET with an expected status code
//! - ICMP ping through the system `ping` utility
//! - DNS resolution to an IPv4 address
//! - TCP connect
//!
//! Probes run sequentially and never fail: every outcome, good or bad, is a
//! [`CheckResult`]. Only a malformed check definition produces an error.
//!
//! # Example
//!
//! ```no_run
//! use healthcheck::{BatchRunner, Dispatcher, NetworkCheck};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entries: Vec<NetworkCheck> = serde_yaml::from_str(r#"
//! - { type: tcp, host: db.internal, port: 5432 }
//! - { type: dns, host: example.com }
//! "#)?;
//!
//! let runner = BatchRunner::new(Dispatcher::new()?);
//! for result in runner.run_all(&entries).await? {
//!     println!("{} ok={} {}ms", result.name, result.ok, result.response_time_ms);
//! }
//! # Ok(())
//! # }
//! ```

pub mod checkers;
pub mod definition;
pub mod dispatch;
pub mod runner;
pub mod types;

pub use checkers::{DnsChecker, HealthChecker, HttpChecker, PingChecker, TcpChecker};
pub use definition::{CheckDefinition, CheckEntry, DefinitionError, NetworkCheck, Probe, ServiceCheck};
pub use dispatch::Dispatcher;
pub use runner::BatchRunner;
pub use types::{BatchStats, CheckResult, CheckType};

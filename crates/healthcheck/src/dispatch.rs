//! Maps a resolved check definition onto its probe.

use crate::checkers::{DnsChecker, HealthChecker, HttpChecker, PingChecker, TcpChecker};
use crate::definition::{CheckDefinition, CheckEntry, Probe};
use crate::types::CheckResult;
use common::{Error, Result};
use tracing::warn;

/// Selects and runs the probe for a check definition.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
}

impl Dispatcher {
    /// Create a dispatcher with a default HTTP client.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(Error::http)?;
        Ok(Self::with_client(client))
    }

    /// Create a dispatcher that issues HTTP checks through `client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Run the probe for `definition` and attach its display name.
    ///
    /// Never fails: an unknown probe kind yields a failing result without
    /// any I/O.
    pub async fn dispatch(&self, definition: &CheckDefinition) -> CheckResult {
        let checker: Box<dyn HealthChecker> = match &definition.probe {
            Probe::Http {
                url,
                expected_status,
                timeout,
            } => Box::new(HttpChecker::new(
                self.client.clone(),
                url.clone(),
                *expected_status,
                *timeout,
            )),
            Probe::Ping {
                host,
                count,
                timeout,
            } => Box::new(PingChecker::new(host.clone(), *count, *timeout)),
            Probe::Dns { host } => Box::new(DnsChecker::new(host.clone())),
            Probe::Tcp {
                host,
                port,
                timeout,
            } => Box::new(TcpChecker::new(host.clone(), *port, *timeout)),
            Probe::Unknown { kind, host } => {
                warn!(name = %definition.name, kind = %kind, "Unknown check type");
                return CheckResult::unknown_kind(kind, host).named(&definition.name);
            }
        };

        checker.check().await.named(&definition.name)
    }

    /// Resolve a raw configuration entry and dispatch it.
    ///
    /// `index` locates the entry in its configuration section for the error
    /// message. A malformed entry is a configuration error.
    pub async fn dispatch_entry<E: CheckEntry>(&self, index: usize, entry: &E) -> Result<CheckResult> {
        let definition = entry
            .resolve()
            .map_err(|e| Error::config(format!("{}[{}]: {}", E::SECTION, index, e)))?;
        Ok(self.dispatch(&definition).await)
    }
}

//! One full run: services, then network checks.

use crate::alert::{AlertOutcome, AlertSink, alert_on_failures};
use crate::config::Config;
use crate::report::{BatchKind, format_table, log_results};
use common::{Result, RunLog};
use healthcheck::{BatchRunner, BatchStats, CheckEntry, CheckResult};
use std::io::Write;
use tracing::instrument::WithSubscriber;
use tracing::warn;

/// Everything one batch produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub kind: BatchKind,
    pub results: Vec<CheckResult>,
    pub alert: AlertOutcome,
}

impl BatchReport {
    pub fn stats(&self) -> BatchStats {
        BatchStats::from_results(&self.results)
    }
}

/// Collaborators shared by every batch of a run.
pub struct RunContext {
    runner: BatchRunner,
    log: RunLog,
    sink: Box<dyn AlertSink>,
}

impl RunContext {
    pub fn new(runner: BatchRunner, log: RunLog, sink: Box<dyn AlertSink>) -> Self {
        Self { runner, log, sink }
    }

    /// Run the services batch, then the network batch.
    ///
    /// Tables go to `out`. Empty sections are skipped entirely. A malformed
    /// entry aborts the run with a configuration error.
    pub async fn run<W: Write>(&self, config: &Config, out: &mut W) -> Result<Vec<BatchReport>> {
        let mut reports = Vec::with_capacity(2);

        if let Some(report) = self
            .run_batch(BatchKind::Services, &config.services, out)
            .await?
        {
            reports.push(report);
        }

        if let Some(report) = self
            .run_batch(BatchKind::Network, &config.network_checks, out)
            .await?
        {
            reports.push(report);
        }

        Ok(reports)
    }

    /// Run, report and alert on one section of the configuration.
    pub async fn run_batch<E: CheckEntry, W: Write>(
        &self,
        kind: BatchKind,
        entries: &[E],
        out: &mut W,
    ) -> Result<Option<BatchReport>> {
        if entries.is_empty() {
            return Ok(None);
        }

        let results = self
            .runner
            .run_all(entries)
            .with_subscriber(self.log.dispatch().clone())
            .await?;

        // A closed stdout must not stop the results from being logged and alerted.
        if let Err(e) = write_table(out, kind, &results) {
            self.log
                .scope(|| warn!("Failed to write {} table: {e}", kind.title()));
        }

        log_results(&self.log, kind, &results);
        let alert = alert_on_failures(&self.log, self.sink.as_ref(), kind, &results).await;

        Ok(Some(BatchReport {
            kind,
            results,
            alert,
        }))
    }
}

fn write_table<W: Write>(out: &mut W, kind: BatchKind, results: &[CheckResult]) -> std::io::Result<()> {
    out.write_all(format_table(kind, results).as_bytes())?;
    out.flush()
}

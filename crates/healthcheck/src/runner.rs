//! Sequential batch execution of health checks.

use crate::definition::{CheckDefinition, CheckEntry};
use crate::dispatch::Dispatcher;
use crate::types::{BatchStats, CheckResult};
use common::Result;
use std::time::Instant;
use tracing::info;

/// Runs a list of checks one after another, in input order.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    dispatcher: Dispatcher,
}

impl BatchRunner {
    /// Create a batch runner
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Resolve and run every entry, returning one result per entry.
    ///
    /// A failing probe never stops the batch. A malformed entry does: its
    /// configuration error is returned and the remaining entries are not run.
    pub async fn run_all<E: CheckEntry>(&self, entries: &[E]) -> Result<Vec<CheckResult>> {
        let started = Instant::now();
        let mut results = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            results.push(self.dispatcher.dispatch_entry(index, entry).await?);
        }

        log_batch(E::SECTION, &results, started);
        Ok(results)
    }

    /// Run already resolved definitions, returning one result per definition.
    pub async fn run_definitions(&self, definitions: &[CheckDefinition]) -> Vec<CheckResult> {
        let started = Instant::now();
        let mut results = Vec::with_capacity(definitions.len());

        for definition in definitions {
            results.push(self.dispatcher.dispatch(definition).await);
        }

        log_batch("definitions", &results, started);
        results
    }
}

fn log_batch(section: &str, results: &[CheckResult], started: Instant) {
    let stats = BatchStats::from_results(results);
    info!(
        section,
        total = stats.total,
        passed = stats.passed,
        failed = stats.failed,
        avg_response_time_ms = stats.avg_response_time_ms,
        "Batch completed in {:.2}s",
        started.elapsed().as_secs_f64()
    );
}

//! Failure alerts delivered through a Slack incoming webhook.

use crate::report::BatchKind;
use async_trait::async_trait;
use common::{RunLog, error_chain};
use healthcheck::CheckResult;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument::WithSubscriber;
use tracing::{error, info};

/// Upper bound on a single webhook delivery.
pub const ALERT_TIMEOUT: Duration = Duration::from_secs(5);

/// Reasons an alert was not delivered
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("No Slack webhook configured")]
    NotConfigured,

    #[error("Slack error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Slack request failed: {}", error_chain(.0))]
    Transport(#[from] reqwest::Error),
}

/// Destination for alert messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one message.
    async fn send_alert(&self, message: &str) -> Result<(), AlertError>;
}

/// Posts `{"text": message}` to a Slack incoming webhook
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    webhook: Option<String>,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook: Option<String>, client: reqwest::Client) -> Self {
        Self {
            webhook: webhook.filter(|w| !w.trim().is_empty()),
            client,
        }
    }
}

#[async_trait]
impl AlertSink for SlackNotifier {
    async fn send_alert(&self, message: &str) -> Result<(), AlertError> {
        let webhook = self.webhook.as_deref().ok_or(AlertError::NotConfigured)?;

        let response = self
            .client
            .post(webhook)
            .json(&json!({ "text": message }))
            .timeout(ALERT_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// What the alert trigger did for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Nothing failed; no alert was sent.
    AllPassed,
    /// An alert covering `failures` results was delivered.
    Sent { failures: usize },
    /// An alert covering `failures` results could not be delivered.
    DeliveryFailed { failures: usize },
}

/// Build the alert text: the header, then one `- <name> [<type>] <detail>`
/// line per failure. Multi-line names, tags and details are folded onto
/// their line.
pub fn compose_alert(header: &str, failures: &[&CheckResult]) -> String {
    let mut lines = Vec::with_capacity(failures.len() + 1);
    lines.push(fold_lines(header));

    for result in failures {
        let line = format!(
            "- {} [{}] {}",
            fold_lines(&result.name),
            fold_lines(result.kind.as_str()),
            fold_lines(&result.failure_detail())
        );
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

fn fold_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Alert on the failed results of one batch.
///
/// With no failures the sink is never called. Otherwise it is called exactly
/// once; a delivery error is logged and dropped.
pub async fn alert_on_failures(
    log: &RunLog,
    sink: &dyn AlertSink,
    kind: BatchKind,
    results: &[CheckResult],
) -> AlertOutcome {
    let failures: Vec<&CheckResult> = results.iter().filter(|r| !r.ok).collect();

    if failures.is_empty() {
        log.scope(|| info!("{}", kind.all_passed()));
        return AlertOutcome::AllPassed;
    }

    let message = compose_alert(kind.alert_header(), &failures);
    let count = failures.len();

    match sink
        .send_alert(&message)
        .with_subscriber(log.dispatch().clone())
        .await
    {
        Ok(()) => {
            log.scope(|| info!(failures = count, "Alert sent successfully"));
            AlertOutcome::Sent { failures: count }
        }
        Err(e) => {
            log.scope(|| error!(failures = count, "Failed to send alert: {e}"));
            AlertOutcome::DeliveryFailed { failures: count }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::LogFormat;
    use healthcheck::CheckType;

    fn quiet_log() -> RunLog {
        RunLog::with_writer(std::io::sink, LogFormat::Pipe, "off").unwrap()
    }

    fn passed(name: &str) -> CheckResult {
        CheckResult::passed(CheckType::Tcp, "h", Duration::from_millis(1)).named(name)
    }

    fn failed(name: &str, error: &str) -> CheckResult {
        CheckResult::failed(CheckType::Ping, "h", Duration::from_millis(1), error).named(name)
    }

    #[test]
    fn test_compose_alert_lines() {
        let mismatch = CheckResult::rejected(CheckType::Http, "u", Duration::ZERO)
            .with_status_code(503)
            .named("api");
        let down = failed("gateway", "100% packet loss");

        let message = compose_alert("API check failures detected:", &[&mismatch, &down]);
        assert_eq!(
            message,
            "API check failures detected:\n- api [http] status=503\n- gateway [ping] 100% packet loss"
        );
    }

    #[test]
    fn test_compose_alert_folds_multiline_errors() {
        let result = failed("gw", "PING gw\n\nRequest timeout\n");
        let message = compose_alert("header", &[&result]);
        assert_eq!(message, "header\n- gw [ping] PING gw / Request timeout");
    }

    #[test]
    fn test_compose_alert_folds_multiline_names() {
        let first = failed("core\nrouter", "down");
        let second = failed("edge", "down");

        let message = compose_alert("header", &[&first, &second]);
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "- core / router [ping] down");
    }

    #[tokio::test]
    async fn test_no_failures_never_calls_sink() {
        let mut sink = MockAlertSink::new();
        sink.expect_send_alert().times(0);

        let results = vec![passed("a"), passed("b")];
        let outcome = alert_on_failures(&quiet_log(), &sink, BatchKind::Network, &results).await;
        assert_eq!(outcome, AlertOutcome::AllPassed);
    }

    #[tokio::test]
    async fn test_failures_send_one_alert() {
        let mut sink = MockAlertSink::new();
        sink.expect_send_alert()
            .times(1)
            .withf(|message: &str| {
                let lines: Vec<&str> = message.lines().collect();
                lines.len() == 3
                    && lines[0] == "Network check failures detected:"
                    && lines[1].starts_with("- b [ping]")
                    && lines[2].starts_with("- d [ping]")
            })
            .returning(|_| Ok(()));

        let results = vec![passed("a"), failed("b", "down"), passed("c"), failed("d", "down")];
        let outcome = alert_on_failures(&quiet_log(), &sink, BatchKind::Network, &results).await;
        assert_eq!(outcome, AlertOutcome::Sent { failures: 2 });
    }

    #[tokio::test]
    async fn test_delivery_failure_is_recovered() {
        let mut sink = MockAlertSink::new();
        sink.expect_send_alert()
            .times(1)
            .returning(|_| Err(AlertError::NotConfigured));

        let results = vec![failed("a", "down")];
        let outcome = alert_on_failures(&quiet_log(), &sink, BatchKind::Services, &results).await;
        assert_eq!(outcome, AlertOutcome::DeliveryFailed { failures: 1 });
    }

    #[tokio::test]
    async fn test_missing_webhook_is_not_configured() {
        let notifier = SlackNotifier::new(Some("  ".to_string()), reqwest::Client::new());
        assert!(matches!(
            notifier.send_alert("hello").await,
            Err(AlertError::NotConfigured)
        ));
    }
}

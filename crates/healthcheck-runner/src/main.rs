//! Healthcheck runner binary

use anyhow::Context;
use common::RunLog;
use healthcheck::{BatchRunner, Dispatcher};
use healthcheck_runner::{Config, RunContext, SlackNotifier};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Configuration comes first: it decides where logs go.
    let path = Config::locate();
    let config = match &path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let log = RunLog::init(&config.to_log_options()).context("initializing logging")?;

    log.scope(|| match &path {
        Some(path) => tracing::info!("Configuration loaded from {}", path.display()),
        None => tracing::warn!("No configuration file found, using defaults"),
    });

    let client = reqwest::Client::builder()
        .build()
        .context("building HTTP client")?;

    let context = RunContext::new(
        BatchRunner::new(Dispatcher::with_client(client.clone())),
        log.clone(),
        Box::new(SlackNotifier::new(config.alerts.slack_webhook.clone(), client)),
    );

    let stdout = std::io::stdout();
    if let Err(e) = context.run(&config, &mut stdout.lock()).await {
        log.scope(|| tracing::error!("Run aborted: {e}"));
        return Err(e.into());
    }

    Ok(())
}

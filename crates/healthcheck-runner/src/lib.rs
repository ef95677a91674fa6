//! Healthcheck runner
//!
//! Loads a YAML check list, probes every service and network endpoint once,
//! prints a results table per section and posts a Slack alert when anything
//! failed.

pub mod alert;
pub mod config;
pub mod report;
pub mod run;

pub use alert::{AlertError, AlertOutcome, AlertSink, SlackNotifier, compose_alert};
pub use config::{Config, ConfigError};
pub use report::BatchKind;
pub use run::{BatchReport, RunContext};

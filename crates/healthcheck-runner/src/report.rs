//! Results tables and per-result log lines.

use common::RunLog;
use healthcheck::{CheckResult, CheckType};
use std::fmt::Write as _;
use tracing::{error, info};

const RULE_WIDTH: usize = 70;

/// Which configuration section a batch of results came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// HTTP service checks (`services`)
    Services,
    /// Ping, DNS and TCP checks (`network_checks`)
    Network,
}

impl BatchKind {
    pub fn title(self) -> &'static str {
        match self {
            BatchKind::Services => "SERVICE CHECK RESULTS",
            BatchKind::Network => "NETWORK CHECK RESULTS",
        }
    }

    pub fn log_prefix(self) -> &'static str {
        match self {
            BatchKind::Services => "API",
            BatchKind::Network => "NET",
        }
    }

    pub fn alert_header(self) -> &'static str {
        match self {
            BatchKind::Services => "API check failures detected:",
            BatchKind::Network => "Network check failures detected:",
        }
    }

    pub fn all_passed(self) -> &'static str {
        match self {
            BatchKind::Services => "All API checks passed",
            BatchKind::Network => "All network checks passed",
        }
    }
}

/// Render the fixed-width results table for one batch.
///
/// Columns: name, type, OK/FAIL, status code (`ERR` for an HTTP check with no
/// response, `-` for other kinds), response time and an extra column holding
/// the resolved address for DNS checks or `port N` for TCP checks.
pub fn format_table(kind: BatchKind, results: &[CheckResult]) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut table = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(table);
    let _ = writeln!(table, "{}", kind.title());
    let _ = writeln!(table, "{rule}");
    for result in results {
        let _ = writeln!(table, "{}", format_row(result));
    }
    let _ = writeln!(table, "{rule}");

    table
}

fn format_row(result: &CheckResult) -> String {
    let status = if result.ok { "OK" } else { "FAIL" };
    let code = match (result.status_code, &result.kind) {
        (Some(code), _) => code.to_string(),
        (None, CheckType::Http) => "ERR".to_string(),
        (None, _) => "-".to_string(),
    };
    let extra = match (&result.kind, result.ip, result.port) {
        (CheckType::Dns, Some(ip), _) => ip.to_string(),
        (CheckType::Tcp, _, Some(port)) => format!("port {port}"),
        _ => String::new(),
    };

    let time = format!("{:.2} ms", result.response_time_ms);
    let row = format!(
        "{:<20} | {:<4} | {:<4} | {:<4} | {:>10} | {}",
        result.name,
        result.kind.as_str(),
        status,
        code,
        time,
        extra
    );
    row.trim_end().to_string()
}

/// Emit one log line per result: info when it passed, error when it failed.
pub fn log_results(log: &RunLog, kind: BatchKind, results: &[CheckResult]) {
    let prefix = kind.log_prefix();

    log.scope(|| {
        for result in results {
            let status = result
                .status_code
                .map(|code| format!(" status={code}"))
                .unwrap_or_default();

            if result.ok {
                info!(
                    "{prefix} OK: {} [{}]{status} time={}ms",
                    result.name, result.kind, result.response_time_ms
                );
            } else {
                let error = result
                    .error
                    .as_deref()
                    .map(|e| format!(" error={e}"))
                    .unwrap_or_default();
                error!(
                    "{prefix} FAIL: {} [{}]{status} time={}ms{error}",
                    result.name, result.kind, result.response_time_ms
                );
            }
        }
    });
}

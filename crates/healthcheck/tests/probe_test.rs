//! Integration tests for probes and batches against local endpoints

use axum::{Router, http::StatusCode, routing::get};
use healthcheck::{BatchRunner, CheckType, Dispatcher, NetworkCheck, ServiceCheck};
use std::net::SocketAddr;
use std::time::Duration;

/// Helper to start a local HTTP server with `/ok` (200), `/missing` (404)
/// and `/slow` (answers after two seconds)
async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "missing") }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Helper to find a local port with nothing listening on it
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn runner() -> BatchRunner {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    BatchRunner::new(Dispatcher::with_client(client))
}

fn service(name: &str, url: String, expected_status: Option<u16>) -> ServiceCheck {
    ServiceCheck {
        name: Some(name.to_string()),
        url: Some(url),
        expected_status,
        timeout: Some(2.0),
    }
}

#[tokio::test]
async fn test_http_expected_status_passes() {
    let addr = spawn_server().await;
    let entries = vec![service("ok", format!("http://{addr}/ok"), None)];

    let results = runner().run_all(&entries).await.unwrap();
    let result = &results[0];

    assert!(result.ok);
    assert_eq!(result.kind, CheckType::Http);
    assert_eq!(result.status_code, Some(200));
    assert!(result.error.is_none());
    assert!(result.response_time_ms >= 0.0);
}

#[tokio::test]
async fn test_http_status_mismatch_fails_without_error_text() {
    let addr = spawn_server().await;
    let entries = vec![service("missing", format!("http://{addr}/missing"), Some(200))];

    let results = runner().run_all(&entries).await.unwrap();
    let result = &results[0];

    assert!(!result.ok);
    assert_eq!(result.status_code, Some(404));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_http_expected_non_200_status() {
    let addr = spawn_server().await;
    let entries = vec![service("gone", format!("http://{addr}/missing"), Some(404))];

    let results = runner().run_all(&entries).await.unwrap();
    assert!(results[0].ok);
    assert_eq!(results[0].status_code, Some(404));
}

#[tokio::test]
async fn test_http_timeout_fails_without_status() {
    let addr = spawn_server().await;
    let entries = vec![ServiceCheck {
        name: Some("slow".to_string()),
        url: Some(format!("http://{addr}/slow")),
        expected_status: None,
        timeout: Some(0.2),
    }];

    let results = runner().run_all(&entries).await.unwrap();
    let result = &results[0];

    assert!(!result.ok);
    assert_eq!(result.status_code, None);
    assert!(!result.error.as_deref().unwrap_or_default().is_empty());
    assert!(result.response_time_ms >= 200.0);
    assert!(result.response_time_ms < 2000.0);
}

#[tokio::test]
async fn test_service_name_defaults_to_url() {
    let addr = spawn_server().await;
    let url = format!("http://{addr}/ok");
    let entries = vec![ServiceCheck {
        url: Some(url.clone()),
        ..Default::default()
    }];

    let results = runner().run_all(&entries).await.unwrap();
    assert_eq!(results[0].name, url);
    assert_eq!(results[0].target, url);
}

#[tokio::test]
async fn test_mixed_network_batch_keeps_order_and_length() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open_port = listener.local_addr().unwrap().port();
    let refused_port = closed_port();

    let entries: Vec<NetworkCheck> = serde_yaml::from_str(&format!(
        r#"
- {{ name: open, type: tcp, host: 127.0.0.1, port: {open_port} }}
- {{ name: refused, type: tcp, host: 127.0.0.1, port: {refused_port}, timeout: 1 }}
- {{ name: resolver, type: dns, host: no-such-host.invalid }}
- {{ name: loopback, type: dns, host: 127.0.0.1 }}
- {{ name: mystery, type: foo, host: x }}
"#
    ))
    .unwrap();

    let results = runner().run_all(&entries).await.unwrap();
    assert_eq!(results.len(), entries.len());

    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["open", "refused", "resolver", "loopback", "mystery"]);

    let ok: Vec<bool> = results.iter().map(|r| r.ok).collect();
    assert_eq!(ok, [true, false, false, true, false]);

    for result in &results {
        assert!(result.response_time_ms >= 0.0);
        if !result.ok {
            assert!(!result.error.as_deref().unwrap_or_default().is_empty());
        }
    }

    assert_eq!(results[3].ip, Some(std::net::Ipv4Addr::LOCALHOST));
    assert_eq!(results[4].response_time_ms, 0.0);
    assert_eq!(results[4].error.as_deref(), Some("Unknown check type: foo"));
}

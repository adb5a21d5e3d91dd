// tests/integration/status_test.rs

use pupok::core::ConnectionRegistry;
use pupok::server::status_server;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

async fn spawn_status_server(
    registry: Arc<ConnectionRegistry>,
) -> (SocketAddr, broadcast::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(status_server::run_status_server(listener, registry, shutdown_rx));
    (addr, shutdown_tx)
}

async fn get(url: String) -> (reqwest::StatusCode, String) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_status_empty_registry() {
    let registry = Arc::new(ConnectionRegistry::new());
    let (addr, _shutdown) = spawn_status_server(registry).await;

    let (status, body) = get(format!("http://{addr}/")).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_status_lists_each_active_address_once() {
    let registry = Arc::new(ConnectionRegistry::new());
    let (addr, _shutdown) = spawn_status_server(registry.clone()).await;

    let active: Vec<String> = (1..=5).map(|i| format!("10.0.0.{i}:5555")).collect();
    for a in &active {
        registry.set_active(a, true);
    }
    registry.set_active("10.0.0.1:5555", true);
    registry.set_active("10.0.0.9:5555", true);
    registry.set_active("10.0.0.9:5555", false);

    let (status, body) = get(format!("http://{addr}/")).await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), active.len());
    for a in &active {
        assert_eq!(lines.iter().filter(|line| **line == a.as_str()).count(), 1);
    }
    assert!(!body.contains("10.0.0.9:5555"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let registry = Arc::new(ConnectionRegistry::new());
    let (addr, _shutdown) = spawn_status_server(registry).await;

    // Touch a metric so the registry is not empty.
    pupok::core::metrics::ACCEPT_ERRORS_TOTAL.inc_by(0.0);

    let (status, body) = get(format!("http://{addr}/metrics")).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert!(body.contains("pupok_accept_errors_total"));
}

#[tokio::test]
async fn test_status_server_stops_on_shutdown() {
    let registry = Arc::new(ConnectionRegistry::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(status_server::run_status_server(listener, registry, shutdown_rx));

    shutdown_tx.send(()).unwrap();
    let result = tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("status server should stop")
        .unwrap();
    assert!(result.is_ok());
}

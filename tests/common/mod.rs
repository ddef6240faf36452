//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// Start a simple mock service that answers every request with 200 OK.
///
/// Good enough for both HTTP health checks (any path, including
/// `/health`) and plain TCP connect probes.
#[allow(dead_code)]
pub async fn start_mock_service(addr: SocketAddr, body: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a programmable mock service whose status and body come from the
/// supplied closure, for flapping-health scenarios.
#[allow(dead_code)]
pub async fn start_programmable_service<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = std::sync::Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Build the HealthTracker bootstrap model: a Redis cache plus two
/// project services, with the web frontend gated on both.
pub fn health_tracker_model() -> apphost::AppModel {
    let mut builder = apphost::AppHostBuilder::new();

    let cache = builder.add_redis("cache").id();

    let api_service = builder
        .add_project("apiservice", "healthtracker-apiservice")
        .with_http_health_check("/health")
        .id();

    builder
        .add_project("webfrontend", "healthtracker-web")
        .with_external_http_endpoints()
        .with_http_health_check("/health")
        .with_reference(cache)
        .wait_for(cache)
        .with_reference(api_service)
        .wait_for(api_service);

    builder.build().unwrap()
}

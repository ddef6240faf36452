//! TCP readiness probe.
//!
//! Used for resources without an HTTP health-check path (the Redis
//! cache): a successful connect counts as a health-probe success.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;

/// Attempt a TCP connect within the timeout.
pub async fn tcp_probe(addr: SocketAddr, timeout: Duration) -> bool {
    match time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::debug!(addr = %addr, error = %e, "TCP probe failed: connection error");
            false
        }
        Err(_) => {
            tracing::debug!(addr = %addr, "TCP probe failed: timeout");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_open_and_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(tcp_probe(addr, Duration::from_secs(1)).await);

        drop(listener);
        assert!(!tcp_probe(addr, Duration::from_secs(1)).await);
    }
}

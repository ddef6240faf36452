//! Active health monitoring.
//!
//! # Responsibilities
//! - Periodically probe every started resource
//! - Feed results into the per-resource state machine
//! - Promote resources to Ready on their first Healthy transition

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::Request;
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HostConfig;
use crate::net::probe::tcp_probe;
use crate::observability::metrics;
use crate::runtime::registry::{ProbeKind, Registry, ResourceState};

pub struct HealthMonitor {
    registry: Arc<Registry>,
    config: Arc<ArcSwap<HostConfig>>,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<Registry>, config: Arc<ArcSwap<HostConfig>>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            config,
            client,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        {
            let snapshot = self.config.load();
            if !snapshot.health_check.enabled {
                tracing::info!("Health monitoring disabled");
                return;
            }
            tracing::info!(
                interval = snapshot.health_check.interval_secs,
                "Health monitor starting"
            );
        }

        loop {
            // Re-read the interval every round so config reloads apply.
            let interval = Duration::from_secs(self.config.load().health_check.interval_secs);
            tokio::select! {
                _ = time::sleep(interval) => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn check_all(&self) {
        let snapshot = self.config.load();
        let timeout = Duration::from_secs(snapshot.health_check.timeout_secs);
        let healthy_threshold = snapshot.health_check.healthy_threshold as usize;
        let unhealthy_threshold = snapshot.health_check.unhealthy_threshold as usize;

        // Probe everything concurrently so one slow endpoint cannot hold
        // back the rest of the round.
        let checks = self
            .registry
            .all()
            .into_iter()
            .filter(|state| state.probeable())
            .map(|state| self.check_one(state, timeout, healthy_threshold, unhealthy_threshold));
        join_all(checks).await;
    }

    async fn check_one(
        &self,
        state: Arc<ResourceState>,
        timeout: Duration,
        healthy_threshold: usize,
        unhealthy_threshold: usize,
    ) {
        let healthy = match &state.probe {
            ProbeKind::Http(path) => self.http_probe(&state, path, timeout).await,
            ProbeKind::Tcp => tcp_probe(state.endpoint, timeout).await,
            ProbeKind::None => return,
        };

        metrics::record_probe(&state.name, healthy);

        if healthy {
            if let Some(new_state) = state.health.mark_success(healthy_threshold) {
                tracing::info!(resource = %state.name, state = ?new_state, "Health state changed");
                metrics::record_resource_health(&state.name, true);
            }
            if state.health.is_healthy() && self.registry.mark_ready(&state) {
                tracing::info!(resource = %state.name, "Resource ready");
            }
        } else if let Some(new_state) = state.health.mark_failure(unhealthy_threshold) {
            tracing::warn!(resource = %state.name, state = ?new_state, "Health state changed");
            metrics::record_resource_health(&state.name, false);
        }
    }

    async fn http_probe(&self, state: &ResourceState, path: &str, timeout: Duration) -> bool {
        let uri_string = format!("http://{}{}", state.endpoint, path);

        let request = match Request::builder()
            .method("GET")
            .uri(uri_string)
            .header("user-agent", "apphost-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!("Failed to build health check request: {}", e);
                return false;
            }
        };

        let response_future = self.client.request(request);

        match time::timeout(timeout, response_future).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(
                        resource = %state.name,
                        status = %response.status(),
                        "Health check failed: non-success status"
                    );
                }
                success
            }
            Ok(Err(e)) => {
                tracing::debug!(resource = %state.name, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(resource = %state.name, "Health check failed: timeout");
                false
            }
        }
    }
}

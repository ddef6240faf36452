//! Status API.
//!
//! # Responsibilities
//! - Serve the live resource table and the application graph over HTTP
//! - Optional bearer-token authentication
//! - Optional TLS via axum-server
//!
//! Routes: `GET /status`, `GET /resources`, `GET /graph`.

pub mod auth;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::config::HostConfig;
use crate::model::AppModel;
use crate::net::tls::load_tls_config;
use crate::runtime::registry::Registry;
use crate::runtime::RuntimeError;

/// Shared state injected into status handlers.
#[derive(Clone)]
pub struct StatusState {
    pub model: Arc<AppModel>,
    pub registry: Arc<Registry>,
    pub config: Arc<ArcSwap<HostConfig>>,
    pub run_id: Uuid,
    pub started_at: Instant,
}

/// HTTP server exposing the host's status API.
pub struct StatusServer {
    state: StatusState,
}

impl StatusServer {
    pub fn new(
        model: Arc<AppModel>,
        registry: Arc<Registry>,
        config: Arc<ArcSwap<HostConfig>>,
        run_id: Uuid,
    ) -> Self {
        Self {
            state: StatusState {
                model,
                registry,
                config,
                run_id,
                started_at: Instant::now(),
            },
        }
    }

    /// Serve until the shutdown broadcast fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), RuntimeError> {
        let snapshot = self.state.config.load_full();
        let addr: SocketAddr = snapshot.status.bind_address.parse().map_err(|e| {
            RuntimeError::StatusBind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let router = build_router(self.state.clone());

        tracing::info!(address = %addr, tls = snapshot.status.tls.is_some(), "Status API starting");

        if let Some(tls) = &snapshot.status.tls {
            let rustls = load_tls_config(tls.cert_path.as_ref(), tls.key_path.as_ref())
                .await
                .map_err(RuntimeError::StatusBind)?;
            let handle = axum_server::Handle::new();
            let stop_handle = handle.clone();
            tokio::spawn(async move {
                let _ = shutdown.recv().await;
                stop_handle.graceful_shutdown(Some(Duration::from_secs(5)));
            });
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .map_err(RuntimeError::StatusBind)?;
        } else {
            let listener = TcpListener::bind(addr)
                .await
                .map_err(RuntimeError::StatusBind)?;
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await
                .map_err(RuntimeError::StatusBind)?;
        }

        tracing::info!("Status API stopped");
        Ok(())
    }
}

fn build_router(state: StatusState) -> Router {
    let mut router = Router::new()
        .route("/status", get(handlers::get_status))
        .route("/resources", get(handlers::get_resources))
        .route("/graph", get(handlers::get_graph));

    if !state.config.load().status.api_key.is_empty() {
        router = router.layer(middleware::from_fn_with_state(
            state.clone(),
            auth::bearer_auth_middleware,
        ));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(10))),
    )
}

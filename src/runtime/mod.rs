//! Orchestration runtime.
//!
//! # Data Flow
//! ```text
//! AppModel + HostConfig
//!     → allocate an endpoint per resource (registry.rs)
//!     → start resources in topological order, gating each on the
//!       readiness of its wait-for targets
//!     → spawn per-process supervisors (process.rs)
//!     → health monitor promotes probed resources to Ready
//!     → block until shutdown signal or fatal resource failure
//!     → stop processes in reverse start order
//! ```
//!
//! # Design Decisions
//! - Readiness gating happens here, not in the processes: a dependent is
//!   simply not spawned until its dependencies report ready
//! - Attached resources (config `attach`) are probed but never spawned,
//!   restarted, or killed
//! - Endpoints always live on loopback; external exposure only widens
//!   the HOST bind address handed to the process

pub mod process;
pub mod registry;

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time;
use uuid::Uuid;

use crate::config::HostConfig;
use crate::health::HealthMonitor;
use crate::lifecycle::{signals, Shutdown};
use crate::model::{AppModel, Resource, ResourceKind};
use crate::net::ports::{PortAllocator, PortError};
use crate::runtime::process::{LaunchSpec, ProcessHandle};
use crate::runtime::registry::{Lifecycle, ProbeKind, Registry, ResourceState};
use crate::status;

/// Error type for orchestration failures.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("port allocation failed: {0}")]
    Ports(#[from] PortError),

    #[error("invalid attach endpoint '{endpoint}' for resource '{name}'")]
    InvalidAttach { name: String, endpoint: String },

    #[error("failed to spawn process for resource '{name}'")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("resource '{name}' failed permanently")]
    ResourceFailed { name: String },

    #[error("resource '{name}' timed out after {timeout_secs}s waiting for '{waiting_on}'")]
    StartupTimeout {
        name: String,
        waiting_on: String,
        timeout_secs: u64,
    },

    #[error("status API failed to bind: {0}")]
    StatusBind(#[source] std::io::Error),
}

enum WaitOutcome {
    Satisfied,
    Aborted,
}

/// Drives a frozen [`AppModel`]: provisions resources, supervises their
/// processes, and serves the status API until shutdown.
pub struct Orchestrator {
    model: Arc<AppModel>,
    config: Arc<ArcSwap<HostConfig>>,
    registry: Arc<Registry>,
    shutdown: Shutdown,
    run_id: Uuid,
}

impl Orchestrator {
    pub fn new(model: AppModel, config: HostConfig) -> Self {
        Self {
            model: Arc::new(model),
            config: Arc::new(ArcSwap::from_pointee(config)),
            registry: Arc::new(Registry::new()),
            shutdown: Shutdown::new(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Shutdown handle, mainly for tests driving the run externally.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run the application until shutdown.
    ///
    /// `config_updates` feeds hot-reloaded configurations from the file
    /// watcher; pass the receiver of a fresh channel when not watching.
    pub async fn run(
        self,
        mut config_updates: mpsc::UnboundedReceiver<HostConfig>,
    ) -> Result<(), RuntimeError> {
        tracing::info!(
            run_id = %self.run_id,
            resources = self.model.resources().len(),
            descriptor = %self.model.descriptor(),
            "Application model loaded"
        );

        self.allocate_endpoints()?;

        tokio::spawn(signals::listen(self.shutdown.clone()));

        // Apply hot reloads; only probe/restart settings take effect.
        {
            let config = self.config.clone();
            tokio::spawn(async move {
                while let Some(new_config) = config_updates.recv().await {
                    tracing::info!("Applying reloaded configuration");
                    config.store(Arc::new(new_config));
                }
            });
        }

        if self.config.load().status.enabled {
            let server = status::StatusServer::new(
                self.model.clone(),
                self.registry.clone(),
                self.config.clone(),
                self.run_id,
            );
            let shutdown_rx = self.shutdown.subscribe();
            tokio::spawn(async move {
                if let Err(e) = server.run(shutdown_rx).await {
                    tracing::error!(error = %e, "Status API terminated");
                }
            });
        }

        let monitor = HealthMonitor::new(self.registry.clone(), self.config.clone());
        let monitor_shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            monitor.run(monitor_shutdown).await;
        });

        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();
        let mut handles: Vec<ProcessHandle> = Vec::new();
        let mut result = Ok(());

        for resource in self.model.start_order() {
            let state = self
                .registry
                .get(&resource.name)
                .expect("resource registered during allocation");
            state.set_lifecycle(Lifecycle::Starting);

            match self.wait_for_dependencies(resource).await {
                Ok(WaitOutcome::Satisfied) => {}
                Ok(WaitOutcome::Aborted) => break,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }

            if state.attached {
                tracing::info!(
                    resource = %resource.name,
                    endpoint = %state.endpoint,
                    "Adopting attached endpoint"
                );
                state.set_lifecycle(Lifecycle::Running);
            } else {
                let spec = self.launch_spec(resource, &state);
                match process::launch(
                    spec,
                    state.clone(),
                    self.config.clone(),
                    fatal_tx.clone(),
                ) {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        result = Err(e);
                        break;
                    }
                }
            }

            // Nothing to probe: running is as ready as it gets.
            if matches!(state.probe, ProbeKind::None) {
                self.registry.mark_ready(&state);
            }
        }

        if result.is_ok() {
            let mut shutdown_rx = self.shutdown.subscribe();
            result = tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown requested");
                    Ok(())
                }
                Some(err) = fatal_rx.recv() => Err(err),
            };
        }

        // Wind down everything we started, in reverse start order.
        self.shutdown.trigger();
        let grace = Duration::from_secs(self.config.load().timeouts.stop_grace_secs);
        for handle in handles.into_iter().rev() {
            handle.stop(grace).await;
        }
        for state in self.registry.all() {
            if state.attached {
                state.set_lifecycle(Lifecycle::Stopped);
            }
        }

        result
    }

    /// Resolve every resource to an endpoint and register its state.
    fn allocate_endpoints(&self) -> Result<(), RuntimeError> {
        let snapshot = self.config.load_full();
        let mut allocator = PortAllocator::new(snapshot.ports.base);

        for resource in self.model.resources() {
            let overrides = snapshot.resources.get(&resource.name);

            let (endpoint, attached) = match overrides.and_then(|o| o.attach.as_deref()) {
                Some(attach) => {
                    let endpoint =
                        attach
                            .parse()
                            .map_err(|_| RuntimeError::InvalidAttach {
                                name: resource.name.clone(),
                                endpoint: attach.to_string(),
                            })?;
                    (endpoint, true)
                }
                None => {
                    let port = match overrides.and_then(|o| o.port) {
                        Some(port) => port,
                        None => allocator.allocate()?,
                    };
                    (([127, 0, 0, 1], port).into(), false)
                }
            };

            let state = Arc::new(ResourceState::new(resource, endpoint, attached));
            tracing::info!(
                resource = %resource.name,
                kind = resource.kind.label(),
                endpoint = %endpoint,
                attached,
                "Endpoint assigned"
            );
            self.registry.insert(state);
        }

        Ok(())
    }

    /// Block until every wait-for target of `resource` is ready.
    async fn wait_for_dependencies(&self, resource: &Resource) -> Result<WaitOutcome, RuntimeError> {
        if resource.waits_for.is_empty() {
            return Ok(WaitOutcome::Satisfied);
        }

        let timeout_secs = self.config.load().timeouts.startup_secs;
        let deadline = Instant::now() + Duration::from_secs(timeout_secs);
        let mut shutdown = self.shutdown.subscribe();

        for dep_name in &resource.waits_for {
            let dep = self
                .registry
                .get(dep_name)
                .expect("edge targets validated at build");
            if dep.is_ready() {
                continue;
            }
            tracing::info!(resource = %resource.name, waiting_on = %dep_name, "Waiting for dependency");

            loop {
                if dep.is_ready() {
                    break;
                }
                if dep.lifecycle() == Lifecycle::Failed {
                    return Err(RuntimeError::ResourceFailed {
                        name: dep_name.clone(),
                    });
                }
                if Instant::now() >= deadline {
                    return Err(RuntimeError::StartupTimeout {
                        name: resource.name.clone(),
                        waiting_on: dep_name.clone(),
                        timeout_secs,
                    });
                }
                tokio::select! {
                    _ = time::sleep(Duration::from_millis(100)) => {}
                    _ = shutdown.recv() => return Ok(WaitOutcome::Aborted),
                }
            }
        }

        Ok(WaitOutcome::Satisfied)
    }

    /// Assemble the launch command, arguments, and environment for a
    /// resource from its declaration and any config overrides.
    fn launch_spec(&self, resource: &Resource, state: &ResourceState) -> LaunchSpec {
        let snapshot = self.config.load();
        let overrides = snapshot.resources.get(&resource.name);

        let (default_program, mut args) = match &resource.kind {
            ResourceKind::Redis => (
                "redis-server".to_string(),
                vec!["--port".to_string(), state.endpoint.port().to_string()],
            ),
            ResourceKind::Project { target } => (target.clone(), Vec::new()),
        };
        let program = overrides
            .and_then(|o| o.command.clone())
            .unwrap_or(default_program);
        if let Some(o) = overrides {
            args.extend(o.args.iter().cloned());
        }

        let host = if resource.external { "0.0.0.0" } else { "127.0.0.1" };
        let mut env: Vec<(String, String)> = vec![
            ("HOST".to_string(), host.to_string()),
            ("PORT".to_string(), state.endpoint.port().to_string()),
        ];
        for reference in &resource.references {
            let target = self.model.get(reference).expect("edge targets validated at build");
            if let Some(dep) = self.registry.get(reference) {
                env.push((target.url_env_var(), dep.endpoint_url().to_string()));
            }
        }
        if let Some(o) = overrides {
            for (key, value) in &o.env {
                env.push((key.clone(), value.clone()));
            }
        }

        LaunchSpec {
            name: resource.name.clone(),
            program,
            args,
            env,
            workdir: overrides.and_then(|o| o.workdir.clone().map(Into::into)),
        }
    }
}

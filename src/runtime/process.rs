//! Child process launch and supervision.
//!
//! # Responsibilities
//! - Spawn resource processes with their injected environment
//! - Forward child stdout/stderr into the tracing stream
//! - Restart unexpectedly exited processes with jittered backoff
//! - Stop processes on shutdown, bounded by the grace period
//!
//! # Design Decisions
//! - One supervisor task per process; the orchestrator keeps a
//!   [`ProcessHandle`] per resource for ordered shutdown
//! - The restart attempt counter resets once a process has stayed up
//!   long enough, so an old crash burst does not count against a now
//!   stable service

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::HostConfig;
use crate::observability::metrics;
use crate::resilience::RestartPolicy;
use crate::runtime::registry::{Lifecycle, ResourceState};
use crate::runtime::RuntimeError;

/// Uptime after which the restart attempt counter resets.
const STABLE_UPTIME: Duration = Duration::from_secs(30);

/// Everything needed to (re)spawn one resource process.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub workdir: Option<PathBuf>,
}

/// Handle held by the orchestrator for ordered shutdown.
pub struct ProcessHandle {
    name: String,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ProcessHandle {
    /// Stop the supervised process, waiting up to `grace` for the
    /// supervisor to wind down.
    pub async fn stop(self, grace: Duration) {
        let _ = self.stop_tx.send(());
        if time::timeout(grace, self.task).await.is_err() {
            tracing::warn!(resource = %self.name, "Supervisor did not stop within grace period");
        }
    }
}

/// Spawn the process and its supervisor task.
///
/// A failure of the *initial* spawn is a startup error for the whole
/// run; later respawn failures are reported through `fatal_tx`.
pub fn launch(
    spec: LaunchSpec,
    state: Arc<ResourceState>,
    config: Arc<ArcSwap<HostConfig>>,
    fatal_tx: mpsc::UnboundedSender<RuntimeError>,
) -> Result<ProcessHandle, RuntimeError> {
    let child = spawn_child(&spec)?;
    state.set_lifecycle(Lifecycle::Running);
    tracing::info!(
        resource = %spec.name,
        program = %spec.program,
        pid = ?child.id(),
        "Process started"
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    let name = spec.name.clone();
    let task = tokio::spawn(supervise(spec, child, state, config, fatal_tx, stop_rx));

    Ok(ProcessHandle {
        name,
        stop_tx,
        task,
    })
}

async fn supervise(
    spec: LaunchSpec,
    mut child: Child,
    state: Arc<ResourceState>,
    config: Arc<ArcSwap<HostConfig>>,
    fatal_tx: mpsc::UnboundedSender<RuntimeError>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut attempt: u32 = 0;
    let mut spawned_at = Instant::now();

    loop {
        tokio::select! {
            status = child.wait() => {
                let code = status.as_ref().ok().and_then(|s| s.code());
                tracing::warn!(resource = %spec.name, exit_code = ?code, "Process exited unexpectedly");
                state.health.reset();
                metrics::record_resource_health(&spec.name, false);

                if spawned_at.elapsed() >= STABLE_UPTIME {
                    attempt = 0;
                }
                attempt += 1;

                let policy = RestartPolicy::new(config.load().restart.clone());
                if !policy.allows(attempt - 1) {
                    tracing::error!(resource = %spec.name, attempts = attempt - 1, "Restart attempts exhausted");
                    state.set_lifecycle(Lifecycle::Failed);
                    let _ = fatal_tx.send(RuntimeError::ResourceFailed {
                        name: spec.name.clone(),
                    });
                    return;
                }

                let delay = policy.delay(attempt);
                tracing::info!(resource = %spec.name, attempt, delay = ?delay, "Restarting process");
                tokio::select! {
                    _ = time::sleep(delay) => {}
                    _ = &mut stop_rx => {
                        state.set_lifecycle(Lifecycle::Stopped);
                        return;
                    }
                }

                match spawn_child(&spec) {
                    Ok(new_child) => {
                        child = new_child;
                        spawned_at = Instant::now();
                        state.restarts.fetch_add(1, Ordering::Relaxed);
                        state.set_lifecycle(Lifecycle::Running);
                        metrics::record_restart(&spec.name);
                        tracing::info!(resource = %spec.name, pid = ?child.id(), "Process restarted");
                    }
                    Err(e) => {
                        tracing::error!(resource = %spec.name, error = %e, "Respawn failed");
                        state.set_lifecycle(Lifecycle::Failed);
                        let _ = fatal_tx.send(RuntimeError::ResourceFailed {
                            name: spec.name.clone(),
                        });
                        return;
                    }
                }
            }
            _ = &mut stop_rx => {
                let grace = Duration::from_secs(config.load().timeouts.stop_grace_secs);
                stop_child(&spec.name, &mut child, grace).await;
                state.set_lifecycle(Lifecycle::Stopped);
                return;
            }
        }
    }
}

async fn stop_child(name: &str, child: &mut Child, grace: Duration) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(resource = %name, error = %e, "Kill failed (process already gone)");
    }
    match time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            tracing::info!(resource = %name, exit_code = ?status.code(), "Process stopped");
        }
        Ok(Err(e)) => {
            tracing::warn!(resource = %name, error = %e, "Failed to reap process");
        }
        Err(_) => {
            tracing::warn!(resource = %name, "Process did not exit within grace period");
        }
    }
}

fn spawn_child(spec: &LaunchSpec) -> Result<Child, RuntimeError> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &spec.env {
        command.env(key, value);
    }
    if let Some(dir) = &spec.workdir {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|e| RuntimeError::Spawn {
        name: spec.name.clone(),
        source: e,
    })?;

    if let Some(stdout) = child.stdout.take() {
        forward_output(spec.name.clone(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_output(spec.name.clone(), "stderr", stderr);
    }

    Ok(child)
}

/// Forward child output into the tracing stream, line by line.
fn forward_output(name: String, stream: &'static str, reader: impl AsyncRead + Unpin + Send + 'static) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::info!(resource = %name, stream, "{}", line);
        }
    });
}

//! Live resource state registry.
//!
//! # Responsibilities
//! - Track one [`ResourceState`] per declared resource
//! - Serve lookups for the health monitor, supervisors, and status API
//! - Assign monotonic readiness sequence numbers

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use url::Url;

use crate::health::HealthCounters;
use crate::model::{Resource, ResourceKind};
use crate::observability::metrics;

/// Lifecycle of a resource instance.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Declared but not yet started.
    Pending = 0,
    /// Waiting on dependencies or mid-spawn.
    Starting = 1,
    /// Process running (or endpoint attached), not yet ready.
    Running = 2,
    /// Reported ready at least once.
    Ready = 3,
    /// Gave up: spawn failed or restart attempts exhausted.
    Failed = 4,
    /// Stopped during shutdown.
    Stopped = 5,
}

impl From<u8> for Lifecycle {
    fn from(val: u8) -> Self {
        match val {
            1 => Lifecycle::Starting,
            2 => Lifecycle::Running,
            3 => Lifecycle::Ready,
            4 => Lifecycle::Failed,
            5 => Lifecycle::Stopped,
            _ => Lifecycle::Pending,
        }
    }
}

impl Lifecycle {
    pub fn label(&self) -> &'static str {
        match self {
            Lifecycle::Pending => "pending",
            Lifecycle::Starting => "starting",
            Lifecycle::Running => "running",
            Lifecycle::Ready => "ready",
            Lifecycle::Failed => "failed",
            Lifecycle::Stopped => "stopped",
        }
    }
}

/// How the health monitor probes a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeKind {
    /// GET an HTTP path on the resource endpoint.
    Http(String),
    /// Plain TCP connect (Redis).
    Tcp,
    /// Not probed; ready as soon as the process runs.
    None,
}

/// Shared runtime state of a single resource.
#[derive(Debug)]
pub struct ResourceState {
    /// Resource name from the model.
    pub name: String,
    /// Kind from the model.
    pub kind: ResourceKind,
    /// Allocated (or attached) endpoint address.
    pub endpoint: SocketAddr,
    /// True when adopting an externally managed endpoint.
    pub attached: bool,
    /// How this resource is probed.
    pub probe: ProbeKind,

    /// Current lifecycle state.
    lifecycle: AtomicU8,
    /// Health hysteresis counters.
    pub health: HealthCounters,
    /// Completed restart count.
    pub restarts: AtomicU32,
    /// Readiness order (0 = not ready yet).
    ready_seq: AtomicU64,
    /// Creation time, the baseline for the time-to-ready metric.
    created_at: Instant,
}

impl ResourceState {
    pub fn new(resource: &Resource, endpoint: SocketAddr, attached: bool) -> Self {
        let probe = match (&resource.health_check, &resource.kind) {
            (Some(path), _) => ProbeKind::Http(path.clone()),
            (None, ResourceKind::Redis) => ProbeKind::Tcp,
            (None, ResourceKind::Project { .. }) => ProbeKind::None,
        };
        Self {
            name: resource.name.clone(),
            kind: resource.kind.clone(),
            endpoint,
            attached,
            probe,
            lifecycle: AtomicU8::new(Lifecycle::Pending as u8),
            health: HealthCounters::new(),
            restarts: AtomicU32::new(0),
            ready_seq: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.load(Ordering::Relaxed).into()
    }

    pub fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.store(lifecycle as u8, Ordering::Relaxed);
    }

    /// True once the resource has reported ready. Sticky: later health
    /// dips flip the healthy flag, not readiness.
    pub fn is_ready(&self) -> bool {
        self.ready_seq.load(Ordering::Relaxed) != 0
    }

    /// Readiness order, if ready.
    pub fn ready_seq(&self) -> Option<u64> {
        match self.ready_seq.load(Ordering::Relaxed) {
            0 => None,
            seq => Some(seq),
        }
    }

    /// Whether the monitor should probe this resource right now.
    pub fn probeable(&self) -> bool {
        !matches!(self.probe, ProbeKind::None)
            && matches!(self.lifecycle(), Lifecycle::Running | Lifecycle::Ready)
    }

    /// Endpoint URL with the kind's scheme, e.g. `redis://127.0.0.1:18000`.
    pub fn endpoint_url(&self) -> Url {
        // Scheme and socket address always form a valid URL.
        Url::parse(&format!("{}://{}", self.kind.scheme(), self.endpoint))
            .expect("endpoint URL")
    }
}

/// Registry of all resource instances for the current run.
#[derive(Debug, Default)]
pub struct Registry {
    entries: DashMap<String, Arc<ResourceState>>,
    ready_counter: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, state: Arc<ResourceState>) {
        self.entries.insert(state.name.clone(), state);
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceState>> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    /// Return all resource states (for health checking and status).
    pub fn all(&self) -> Vec<Arc<ResourceState>> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }

    /// Mark a resource ready, assigning its readiness order on the first
    /// call. Returns true on the first transition.
    pub fn mark_ready(&self, state: &ResourceState) -> bool {
        if state.ready_seq.load(Ordering::Relaxed) != 0 {
            return false;
        }
        let seq = self.ready_counter.fetch_add(1, Ordering::Relaxed) + 1;
        state.ready_seq.store(seq, Ordering::Relaxed);
        state.set_lifecycle(Lifecycle::Ready);
        metrics::record_time_to_ready(&state.name, state.created_at.elapsed());
        true
    }
}

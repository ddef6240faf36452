//! Resource health state machine.
//!
//! # States
//! - Unknown: not probed successfully yet
//! - Healthy: resource answers probes
//! - Unhealthy: consecutive probe failures crossed the threshold
//!
//! # State Transitions
//! ```text
//! Unknown/Unhealthy → Healthy: consecutive successes >= healthy_threshold
//! Unknown/Healthy → Unhealthy: consecutive failures >= unhealthy_threshold
//! ```

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Health state of a single resource.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Lock-free hysteresis counters backing [`HealthState`].
///
/// Counters reset on state transition so a transition always requires a
/// fresh run of consecutive results.
#[derive(Debug, Default)]
pub struct HealthCounters {
    /// Current state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    /// Consecutive failure count.
    consecutive_failures: AtomicUsize,
    /// Consecutive success count.
    consecutive_successes: AtomicUsize,
}

impl HealthCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current health state.
    pub fn state(&self) -> HealthState {
        self.state.load(Ordering::Relaxed).into()
    }

    /// True only in the Healthy state. Unknown does not count: readiness
    /// gating must see an actual successful probe run.
    pub fn is_healthy(&self) -> bool {
        self.state() == HealthState::Healthy
    }

    /// Report a successful probe. Returns the new state on transition.
    pub fn mark_success(&self, healthy_threshold: usize) -> Option<HealthState> {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == HealthState::Healthy as u8 {
            return None;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            self.consecutive_successes.store(0, Ordering::Relaxed);
            return Some(HealthState::Healthy);
        }
        None
    }

    /// Report a failed probe. Returns the new state on transition.
    pub fn mark_failure(&self, unhealthy_threshold: usize) -> Option<HealthState> {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == HealthState::Unhealthy as u8 {
            return None;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            self.consecutive_failures.store(0, Ordering::Relaxed);
            return Some(HealthState::Unhealthy);
        }
        None
    }

    /// Forget everything, e.g. after a process restart.
    pub fn reset(&self) {
        self.state.store(HealthState::Unknown as u8, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.consecutive_successes.store(0, Ordering::Relaxed);
    }
}

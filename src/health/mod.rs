//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Health monitor (monitor.rs):
//!     Periodic timer
//!     → Probe each started resource (HTTP path or TCP connect)
//!     → Feed result into state.rs counters
//!     → First Healthy transition marks the resource Ready
//!
//! State machine (state.rs):
//!     Unknown/Unhealthy ←→ Healthy
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - One monitor task probes all resources; probe settings are read from
//!   the live config snapshot each round
//! - State transitions require consecutive successes/failures
//! - Readiness is sticky: a later Unhealthy dip does not revoke Ready,
//!   it only flips the healthy flag reported by the status API

pub mod monitor;
pub mod state;

pub use monitor::HealthMonitor;
pub use state::{HealthCounters, HealthState};

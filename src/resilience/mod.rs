//! Resilience primitives.
//!
//! Restart backoff for supervised processes. Thresholded health-state
//! transitions live in `health::state`.

pub mod backoff;

pub use backoff::RestartPolicy;

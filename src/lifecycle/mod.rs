//! Process lifecycle coordination.
//!
//! # Responsibilities
//! - Broadcast shutdown to all long-running tasks
//! - Translate OS signals into the shutdown broadcast

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;

//! Distributed Application Host Library

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod model;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod runtime;
pub mod status;

pub use config::HostConfig;
pub use lifecycle::Shutdown;
pub use model::{AppHostBuilder, AppModel};
pub use runtime::Orchestrator;

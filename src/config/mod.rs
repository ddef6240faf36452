//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<HostConfig>
//!     → health monitor and supervisors observe new settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults so the host runs with no config file at all
//! - Validation separates syntactic (serde) from semantic checks
//! - The model shape and allocated endpoints are fixed at startup; a
//!   reload only adjusts probe and restart settings

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::HealthCheckConfig;
pub use schema::HostConfig;
pub use schema::ResourceOverride;
pub use schema::RestartConfig;
pub use schema::StatusConfig;

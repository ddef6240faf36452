//! Application model subsystem.
//!
//! # Data Flow
//! ```text
//! bootstrap code (main.rs)
//!     → builder.rs (declare resources + edges, fluent chaining)
//!     → build(): validate names, resolve edges, compute start order
//!     → AppModel (validated, immutable)
//!     → shared via Arc with the runtime and status API
//! ```
//!
//! # Design Decisions
//! - Handles are plain indices; an edge can only point at a resource
//!   declared earlier on the same builder, so the model is acyclic by
//!   construction
//! - The model is frozen at build(); the runtime never mutates it
//! - build() borrows the builder, so building twice is legal and yields
//!   structurally equal models

pub mod app;
pub mod builder;
pub mod graph;
pub mod resource;

pub use app::{AppManifest, AppModel, ManifestResource};
pub use builder::{AppHostBuilder, ModelError, ResourceBuilder};
pub use resource::{Resource, ResourceId, ResourceKind};

//! Client SDK for the apphost status API.

pub mod client;

pub use client::{AppHostClient, GraphView, ResourceStatus, SystemStatus};

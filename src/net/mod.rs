//! Network plumbing: endpoint allocation, readiness probing, TLS.

pub mod ports;
pub mod probe;
pub mod tls;

pub use ports::PortAllocator;

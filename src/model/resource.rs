//! Resource types shared by the builder, the model, and the runtime.

use serde::{Deserialize, Serialize};

/// Handle to a declared resource.
///
/// Returned by the declaration calls on [`AppHostBuilder`] and consumed by
/// `with_reference`/`wait_for`. Only valid for the builder that issued it.
///
/// [`AppHostBuilder`]: crate::model::AppHostBuilder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub(crate) usize);

/// What a resource is, and therefore how the runtime provisions it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceKind {
    /// An in-memory data store. Spawned as a local `redis-server` unless
    /// the host config attaches an existing endpoint.
    Redis,
    /// A service bound to a build target (an executable name by default).
    Project { target: String },
}

impl ResourceKind {
    /// Short kind label used in logs and the model descriptor.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Redis => "redis",
            ResourceKind::Project { .. } => "project",
        }
    }

    /// URL scheme for endpoints of this kind, used when injecting
    /// reference environment variables.
    pub fn scheme(&self) -> &'static str {
        match self {
            ResourceKind::Redis => "redis",
            ResourceKind::Project { .. } => "http",
        }
    }
}

/// A validated resource declaration inside an [`AppModel`].
///
/// Edge lists hold target resource names in declaration order.
///
/// [`AppModel`]: crate::model::AppModel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Unique resource name. Part of the service-discovery contract.
    pub name: String,

    /// Resource kind.
    pub kind: ResourceKind,

    /// HTTP path polled by the health monitor, if declared.
    pub health_check: Option<String>,

    /// Whether endpoints should be reachable from outside the host.
    pub external: bool,

    /// Resources whose endpoints are injected into this one's environment.
    pub references: Vec<String>,

    /// Resources that must report ready before this one is started.
    pub waits_for: Vec<String>,
}

impl Resource {
    /// Environment variable name carrying this resource's endpoint URL
    /// into dependents, e.g. `CACHE_URL` for a resource named `cache`.
    pub fn url_env_var(&self) -> String {
        format!("{}_URL", self.name.to_uppercase().replace('-', "_"))
    }
}

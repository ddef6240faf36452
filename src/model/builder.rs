//! Application host builder.
//!
//! # Responsibilities
//! - Accumulate resource declarations and inter-resource edges
//! - Offer fluent per-resource configuration via a chaining guard
//! - Validate and freeze the declarations into an [`AppModel`]
//!
//! # Design Decisions
//! - Declaration calls return a [`ResourceBuilder`] borrowing the host
//!   builder; `.id()` detaches a copyable [`ResourceId`] for later edges
//! - Edges are stored as raw ids and resolved to names at build(), which
//!   is where all validation errors surface

use thiserror::Error;

use crate::model::app::AppModel;
use crate::model::graph;
use crate::model::resource::{Resource, ResourceId, ResourceKind};

/// Error produced when freezing a model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("resource name must not be empty")]
    EmptyName,

    #[error("invalid resource name '{0}': lowercase letters, digits and dashes only")]
    InvalidName(String),

    #[error("duplicate resource name '{0}'")]
    DuplicateName(String),

    #[error("health check path '{path}' on resource '{name}' must start with '/'")]
    InvalidHealthPath { name: String, path: String },

    #[error("edge on resource '{0}' references a resource unknown to this builder")]
    UnknownEdgeTarget(String),

    #[error("edge on resource '{name}' must reference a resource declared before it")]
    ForwardEdge { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Edge {
    Reference(ResourceId),
    WaitFor(ResourceId),
}

/// One accumulated declaration. Edges stay unresolved until build().
#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    name: String,
    kind: ResourceKind,
    health_check: Option<String>,
    external: bool,
    edges: Vec<Edge>,
}

/// Accumulates resource declarations for a distributed application.
#[derive(Debug, Default)]
pub struct AppHostBuilder {
    declarations: Vec<Declaration>,
}

impl AppHostBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a Redis cache resource.
    pub fn add_redis(&mut self, name: &str) -> ResourceBuilder<'_> {
        self.push(Declaration {
            name: name.to_string(),
            kind: ResourceKind::Redis,
            health_check: None,
            external: false,
            edges: Vec::new(),
        })
    }

    /// Declare a project resource bound to a build target.
    pub fn add_project(&mut self, name: &str, target: &str) -> ResourceBuilder<'_> {
        self.push(Declaration {
            name: name.to_string(),
            kind: ResourceKind::Project {
                target: target.to_string(),
            },
            health_check: None,
            external: false,
            edges: Vec::new(),
        })
    }

    fn push(&mut self, declaration: Declaration) -> ResourceBuilder<'_> {
        let index = self.declarations.len();
        self.declarations.push(declaration);
        ResourceBuilder { host: self, index }
    }

    /// Freeze the accumulated declarations into an immutable model.
    ///
    /// Borrows the builder; building twice over the same declarations
    /// yields structurally equal models.
    pub fn build(&self) -> Result<AppModel, ModelError> {
        let mut resources = Vec::with_capacity(self.declarations.len());

        for (index, decl) in self.declarations.iter().enumerate() {
            validate_name(&decl.name)?;
            if self.declarations[..index].iter().any(|d| d.name == decl.name) {
                return Err(ModelError::DuplicateName(decl.name.clone()));
            }
            if let Some(path) = &decl.health_check {
                if !path.starts_with('/') {
                    return Err(ModelError::InvalidHealthPath {
                        name: decl.name.clone(),
                        path: path.clone(),
                    });
                }
            }

            let mut references = Vec::new();
            let mut waits_for = Vec::new();
            for edge in &decl.edges {
                let (ResourceId(target), list) = match edge {
                    Edge::Reference(id) => (*id, &mut references),
                    Edge::WaitFor(id) => (*id, &mut waits_for),
                };
                let target_decl = self
                    .declarations
                    .get(target)
                    .ok_or_else(|| ModelError::UnknownEdgeTarget(decl.name.clone()))?;
                // Ids are handed out in declaration order, so an edge at or
                // past the declaring index means a handle from another builder.
                if target >= index {
                    return Err(ModelError::ForwardEdge {
                        name: decl.name.clone(),
                    });
                }
                list.push(target_decl.name.clone());
            }

            resources.push(Resource {
                name: decl.name.clone(),
                kind: decl.kind.clone(),
                health_check: decl.health_check.clone(),
                external: decl.external,
                references,
                waits_for,
            });
        }

        let start_order = graph::start_order(&resources);
        Ok(AppModel::new(resources, start_order))
    }
}

fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.is_empty() {
        return Err(ModelError::EmptyName);
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(ModelError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Fluent configuration guard for the most recently declared resource.
pub struct ResourceBuilder<'a> {
    host: &'a mut AppHostBuilder,
    index: usize,
}

impl ResourceBuilder<'_> {
    /// Attach an HTTP health-check path polled by the runtime.
    pub fn with_http_health_check(self, path: &str) -> Self {
        self.host.declarations[self.index].health_check = Some(path.to_string());
        self
    }

    /// Mark the resource's endpoints as reachable from outside the host.
    pub fn with_external_http_endpoints(self) -> Self {
        self.host.declarations[self.index].external = true;
        self
    }

    /// Inject the target's endpoint into this resource's environment.
    pub fn with_reference(self, target: ResourceId) -> Self {
        self.host.declarations[self.index]
            .edges
            .push(Edge::Reference(target));
        self
    }

    /// Delay this resource's startup until the target reports ready.
    pub fn wait_for(self, target: ResourceId) -> Self {
        self.host.declarations[self.index]
            .edges
            .push(Edge::WaitFor(target));
        self
    }

    /// Detach the copyable handle for use in later edges.
    pub fn id(&self) -> ResourceId {
        ResourceId(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_declarations() {
        let mut builder = AppHostBuilder::new();
        let cache = builder.add_redis("cache").id();
        builder
            .add_project("web", "web-target")
            .with_http_health_check("/health")
            .with_external_http_endpoints()
            .with_reference(cache)
            .wait_for(cache);

        let model = builder.build().unwrap();
        let web = model.get("web").unwrap();
        assert_eq!(web.health_check.as_deref(), Some("/health"));
        assert!(web.external);
        assert_eq!(web.references, vec!["cache"]);
        assert_eq!(web.waits_for, vec!["cache"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut builder = AppHostBuilder::new();
        builder.add_redis("cache");
        builder.add_project("cache", "t");
        assert_eq!(
            builder.build().unwrap_err(),
            ModelError::DuplicateName("cache".into())
        );
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut builder = AppHostBuilder::new();
        builder.add_redis("");
        assert_eq!(builder.build().unwrap_err(), ModelError::EmptyName);

        let mut builder = AppHostBuilder::new();
        builder.add_project("Web Frontend", "t");
        assert!(matches!(
            builder.build().unwrap_err(),
            ModelError::InvalidName(_)
        ));
    }

    #[test]
    fn test_health_path_must_be_rooted() {
        let mut builder = AppHostBuilder::new();
        builder.add_project("api", "t").with_http_health_check("health");
        assert!(matches!(
            builder.build().unwrap_err(),
            ModelError::InvalidHealthPath { .. }
        ));
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut other = AppHostBuilder::new();
        other.add_redis("a");
        other.add_redis("b");
        let foreign = other.add_redis("c").id();

        // `foreign` indexes past everything this builder declared.
        let mut builder = AppHostBuilder::new();
        builder.add_project("api", "t").wait_for(foreign);
        assert!(matches!(
            builder.build().unwrap_err(),
            ModelError::UnknownEdgeTarget(_) | ModelError::ForwardEdge { .. }
        ));
    }

    #[test]
    fn test_build_twice_equal() {
        let mut builder = AppHostBuilder::new();
        let cache = builder.add_redis("cache").id();
        builder.add_project("api", "t").wait_for(cache);

        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        assert_eq!(first, second);
    }
}

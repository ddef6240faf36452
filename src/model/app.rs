//! The frozen application model.

use serde::{Deserialize, Serialize};

use crate::model::resource::Resource;

/// Immutable result of [`AppHostBuilder::build`].
///
/// Owns the validated resource list and a precomputed start order. Shared
/// via `Arc` between the runtime and the status API.
///
/// [`AppHostBuilder::build`]: crate::model::AppHostBuilder::build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppModel {
    resources: Vec<Resource>,
    start_order: Vec<usize>,
}

impl AppModel {
    pub(crate) fn new(resources: Vec<Resource>, start_order: Vec<usize>) -> Self {
        Self {
            resources,
            start_order,
        }
    }

    /// All resources in declaration order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Look up a resource by name.
    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Resources in topological start order (dependencies first).
    pub fn start_order(&self) -> impl Iterator<Item = &Resource> {
        self.start_order.iter().map(|&i| &self.resources[i])
    }

    /// Render the declared shape to a one-line descriptor, e.g.
    /// `cache:redis; web:project(health=/health, waits_for=[cache])`.
    ///
    /// Annotation order is fixed: health, external, waits_for.
    pub fn descriptor(&self) -> String {
        self.resources
            .iter()
            .map(render_resource)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Serializable snapshot of the model for the status API.
    pub fn manifest(&self) -> AppManifest {
        AppManifest {
            resources: self
                .resources
                .iter()
                .map(|r| ManifestResource {
                    name: r.name.clone(),
                    kind: r.kind.label().to_string(),
                    health_check: r.health_check.clone(),
                    external: r.external,
                    references: r.references.clone(),
                    waits_for: r.waits_for.clone(),
                })
                .collect(),
        }
    }
}

fn render_resource(resource: &Resource) -> String {
    let mut annotations = Vec::new();
    if let Some(path) = &resource.health_check {
        annotations.push(format!("health={}", path));
    }
    if resource.external {
        annotations.push("external=true".to_string());
    }
    if !resource.waits_for.is_empty() {
        annotations.push(format!("waits_for=[{}]", resource.waits_for.join(",")));
    }

    if annotations.is_empty() {
        format!("{}:{}", resource.name, resource.kind.label())
    } else {
        format!(
            "{}:{}({})",
            resource.name,
            resource.kind.label(),
            annotations.join(", ")
        )
    }
}

/// Wire-format snapshot of the model served by `GET /graph`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
    pub resources: Vec<ManifestResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestResource {
    pub name: String,
    pub kind: String,
    pub health_check: Option<String>,
    pub external: bool,
    pub references: Vec<String>,
    pub waits_for: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppHostBuilder;

    #[test]
    fn test_descriptor_rendering() {
        let mut builder = AppHostBuilder::new();
        let cache = builder.add_redis("cache").id();
        let api = builder
            .add_project("apiservice", "api-target")
            .with_http_health_check("/health")
            .id();
        builder
            .add_project("webfrontend", "web-target")
            .with_external_http_endpoints()
            .with_http_health_check("/health")
            .with_reference(cache)
            .wait_for(cache)
            .with_reference(api)
            .wait_for(api);

        let model = builder.build().unwrap();
        assert_eq!(
            model.descriptor(),
            "cache:redis; apiservice:project(health=/health); \
             webfrontend:project(health=/health, external=true, waits_for=[cache,apiservice])"
        );
    }

    #[test]
    fn test_manifest_round_trip() {
        let mut builder = AppHostBuilder::new();
        builder.add_redis("cache");
        let model = builder.build().unwrap();

        let manifest = model.manifest();
        let json = serde_json::to_string(&manifest).unwrap();
        let back: AppManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(manifest, back);
        assert_eq!(back.resources[0].kind, "redis");
    }
}

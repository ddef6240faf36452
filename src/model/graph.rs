//! Start-order computation over wait-for edges.

use crate::model::resource::Resource;

/// Compute a topological start order respecting wait-for edges.
///
/// Stable: among resources whose dependencies are satisfied, declaration
/// order wins. Edges always point at earlier declarations, so declaration
/// order itself is a valid topological order; this still walks the graph
/// so the runtime never has to reason about it.
pub fn start_order(resources: &[Resource]) -> Vec<usize> {
    let mut order = Vec::with_capacity(resources.len());
    let mut placed = vec![false; resources.len()];

    while order.len() < resources.len() {
        let mut advanced = false;
        for (index, resource) in resources.iter().enumerate() {
            if placed[index] {
                continue;
            }
            let ready = resource.waits_for.iter().all(|dep| {
                resources
                    .iter()
                    .position(|r| &r.name == dep)
                    .map(|i| placed[i])
                    .unwrap_or(true)
            });
            if ready {
                placed[index] = true;
                order.push(index);
                advanced = true;
            }
        }
        // Unreachable for models produced by build(), where edges only
        // point backwards. Fall back to declaration order rather than spin.
        if !advanced {
            for (index, _) in resources.iter().enumerate() {
                if !placed[index] {
                    placed[index] = true;
                    order.push(index);
                }
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resource::ResourceKind;

    fn resource(name: &str, waits_for: &[&str]) -> Resource {
        Resource {
            name: name.to_string(),
            kind: ResourceKind::Redis,
            health_check: None,
            external: false,
            references: Vec::new(),
            waits_for: waits_for.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_dependencies_first() {
        // Declared out of dependency order on purpose
        let resources = vec![
            resource("web", &["cache", "api"]),
            resource("cache", &[]),
            resource("api", &["cache"]),
        ];
        let order = start_order(&resources);
        let names: Vec<&str> = order.iter().map(|&i| resources[i].name.as_str()).collect();
        assert_eq!(names, vec!["cache", "api", "web"]);
    }

    #[test]
    fn test_declaration_order_among_independents() {
        let resources = vec![resource("b", &[]), resource("a", &[]), resource("c", &[])];
        let order = start_order(&resources);
        assert_eq!(order, vec![0, 1, 2]);
    }
}

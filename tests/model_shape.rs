//! Shape tests for the declared application model.

use apphost::model::{AppHostBuilder, ResourceKind};

mod common;

#[test]
fn test_exactly_three_named_resources() {
    let model = common::health_tracker_model();

    let names: Vec<&str> = model.resources().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["cache", "apiservice", "webfrontend"]);

    assert_eq!(model.get("cache").unwrap().kind, ResourceKind::Redis);
    assert!(matches!(
        model.get("apiservice").unwrap().kind,
        ResourceKind::Project { .. }
    ));
}

#[test]
fn test_webfrontend_waits_for_both_dependencies() {
    let model = common::health_tracker_model();

    let web = model.get("webfrontend").unwrap();
    assert_eq!(web.waits_for, vec!["cache", "apiservice"]);
    assert_eq!(web.references, vec!["cache", "apiservice"]);

    // The other two have no outgoing edges
    assert!(model.get("cache").unwrap().waits_for.is_empty());
    assert!(model.get("apiservice").unwrap().waits_for.is_empty());
}

#[test]
fn test_health_check_paths() {
    let model = common::health_tracker_model();

    assert_eq!(
        model.get("apiservice").unwrap().health_check.as_deref(),
        Some("/health")
    );
    assert_eq!(
        model.get("webfrontend").unwrap().health_check.as_deref(),
        Some("/health")
    );
    assert_eq!(model.get("cache").unwrap().health_check, None);
}

#[test]
fn test_only_webfrontend_is_external() {
    let model = common::health_tracker_model();

    let external: Vec<&str> = model
        .resources()
        .iter()
        .filter(|r| r.external)
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(external, vec!["webfrontend"]);
}

#[test]
fn test_build_is_idempotent() {
    let mut builder = AppHostBuilder::new();
    let cache = builder.add_redis("cache").id();
    let api = builder
        .add_project("apiservice", "healthtracker-apiservice")
        .with_http_health_check("/health")
        .id();
    builder
        .add_project("webfrontend", "healthtracker-web")
        .with_external_http_endpoints()
        .with_http_health_check("/health")
        .with_reference(cache)
        .wait_for(cache)
        .with_reference(api)
        .wait_for(api);

    let first = builder.build().unwrap();
    let second = builder.build().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_descriptor_matches_contract() {
    let model = common::health_tracker_model();

    assert_eq!(
        model.descriptor(),
        "cache:redis; apiservice:project(health=/health); \
         webfrontend:project(health=/health, external=true, waits_for=[cache,apiservice])"
    );
}

#[test]
fn test_start_order_respects_waits() {
    let model = common::health_tracker_model();

    let order: Vec<&str> = model.start_order().map(|r| r.name.as_str()).collect();
    let pos = |name: &str| order.iter().position(|n| *n == name).unwrap();
    assert!(pos("webfrontend") > pos("cache"));
    assert!(pos("webfrontend") > pos("apiservice"));
}

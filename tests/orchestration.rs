//! End-to-end orchestration tests against attached mock endpoints.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use apphost::config::{HostConfig, ResourceOverride};
use apphost::model::AppHostBuilder;
use apphost::runtime::registry::Lifecycle;
use apphost::runtime::{Orchestrator, RuntimeError};
use apphost_sdk::AppHostClient;

mod common;

fn attach(config: &mut HostConfig, name: &str, addr: &str) {
    config.resources.insert(
        name.to_string(),
        ResourceOverride {
            attach: Some(addr.to_string()),
            ..Default::default()
        },
    );
}

#[tokio::test]
async fn test_full_application_reaches_ready_in_dependency_order() {
    let cache_addr: SocketAddr = "127.0.0.1:29381".parse().unwrap();
    let api_addr: SocketAddr = "127.0.0.1:29382".parse().unwrap();
    let web_addr: SocketAddr = "127.0.0.1:29383".parse().unwrap();
    let status_addr = "127.0.0.1:29384";

    common::start_mock_service(cache_addr, "cache").await;
    common::start_mock_service(api_addr, "api").await;
    common::start_mock_service(web_addr, "web").await;

    let mut config = HostConfig::default();
    config.status.bind_address = status_addr.to_string();
    config.health_check.interval_secs = 1;
    config.health_check.healthy_threshold = 1;
    attach(&mut config, "cache", &cache_addr.to_string());
    attach(&mut config, "apiservice", &api_addr.to_string());
    attach(&mut config, "webfrontend", &web_addr.to_string());

    let orchestrator = Orchestrator::new(common::health_tracker_model(), config);
    let shutdown = orchestrator.shutdown_handle();
    let (_, config_updates) = mpsc::unbounded_channel();
    let run = tokio::spawn(orchestrator.run(config_updates));

    let client = AppHostClient::new(&format!("http://{}", status_addr));

    // Wait for the whole application to come up
    let mut ready = false;
    for _ in 0..60 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        if let Ok(status) = client.status().await {
            if status.resources_ready == 3 {
                ready = true;
                break;
            }
        }
    }
    assert!(ready, "All three resources should reach ready");

    let resources = client.resources().await.unwrap();
    let seq = |name: &str| {
        resources
            .iter()
            .find(|r| r.name == name)
            .and_then(|r| r.ready_seq)
            .unwrap_or_else(|| panic!("{} should be ready", name))
    };

    // The frontend waits for both dependencies, so it must come up last
    assert!(seq("webfrontend") > seq("cache"));
    assert!(seq("webfrontend") > seq("apiservice"));

    let graph = client.graph().await.unwrap();
    assert_eq!(
        graph.descriptor,
        "cache:redis; apiservice:project(health=/health); \
         webfrontend:project(health=/health, external=true, waits_for=[cache,apiservice])"
    );

    shutdown.trigger();
    let result = run.await.unwrap();
    assert!(result.is_ok(), "Run should end cleanly: {:?}", result);
}

#[tokio::test]
async fn test_status_api_requires_bearer_when_configured() {
    let backend_addr: SocketAddr = "127.0.0.1:29391".parse().unwrap();
    let status_addr = "127.0.0.1:29392";

    common::start_mock_service(backend_addr, "svc").await;

    let mut config = HostConfig::default();
    config.status.bind_address = status_addr.to_string();
    config.status.api_key = "test-secret".to_string();
    config.health_check.interval_secs = 1;
    attach(&mut config, "svc", &backend_addr.to_string());

    let mut builder = AppHostBuilder::new();
    builder.add_project("svc", "svc-target").with_http_health_check("/health");
    let model = builder.build().unwrap();

    let orchestrator = Orchestrator::new(model, config);
    let shutdown = orchestrator.shutdown_handle();
    let (_, config_updates) = mpsc::unbounded_channel();
    let run = tokio::spawn(orchestrator.run(config_updates));

    tokio::time::sleep(Duration::from_secs(1)).await;

    let unauthorized = AppHostClient::new(&format!("http://{}", status_addr));
    assert!(unauthorized.status().await.is_err());

    let authorized =
        AppHostClient::new(&format!("http://{}", status_addr)).with_api_key("test-secret");
    let status = authorized.status().await.unwrap();
    assert_eq!(status.resources_total, 1);

    shutdown.trigger();
    let _ = run.await.unwrap();
}

#[tokio::test]
async fn test_unhealthy_dip_flips_health_but_keeps_ready() {
    let backend_addr: SocketAddr = "127.0.0.1:29395".parse().unwrap();
    let status_addr = "127.0.0.1:29396";

    let healthy = Arc::new(AtomicBool::new(true));
    let flag = healthy.clone();
    common::start_programmable_service(backend_addr, move || {
        let flag = flag.clone();
        async move {
            if flag.load(Ordering::SeqCst) {
                (200, "ok".into())
            } else {
                (503, "down".into())
            }
        }
    })
    .await;

    let mut config = HostConfig::default();
    config.status.bind_address = status_addr.to_string();
    config.health_check.interval_secs = 1;
    config.health_check.healthy_threshold = 1;
    config.health_check.unhealthy_threshold = 2;
    attach(&mut config, "svc", &backend_addr.to_string());

    let mut builder = AppHostBuilder::new();
    builder.add_project("svc", "svc-target").with_http_health_check("/health");
    let model = builder.build().unwrap();

    let orchestrator = Orchestrator::new(model, config);
    let shutdown = orchestrator.shutdown_handle();
    let (_, config_updates) = mpsc::unbounded_channel();
    let run = tokio::spawn(orchestrator.run(config_updates));

    let client = AppHostClient::new(&format!("http://{}", status_addr));

    let mut ready = false;
    for _ in 0..30 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        if let Ok(status) = client.status().await {
            if status.resources_ready == 1 {
                ready = true;
                break;
            }
        }
    }
    assert!(ready);

    // Take the backend down; two consecutive failures flip the state
    healthy.store(false, Ordering::SeqCst);
    let mut unhealthy_seen = false;
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let resources = client.resources().await.unwrap();
        let svc = &resources[0];
        if !svc.healthy {
            unhealthy_seen = true;
            // Readiness is sticky: the dip must not revoke it
            assert!(svc.ready_seq.is_some());
            assert_eq!(svc.lifecycle, "ready");
            break;
        }
    }
    assert!(unhealthy_seen, "Health flag should flip after the dip");

    shutdown.trigger();
    let _ = run.await.unwrap();
}

#[tokio::test]
async fn test_spawned_process_runs_and_stops() {
    let mut config = HostConfig::default();
    config.status.enabled = false;
    config.ports.base = 29500;
    config.resources.insert(
        "worker".to_string(),
        ResourceOverride {
            args: vec!["30".to_string()],
            ..Default::default()
        },
    );

    // No health check: ready as soon as the process is running
    let mut builder = AppHostBuilder::new();
    builder.add_project("worker", "sleep");
    let model = builder.build().unwrap();

    let orchestrator = Orchestrator::new(model, config);
    let shutdown = orchestrator.shutdown_handle();
    let registry = orchestrator.registry();
    let (_, config_updates) = mpsc::unbounded_channel();
    let run = tokio::spawn(orchestrator.run(config_updates));

    tokio::time::sleep(Duration::from_millis(500)).await;
    let worker = registry.get("worker").unwrap();
    assert!(worker.is_ready());

    shutdown.trigger();
    let result = run.await.unwrap();
    assert!(result.is_ok());
    assert_eq!(worker.lifecycle(), Lifecycle::Stopped);
}

#[tokio::test]
async fn test_crash_looping_process_fails_the_run() {
    let mut config = HostConfig::default();
    config.status.enabled = false;
    config.health_check.enabled = false;
    config.ports.base = 29510;
    config.restart.max_attempts = 1;
    config.restart.base_delay_ms = 10;
    config.restart.max_delay_ms = 20;

    let mut builder = AppHostBuilder::new();
    builder.add_project("flaky", "false");
    let model = builder.build().unwrap();

    let orchestrator = Orchestrator::new(model, config);
    let (_, config_updates) = mpsc::unbounded_channel();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.run(config_updates),
    )
    .await
    .expect("run should fail fast");

    match result {
        Err(RuntimeError::ResourceFailed { name }) => assert_eq!(name, "flaky"),
        other => panic!("Expected ResourceFailed, got {:?}", other),
    }
}

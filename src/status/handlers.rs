use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::atomic::Ordering;

use crate::model::AppManifest;
use crate::status::StatusState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub run_id: String,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub resources_total: usize,
    pub resources_ready: usize,
}

#[derive(Serialize)]
pub struct ResourceStatus {
    pub name: String,
    pub kind: String,
    pub endpoint: String,
    pub lifecycle: String,
    pub healthy: bool,
    pub restarts: u32,
    pub ready_seq: Option<u64>,
}

#[derive(Serialize)]
pub struct GraphView {
    pub descriptor: String,
    pub manifest: AppManifest,
}

pub async fn get_status(State(state): State<StatusState>) -> Json<SystemStatus> {
    let all = state.registry.all();
    let ready = all.iter().filter(|s| s.is_ready()).count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        run_id: state.run_id.to_string(),
        status: "running",
        uptime_secs: state.started_at.elapsed().as_secs(),
        resources_total: all.len(),
        resources_ready: ready,
    })
}

pub async fn get_resources(State(state): State<StatusState>) -> Json<Vec<ResourceStatus>> {
    let mut statuses = Vec::new();

    // Walk the model so the order matches the declarations.
    for resource in state.model.resources() {
        if let Some(live) = state.registry.get(&resource.name) {
            statuses.push(ResourceStatus {
                name: live.name.clone(),
                kind: live.kind.label().to_string(),
                endpoint: live.endpoint_url().to_string(),
                lifecycle: live.lifecycle().label().to_string(),
                healthy: live.health.is_healthy(),
                restarts: live.restarts.load(Ordering::Relaxed),
                ready_seq: live.ready_seq(),
            });
        }
    }

    Json(statuses)
}

pub async fn get_graph(State(state): State<StatusState>) -> Json<GraphView> {
    Json(GraphView {
        descriptor: state.model.descriptor(),
        manifest: state.model.manifest(),
    })
}

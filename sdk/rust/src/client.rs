use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub run_id: String,
    pub status: String,
    pub uptime_secs: u64,
    pub resources_total: usize,
    pub resources_ready: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub name: String,
    pub kind: String,
    pub endpoint: String,
    pub lifecycle: String,
    pub healthy: bool,
    pub restarts: u32,
    pub ready_seq: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphView {
    pub descriptor: String,
    pub manifest: serde_json::Value,
}

pub struct AppHostClient {
    client: Client,
    host_url: String,
    api_key: Option<String>,
}

impl AppHostClient {
    pub fn new(host_url: &str) -> Self {
        Self {
            client: Client::new(),
            host_url: host_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Use a bearer token on every request.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub async fn status(&self) -> Result<SystemStatus, Box<dyn std::error::Error>> {
        self.get_json("/status").await
    }

    pub async fn resources(&self) -> Result<Vec<ResourceStatus>, Box<dyn std::error::Error>> {
        self.get_json("/resources").await
    }

    pub async fn graph(&self) -> Result<GraphView, Box<dyn std::error::Error>> {
        self.get_json("/graph").await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let mut request = self.client.get(format!("{}{}", self.host_url, path));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let resp = request.send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Status API returned {}: {}", status, text).into());
        }

        match serde_json::from_str::<T>(&text) {
            Ok(value) => Ok(value),
            Err(e) => Err(e.into()),
        }
    }
}

//! GitHub releases/tags client (token auth).

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use crate::config::ServiceConfig;

pub struct GitHubClient {
    base_url: String,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: &ServiceConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("token {}", config.api_key)) {
            headers.insert("Authorization", value);
        }
        let client = reqwest::Client::builder()
            .user_agent("plexarr")
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_matches('/'));
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn releases(&self, owner: &str, repo: &str) -> anyhow::Result<Value> {
        self.get(&format!("/repos/{owner}/{repo}/releases")).await
    }

    pub async fn tags(&self, owner: &str, repo: &str) -> anyhow::Result<Value> {
        self.get(&format!("/repos/{owner}/{repo}/tags")).await
    }
}

//! Shared JSON REST plumbing for the `X-Api-Key` services (Radarr, Sonarr).

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use crate::config::ServiceConfig;

#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    client: reqwest::Client,
}

impl RestClient {
    pub fn new(config: &ServiceConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.api_key) {
            headers.insert("X-Api-Key", value);
        }
        let client = reqwest::Client::builder()
            .user_agent("plexarr")
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_matches('/'))
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn put(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

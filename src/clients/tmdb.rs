//! The Movie Database search client.

use serde_json::Value;

use crate::config::ServiceConfig;

pub struct TmdbClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TmdbClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: reqwest::Client::builder()
                .user_agent("plexarr")
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub async fn search_movie(&self, query: &str) -> anyhow::Result<Value> {
        let url = format!("{}/search/movie", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

//! Sonarr series-collection client.

use serde_json::{json, Value};

use crate::config::ServiceConfig;

use super::radarr::find_by_title;
use super::rest::RestClient;

pub struct SonarrClient {
    rest: RestClient,
}

impl SonarrClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            rest: RestClient::new(config),
        }
    }

    /// Every series in the collection.
    pub async fn series(&self) -> anyhow::Result<Value> {
        self.rest.get("/series", &[]).await
    }

    pub async fn show_by_id(&self, series_id: i64) -> anyhow::Result<Value> {
        self.rest.get(&format!("/series/{series_id}"), &[]).await
    }

    /// Exact-title lookup over the full series list.
    pub async fn show_by_title(&self, title: &str) -> anyhow::Result<Option<Value>> {
        let series = self.series().await?;
        Ok(find_by_title(&series, title))
    }

    pub async fn episodes(&self, series_id: i64) -> anyhow::Result<Value> {
        self.rest
            .get("/episode", &[("seriesId", series_id.to_string())])
            .await
    }

    pub async fn episode_files(&self, series_id: i64) -> anyhow::Result<Value> {
        self.rest
            .get("/episodefile", &[("seriesId", series_id.to_string())])
            .await
    }

    /// Push back an episode object previously fetched with `episodes`.
    pub async fn edit_episode(&self, episode: &Value) -> anyhow::Result<Value> {
        self.rest.put("/episode", episode).await
    }

    pub async fn indexers(&self) -> anyhow::Result<Value> {
        self.rest.get("/indexer", &[]).await
    }

    pub async fn indexer(&self, indexer_id: i64) -> anyhow::Result<Value> {
        self.rest.get(&format!("/indexer/{indexer_id}"), &[]).await
    }

    pub async fn edit_indexer(&self, indexer_id: i64, indexer: &Value) -> anyhow::Result<Value> {
        self.rest
            .put(&format!("/indexer/{indexer_id}"), indexer)
            .await
    }

    /// Scan a downloaded-episode path and import it into the collection.
    pub async fn import_downloaded_episode(
        &self,
        episode_path: &str,
        import_mode: &str,
    ) -> anyhow::Result<Value> {
        let command = json!({
            "name": "DownloadedEpisodesScan",
            "path": episode_path,
            "importMode": import_mode,
        });
        self.rest.post("/command", &command).await
    }
}

//! Radarr movie-collection client.

use serde_json::{json, Value};

use crate::config::ServiceConfig;

use super::rest::RestClient;

pub struct RadarrClient {
    rest: RestClient,
}

impl RadarrClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            rest: RestClient::new(config),
        }
    }

    /// Every movie in the collection.
    pub async fn movies(&self) -> anyhow::Result<Value> {
        self.rest.get("/movie", &[]).await
    }

    pub async fn movie_by_id(&self, movie_id: i64) -> anyhow::Result<Value> {
        self.rest.get(&format!("/movie/{movie_id}"), &[]).await
    }

    pub async fn movie_by_tmdb_id(&self, tmdb_id: i64) -> anyhow::Result<Value> {
        self.rest
            .get("/movie", &[("tmdbId", tmdb_id.to_string())])
            .await
    }

    /// Exact-title lookup over the full movie list.
    pub async fn movie_by_title(&self, title: &str) -> anyhow::Result<Option<Value>> {
        let movies = self.movies().await?;
        Ok(find_by_title(&movies, title))
    }

    /// Push back a movie object previously fetched with a `movie_*` call.
    pub async fn edit_movie(&self, movie: &Value) -> anyhow::Result<Value> {
        self.rest.put("/movie", movie).await
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

    /// Scan a downloaded-movie path and import it into the collection.
    pub async fn import_downloaded_movie(
        &self,
        movie_path: &str,
        import_mode: &str,
    ) -> anyhow::Result<Value> {
        let command = json!({
            "name": "DownloadedMoviesScan",
            "path": movie_path,
            "importMode": import_mode,
        });
        self.rest.post("/command", &command).await
    }
}

pub(crate) fn find_by_title(items: &Value, title: &str) -> Option<Value> {
    items
        .as_array()?
        .iter()
        .find(|item| item["title"].as_str() == Some(title))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_lookup_is_exact() {
        let movies = json!([
            {"title": "Heat", "id": 1},
            {"title": "Heat 2", "id": 2},
        ]);
        assert_eq!(find_by_title(&movies, "Heat").unwrap()["id"], 1);
        assert!(find_by_title(&movies, "heat").is_none());
        assert!(find_by_title(&json!({}), "Heat").is_none());
    }
}

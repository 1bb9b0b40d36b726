//! Ombi request-management client. Authenticates with the `UserName` +
//! `ApiKey` header pair rather than `X-Api-Key`.

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

use crate::config::OmbiConfig;

pub struct OmbiClient {
    base_url: String,
    client: reqwest::Client,
}

impl OmbiClient {
    pub fn new(config: &OmbiConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.username) {
            headers.insert("UserName", value);
        }
        if let Ok(value) = HeaderValue::from_str(&config.api_key) {
            headers.insert("ApiKey", value);
        }
        let client = reqwest::Client::builder()
            .user_agent("plexarr")
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_matches('/'))
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Every movie request, fulfilled or not.
    pub async fn movie_requests(&self) -> anyhow::Result<Value> {
        self.get("/Request/movie", &[]).await
    }

    /// Requested movies that are not yet available.
    pub async fn pending_movies(&self) -> anyhow::Result<Vec<Value>> {
        let requests = self.movie_requests().await?;
        Ok(pending_only(&requests))
    }

    /// Search for a movie, optionally narrowed to a release year.
    pub async fn search_movie(
        &self,
        query: &str,
        year: Option<i32>,
    ) -> anyhow::Result<Vec<Value>> {
        let results = self
            .get(&format!("/Search/movie/{}", urlencoding::encode(query)), &[])
            .await?;
        Ok(filter_year(&results, year))
    }

    /// Root folders of the connected Radarr instance.
    pub async fn radarr_root_folders(&self) -> anyhow::Result<Value> {
        self.get("/Radarr/RootFolders", &[]).await
    }

    /// Request a movie for the connected Radarr instance.
    pub async fn request_movie(
        &self,
        tmdb_id: i64,
        language: &str,
        quality_id: &str,
        folder_id: &str,
    ) -> anyhow::Result<Value> {
        let body = json!({
            "theMovieDbId": tmdb_id,
            "languageCode": language,
            "qualityPathOverride": quality_id,
            "rootFolderOverride": folder_id,
        });
        self.post("/Request/Movie", &body).await
    }
}

fn pending_only(requests: &Value) -> Vec<Value> {
    requests
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|item| item["available"].as_bool() != Some(true))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn filter_year(results: &Value, year: Option<i32>) -> Vec<Value> {
    let items: Vec<Value> = results
        .as_array()
        .map(|items| items.to_vec())
        .unwrap_or_default();
    let Some(year) = year else {
        return items;
    };
    items
        .into_iter()
        .filter(|item| {
            item["releaseDate"]
                .as_str()
                .and_then(|date| date.get(..4))
                .and_then(|y| y.parse::<i32>().ok())
                == Some(year)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_filter_drops_available_requests() {
        let requests = json!([
            {"title": "a", "available": true},
            {"title": "b", "available": false},
            {"title": "c"},
        ]);
        let pending = pending_only(&requests);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0]["title"], "b");
    }

    #[test]
    fn year_filter_uses_release_date_prefix() {
        let results = json!([
            {"title": "a", "releaseDate": "1995-12-15T00:00:00"},
            {"title": "b", "releaseDate": "2015-06-01T00:00:00"},
            {"title": "c"},
        ]);
        let hits = filter_year(&results, Some(1995));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["title"], "a");
        assert_eq!(filter_year(&results, None).len(), 3);
    }
}

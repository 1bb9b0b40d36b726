//! uTorrent Web UI client.
//!
//! The Web UI wants a CSRF token scraped from `token.html` before any
//! action, and returns torrent lists as positional arrays.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::xtream::id_str;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<div[^>]*>(?P<token>[^<]+)</div>").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Torrent {
    pub hash: String,
    pub status: i64,
    pub name: String,
    pub size: i64,
    /// Per mille (1000 = 100%)
    pub progress: i64,
    pub downloaded: i64,
    pub uploaded: i64,
    pub ratio: i64,
    pub upspeed: i64,
    pub downspeed: i64,
    pub eta: i64,
    pub label: String,
    pub peers_connected: i64,
    pub peers_swarm: i64,
    pub seeds_connected: i64,
    pub seeds_swarm: i64,
    pub availability: i64,
    pub queue_position: i64,
    pub remaining: i64,
}

impl Torrent {
    /// One row of the Web UI's positional `torrents` array.
    pub fn from_row(row: &Value) -> Option<Self> {
        let row = row.as_array()?;
        let int = |i: usize| row.get(i).and_then(Value::as_i64).unwrap_or(0);
        let text = |i: usize| row.get(i).map(id_str).unwrap_or_default();

        Some(Self {
            hash: text(0),
            status: int(1),
            name: text(2),
            size: int(3),
            progress: int(4),
            downloaded: int(5),
            uploaded: int(6),
            ratio: int(7),
            upspeed: int(8),
            downspeed: int(9),
            eta: int(10),
            label: text(11),
            peers_connected: int(12),
            peers_swarm: int(13),
            seeds_connected: int(14),
            seeds_swarm: int(15),
            availability: int(16),
            queue_position: int(17),
            remaining: int(18),
        })
    }
}

pub struct UTorrentClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

impl UTorrentClient {
    pub fn new(config: &ServiceConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Basic {}", config.api_key)) {
            headers.insert("Authorization", value);
        }
        let client = reqwest::Client::builder()
            .user_agent("plexarr")
            .default_headers(headers)
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Fetch the CSRF token; the session cookie rides along in the client.
    pub async fn authenticate(&mut self) -> anyhow::Result<&str> {
        let url = format!("{}/token.html", self.base_url);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        self.token = Some(extract_token(&body));
        Ok(self.token.as_deref().unwrap_or(""))
    }

    fn token(&self) -> anyhow::Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("not authenticated, call authenticate() first"))
    }

    async fn action(&self, query: &[(&str, &str)]) -> anyhow::Result<Value> {
        let token = self.token()?;
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("token", token)])
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn torrents(&self) -> anyhow::Result<Vec<Torrent>> {
        let listing = self.action(&[("list", "1")]).await?;
        Ok(parse_torrents(&listing))
    }

    pub async fn add_magnet(&self, magnet_url: &str) -> anyhow::Result<Value> {
        self.action(&[("action", "add-url"), ("s", magnet_url)])
            .await
    }

    pub async fn set_label(&self, torrent_hash: &str, label: &str) -> anyhow::Result<Value> {
        self.action(&[
            ("action", "setprops"),
            ("hash", torrent_hash),
            ("s", "label"),
            ("v", label),
        ])
        .await
    }
}

/// The token page is `<html><div id='token' ...>TOKEN</div></html>`; fall
/// back to the raw body when the wrapper is absent.
fn extract_token(body: &str) -> String {
    TOKEN_RE
        .captures(body)
        .map(|caps| caps["token"].to_string())
        .unwrap_or_else(|| body.trim().to_string())
}

fn parse_torrents(listing: &Value) -> Vec<Torrent> {
    listing["torrents"]
        .as_array()
        .map(|rows| rows.iter().filter_map(Torrent::from_row).collect())
        .unwrap_or_default()
}

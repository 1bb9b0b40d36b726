use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub category_id: String,
    pub category_name: String,
    pub parent_id: ::serde_json::Value, // frequent null or 0
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Stream {
    pub num: Option<serde_json::Value>, // Sometimes int, sometimes string, sometimes missing
    pub name: String,

    #[serde(default)]
    pub stream_type: String,

    pub stream_id: serde_json::Value, // Can be int or string

    pub stream_icon: Option<String>,
    pub epg_channel_id: Option<String>,
    pub added: Option<String>,
    pub category_id: Option<String>,
}

impl Stream {
    pub fn id(&self) -> String {
        id_str(&self.stream_id)
    }

    /// Label part of the display name, before the ":" description
    /// (e.g. "USA NFL Sunday 705").
    pub fn label(&self) -> String {
        self.name.split(':').next().unwrap_or("").trim().to_string()
    }

    /// Description part of the display name, after the first ":".
    /// Empty when the channel carries no game info right now.
    pub fn description(&self) -> String {
        self.name
            .split_once(':')
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default()
    }
}

/// Providers send ids as either numbers or strings
pub fn id_str(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserInfo {
    pub auth: i32,
    pub status: Option<String>,
    pub exp_date: Option<serde_json::Value>,
    pub max_connections: Option<serde_json::Value>,
    pub active_cons: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerInfo {
    pub timezone: Option<String>,
    pub server_time: Option<String>,
}

/// One entry from `get_short_epg` / `get_simple_data_table`.
/// Title and description arrive base64-encoded.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EpgListing {
    pub id: Option<serde_json::Value>,
    pub channel_id: Option<String>,
    pub title: String,
    pub description: String,
    pub start: String,
    #[serde(alias = "end")]
    pub stop: String,
}

impl EpgListing {
    pub fn decoded_title(&self) -> String {
        decode_b64(&self.title)
    }

    pub fn decoded_description(&self) -> String {
        decode_b64(&self.description)
    }
}

fn decode_b64(input: &str) -> String {
    base64::engine::general_purpose::STANDARD
        .decode(input)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_else(|_| input.to_string())
}

#[derive(Debug, Deserialize)]
struct EpgResponse {
    #[serde(default)]
    epg_listings: Vec<EpgListing>,
}

#[derive(Debug, Clone)]
pub struct XtreamClient {
    pub base_url: String,
    pub username: String,
    pub password: String,
    client: reqwest::Client,
}

impl XtreamClient {
    pub fn new(provider: &ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("IPTV Smarters Pro")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: provider.base_url(),
            username: provider.username.clone(),
            password: provider.password.clone(),
            client,
        }
    }

    fn player_api(&self, action: &str) -> String {
        format!(
            "{}/player_api.php?username={}&password={}&action={}",
            self.base_url, self.username, self.password, action
        )
    }

    pub async fn authenticate(
        &self,
    ) -> Result<(bool, Option<UserInfo>, Option<ServerInfo>), anyhow::Error> {
        let url = format!(
            "{}/player_api.php?username={}&password={}",
            self.base_url, self.username, self.password
        );
        let resp = self.client.get(&url).send().await?;

        #[derive(Deserialize)]
        struct AuthResponse {
            user_info: Option<UserInfo>,
            server_info: Option<ServerInfo>,
        }

        if let Ok(json) = resp.json::<AuthResponse>().await {
            if let Some(info) = json.user_info {
                return Ok((info.auth == 1, Some(info), json.server_info));
            }
        }
        Ok((false, None, None))
    }

    pub async fn get_live_categories(&self) -> Result<Vec<Category>, anyhow::Error> {
        let url = self.player_api("get_live_categories");
        let resp = self.client.get(&url).send().await?;
        let categories: Vec<Category> = resp.json().await?;
        Ok(categories)
    }

    /// All live streams, or just those in one category.
    pub async fn get_live_streams(
        &self,
        category_id: Option<&str>,
    ) -> Result<Vec<Stream>, anyhow::Error> {
        let url = match category_id {
            Some(id) => format!("{}&category_id={}", self.player_api("get_live_streams"), id),
            None => self.player_api("get_live_streams"),
        };
        let resp = self.client.get(&url).send().await?;
        let streams: Vec<Stream> = resp.json().await?;
        Ok(streams)
    }

    /// Short (next few programmes) EPG for a single stream.
    pub async fn get_short_epg(
        &self,
        stream_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<EpgListing>, anyhow::Error> {
        let mut url = format!(
            "{}&stream_id={}",
            self.player_api("get_short_epg"),
            stream_id
        );
        if let Some(limit) = limit {
            url.push_str(&format!("&limit={limit}"));
        }
        let resp = self.client.get(&url).send().await?;
        let json: EpgResponse = resp.json().await?;
        Ok(json.epg_listings)
    }

    /// Full programme table for a single stream. The panel uses "end" instead
    /// of "stop" here; `EpgListing` accepts both.
    pub async fn get_simple_data_table(
        &self,
        stream_id: &str,
    ) -> Result<Vec<EpgListing>, anyhow::Error> {
        let url = format!(
            "{}&stream_id={}",
            self.player_api("get_simple_data_table"),
            stream_id
        );
        let resp = self.client.get(&url).send().await?;
        let json: EpgResponse = resp.json().await?;
        Ok(json.epg_listings)
    }

    pub fn live_stream_url(&self, stream_id: &str, extension: &str) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            self.base_url, self.username, self.password, stream_id, extension
        )
    }
}

/// Categories whose name is exactly one of the configured group names.
pub fn categories_in_groups(categories: &[Category], groups: &[String]) -> Vec<Category> {
    categories
        .iter()
        .filter(|c| groups.iter().any(|g| g == &c.category_name))
        .cloned()
        .collect()
}

/// First category whose name contains the query, case-insensitive.
pub fn find_category<'a>(categories: &'a [Category], query: &str) -> Option<&'a Category> {
    let query = query.to_lowercase();
    categories
        .iter()
        .find(|c| c.category_name.to_lowercase().contains(&query))
}

/// Streams whose display name contains any of the given terms, case-insensitive.
/// Term order is preserved, matching the original multi-term accumulation.
pub fn streams_matching(streams: &[Stream], terms: &[&str]) -> Vec<Stream> {
    let mut matched = Vec::new();
    for term in terms {
        let term = term.to_lowercase();
        for stream in streams {
            if stream.name.to_lowercase().contains(&term) {
                matched.push(stream.clone());
            }
        }
    }
    matched
}

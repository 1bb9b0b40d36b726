//! Pluto TV guide supplement (`api.pluto.tv/v2/channels`).
//!
//! Pluto publishes its own guide inline: each channel carries a `timelines`
//! array for the requested window, so one request yields both the channel
//! and its programmes.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::xmltv::{format_epg_time, Channel, Program};

const PLUTO_API: &str = "http://api.pluto.tv/v2/channels";

#[derive(Debug, Clone, Deserialize)]
pub struct PlutoChannel {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "featuredImage", default)]
    pub featured_image: Option<PlutoImage>,
    #[serde(default)]
    pub timelines: Vec<PlutoTimeline>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlutoImage {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlutoTimeline {
    pub title: String,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    #[serde(default)]
    pub episode: Option<PlutoEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlutoEpisode {
    #[serde(default)]
    pub description: String,
}

pub struct PlutoClient {
    client: reqwest::Client,
}

impl Default for PlutoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PlutoClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("plexarr")
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// All channels with their timelines for a two-day window from `start`.
    pub async fn get_channels(
        &self,
        start: DateTime<Utc>,
    ) -> Result<Vec<PlutoChannel>, anyhow::Error> {
        let stop = start + Duration::days(2);
        let format = "%Y-%m-%d %H:%M:%S.000%z";
        let resp = self
            .client
            .get(PLUTO_API)
            .query(&[
                ("start", start.format(format).to_string()),
                ("stop", stop.format(format).to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// First channel whose name contains the term, case-insensitive.
    pub async fn get_channel(
        &self,
        term: &str,
        start: DateTime<Utc>,
    ) -> Result<Option<PlutoChannel>, anyhow::Error> {
        let channels = self.get_channels(start).await?;
        Ok(find_channel(channels, term))
    }
}

pub fn find_channel(channels: Vec<PlutoChannel>, term: &str) -> Option<PlutoChannel> {
    let term = term.to_lowercase();
    channels
        .into_iter()
        .find(|c| c.name.to_lowercase().contains(&term))
}

/// Flatten one Pluto channel's timelines into guide records under the given
/// tvg id and display name.
pub fn pluto_guide(
    channel: &PlutoChannel,
    tvg_id: &str,
    tvg_name: &str,
) -> (Vec<Channel>, Vec<Program>) {
    let channels = vec![Channel {
        tvg_id: tvg_id.to_string(),
        tvg_name: tvg_name.to_string(),
        tvg_logo: channel
            .featured_image
            .as_ref()
            .map(|img| img.path.clone())
            .unwrap_or_default(),
        epg_desc: String::new(),
    }];

    let programs = channel
        .timelines
        .iter()
        .map(|timeline| Program {
            tvg_id: tvg_id.to_string(),
            epg_title: timeline.title.clone(),
            epg_start: format_epg_time(&timeline.start),
            epg_stop: format_epg_time(&timeline.stop),
            epg_desc: timeline
                .episode
                .as_ref()
                .map(|e| e.description.clone())
                .unwrap_or_default(),
        })
        .collect();

    (channels, programs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_fixture() -> PlutoChannel {
        serde_json::from_value(serde_json::json!({
            "name": "Pluto TV Science",
            "slug": "science",
            "featuredImage": {"path": "http://images.pluto.tv/science.png"},
            "timelines": [
                {
                    "title": "How the Universe Works",
                    "start": "2024-01-01T12:00:00Z",
                    "stop": "2024-01-01T13:00:00Z",
                    "episode": {"description": "Black holes."}
                },
                {
                    "title": "Space Deep Dive",
                    "start": "2024-01-01T13:00:00Z",
                    "stop": "2024-01-01T14:30:00Z"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn find_channel_matches_case_insensitively() {
        let channels = vec![channel_fixture()];
        assert!(find_channel(channels.clone(), "SCIENCE").is_some());
        assert!(find_channel(channels, "cooking").is_none());
    }

    #[test]
    fn timelines_flatten_to_guide_records() {
        let (channels, programs) = pluto_guide(&channel_fixture(), "SCIENCE", "Pluto: Science");

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].tvg_id, "SCIENCE");
        assert_eq!(channels[0].tvg_logo, "http://images.pluto.tv/science.png");

        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].epg_title, "How the Universe Works");
        assert_eq!(programs[0].epg_start, "20240101120000 +0000");
        assert_eq!(programs[0].epg_desc, "Black holes.");
        assert_eq!(programs[1].epg_desc, "");
    }
}

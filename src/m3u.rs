//! M3U playlist rendering for live streams.
//!
//! One `#EXTINF` line per stream with the CUID / tvg-* / group-title
//! attributes the downstream players expect, followed by the authenticated
//! live stream URL.

use crate::fetch::{fetch_all, FetchOptions, FetchReport};
use crate::xtream::{categories_in_groups, Stream, XtreamClient};

/// Starting CUID counters for the curated sports playlists.
pub const NFL_FIRST_CUID: u32 = 702;
pub const NBA_FIRST_CUID: u32 = 801;
pub const ESPN_FIRST_CUID: u32 = 1500;

#[derive(Debug, Clone)]
pub struct M3uOptions {
    pub group: String,
    pub logo: String,
    pub first_cuid: u32,
}

impl Default for M3uOptions {
    fn default() -> Self {
        Self {
            group: String::new(),
            logo: String::new(),
            first_cuid: 1,
        }
    }
}

/// Render streams into an M3U playlist. CUIDs count up from
/// `options.first_cuid` in stream order.
pub fn render_m3u(streams: &[Stream], client: &XtreamClient, options: &M3uOptions) -> String {
    let mut m3u = String::from("#EXTM3U\n");
    let mut cuid = options.first_cuid;

    for stream in streams {
        let tvg_id = stream.id();
        let tvg_name = stream.label();
        let tvg_logo = stream
            .stream_icon
            .clone()
            .filter(|icon| !icon.is_empty())
            .unwrap_or_else(|| options.logo.clone());

        m3u.push_str(&format!(
            "#EXTINF:-1 CUID=\"{cuid}\" tvg-id=\"{tvg_id}\" tvg-name=\"{tvg_name}\" tvg-logo=\"{tvg_logo}\" group-title=\"{}\",{tvg_name}\n",
            options.group
        ));
        m3u.push_str(&client.live_stream_url(&tvg_id, "ts"));
        m3u.push('\n');
        cuid += 1;
    }
    m3u
}

/// Full playlist for the provider's configured groups: list categories,
/// keep the configured ones, fetch each category's streams concurrently,
/// then render one playlist with the category name as group-title.
pub async fn group_playlist(
    client: &XtreamClient,
    groups: &[String],
    options: &FetchOptions,
) -> anyhow::Result<(String, FetchReport)> {
    let categories = client.get_live_categories().await?;
    let wanted = categories_in_groups(&categories, groups);

    let ids: Vec<String> = wanted.iter().map(|c| c.category_id.clone()).collect();
    let (stream_lists, report) = fetch_all(&ids, options, |category_id| async move {
        client.get_live_streams(Some(&category_id)).await
    })
    .await;

    let mut m3u = String::from("#EXTM3U\n");
    let mut cuid = 1u32;
    // Results are slot-aligned with `wanted`; a failed category leaves None
    // and must not shift later categories onto the wrong group-title.
    for (category, streams) in wanted.iter().zip(stream_lists) {
        let Some(streams) = streams else { continue };
        for stream in &streams {
            let tvg_id = stream.id();
            let tvg_name = stream.label();
            let tvg_logo = stream.stream_icon.clone().unwrap_or_default();
            m3u.push_str(&format!(
                "#EXTINF:-1 CUID=\"{cuid}\" tvg-id=\"{tvg_id}\" tvg-name=\"{tvg_name}\" tvg-logo=\"{tvg_logo}\" group-title=\"{}\",{tvg_name}\n",
                category.category_name
            ));
            m3u.push_str(&client.live_stream_url(&tvg_id, "ts"));
            m3u.push('\n');
            cuid += 1;
        }
    }
    Ok((m3u, report))
}

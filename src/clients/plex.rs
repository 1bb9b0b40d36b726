//! Plex server client. Plex authenticates with an `X-Plex-Token` query
//! parameter and answers in XML; the library lookup pulls directory keys
//! out of the `/library/sections` listing.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::config::ServiceConfig;

pub struct PlexClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl PlexClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_key.clone(),
            client: reqwest::Client::builder()
                .user_agent("plexarr")
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Token-authenticated GET returning the raw XML body.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<String> {
        let url = format!("{}/{}", self.base_url, path.trim_matches('/'));
        let resp = self
            .client
            .get(&url)
            .query(&[("X-Plex-Token", self.token.as_str())])
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }

    /// Server identity and capability attributes (root document).
    pub async fn server_capabilities(&self) -> anyhow::Result<String> {
        self.get("/", &[]).await
    }

    /// Library sections listing.
    pub async fn libraries(&self) -> anyhow::Result<String> {
        self.get("/library/sections", &[]).await
    }

    /// Metadata document for a rating key (e.g. `/library/metadata/91993`).
    pub async fn metadata(&self, rating_key: &str) -> anyhow::Result<String> {
        self.get(rating_key, &[]).await
    }

    /// Refresh only the given folder of the named library.
    pub async fn partial_scan(&self, library: &str, folder: &str) -> anyhow::Result<()> {
        let sections = self.libraries().await?;
        let key = library_key(&sections, library)
            .ok_or_else(|| anyhow::anyhow!("no library named {library}"))?;
        self.get(
            &format!("/library/sections/{key}/refresh"),
            &[("path", folder.to_string())],
        )
        .await?;
        Ok(())
    }
}

/// Key of the `<Directory>` whose title matches, from a sections listing.
pub fn library_key(xml: &str, title: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event().ok()? {
            Event::Start(e) | Event::Empty(e) => {
                if e.name().as_ref() != b"Directory" {
                    continue;
                }
                let mut key = None;
                let mut matched = false;
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().ok()?.into_owned();
                    match attr.key.as_ref() {
                        b"key" => key = Some(value),
                        b"title" => matched = value == title,
                        _ => {}
                    }
                }
                if matched {
                    return key;
                }
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="2">
  <Directory key="1" type="movie" title="Movies" />
  <Directory key="5" type="show" title="TV Shows" />
</MediaContainer>"#;

    #[test]
    fn library_key_matches_title_exactly() {
        assert_eq!(library_key(SECTIONS, "Movies").as_deref(), Some("1"));
        assert_eq!(library_key(SECTIONS, "TV Shows").as_deref(), Some("5"));
        assert!(library_key(SECTIONS, "movies").is_none());
    }
}

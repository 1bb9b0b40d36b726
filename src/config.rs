use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::errors::ConfigError;

/// One Xtream-Codes panel account (`[providers.lemo]`, `[providers.kemo]`, ...)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// Category names to include when building a full playlist
    #[serde(default)]
    pub groups: Vec<String>,
}

impl ProviderConfig {
    /// Panel origin without the `/player_api.php` suffix
    pub fn base_url(&self) -> String {
        let url = self.api_url.trim_end_matches('/');
        url.trim_end_matches("/player_api.php").to_string()
    }
}

/// API-key service section (radarr, sonarr, tmdb, github, utorrent)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    pub api_url: String,
    pub api_key: String,
}

/// Ombi authenticates with both a username and an API key
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OmbiConfig {
    pub api_url: String,
    pub api_key: String,
    pub username: String,
}

/// Remote target for publishing generated playlists/guides over scp
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RemoteConfig {
    pub host: String,
    pub user: String,
    pub path: String,
}

impl RemoteConfig {
    /// scp destination (`user@host:path`)
    pub fn destination(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.path)
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    pub radarr: Option<ServiceConfig>,
    pub sonarr: Option<ServiceConfig>,
    pub ombi: Option<OmbiConfig>,
    pub plex: Option<ServiceConfig>,
    pub tmdb: Option<ServiceConfig>,
    pub github: Option<ServiceConfig>,
    pub utorrent: Option<ServiceConfig>,
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "plexarr", "plexarr")?;
        Some(proj.config_dir().join("plexarr.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        let path =
            Self::config_path().ok_or_else(|| ConfigError::NotFound("<no home dir>".into()))?;
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Typed provider lookup by name; replaces the original's string-built
    /// attribute access.
    pub fn provider(&self, name: &str) -> Result<&ProviderConfig, ConfigError> {
        self.providers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProvider(name.to_string()))
    }

    pub fn radarr(&self) -> Result<&ServiceConfig, ConfigError> {
        self.radarr
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("radarr".into()))
    }

    pub fn sonarr(&self) -> Result<&ServiceConfig, ConfigError> {
        self.sonarr
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("sonarr".into()))
    }

    pub fn ombi(&self) -> Result<&OmbiConfig, ConfigError> {
        self.ombi
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("ombi".into()))
    }

    pub fn plex(&self) -> Result<&ServiceConfig, ConfigError> {
        self.plex
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("plex".into()))
    }

    pub fn tmdb(&self) -> Result<&ServiceConfig, ConfigError> {
        self.tmdb
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("tmdb".into()))
    }

    pub fn github(&self) -> Result<&ServiceConfig, ConfigError> {
        self.github
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("github".into()))
    }

    pub fn utorrent(&self) -> Result<&ServiceConfig, ConfigError> {
        self.utorrent
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("utorrent".into()))
    }

    pub fn remote(&self) -> Result<&RemoteConfig, ConfigError> {
        self.remote
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSection("remote".into()))
    }

    /// Configured timezone, or the system timezone, or UTC.
    pub fn user_timezone(&self) -> String {
        if let Some(tz) = &self.timezone {
            return tz.clone();
        }
        if let Ok(tz) = iana_time_zone::get_timezone() {
            return tz;
        }
        "UTC".to_string()
    }
}

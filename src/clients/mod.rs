//! Thin typed clients for the media services plexarr glues together.
//!
//! Each client is constructed from its config section and exposes the
//! handful of endpoints the original scripts actually used. Responses stay
//! as `serde_json::Value` where the callers only forward them.

pub mod github;
pub mod ombi;
pub mod plex;
pub mod radarr;
pub mod rest;
pub mod sonarr;
pub mod tmdb;
pub mod utorrent;

pub use github::GitHubClient;
pub use ombi::OmbiClient;
pub use plex::PlexClient;
pub use radarr::RadarrClient;
pub use rest::RestClient;
pub use sonarr::SonarrClient;
pub use tmdb::TmdbClient;
pub use utorrent::UTorrentClient;

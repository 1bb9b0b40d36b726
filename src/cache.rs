//! On-disk season cache for team and schedule tables.
//!
//! Files are JSON, one per `{league}_{kind}_{year}` (e.g. `nfl_teams_2024.json`),
//! so a season is fetched once and reused until an explicit refresh.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Increment when the envelope changes to auto-invalidate old caches
const CACHE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    #[allow(dead_code)]
    cached_at: u64,
    items: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct SeasonCache {
    dir: PathBuf,
}

impl SeasonCache {
    /// Cache under the per-user project cache directory.
    pub fn open() -> Option<Self> {
        use directories::ProjectDirs;
        let proj = ProjectDirs::from("com", "plexarr", "plexarr")?;
        let dir = proj.cache_dir().join("seasons");
        std::fs::create_dir_all(&dir).ok()?;
        Some(Self { dir })
    }

    /// Cache rooted at an explicit directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        let _ = std::fs::create_dir_all(&dir);
        Self { dir }
    }

    fn path(&self, league: &str, kind: &str, year: i32) -> PathBuf {
        self.dir.join(format!("{league}_{kind}_{year}.json"))
    }

    /// Load a cached table. Returns None when missing, corrupt, or from an
    /// older cache version (stale files are removed).
    pub fn load<T: DeserializeOwned>(&self, league: &str, kind: &str, year: i32) -> Option<Vec<T>> {
        let path = self.path(league, kind, year);
        let data = std::fs::read_to_string(&path).ok()?;
        let envelope: Envelope<T> = serde_json::from_str(&data).ok()?;
        if envelope.version != CACHE_VERSION {
            let _ = std::fs::remove_file(&path);
            return None;
        }
        Some(envelope.items)
    }

    pub fn store<T: Serialize>(
        &self,
        league: &str,
        kind: &str,
        year: i32,
        items: &[T],
    ) -> anyhow::Result<()> {
        let envelope = EnvelopeRef {
            version: CACHE_VERSION,
            cached_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            items,
        };
        let path = self.path(league, kind, year);
        std::fs::write(&path, serde_json::to_string_pretty(&envelope)?)?;
        Ok(())
    }

    pub fn invalidate(&self, league: &str, kind: &str, year: i32) {
        let _ = std::fs::remove_file(self.path(league, kind, year));
    }
}

// Envelope serializes `items: &[T]` on write but owns Vec<T> on read, so the
// store path uses a borrowed twin.
#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    cached_at: u64,
    items: &'a [T],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::espn::Team;

    fn team(name: &str) -> Team {
        Team {
            team_id: "1".to_string(),
            team_name: name.to_string(),
            team_nick: String::new(),
            team_abbr: String::new(),
            team_area: String::new(),
            team_venue: String::new(),
        }
    }

    #[test]
    fn store_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SeasonCache::with_dir(tmp.path().to_path_buf());

        let teams = vec![team("Las Vegas Raiders"), team("Minnesota Vikings")];
        cache.store("nfl", "teams", 2024, &teams).unwrap();

        let loaded: Vec<Team> = cache.load("nfl", "teams", 2024).unwrap();
        assert_eq!(loaded, teams);
    }

    #[test]
    fn missing_and_invalidated_caches_return_none() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SeasonCache::with_dir(tmp.path().to_path_buf());

        assert!(cache.load::<Team>("nfl", "teams", 2024).is_none());

        cache.store("nfl", "teams", 2024, &[team("A")]).unwrap();
        cache.invalidate("nfl", "teams", 2024);
        assert!(cache.load::<Team>("nfl", "teams", 2024).is_none());
    }

    #[test]
    fn version_mismatch_discards_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SeasonCache::with_dir(tmp.path().to_path_buf());

        let stale = r#"{"version": 0, "cached_at": 0, "items": []}"#;
        std::fs::write(tmp.path().join("nfl_teams_2024.json"), stale).unwrap();
        assert!(cache.load::<Team>("nfl", "teams", 2024).is_none());
        assert!(!tmp.path().join("nfl_teams_2024.json").exists());
    }
}

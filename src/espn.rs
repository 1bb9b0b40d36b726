//! ESPN core API v2 client (`sports.core.api.espn.com`).
//!
//! Fetches per-season team tables and the NFL schedule. List endpoints
//! return `$ref` links which are expanded with a bounded-concurrency fetch.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fetch::{fetch_all, FetchOptions, FetchReport};

const CORE_API: &str = "http://sports.core.api.espn.com/v2/sports";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum League {
    Nfl,
    Nba,
}

impl League {
    pub fn path(&self) -> &'static str {
        match self {
            League::Nfl => "football/leagues/nfl",
            League::Nba => "basketball/leagues/nba",
        }
    }

    /// Cache-file prefix for this league's season data.
    pub fn slug(&self) -> &'static str {
        match self {
            League::Nfl => "nfl",
            League::Nba => "nba",
        }
    }

    /// Season start year for a given date.
    /// NFL seasons run September through January; NBA October through April.
    pub fn season_year(&self, date: NaiveDate) -> i32 {
        match self {
            League::Nfl => {
                if date.month() < 8 {
                    date.year() - 1
                } else {
                    date.year()
                }
            }
            League::Nba => {
                if (10..=12).contains(&date.month()) {
                    date.year()
                } else {
                    date.year() - 1
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: String,
    pub team_name: String,
    pub team_nick: String,
    pub team_abbr: String,
    pub team_area: String,
    pub team_venue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGame {
    pub season: String,
    pub week_name: String,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub game_name: String,
    pub game_short: String,
    pub game_date: DateTime<Utc>,
    pub home_team: String,
    pub home_venue: String,
    pub away_team: String,
}

#[derive(Debug, Deserialize)]
struct RefList {
    #[serde(default)]
    items: Vec<RefItem>,
}

#[derive(Debug, Deserialize)]
struct RefItem {
    #[serde(rename = "$ref")]
    href: String,
}

#[derive(Debug, Deserialize)]
struct TeamItem {
    id: serde_json::Value,
    #[serde(rename = "displayName")]
    display_name: String,
    name: Option<String>,
    abbreviation: Option<String>,
    location: Option<String>,
    venue: Option<VenueItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VenueItem {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeasonType {
    id: serde_json::Value,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekItem {
    number: i64,
    text: String,
    start_date: String,
    end_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventItem {
    name: String,
    short_name: Option<String>,
    date: String,
    #[serde(default)]
    competitions: Vec<CompetitionItem>,
}

#[derive(Debug, Deserialize)]
struct CompetitionItem {
    #[serde(default)]
    competitors: Vec<CompetitorItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompetitorItem {
    id: serde_json::Value,
    home_away: String,
}

/// ESPN event dates come as RFC 3339, sometimes without seconds.
fn parse_espn_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}

pub struct EspnClient {
    client: reqwest::Client,
    fetch_options: FetchOptions,
}

impl Default for EspnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EspnClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("plexarr")
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            fetch_options: FetchOptions::default(),
        }
    }

    fn league_url(&self, league: League, path: &str) -> String {
        format!(
            "{}/{}/{}?lang=en&region=us&limit=32",
            CORE_API,
            league.path(),
            path.trim_matches('/')
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Expand a `{items: [{$ref}]}` listing into its referenced objects.
    async fn get_items<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> anyhow::Result<(Vec<T>, FetchReport)> {
        let listing: RefList = self.get_json(url).await?;
        let refs: Vec<String> = listing.items.into_iter().map(|item| item.href).collect();
        let (items, report) = fetch_all(&refs, &self.fetch_options, |href| async move {
            self.get_json::<T>(&href).await
        })
        .await;
        Ok((items.into_iter().flatten().collect(), report))
    }

    /// Team table for one league season, sorted by full team name.
    pub async fn get_teams(&self, league: League, year: i32) -> anyhow::Result<Vec<Team>> {
        let url = self.league_url(league, &format!("seasons/{year}/teams"));
        let (items, _report) = self.get_items::<TeamItem>(&url).await?;

        let mut teams: Vec<Team> = items
            .into_iter()
            .map(|item| Team {
                team_id: crate::xtream::id_str(&item.id),
                team_name: item.display_name,
                team_nick: item.name.unwrap_or_default(),
                team_abbr: item.abbreviation.unwrap_or_default(),
                team_area: item.location.unwrap_or_default(),
                team_venue: item
                    .venue
                    .and_then(|v| v.full_name)
                    .unwrap_or_default(),
            })
            .collect();
        teams.sort_by(|a, b| a.team_name.cmp(&b.team_name));
        Ok(teams)
    }

    /// Full NFL season schedule: season types -> weeks -> events, with each
    /// event's competitors joined against the team table.
    pub async fn get_nfl_schedule(
        &self,
        year: i32,
        teams: &[Team],
    ) -> anyhow::Result<Vec<ScheduleGame>> {
        let types_url = self.league_url(League::Nfl, &format!("seasons/{year}/types"));
        let (season_types, _) = self.get_items::<SeasonType>(&types_url).await?;

        let mut schedule = Vec::new();
        for season in season_types {
            let season_id = crate::xtream::id_str(&season.id);
            let weeks_url =
                self.league_url(League::Nfl, &format!("seasons/{year}/types/{season_id}/weeks"));
            let (weeks, _) = self.get_items::<WeekItem>(&weeks_url).await?;

            for week in weeks {
                let events_url = self.league_url(
                    League::Nfl,
                    &format!(
                        "seasons/{year}/types/{season_id}/weeks/{}/events",
                        week.number
                    ),
                );
                let (events, _) = self.get_items::<EventItem>(&events_url).await?;

                let week_start = parse_espn_date(&week.start_date);
                let week_end = parse_espn_date(&week.end_date);

                for event in events {
                    if let Some(game) =
                        build_game(&season.name, &week.text, week_start, week_end, event, teams)
                    {
                        schedule.push(game);
                    }
                }
            }
        }
        Ok(schedule)
    }
}

fn build_game(
    season: &str,
    week_name: &str,
    week_start: Option<DateTime<Utc>>,
    week_end: Option<DateTime<Utc>>,
    event: EventItem,
    teams: &[Team],
) -> Option<ScheduleGame> {
    let competition = event.competitions.first()?;
    let find_team = |side: &str| -> Option<&Team> {
        let competitor = competition
            .competitors
            .iter()
            .find(|c| c.home_away == side)?;
        let id = crate::xtream::id_str(&competitor.id);
        teams.iter().find(|t| t.team_id == id)
    };

    let home = find_team("home");
    let away = find_team("away");

    Some(ScheduleGame {
        season: season.to_string(),
        week_name: week_name.to_string(),
        week_start: week_start?,
        week_end: week_end?,
        game_name: event.name,
        game_short: event.short_name.unwrap_or_default(),
        game_date: parse_espn_date(&event.date)?,
        home_team: home.map(|t| t.team_name.clone()).unwrap_or_default(),
        home_venue: home.map(|t| t.team_venue.clone()).unwrap_or_default(),
        away_team: away.map(|t| t.team_name.clone()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn nfl_season_year_rolls_over_in_august() {
        assert_eq!(League::Nfl.season_year(date(2024, 7, 31)), 2023);
        assert_eq!(League::Nfl.season_year(date(2024, 8, 1)), 2024);
        assert_eq!(League::Nfl.season_year(date(2025, 1, 15)), 2024);
    }

    #[test]
    fn nba_season_year_rolls_over_in_october() {
        assert_eq!(League::Nba.season_year(date(2023, 9, 30)), 2022);
        assert_eq!(League::Nba.season_year(date(2023, 10, 1)), 2023);
        assert_eq!(League::Nba.season_year(date(2024, 4, 1)), 2023);
    }

    #[test]
    fn espn_dates_parse_with_and_without_seconds() {
        assert!(parse_espn_date("2024-09-06T00:15Z").is_some());
        assert!(parse_espn_date("2024-09-06T00:15:00Z").is_some());
        assert!(parse_espn_date("garbage").is_none());
    }

    #[test]
    fn build_game_joins_competitors_to_team_table() {
        let teams = vec![
            Team {
                team_id: "13".to_string(),
                team_name: "Las Vegas Raiders".to_string(),
                team_nick: "Raiders".to_string(),
                team_abbr: "LV".to_string(),
                team_area: "Las Vegas".to_string(),
                team_venue: "Allegiant Stadium".to_string(),
            },
            Team {
                team_id: "16".to_string(),
                team_name: "Minnesota Vikings".to_string(),
                team_nick: "Vikings".to_string(),
                team_abbr: "MIN".to_string(),
                team_area: "Minnesota".to_string(),
                team_venue: "U.S. Bank Stadium".to_string(),
            },
        ];
        let event: EventItem = serde_json::from_value(serde_json::json!({
            "name": "Minnesota Vikings at Las Vegas Raiders",
            "shortName": "MIN @ LV",
            "date": "2024-12-08T21:25Z",
            "competitions": [{
                "competitors": [
                    {"id": "13", "homeAway": "home"},
                    {"id": "16", "homeAway": "away"},
                ]
            }]
        }))
        .unwrap();

        let game = build_game(
            "Regular Season",
            "Week 14",
            parse_espn_date("2024-12-04T08:00Z"),
            parse_espn_date("2024-12-11T07:59Z"),
            event,
            &teams,
        )
        .unwrap();

        assert_eq!(game.home_team, "Las Vegas Raiders");
        assert_eq!(game.home_venue, "Allegiant Stadium");
        assert_eq!(game.away_team, "Minnesota Vikings");
        assert_eq!(game.game_short, "MIN @ LV");
    }
}

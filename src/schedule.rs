//! Matchup extraction from stream display names and schedule resolution.
//!
//! Stream names look like
//! `"USA NFL Sunday 705: Las Vegas Raiders vs Minnesota Vikings @ 04:25 PM"`.
//! The parser is built from the known team table: an alternation of all team
//! names ordered longest-first, so when one name is a substring of another
//! (relocated franchises, shared city names) the longest known name wins.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::errors::{ParseError, ScheduleError};
use crate::espn::{ScheduleGame, Team};

/// A matchup extracted from a stream display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    pub tvg_name: String,
    pub team1: String,
    pub team2: String,
    pub time: String,
}

pub struct MatchupParser {
    full: Regex,
    pair: Regex,
}

impl MatchupParser {
    pub fn from_teams(teams: &[Team]) -> Result<Self, regex::Error> {
        let names: Vec<String> = teams.iter().map(|t| t.team_name.clone()).collect();
        Self::from_names(&names)
    }

    pub fn from_names(names: &[String]) -> Result<Self, regex::Error> {
        let mut names: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
        // Longest-first so e.g. "New York Jets" beats a bare "Jets"
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        let alternation = names.join("|");

        let full = Regex::new(&format!(
            r"(?i)(?P<tvg_name>[\w\s]+):\s*(?P<team1>{alternation})\s+(?:vs\.?|at|x|@|-)\s+(?P<team2>{alternation})\s*[@(]\s*(?P<time>\d{{1,2}}:\d{{2}}\s*(?:AM|PM)?)\)?"
        ))?;
        let pair = Regex::new(&format!(
            r"(?i)(?P<team1>{alternation})\s+(?:vs\.?|at|x|@|-)\s+(?P<team2>{alternation})"
        ))?;
        Ok(Self { full, pair })
    }

    /// Extract `{tvg_name, team1, team2, time}` from a display name.
    pub fn parse(&self, line: &str) -> Result<Matchup, ParseError> {
        let description = line
            .split_once(':')
            .map(|(_, rest)| rest.trim())
            .unwrap_or("");
        if description.is_empty() {
            return Err(ParseError::NoDescription(line.to_string()));
        }

        if let Some(caps) = self.full.captures(line) {
            return Ok(Matchup {
                tvg_name: caps["tvg_name"].trim().to_string(),
                team1: caps["team1"].to_string(),
                team2: caps["team2"].to_string(),
                time: caps["time"].trim().to_string(),
            });
        }

        if self.pair.is_match(description) {
            return Err(ParseError::NoTimeToken(line.to_string()));
        }
        Err(ParseError::NoMatchup(line.to_string()))
    }
}

/// A season schedule table with window-based game lookup.
#[derive(Debug, Clone)]
pub struct Schedule {
    games: Vec<ScheduleGame>,
}

impl Schedule {
    pub fn new(games: Vec<ScheduleGame>) -> Self {
        Self { games }
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// The game in the week containing `now` where both teams play.
    /// Multiple candidate rows resolve to the first in table order.
    pub fn find_game(
        &self,
        team1: &str,
        team2: &str,
        now: DateTime<Utc>,
    ) -> Result<&ScheduleGame, ScheduleError> {
        self.games
            .iter()
            .filter(|g| g.week_start <= now && now <= g.week_end)
            .find(|g| {
                let pair = [g.home_team.as_str(), g.away_team.as_str()];
                pair.contains(&team1) && pair.contains(&team2)
            })
            .ok_or_else(|| ScheduleError::NoGameInWindow {
                team1: team1.to_string(),
                team2: team2.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn nfl_names() -> Vec<String> {
        [
            "Arizona Cardinals",
            "Baltimore Ravens",
            "Cincinnati Bengals",
            "Cleveland Browns",
            "Las Vegas Raiders",
            "Los Angeles Rams",
            "Minnesota Vikings",
            "New York Giants",
            "Philadelphia Eagles",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn parser() -> MatchupParser {
        MatchupParser::from_names(&nfl_names()).unwrap()
    }

    #[test]
    fn extracts_teams_and_time() {
        let m = parser()
            .parse("USA NFL Sunday 705: Las Vegas Raiders vs Minnesota Vikings @ 04:25 PM")
            .unwrap();
        assert_eq!(m.tvg_name, "USA NFL Sunday 705");
        assert_eq!(m.team1, "Las Vegas Raiders");
        assert_eq!(m.team2, "Minnesota Vikings");
        assert_eq!(m.time, "04:25 PM");
    }

    #[test]
    fn handles_extra_spaces_and_parenthesized_times() {
        let p = parser();

        let m = p
            .parse("USA NFL Sunday 705: Philadelphia Eagles vs  Cleveland Browns @ 01:00 PM")
            .unwrap();
        assert_eq!(m.team1, "Philadelphia Eagles");
        assert_eq!(m.team2, "Cleveland Browns");

        let m = p
            .parse("USA NFL Sunday 707: Arizona Cardinals vs Baltimore Ravens (08:00 PM)")
            .unwrap();
        assert_eq!(m.time, "08:00 PM");
    }

    #[test]
    fn bare_label_is_no_description() {
        let p = parser();
        assert_eq!(
            p.parse("USA NFL Sunday 708"),
            Err(ParseError::NoDescription("USA NFL Sunday 708".into()))
        );
        assert_eq!(
            p.parse("USA NFL Sunday 708:"),
            Err(ParseError::NoDescription("USA NFL Sunday 708:".into()))
        );
    }

    #[test]
    fn unknown_teams_are_no_matchup() {
        let err = parser()
            .parse("USA NFL Sunday 705: Springfield Isotopes vs Shelbyville @ 01:00 PM")
            .unwrap_err();
        assert!(matches!(err, ParseError::NoMatchup(_)));
    }

    #[test]
    fn matchup_without_time_is_distinct_error() {
        let err = parser()
            .parse("USA NFL Sunday 705: Las Vegas Raiders vs Minnesota Vikings")
            .unwrap_err();
        assert!(matches!(err, ParseError::NoTimeToken(_)));
    }

    #[test]
    fn longest_team_name_wins_over_substring() {
        let names = vec![
            "Jets".to_string(),
            "New York Jets".to_string(),
            "Buffalo Bills".to_string(),
        ];
        let p = MatchupParser::from_names(&names).unwrap();
        let m = p
            .parse("USA NFL Sunday 706: New York Jets vs Buffalo Bills @ 01:00 PM")
            .unwrap();
        assert_eq!(m.team1, "New York Jets");
    }

    fn game(home: &str, away: &str, start_day: u32, end_day: u32) -> ScheduleGame {
        ScheduleGame {
            season: "Regular Season".to_string(),
            week_name: "Week 14".to_string(),
            week_start: Utc.with_ymd_and_hms(2024, 12, start_day, 8, 0, 0).unwrap(),
            week_end: Utc.with_ymd_and_hms(2024, 12, end_day, 7, 59, 0).unwrap(),
            game_name: format!("{away} at {home}"),
            game_short: String::new(),
            game_date: Utc.with_ymd_and_hms(2024, 12, 8, 21, 25, 0).unwrap(),
            home_team: home.to_string(),
            home_venue: "Stadium".to_string(),
            away_team: away.to_string(),
        }
    }

    #[test]
    fn finds_single_in_window_game() {
        let schedule = Schedule::new(vec![
            game("Las Vegas Raiders", "Minnesota Vikings", 4, 11),
            game("New York Giants", "Philadelphia Eagles", 4, 11),
        ]);
        let now = Utc.with_ymd_and_hms(2024, 12, 8, 18, 0, 0).unwrap();
        let found = schedule
            .find_game("Minnesota Vikings", "Las Vegas Raiders", now)
            .unwrap();
        assert_eq!(found.home_team, "Las Vegas Raiders");
    }

    #[test]
    fn out_of_window_game_is_an_error() {
        let schedule = Schedule::new(vec![game("Las Vegas Raiders", "Minnesota Vikings", 4, 11)]);
        let now = Utc.with_ymd_and_hms(2024, 12, 20, 18, 0, 0).unwrap();
        assert!(matches!(
            schedule.find_game("Minnesota Vikings", "Las Vegas Raiders", now),
            Err(ScheduleError::NoGameInWindow { .. })
        ));
    }

    #[test]
    fn multiple_candidates_resolve_to_first_row() {
        let mut second = game("Las Vegas Raiders", "Minnesota Vikings", 4, 11);
        second.week_name = "Week 14 (second listing)".to_string();
        let schedule = Schedule::new(vec![
            game("Las Vegas Raiders", "Minnesota Vikings", 4, 11),
            second,
        ]);
        let now = Utc.with_ymd_and_hms(2024, 12, 8, 18, 0, 0).unwrap();
        let found = schedule
            .find_game("Las Vegas Raiders", "Minnesota Vikings", now)
            .unwrap();
        assert_eq!(found.week_name, "Week 14");
    }
}

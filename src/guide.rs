//! Guide (channel + programme) building from live sports streams.
//!
//! Each stream's display name either carries a matchup description
//! (`"...: Team A vs Team B @ 04:25 PM"`) or is a bare label. Described
//! streams are resolved against the schedule (NFL) or their own embedded
//! game time (NBA, ESPN+); bare streams get an off-air placeholder entry.
//! Streams that fail to parse or resolve are dropped and counted.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::{Tz, US::Eastern};
use tracing::warn;

use crate::schedule::{MatchupParser, Schedule};
use crate::xmltv::{format_epg_time, Channel, Program};
use crate::xtream::Stream;

pub const PLACEHOLDER_TITLE: &str = "NO GAME RIGHT NOW?";
pub const PLACEHOLDER_DESC: &str = "OFF AIR";

/// Listed game slots run three hours.
const GAME_HOURS: i64 = 3;

#[derive(Debug, Default)]
pub struct Guide {
    pub channels: Vec<Channel>,
    pub programs: Vec<Program>,
}

impl Guide {
    fn push(&mut self, channel: Channel, program: Program) {
        self.channels.push(channel);
        self.programs.push(program);
    }
}

/// Accounting for one guide build: records kept, records dropped on
/// parse/schedule failure, and off-air placeholders emitted.
#[derive(Debug, Default, PartialEq)]
pub struct GuideReport {
    pub kept: usize,
    pub dropped: usize,
    pub placeholders: usize,
}

fn channel_for(stream: &Stream, logo: &str, epg_desc: &str) -> Channel {
    Channel {
        tvg_id: stream.id(),
        tvg_name: stream.label(),
        tvg_logo: stream
            .stream_icon
            .clone()
            .filter(|icon| !icon.is_empty())
            .unwrap_or_else(|| logo.to_string()),
        epg_desc: epg_desc.to_string(),
    }
}

fn placeholder(guide: &mut Guide, stream: &Stream, logo: &str, now: &DateTime<Tz>) {
    let start = format_epg_time(now);
    let stop = format_epg_time(&(*now + Duration::hours(GAME_HOURS)));
    guide.push(
        channel_for(stream, logo, PLACEHOLDER_DESC),
        Program {
            tvg_id: stream.id(),
            epg_title: PLACEHOLDER_TITLE.to_string(),
            epg_start: start,
            epg_stop: stop,
            epg_desc: PLACEHOLDER_DESC.to_string(),
        },
    );
}

/// NFL guide: matchups are resolved against the season schedule, so the
/// programme carries the real kickoff time and venue.
pub fn nfl_guide(
    streams: &[Stream],
    parser: &MatchupParser,
    schedule: &Schedule,
    now: DateTime<Tz>,
    logo: &str,
) -> (Guide, GuideReport) {
    let mut guide = Guide::default();
    let mut report = GuideReport::default();

    for stream in streams {
        let epg_desc = stream.description();
        if epg_desc.is_empty() {
            placeholder(&mut guide, stream, logo, &now);
            report.placeholders += 1;
            continue;
        }

        let matchup = match parser.parse(&stream.name) {
            Ok(m) => m,
            Err(err) => {
                warn!(stream = %stream.name, error = %err, "dropping unparseable stream");
                report.dropped += 1;
                continue;
            }
        };

        let game = match schedule.find_game(&matchup.team1, &matchup.team2, now.with_timezone(&Utc))
        {
            Ok(g) => g,
            Err(err) => {
                warn!(stream = %stream.name, error = %err, "dropping unscheduled stream");
                report.dropped += 1;
                continue;
            }
        };

        let start = game.game_date.with_timezone(&now.timezone());
        let stop = start + Duration::hours(GAME_HOURS);
        guide.push(
            channel_for(stream, logo, &epg_desc),
            Program {
                tvg_id: stream.id(),
                epg_title: format!(
                    "{} vs {} at {}",
                    game.home_team, game.away_team, game.home_venue
                ),
                epg_start: format_epg_time(&start),
                epg_stop: format_epg_time(&stop),
                epg_desc,
            },
        );
        report.kept += 1;
    }
    (guide, report)
}

/// NBA guide: the description itself is `"<matchup> @ <clock>"`, so the
/// programme start is today's date at that clock time, read as Eastern.
pub fn nba_guide(streams: &[Stream], now: DateTime<Tz>, logo: &str) -> (Guide, GuideReport) {
    timed_guide(streams, now, logo, |desc| {
        let (title, clock) = desc.split_once('@')?;
        Some((title.trim().to_string(), clock.trim().to_string()))
    })
}

/// ESPN+ guide: description is `"<event>  <clock> et"` (double space), with
/// an optional "et" suffix on the clock.
pub fn espn_guide(streams: &[Stream], now: DateTime<Tz>, logo: &str) -> (Guide, GuideReport) {
    timed_guide(streams, now, logo, |desc| {
        let (title, clock) = desc.split_once("  ")?;
        let clock = clock
            .to_lowercase()
            .split("et")
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        Some((title.trim().to_string(), clock))
    })
}

/// Shared flow for guides whose game time is embedded in the description.
/// `split` extracts `(title, clock)`; the clock is parsed as `h:mm AM/PM`.
fn timed_guide<F>(
    streams: &[Stream],
    now: DateTime<Tz>,
    logo: &str,
    split: F,
) -> (Guide, GuideReport)
where
    F: Fn(&str) -> Option<(String, String)>,
{
    let mut guide = Guide::default();
    let mut report = GuideReport::default();

    for stream in streams {
        let epg_desc = stream.description();
        if epg_desc.is_empty() {
            placeholder(&mut guide, stream, logo, &now);
            report.placeholders += 1;
            continue;
        }

        let Some((title, clock)) = split(&epg_desc) else {
            warn!(stream = %stream.name, "dropping stream with no game time separator");
            report.dropped += 1;
            continue;
        };
        let Some(start) = game_time_today(&clock, &now) else {
            warn!(stream = %stream.name, clock = %clock, "dropping stream with bad game time");
            report.dropped += 1;
            continue;
        };

        let stop = start + Duration::hours(GAME_HOURS);
        guide.push(
            channel_for(stream, logo, &epg_desc),
            Program {
                tvg_id: stream.id(),
                epg_title: title,
                epg_start: format_epg_time(&start),
                epg_stop: format_epg_time(&stop),
                epg_desc,
            },
        );
        report.kept += 1;
    }
    (guide, report)
}

/// `"04:25 PM"` on today's Eastern date. Embedded game clocks are US/Eastern
/// wall-clock times whatever the host timezone is.
fn game_time_today(clock: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let time = NaiveTime::parse_from_str(&clock.trim().to_uppercase(), "%I:%M %p").ok()?;
    let local = now.with_timezone(&Eastern).date_naive().and_time(time);
    Eastern.from_local_datetime(&local).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::espn::ScheduleGame;
    use chrono_tz::US::Eastern;
    use serde_json::json;

    const LOGO: &str = "http://x/logo.png";

    fn stream(name: &str, id: u64) -> Stream {
        Stream {
            num: None,
            name: name.to_string(),
            stream_type: "live".to_string(),
            stream_id: json!(id),
            stream_icon: None,
            epg_channel_id: None,
            added: None,
            category_id: None,
        }
    }

    fn now_eastern() -> DateTime<Tz> {
        Eastern.with_ymd_and_hms(2024, 12, 8, 12, 0, 0).unwrap()
    }

    fn fixture_schedule() -> Schedule {
        Schedule::new(vec![ScheduleGame {
            season: "Regular Season".to_string(),
            week_name: "Week 14".to_string(),
            week_start: Utc.with_ymd_and_hms(2024, 12, 4, 8, 0, 0).unwrap(),
            week_end: Utc.with_ymd_and_hms(2024, 12, 11, 7, 59, 0).unwrap(),
            game_name: "Minnesota Vikings at Las Vegas Raiders".to_string(),
            game_short: "MIN @ LV".to_string(),
            game_date: Utc.with_ymd_and_hms(2024, 12, 8, 21, 25, 0).unwrap(),
            home_team: "Las Vegas Raiders".to_string(),
            home_venue: "Allegiant Stadium".to_string(),
            away_team: "Minnesota Vikings".to_string(),
        }])
    }

    fn fixture_parser() -> MatchupParser {
        MatchupParser::from_names(&[
            "Las Vegas Raiders".to_string(),
            "Minnesota Vikings".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn nfl_guide_resolves_scheduled_game() {
        let streams = vec![stream(
            "USA NFL Sunday 705: Las Vegas Raiders vs Minnesota Vikings @ 04:25 PM",
            705,
        )];
        let (guide, report) = nfl_guide(
            &streams,
            &fixture_parser(),
            &fixture_schedule(),
            now_eastern(),
            LOGO,
        );

        assert_eq!(report, GuideReport { kept: 1, dropped: 0, placeholders: 0 });
        assert_eq!(guide.channels[0].tvg_id, "705");
        assert_eq!(guide.channels[0].tvg_name, "USA NFL Sunday 705");
        let program = &guide.programs[0];
        assert_eq!(
            program.epg_title,
            "Las Vegas Raiders vs Minnesota Vikings at Allegiant Stadium"
        );
        // 21:25 UTC is 16:25 Eastern, and the slot runs three hours
        assert_eq!(program.epg_start, "20241208162500 -0500");
        assert_eq!(program.epg_stop, "20241208192500 -0500");
    }

    #[test]
    fn bare_stream_gets_off_air_placeholder() {
        let streams = vec![stream("USA NFL Sunday 708", 708)];
        let (guide, report) = nfl_guide(
            &streams,
            &fixture_parser(),
            &fixture_schedule(),
            now_eastern(),
            LOGO,
        );

        assert_eq!(report, GuideReport { kept: 0, dropped: 0, placeholders: 1 });
        assert_eq!(guide.programs[0].epg_title, PLACEHOLDER_TITLE);
        assert_eq!(guide.programs[0].epg_desc, PLACEHOLDER_DESC);
        assert_eq!(guide.channels[0].epg_desc, PLACEHOLDER_DESC);
        assert_eq!(guide.programs[0].epg_start, "20241208120000 -0500");
        assert_eq!(guide.programs[0].epg_stop, "20241208150000 -0500");
    }

    #[test]
    fn unresolvable_streams_are_dropped_and_counted() {
        let streams = vec![
            stream("USA NFL Sunday 706: Springfield Isotopes vs Shelbyville @ 01:00 PM", 706),
            stream(
                "USA NFL Sunday 705: Las Vegas Raiders vs Minnesota Vikings @ 04:25 PM",
                705,
            ),
        ];
        let (guide, report) = nfl_guide(
            &streams,
            &fixture_parser(),
            &fixture_schedule(),
            now_eastern(),
            LOGO,
        );

        assert_eq!(report, GuideReport { kept: 1, dropped: 1, placeholders: 0 });
        assert_eq!(guide.channels.len(), 1);
        assert_eq!(guide.channels[0].tvg_id, "705");
    }

    #[test]
    fn nba_guide_uses_embedded_clock_time() {
        let streams = vec![stream("USA NBA 01: Lakers vs Celtics @ 08:00 PM", 801)];
        let (guide, report) = nba_guide(&streams, now_eastern(), LOGO);

        assert_eq!(report.kept, 1);
        let program = &guide.programs[0];
        assert_eq!(program.epg_title, "Lakers vs Celtics");
        assert_eq!(program.epg_start, "20241208200000 -0500");
        assert_eq!(program.epg_stop, "20241208230000 -0500");
    }

    #[test]
    fn game_clocks_are_eastern_on_any_host_timezone() {
        let streams = vec![stream("USA NBA 01: Lakers vs Celtics @ 08:00 PM", 801)];

        // Same instant as now_eastern(), but carried in UTC.
        let now_utc = chrono_tz::UTC
            .with_ymd_and_hms(2024, 12, 8, 17, 0, 0)
            .unwrap();
        let (guide, report) = nba_guide(&streams, now_utc, LOGO);

        assert_eq!(report.kept, 1);
        assert_eq!(guide.programs[0].epg_start, "20241208200000 -0500");
        assert_eq!(guide.programs[0].epg_stop, "20241208230000 -0500");
    }

    #[test]
    fn nba_guide_drops_descriptions_without_a_clock() {
        let streams = vec![stream("USA NBA 02: Lakers vs Celtics", 802)];
        let (guide, report) = nba_guide(&streams, now_eastern(), LOGO);
        assert_eq!(report, GuideReport { kept: 0, dropped: 1, placeholders: 0 });
        assert!(guide.channels.is_empty());
    }

    #[test]
    fn espn_guide_splits_on_double_space_and_strips_et() {
        let streams = vec![stream("USA ESPN PLUS 150: College Hoops  7:30 pm et", 1500)];
        let (guide, report) = espn_guide(&streams, now_eastern(), LOGO);

        assert_eq!(report.kept, 1);
        assert_eq!(guide.programs[0].epg_title, "College Hoops");
        assert_eq!(guide.programs[0].epg_start, "20241208193000 -0500");
    }

    #[test]
    fn stream_icon_overrides_default_logo() {
        let mut s = stream("USA NBA 01: Lakers vs Celtics @ 08:00 PM", 801);
        s.stream_icon = Some("http://x/own.png".to_string());
        let (guide, _) = nba_guide(&[s], now_eastern(), LOGO);
        assert_eq!(guide.channels[0].tvg_logo, "http://x/own.png");

        let (guide, _) = nba_guide(
            &[stream("USA NBA 01: Lakers vs Celtics @ 08:00 PM", 801)],
            now_eastern(),
            LOGO,
        );
        assert_eq!(guide.channels[0].tvg_logo, LOGO);
    }
}

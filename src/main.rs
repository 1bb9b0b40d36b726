use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use plexarr::cache::SeasonCache;
use plexarr::config::Config;
use plexarr::espn::{EspnClient, League, ScheduleGame, Team};
use plexarr::fetch::{fetch_all, FetchOptions};
use plexarr::guide::{espn_guide, nba_guide, nfl_guide, GuideReport};
use plexarr::m3u::{
    group_playlist, render_m3u, M3uOptions, ESPN_FIRST_CUID, NBA_FIRST_CUID, NFL_FIRST_CUID,
};
use plexarr::pluto::{pluto_guide, PlutoClient};
use plexarr::schedule::{MatchupParser, Schedule};
use plexarr::transfer;
use plexarr::xmltv::{now_in, render_xmltv, Channel, Program};
use plexarr::xtream::{find_category, streams_matching, Stream, XtreamClient};

const NFL_TERMS: &[&str] = &[
    "USA NFL Thursday Night",
    "USA NFL Sunday Night",
    "USA NFL Monday Night",
    "USA NFL Sunday 7",
];
const NBA_TERMS: &[&str] = &["USA NBA 0", "USA NBA 1"];

const NFL_LOGO: &str = "http://line.lemotv.cc/images/d7a1c666d3827922b7dfb5fbb9a3b450.png";
const NBA_LOGO: &str = "http://line.lemotv.cc/images/118ae626674246e6d081a4ff16921b19.png";
const ESPN_LOGO: &str =
    "https://artwork.espncdn.com/programs/14ef54cc-6fd8-443d-80b8-365c1f64d606/16x9/large_20211213222642.jpg";

#[derive(Parser, Debug)]
#[command(version, about = "IPTV playlist and sports guide toolbox", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an XMLTV guide
    Guide {
        #[command(subcommand)]
        kind: GuideKind,
    },
    /// Generate an M3U playlist
    Playlist {
        #[command(subcommand)]
        kind: PlaylistKind,
    },
    /// Generate a full XMLTV guide from the panel's own programme tables
    Epg {
        /// Provider name from the config's [providers.*] sections
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Upload the artifact to the configured [remote] after writing
        #[arg(long)]
        upload: bool,
    },
    /// Refresh the cached ESPN team and schedule tables
    Update,
    /// Verify the config file and provider logins
    Check,
}

#[derive(Subcommand, Debug)]
enum GuideKind {
    Nfl {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        upload: bool,
    },
    Nba {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        upload: bool,
    },
    Espn {
        #[arg(short, long)]
        provider: String,
        /// Stream name filter within the ESPN category
        #[arg(short, long, default_value = "")]
        terms: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        upload: bool,
    },
    Pluto {
        /// Pluto channel name filter (e.g. "science")
        #[arg(short, long)]
        term: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        upload: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PlaylistKind {
    Nfl {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        upload: bool,
    },
    Nba {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        upload: bool,
    },
    Espn {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long, default_value = "")]
        terms: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        upload: bool,
    },
    /// Full playlist built from the provider's configured category groups
    Groups {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        upload: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::load()?;

    match args.command {
        Command::Guide { kind } => run_guide(&config, kind).await,
        Command::Playlist { kind } => run_playlist(&config, kind).await,
        Command::Epg {
            provider,
            output,
            upload,
        } => {
            let xml = panel_epg(&config, &provider).await?;
            publish(&config, &xml, output.as_deref(), upload).await
        }
        Command::Update => update_season_caches().await,
        Command::Check => check(&config).await,
    }
}

async fn run_guide(config: &Config, kind: GuideKind) -> Result<(), anyhow::Error> {
    match kind {
        GuideKind::Nfl {
            provider,
            output,
            upload,
        } => {
            let client = XtreamClient::new(config.provider(&provider)?);
            let streams = sports_streams(&client, "NFL", NFL_TERMS).await?;
            let (teams, schedule) = nfl_season_data(false).await?;
            let parser = MatchupParser::from_teams(&teams)?;
            let now = now_in(&config.user_timezone());

            let (guide, report) = nfl_guide(&streams, &parser, &schedule, now, NFL_LOGO);
            log_report("nfl", &report);
            let xml = render_xmltv(&guide.channels, &guide.programs, &client.base_url);
            publish(config, &xml, output.as_deref(), upload).await
        }
        GuideKind::Nba {
            provider,
            output,
            upload,
        } => {
            let client = XtreamClient::new(config.provider(&provider)?);
            let streams = sports_streams(&client, "NBA", NBA_TERMS).await?;
            let now = now_in(&config.user_timezone());

            let (guide, report) = nba_guide(&streams, now, NBA_LOGO);
            log_report("nba", &report);
            let xml = render_xmltv(&guide.channels, &guide.programs, &client.base_url);
            publish(config, &xml, output.as_deref(), upload).await
        }
        GuideKind::Espn {
            provider,
            terms,
            output,
            upload,
        } => {
            let client = XtreamClient::new(config.provider(&provider)?);
            let streams = sports_streams(&client, "ESPN", &[terms.as_str()]).await?;
            let now = now_in(&config.user_timezone());

            let (guide, report) = espn_guide(&streams, now, ESPN_LOGO);
            log_report("espn", &report);
            let xml = render_xmltv(&guide.channels, &guide.programs, &client.base_url);
            publish(config, &xml, output.as_deref(), upload).await
        }
        GuideKind::Pluto {
            term,
            output,
            upload,
        } => {
            let pluto = PlutoClient::new();
            let channel = pluto
                .get_channel(&term, Utc::now())
                .await?
                .ok_or_else(|| anyhow::anyhow!("no Pluto channel matching {term:?}"))?;
            let tvg_id = channel.slug.to_uppercase();
            let tvg_name = format!("Pluto: {}", channel.name);
            let (channels, programs) = pluto_guide(&channel, &tvg_id, &tvg_name);
            let xml = render_xmltv(&channels, &programs, "http://api.pluto.tv");
            publish(config, &xml, output.as_deref(), upload).await
        }
    }
}

async fn run_playlist(config: &Config, kind: PlaylistKind) -> Result<(), anyhow::Error> {
    match kind {
        PlaylistKind::Nfl {
            provider,
            output,
            upload,
        } => {
            let client = XtreamClient::new(config.provider(&provider)?);
            let streams = sports_streams(&client, "NFL", NFL_TERMS).await?;
            let options = M3uOptions {
                group: "NFL Sunday Games".to_string(),
                logo: NFL_LOGO.to_string(),
                first_cuid: NFL_FIRST_CUID,
            };
            let m3u = render_m3u(&streams, &client, &options);
            publish(config, &m3u, output.as_deref(), upload).await
        }
        PlaylistKind::Nba {
            provider,
            output,
            upload,
        } => {
            let client = XtreamClient::new(config.provider(&provider)?);
            let streams = sports_streams(&client, "NBA", NBA_TERMS).await?;
            let options = M3uOptions {
                group: "NBA Games".to_string(),
                logo: NBA_LOGO.to_string(),
                first_cuid: NBA_FIRST_CUID,
            };
            let m3u = render_m3u(&streams, &client, &options);
            publish(config, &m3u, output.as_deref(), upload).await
        }
        PlaylistKind::Espn {
            provider,
            terms,
            output,
            upload,
        } => {
            let client = XtreamClient::new(config.provider(&provider)?);
            let streams = sports_streams(&client, "ESPN", &[terms.as_str()]).await?;
            let options = M3uOptions {
                group: "ESPN+".to_string(),
                logo: ESPN_LOGO.to_string(),
                first_cuid: ESPN_FIRST_CUID,
            };
            let m3u = render_m3u(&streams, &client, &options);
            publish(config, &m3u, output.as_deref(), upload).await
        }
        PlaylistKind::Groups {
            provider,
            output,
            upload,
        } => {
            let provider_config = config.provider(&provider)?;
            let client = XtreamClient::new(provider_config);
            let (m3u, report) =
                group_playlist(&client, &provider_config.groups, &FetchOptions::default()).await?;
            if report.dropped() > 0 {
                warn!(dropped = report.dropped(), "some categories failed to load");
            }
            publish(config, &m3u, output.as_deref(), upload).await
        }
    }
}

/// Streams of one sports category, filtered to the curated name terms.
async fn sports_streams(
    client: &XtreamClient,
    category_query: &str,
    terms: &[&str],
) -> Result<Vec<Stream>, anyhow::Error> {
    let categories = client.get_live_categories().await?;
    let category = find_category(&categories, category_query)
        .ok_or_else(|| anyhow::anyhow!("no live category matching {category_query:?}"))?;
    let streams = client
        .get_live_streams(Some(&category.category_id))
        .await?;
    Ok(streams_matching(&streams, terms))
}

/// NFL team table and season schedule, from the season cache when present.
async fn nfl_season_data(refresh: bool) -> Result<(Vec<Team>, Schedule), anyhow::Error> {
    let year = League::Nfl.season_year(Utc::now().date_naive());
    let cache = SeasonCache::open();
    let slug = League::Nfl.slug();

    if refresh {
        if let Some(cache) = &cache {
            cache.invalidate(slug, "teams", year);
            cache.invalidate(slug, "schedule", year);
        }
    }

    if let Some(cache) = &cache {
        let teams: Option<Vec<Team>> = cache.load(slug, "teams", year);
        let games: Option<Vec<ScheduleGame>> = cache.load(slug, "schedule", year);
        if let (Some(teams), Some(games)) = (teams, games) {
            return Ok((teams, Schedule::new(games)));
        }
    }

    let espn = EspnClient::new();
    let teams = espn.get_teams(League::Nfl, year).await?;
    let games = espn.get_nfl_schedule(year, &teams).await?;
    info!(year, teams = teams.len(), games = games.len(), "fetched NFL season data");

    if let Some(cache) = &cache {
        cache.store(slug, "teams", year, &teams)?;
        cache.store(slug, "schedule", year, &games)?;
    }
    Ok((teams, Schedule::new(games)))
}

async fn update_season_caches() -> Result<(), anyhow::Error> {
    // Only the NFL guide reads season tables; NBA/ESPN+ programmes come
    // from the clock embedded in each stream name.
    let (teams, schedule) = nfl_season_data(true).await?;
    if schedule.is_empty() {
        warn!("refreshed NFL schedule is empty");
    }
    info!(nfl_teams = teams.len(), "season caches refreshed");
    Ok(())
}

/// Full-guide flow: one channel per stream in the configured groups, with
/// the panel's own programme table fetched per stream.
async fn panel_epg(config: &Config, provider: &str) -> Result<String, anyhow::Error> {
    let provider_config = config.provider(provider)?;
    let client = XtreamClient::new(provider_config);

    let categories = client.get_live_categories().await?;
    let wanted = plexarr::xtream::categories_in_groups(&categories, &provider_config.groups);

    let mut streams = Vec::new();
    for category in &wanted {
        streams.extend(client.get_live_streams(Some(&category.category_id)).await?);
    }

    let channels: Vec<Channel> = streams
        .iter()
        .map(|s| Channel {
            tvg_id: s.epg_channel_id.clone().unwrap_or_else(|| s.id()),
            tvg_name: s.name.clone(),
            tvg_logo: s.stream_icon.clone().unwrap_or_default(),
            epg_desc: String::new(),
        })
        .collect();

    let ids: Vec<String> = streams.iter().map(|s| s.id()).collect();
    let client_ref = &client;
    let (listings, report) = fetch_all(&ids, &FetchOptions::default(), |id| async move {
        client_ref.get_simple_data_table(&id).await
    })
    .await;
    if report.dropped() > 0 {
        warn!(dropped = report.dropped(), "programme tables missing for some streams");
    }

    let mut programs = Vec::new();
    // Listings are slot-aligned with `streams`; a failed table leaves None
    // and must not attach later tables to the wrong channel.
    for (stream, table) in streams.iter().zip(listings) {
        let Some(table) = table else { continue };
        let tvg_id = stream.epg_channel_id.clone().unwrap_or_else(|| stream.id());
        for listing in table {
            let (Ok(start), Ok(stop)) = (
                parse_panel_time(&listing.start),
                parse_panel_time(&listing.stop),
            ) else {
                continue;
            };
            programs.push(Program {
                tvg_id: tvg_id.clone(),
                epg_title: listing.decoded_title(),
                epg_start: start,
                epg_stop: stop,
                epg_desc: listing.decoded_description(),
            });
        }
    }

    Ok(render_xmltv(&channels, &programs, &client.base_url))
}

/// Panel programme timestamps are `"YYYY-MM-DD HH:MM:SS"` in UTC.
fn parse_panel_time(value: &str) -> Result<String, chrono::ParseError> {
    let naive = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")?;
    Ok(plexarr::xmltv::format_epg_time(&naive.and_utc()))
}

async fn check(config: &Config) -> Result<(), anyhow::Error> {
    println!("providers: {}", config.providers.len());
    for (name, provider_config) in &config.providers {
        let client = XtreamClient::new(provider_config);
        match client.authenticate().await {
            Ok((true, user, _)) => {
                let status = user
                    .and_then(|u| u.status)
                    .unwrap_or_else(|| "Active".to_string());
                println!("  {name}: ok ({status})");
            }
            Ok((false, _, _)) => println!("  {name}: login rejected"),
            Err(err) => println!("  {name}: unreachable ({err})"),
        }
    }
    Ok(())
}

fn log_report(league: &str, report: &GuideReport) {
    info!(
        league,
        kept = report.kept,
        dropped = report.dropped,
        placeholders = report.placeholders,
        "guide built"
    );
}

/// Write the artifact to `output` (or stdout), then optionally scp it to
/// the configured remote.
async fn publish(
    config: &Config,
    content: &str,
    output: Option<&std::path::Path>,
    upload: bool,
) -> Result<(), anyhow::Error> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            info!(file = %path.display(), bytes = content.len(), "artifact written");
            if upload {
                transfer::upload(path, config.remote()?).await?;
            }
        }
        None => {
            if upload {
                anyhow::bail!("--upload requires --output");
            }
            print!("{content}");
        }
    }
    Ok(())
}

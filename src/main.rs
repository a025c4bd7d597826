mod browser;
mod config;
mod crawl;
mod db;
mod error;
mod model;
mod parser;
mod sites;
mod walker;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use browser::chrome::ChromeSession;
use crawl::{Crawler, RunSummary};
use model::League;

#[derive(Parser)]
#[command(name = "rinkscrape", about = "NHL and CHL player stats scraper")]
struct Cli {
    /// SQLite database (overrides RINK_DATABASE and rinkscrape.toml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape season stat tables into player_seasons
    Seasons {
        /// nhl, ohl, whl or qmjhl
        #[arg(short, long)]
        league: League,
        /// First season start year (NHL default: 1917)
        #[arg(long, requires = "to")]
        from: Option<i32>,
        /// Last season start year (NHL default: 2016)
        #[arg(long, requires = "from")]
        to: Option<i32>,
        /// Max tables to fetch (default: all not yet stored)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Scrape player pages for every player seen in the league's season tables
    Players {
        #[arg(short, long)]
        league: League,
        /// Max player pages to fetch
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show what is stored
    Stats {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = config::load()?;
    if let Some(path) = cli.db {
        settings.database = path;
    }

    let conn = db::connect(&settings.database)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Seasons {
            league,
            from,
            to,
            limit,
        } => {
            let years = from.zip(to);
            let mut session = ChromeSession::launch(&settings.browser).await?;
            let run: error::Result<RunSummary> = async {
                let units = Crawler::new(&mut session, &conn, league, &settings.crawl)
                    .enumerate_seasons(years)
                    .await?;
                if units.is_empty() {
                    println!("No {} seasons to scrape.", league);
                    return Ok(RunSummary::default());
                }
                println!("{}: {} season tables listed", league, units.len());
                Crawler::new(&mut session, &conn, league, &settings.crawl)
                    .with_limit(limit)
                    .crawl_seasons(&units)
                    .await
            }
            .await;
            session.close().await?;
            let summary = run?;
            print_summary("season tables", &summary);
            Ok(())
        }
        Commands::Players { league, limit } => {
            let ids = db::fetch_player_ids(&conn, league)?;
            if ids.is_empty() {
                println!("No {} players stored. Run 'seasons' first.", league);
                return Ok(());
            }
            println!("{}: {} players known", league, ids.len());
            let mut session = ChromeSession::launch(&settings.browser).await?;
            let run = Crawler::new(&mut session, &conn, league, &settings.crawl)
                .with_limit(limit)
                .crawl_players(&ids)
                .await;
            session.close().await?;
            let summary = run?;
            print_summary("player pages", &summary);
            Ok(())
        }
        Commands::Stats { json } => {
            let s = db::get_stats(&conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&s)?);
                return Ok(());
            }
            println!("Season rows:     {}", s.season_rows);
            println!("Biographies:     {}", s.biographies);
            println!("Completed units: {}", s.completed_units);
            if !s.leagues.is_empty() {
                println!(
                    "\n{:<6} | {:>10} | {:>8} | {:>6} | {:>7}",
                    "League", "Rows", "Players", "Bios", "Seasons"
                );
                println!("{}", "-".repeat(49));
                for l in &s.leagues {
                    println!(
                        "{:<6} | {:>10} | {:>8} | {:>6} | {:>7}",
                        l.league, l.season_rows, l.players, l.biographies, l.completed_seasons
                    );
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_summary(what: &str, s: &RunSummary) {
    println!(
        "{} {}: {} stored, {} skipped, {} failed ({} rows stored, {} rows rejected)",
        s.attempted, what, s.stored, s.skipped, s.failed, s.rows_stored, s.rows_rejected
    );
    if let Some(per) = s.per_fetched_unit() {
        println!(
            "That took {} ({} per fetch)",
            format_duration(s.elapsed),
            format_duration(per)
        );
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

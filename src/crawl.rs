use std::fmt;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::browser::Session;
use crate::config::CrawlSettings;
use crate::db::{self, UnitKind};
use crate::error::{Result, ScrapeError};
use crate::model::{League, SeasonDescriptor, SeasonType};
use crate::parser::bio::{self, BioPage};
use crate::parser::season::SeasonContext;
use crate::parser::{self, TableRecords};
use crate::sites::{self, BioLayout, Site};
use crate::walker::{self, WalkOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Fetched,
    Validated,
    Stored,
    Skipped,
    Failed,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::Pending => "pending",
            UnitState::Fetched => "fetched",
            UnitState::Validated => "validated",
            UnitState::Stored => "stored",
            UnitState::Skipped => "skipped",
            UnitState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One season table of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonUnit {
    pub descriptor: SeasonDescriptor,
    pub season_type: SeasonType,
}

impl fmt::Display for SeasonUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.descriptor.name, self.season_type)
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub attempted: usize,
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows_stored: usize,
    pub rows_rejected: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Units that went out to the site.
    pub fn fetched(&self) -> usize {
        self.stored + self.failed
    }

    pub fn per_fetched_unit(&self) -> Option<Duration> {
        match self.fetched() {
            0 => None,
            n => Some(self.elapsed / n as u32),
        }
    }

    fn record(&mut self, state: UnitState) {
        self.attempted += 1;
        match state {
            UnitState::Stored => self.stored += 1,
            UnitState::Skipped => self.skipped += 1,
            UnitState::Failed => self.failed += 1,
            UnitState::Pending | UnitState::Fetched | UnitState::Validated => {}
        }
    }
}

/// Rows a finished unit produced.
struct Stored {
    rows: usize,
    rejected: usize,
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Drives units of work (one season table, or one player page) from
/// enumeration to storage.
pub struct Crawler<'a, S: Session> {
    session: &'a mut S,
    conn: &'a Connection,
    site: Site,
    settings: &'a CrawlSettings,
    limit: Option<usize>,
    fetched: usize,
}

impl<'a, S: Session> Crawler<'a, S> {
    pub fn new(
        session: &'a mut S,
        conn: &'a Connection,
        league: League,
        settings: &'a CrawlSettings,
    ) -> Self {
        Self {
            session,
            conn,
            site: Site::for_league(league),
            settings,
            limit: None,
            fetched: 0,
        }
    }

    /// Stop after this many units have been fetched. Skipped units don't count.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    fn league(&self) -> League {
        self.site.league
    }

    fn exhausted(&self) -> bool {
        self.limit.is_some_and(|n| self.fetched >= n)
    }

    /// Randomized gap between fetches. The first fetch of a run goes out
    /// immediately.
    async fn pause(&mut self) {
        if self.fetched > 0 {
            let lo = self.settings.pause_min_ms.min(self.settings.pause_max_ms);
            let hi = self.settings.pause_min_ms.max(self.settings.pause_max_ms);
            let ms = rand::thread_rng().gen_range(lo..=hi);
            self.session.sleep(Duration::from_millis(ms)).await;
        }
        self.fetched += 1;
    }

    // ── Enumeration ──

    /// Season units for the league. Year-addressed sites get both types for
    /// every year in `years` (inclusive); selector sites list their own
    /// seasons, optionally narrowed to names whose first year is in range.
    pub async fn enumerate_seasons(&mut self, years: Option<(i32, i32)>) -> Result<Vec<SeasonUnit>> {
        let Some(selector) = self.site.seasons else {
            let (from, to) = years.unwrap_or(DEFAULT_NHL_YEARS);
            return Ok(sites::year_range_seasons(from, to)
                .into_iter()
                .flat_map(|d| {
                    SeasonType::BOTH.map(|season_type| SeasonUnit {
                        descriptor: d.clone(),
                        season_type,
                    })
                })
                .collect());
        };

        let url = self.site.season_index_url();
        self.session.navigate(&url).await?;
        let menu = self
            .session
            .find(selector.menu)
            .await?
            .ok_or_else(|| ScrapeError::Transport(format!("no season selector at {url}")))?;
        let options = self.session.find_all_in(&menu, selector.options).await?;

        let mut units = Vec::new();
        for option in &options {
            let name = self.session.text(option).await?.trim().to_string();
            let Some(season_type) = SeasonType::from_season_name(&name) else {
                debug!("not a season unit: {:?}", name);
                continue;
            };
            if let (Some((from, to)), Some(year)) = (years, first_year(&name)) {
                if year < from || year > to {
                    continue;
                }
            }
            let reactid = self.session.attribute(option, selector.locator_attr).await?;
            let Some(locator) = reactid.as_deref().and_then(sites::locator_from_reactid) else {
                warn!("season {:?} has no locator", name);
                continue;
            };
            units.push(SeasonUnit {
                descriptor: SeasonDescriptor { name, locator },
                season_type,
            });
        }
        info!("{}: {} season units listed", self.league(), units.len());
        Ok(units)
    }

    // ── Seasons ──

    pub async fn crawl_seasons(mut self, units: &[SeasonUnit]) -> Result<RunSummary> {
        let t0 = Instant::now();
        let mut summary = RunSummary::default();
        let pb = progress_bar(units.len());

        for unit in units {
            if self.exhausted() {
                info!("limit reached after {} fetches", self.fetched);
                break;
            }
            pb.set_message(unit.to_string());
            let state = match self.season_unit(unit).await {
                Ok(None) => {
                    debug!("{} {}: already stored", self.league(), unit);
                    UnitState::Skipped
                }
                Ok(Some(stored)) => {
                    info!(
                        "{} {}: {} rows stored, {} rejected",
                        self.league(),
                        unit,
                        stored.rows,
                        stored.rejected
                    );
                    summary.rows_stored += stored.rows;
                    summary.rows_rejected += stored.rejected;
                    UnitState::Stored
                }
                Err(e) if e.is_fatal() => {
                    pb.abandon();
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} {}: {}", self.league(), unit, e);
                    UnitState::Failed
                }
            };
            summary.record(state);
            pb.inc(1);
        }

        pb.finish_and_clear();
        summary.elapsed = t0.elapsed();
        Ok(summary)
    }

    /// `None` when the unit was already complete and nothing was fetched.
    async fn season_unit(&mut self, unit: &SeasonUnit) -> Result<Option<Stored>> {
        let league = self.league();
        let label = &unit.descriptor.name;
        let key = db::season_key(label, unit.season_type);
        debug!("{} {}: {}", league, unit, UnitState::Pending);
        if db::unit_completed(self.conn, league, UnitKind::Season, &key)? {
            return Ok(None);
        }

        self.pause().await;
        let url = self.site.season_url(&unit.descriptor, unit.season_type);
        self.session.navigate(&url).await?;
        let table = walker::walk(self.session, &self.site.table, WalkOptions::from(self.settings)).await?;
        debug!("{} {}: {}, {} rows", league, unit, UnitState::Fetched, table.rows.len());

        let ctx = SeasonContext {
            league,
            season: label.clone(),
            season_type: unit.season_type,
        };
        let TableRecords { records, rejected } = parser::parse_table(&ctx, &table.headers, &table.rows)?;
        debug!("{} {}: {}, {} records", league, unit, UnitState::Validated, records.len());

        let rows = db::save_season_unit(self.conn, league, label, unit.season_type, &records)?;
        Ok(Some(Stored { rows, rejected }))
    }

    // ── Players ──

    pub async fn crawl_players(mut self, player_ids: &[String]) -> Result<RunSummary> {
        let t0 = Instant::now();
        let mut summary = RunSummary::default();
        let pb = progress_bar(player_ids.len());

        for id in player_ids {
            if self.exhausted() {
                info!("limit reached after {} fetches", self.fetched);
                break;
            }
            pb.set_message(id.clone());
            let state = match self.player_unit(id).await {
                Ok(None) => UnitState::Skipped,
                Ok(Some(stored)) => {
                    summary.rows_stored += stored.rows;
                    UnitState::Stored
                }
                Err(e) if e.is_fatal() => {
                    pb.abandon();
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} player {}: {}", self.league(), id, e);
                    UnitState::Failed
                }
            };
            summary.record(state);
            pb.inc(1);
        }

        pb.finish_and_clear();
        summary.elapsed = t0.elapsed();
        Ok(summary)
    }

    async fn player_unit(&mut self, player_id: &str) -> Result<Option<Stored>> {
        let league = self.league();
        if db::unit_completed(self.conn, league, UnitKind::Player, player_id)? {
            return Ok(None);
        }

        self.pause().await;
        let url = self.site.player_url(player_id);
        self.session.navigate(&url).await?;
        let page = read_bio_page(self.session, &self.site.bio).await?;
        if page.name.is_none() && page.items.is_empty() {
            return Err(ScrapeError::Transport(format!("no player profile at {url}")));
        }

        let biography = bio::build(league, player_id, &page)?;
        let written = db::save_biography(self.conn, &biography)?;
        info!(
            "{} player {}: {}",
            league,
            player_id,
            biography.name.as_deref().unwrap_or("(unnamed)")
        );
        Ok(Some(Stored {
            rows: usize::from(written),
            rejected: 0,
        }))
    }
}

/// Seasons covered when no year range is given.
pub const DEFAULT_NHL_YEARS: (i32, i32) = (1917, 2016);

/// `2016-17 Regular Season` → 2016.
fn first_year(name: &str) -> Option<i32> {
    name.split(|c: char| !c.is_ascii_digit())
        .find(|tok| tok.len() == 4)
        .and_then(|tok| tok.parse().ok())
}

async fn read_bio_page<S: Session>(session: &mut S, layout: &BioLayout) -> Result<BioPage> {
    match *layout {
        BioLayout::Vitals {
            headline,
            vitals,
            items,
        } => {
            let (name, number) = match session.text_of(headline).await? {
                Some(h) => bio::split_headline(&h),
                None => (None, None),
            };
            Ok(BioPage {
                name,
                number,
                position: None,
                vitals: session.texts_of(vitals).await?,
                items: session.texts_of(items).await?,
            })
        }
        BioLayout::Profile {
            name,
            number,
            position,
            items,
        } => Ok(BioPage {
            name: session.text_of(name).await?,
            number: session.text_of(number).await?,
            position: session.text_of(position).await?,
            vitals: Vec::new(),
            items: session.texts_of(items).await?,
        }),
    }
}

use std::path::Path;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::Result;
use crate::model::{Draft, League, PlayerBiography, PlayerSeasonStatistic, SeasonType};

/// Assumes a single writer per database file. The skip checks in the crawl
/// read before they write and are not guarded against a second process.
pub fn connect(path: &Path) -> anyhow::Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS player_seasons (
            league                 TEXT NOT NULL,
            player_id              TEXT NOT NULL,
            season                 TEXT NOT NULL,
            season_type            INTEGER NOT NULL CHECK(season_type IN (2, 3)),
            name                   TEXT,
            team                   TEXT,
            position               TEXT,
            active                 BOOLEAN NOT NULL DEFAULT 0,
            rookie                 BOOLEAN NOT NULL DEFAULT 0,
            games_played           INTEGER,
            goals                  INTEGER,
            assists                INTEGER,
            points                 INTEGER,
            plus_minus             INTEGER,
            penalty_minutes        INTEGER,
            points_per_game        REAL,
            power_play_goals       INTEGER,
            power_play_assists     INTEGER,
            power_play_points      INTEGER,
            short_handed_goals     INTEGER,
            short_handed_assists   INTEGER,
            short_handed_points    INTEGER,
            game_winning_goals     INTEGER,
            overtime_goals         INTEGER,
            first_goals            INTEGER,
            insurance_goals        INTEGER,
            shots                  INTEGER,
            shooting_pct           REAL,
            toi_per_game_secs      INTEGER,
            shifts_per_game        REAL,
            faceoff_attempts       INTEGER,
            faceoff_wins           INTEGER,
            faceoff_pct            REAL,
            shootout_games_played  INTEGER,
            shootout_goals         INTEGER,
            shootout_attempts      INTEGER,
            shootout_winning_goals INTEGER,
            shootout_pct           REAL,
            penalty_minutes_per_game REAL,
            scraped_at             TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (league, player_id, season, season_type)
        );
        CREATE INDEX IF NOT EXISTS idx_seasons_player ON player_seasons(league, player_id);

        CREATE TABLE IF NOT EXISTS player_bios (
            league              TEXT NOT NULL,
            player_id           TEXT NOT NULL,
            name                TEXT,
            number              INTEGER,
            position            TEXT,
            height_cm           REAL,
            weight_kg           REAL,
            birth_date          TEXT,
            birth_city          TEXT,
            birth_region        TEXT,
            birth_country       TEXT,
            shoots              TEXT,
            nhl_draft_year      INTEGER,
            nhl_draft_team      TEXT,
            nhl_draft_round     INTEGER,
            nhl_draft_overall   INTEGER,
            league_draft_league TEXT,
            league_draft_year   INTEGER,
            league_draft_team   TEXT,
            league_draft_round  INTEGER,
            league_draft_overall INTEGER,
            scraped_at          TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (league, player_id)
        );

        -- One row per finished unit of work, including units with no rows.
        CREATE TABLE IF NOT EXISTS crawl_units (
            league       TEXT NOT NULL,
            kind         TEXT NOT NULL CHECK(kind IN ('season','player')),
            key          TEXT NOT NULL,
            rows         INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (league, kind, key)
        );
        ",
    )?;
    Ok(())
}

// ── Ledger ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Season,
    Player,
}

impl UnitKind {
    fn as_str(self) -> &'static str {
        match self {
            UnitKind::Season => "season",
            UnitKind::Player => "player",
        }
    }
}

/// Ledger key of a season unit: `20162017:2`.
pub fn season_key(label: &str, season_type: SeasonType) -> String {
    format!("{}:{}", label, season_type.code())
}

pub fn unit_completed(conn: &Connection, league: League, kind: UnitKind, key: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM crawl_units WHERE league = ?1 AND kind = ?2 AND key = ?3",
            params![league.tag(), kind.as_str(), key],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn mark_completed(
    conn: &Connection,
    league: League,
    kind: UnitKind,
    key: &str,
    rows: usize,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO crawl_units (league, kind, key, rows) VALUES (?1, ?2, ?3, ?4)",
        params![league.tag(), kind.as_str(), key, rows as i64],
    )?;
    Ok(())
}

// ── Seasons ──

/// Store one season unit's records and its ledger row in one transaction.
/// Returns the number of rows newly inserted; existing identities are left
/// untouched.
pub fn save_season_unit(
    conn: &Connection,
    league: League,
    label: &str,
    season_type: SeasonType,
    records: &[PlayerSeasonStatistic],
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO player_seasons
             (league, player_id, season, season_type, name, team, position, active, rookie,
              games_played, goals, assists, points, plus_minus, penalty_minutes, points_per_game,
              power_play_goals, power_play_assists, power_play_points,
              short_handed_goals, short_handed_assists, short_handed_points,
              game_winning_goals, overtime_goals, first_goals, insurance_goals,
              shots, shooting_pct, toi_per_game_secs, shifts_per_game,
              faceoff_attempts, faceoff_wins, faceoff_pct,
              shootout_games_played, shootout_goals, shootout_attempts,
              shootout_winning_goals, shootout_pct, penalty_minutes_per_game)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,
                     ?21,?22,?23,?24,?25,?26,?27,?28,?29,?30,?31,?32,?33,?34,?35,?36,?37,?38,?39)",
        )?;
        for r in records {
            let s = &r.stats;
            count += stmt.execute(params![
                r.league.tag(), r.player_id, r.season, r.season_type.code(),
                r.name, r.team, r.position, r.active, r.rookie,
                s.games_played, s.goals, s.assists, s.points, s.plus_minus,
                s.penalty_minutes, s.points_per_game,
                s.power_play_goals, s.power_play_assists, s.power_play_points,
                s.short_handed_goals, s.short_handed_assists, s.short_handed_points,
                s.game_winning_goals, s.overtime_goals, s.first_goals, s.insurance_goals,
                s.shots, s.shooting_pct, s.toi_per_game_secs, s.shifts_per_game,
                s.faceoff_attempts, s.faceoff_wins, s.faceoff_pct,
                s.shootout_games_played, s.shootout_goals, s.shootout_attempts,
                s.shootout_winning_goals, s.shootout_pct, s.penalty_minutes_per_game,
            ])?;
        }
    }
    mark_completed(&tx, league, UnitKind::Season, &season_key(label, season_type), count)?;
    tx.commit()?;
    Ok(count)
}

/// Every player id seen in the league's season rows, in stable order.
pub fn fetch_player_ids(conn: &Connection, league: League) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT player_id FROM player_seasons WHERE league = ?1 ORDER BY player_id",
    )?;
    let rows = stmt
        .query_map([league.tag()], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(rows)
}

// ── Biographies ──

fn draft_columns(d: Option<&Draft>) -> (Option<i64>, Option<String>, Option<i64>, Option<i64>) {
    match d {
        Some(d) => (d.year, d.team.clone(), d.round, d.overall),
        None => (None, None, None, None),
    }
}

/// Returns whether a new biography row was written.
pub fn save_biography(conn: &Connection, bio: &PlayerBiography) -> Result<bool> {
    let (ny, nt, nr, no) = draft_columns(bio.nhl_draft.as_ref());
    let (ly, lt, lr, lo) = draft_columns(bio.league_draft.as_ref());
    let league_draft_league = bio.league_draft.as_ref().map(|d| d.kind.to_string());

    let tx = conn.unchecked_transaction()?;
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO player_bios
         (league, player_id, name, number, position, height_cm, weight_kg, birth_date,
          birth_city, birth_region, birth_country, shoots,
          nhl_draft_year, nhl_draft_team, nhl_draft_round, nhl_draft_overall,
          league_draft_league, league_draft_year, league_draft_team,
          league_draft_round, league_draft_overall)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21)",
        params![
            bio.league.tag(), bio.player_id, bio.name, bio.number, bio.position,
            bio.height_cm, bio.weight_kg, bio.birth_date.map(|d| d.to_string()),
            bio.birthplace.city, bio.birthplace.region, bio.birthplace.country, bio.shoots,
            ny, nt, nr, no,
            league_draft_league, ly, lt, lr, lo,
        ],
    )?;
    mark_completed(&tx, bio.league, UnitKind::Player, &bio.player_id, inserted)?;
    tx.commit()?;
    Ok(inserted > 0)
}

// ── Stats ──

#[derive(Debug, Serialize)]
pub struct LeagueCounts {
    pub league: String,
    pub season_rows: usize,
    pub players: usize,
    pub biographies: usize,
    pub completed_seasons: usize,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub season_rows: usize,
    pub biographies: usize,
    pub completed_units: usize,
    pub leagues: Vec<LeagueCounts>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let season_rows: usize =
        conn.query_row("SELECT COUNT(*) FROM player_seasons", [], |r| r.get(0))?;
    let biographies: usize = conn.query_row("SELECT COUNT(*) FROM player_bios", [], |r| r.get(0))?;
    let completed_units: usize =
        conn.query_row("SELECT COUNT(*) FROM crawl_units", [], |r| r.get(0))?;

    let mut leagues = Vec::new();
    for league in League::ALL {
        let tag = league.tag();
        let (season_rows, players): (usize, usize) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT player_id) FROM player_seasons WHERE league = ?1",
            [tag],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        let biographies: usize = conn.query_row(
            "SELECT COUNT(*) FROM player_bios WHERE league = ?1",
            [tag],
            |r| r.get(0),
        )?;
        let completed_seasons: usize = conn.query_row(
            "SELECT COUNT(*) FROM crawl_units WHERE league = ?1 AND kind = 'season'",
            [tag],
            |r| r.get(0),
        )?;
        if season_rows + biographies + completed_seasons == 0 {
            continue;
        }
        leagues.push(LeagueCounts {
            league: tag.to_string(),
            season_rows,
            players,
            biographies,
            completed_seasons,
        });
    }

    Ok(Stats {
        season_rows,
        biographies,
        completed_units,
        leagues,
    })
}

#[cfg(test)]
pub(crate) fn open_in_memory() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::model::{Birthplace, DraftKind, SeasonStats};

    fn record(id: &str, goals: Option<i64>) -> PlayerSeasonStatistic {
        PlayerSeasonStatistic {
            league: League::Nhl,
            player_id: id.into(),
            season: "20162017".into(),
            season_type: SeasonType::Regular,
            name: Some("Sidney Crosby".into()),
            team: Some("PIT".into()),
            position: Some("C".into()),
            active: false,
            rookie: false,
            stats: SeasonStats {
                games_played: Some(75),
                goals,
                points_per_game: Some(1.19),
                ..Default::default()
            },
        }
    }

    #[test]
    fn season_unit_is_idempotent() {
        let conn = open_in_memory();
        let rows = vec![record("8471675", Some(44)), record("8478402", None)];

        let key = season_key("20162017", SeasonType::Regular);
        assert!(!unit_completed(&conn, League::Nhl, UnitKind::Season, &key).unwrap());

        let n = save_season_unit(&conn, League::Nhl, "20162017", SeasonType::Regular, &rows).unwrap();
        assert_eq!(n, 2);
        assert!(unit_completed(&conn, League::Nhl, UnitKind::Season, &key).unwrap());

        let n = save_season_unit(&conn, League::Nhl, "20162017", SeasonType::Regular, &rows).unwrap();
        assert_eq!(n, 0);
        assert_eq!(get_stats(&conn).unwrap().season_rows, 2);
    }

    #[test]
    fn missing_stats_stay_null() {
        let conn = open_in_memory();
        save_season_unit(&conn, League::Nhl, "20162017", SeasonType::Regular, &[record("1", None)])
            .unwrap();
        let (goals, ppg): (Option<i64>, Option<f64>) = conn
            .query_row(
                "SELECT goals, points_per_game FROM player_seasons WHERE player_id = '1'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(goals, None);
        assert_eq!(ppg, Some(1.19));
    }

    #[test]
    fn empty_unit_is_still_completed() {
        let conn = open_in_memory();
        save_season_unit(&conn, League::Ohl, "2019 Playoffs", SeasonType::Playoff, &[]).unwrap();
        let key = season_key("2019 Playoffs", SeasonType::Playoff);
        assert!(unit_completed(&conn, League::Ohl, UnitKind::Season, &key).unwrap());
        assert!(!unit_completed(&conn, League::Whl, UnitKind::Season, &key).unwrap());
    }

    #[test]
    fn failed_ledger_write_rolls_back_season_rows() {
        let conn = open_in_memory();
        let mut earlier = record("1", Some(10));
        earlier.season = "20152016".into();
        save_season_unit(&conn, League::Nhl, "20152016", SeasonType::Regular, &[earlier]).unwrap();

        // Rows go in first; the ledger write at the end of the unit fails.
        conn.execute_batch("ALTER TABLE crawl_units RENAME TO crawl_units_off").unwrap();
        let rows = vec![record("1", Some(44)), record("2", Some(30))];
        let err = save_season_unit(&conn, League::Nhl, "20162017", SeasonType::Regular, &rows)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Store(_)));
        conn.execute_batch("ALTER TABLE crawl_units_off RENAME TO crawl_units").unwrap();

        let count = |season: &str| -> i64 {
            conn.query_row(
                "SELECT COUNT(*) FROM player_seasons WHERE season = ?1",
                [season],
                |r| r.get(0),
            )
            .unwrap()
        };
        assert_eq!(count("20162017"), 0);
        assert_eq!(count("20152016"), 1);
        let key = |label| season_key(label, SeasonType::Regular);
        assert!(!unit_completed(&conn, League::Nhl, UnitKind::Season, &key("20162017")).unwrap());
        assert!(unit_completed(&conn, League::Nhl, UnitKind::Season, &key("20152016")).unwrap());
    }

    #[test]
    fn player_ids_are_distinct_per_league() {
        let conn = open_in_memory();
        let mut playoff = record("8471675", Some(8));
        playoff.season_type = SeasonType::Playoff;
        save_season_unit(&conn, League::Nhl, "20162017", SeasonType::Regular, &[record("8471675", Some(44))])
            .unwrap();
        save_season_unit(&conn, League::Nhl, "20162017", SeasonType::Playoff, &[playoff]).unwrap();

        assert_eq!(fetch_player_ids(&conn, League::Nhl).unwrap(), ["8471675"]);
        assert!(fetch_player_ids(&conn, League::Ohl).unwrap().is_empty());
    }

    #[test]
    fn biography_round_trip_through_ledger() {
        let conn = open_in_memory();
        let bio = PlayerBiography {
            league: League::Ohl,
            player_id: "1906".into(),
            name: Some("Connor McDavid".into()),
            number: Some(97),
            position: Some("C".into()),
            height_cm: Some(185.42),
            weight_kg: None,
            birth_date: chrono::NaiveDate::from_ymd_opt(1997, 1, 13),
            birthplace: Birthplace {
                city: Some("Richmond Hill".into()),
                region: Some("ON".into()),
                country: None,
            },
            shoots: Some("L".into()),
            nhl_draft: None,
            league_draft: Some(Draft {
                kind: DraftKind::League("OHL".into()),
                year: Some(2012),
                team: Some("Erie Otters".into()),
                round: Some(1),
                overall: Some(1),
            }),
        };

        assert!(save_biography(&conn, &bio).unwrap());
        assert!(!save_biography(&conn, &bio).unwrap());
        assert!(unit_completed(&conn, League::Ohl, UnitKind::Player, "1906").unwrap());

        let (born, draft_league): (String, String) = conn
            .query_row(
                "SELECT birth_date, league_draft_league FROM player_bios WHERE player_id = '1906'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(born, "1997-01-13");
        assert_eq!(draft_league, "OHL");

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.biographies, 1);
        assert_eq!(stats.leagues.len(), 1);
        assert_eq!(stats.leagues[0].league, "OHL");
    }
}

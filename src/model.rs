use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum League {
    Nhl,
    Ohl,
    Whl,
    Qmjhl,
}

impl League {
    pub const ALL: [League; 4] = [League::Nhl, League::Ohl, League::Whl, League::Qmjhl];

    pub fn tag(self) -> &'static str {
        match self {
            League::Nhl => "NHL",
            League::Ohl => "OHL",
            League::Whl => "WHL",
            League::Qmjhl => "QMJHL",
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for League {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        League::ALL
            .into_iter()
            .find(|l| l.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown league {:?} (expected nhl, ohl, whl or qmjhl)", s))
    }
}

/// Regular season or playoffs. Stored as the NHL `gameType` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SeasonType {
    Regular,
    Playoff,
}

impl SeasonType {
    pub const BOTH: [SeasonType; 2] = [SeasonType::Regular, SeasonType::Playoff];

    pub fn code(self) -> i64 {
        match self {
            SeasonType::Regular => 2,
            SeasonType::Playoff => 3,
        }
    }

    /// Classify a season selector entry such as "2016-17 Regular Season".
    /// Pre-season, all-star and showcase entries are not units of work.
    pub fn from_season_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("playoff") {
            Some(SeasonType::Playoff)
        } else if lower.contains("regular") {
            Some(SeasonType::Regular)
        } else {
            None
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonType::Regular => f.write_str("regular"),
            SeasonType::Playoff => f.write_str("playoff"),
        }
    }
}

/// One entry of a site's season selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonDescriptor {
    pub name: String,
    pub locator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Birthplace {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DraftKind {
    Nhl,
    League(String),
}

impl fmt::Display for DraftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftKind::Nhl => f.write_str("NHL"),
            DraftKind::League(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Draft {
    pub kind: DraftKind,
    pub year: Option<i64>,
    pub team: Option<String>,
    pub round: Option<i64>,
    pub overall: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerBiography {
    pub league: League,
    pub player_id: String,
    pub name: Option<String>,
    pub number: Option<i64>,
    pub position: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub birth_date: Option<NaiveDate>,
    pub birthplace: Birthplace,
    pub shoots: Option<String>,
    pub nhl_draft: Option<Draft>,
    pub league_draft: Option<Draft>,
}

/// Counting and rate statistics for one player-season. `None` means the
/// source table did not publish the column, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonStats {
    pub games_played: Option<i64>,
    pub goals: Option<i64>,
    pub assists: Option<i64>,
    pub points: Option<i64>,
    pub plus_minus: Option<i64>,
    pub penalty_minutes: Option<i64>,
    pub points_per_game: Option<f64>,
    pub power_play_goals: Option<i64>,
    pub power_play_assists: Option<i64>,
    pub power_play_points: Option<i64>,
    pub short_handed_goals: Option<i64>,
    pub short_handed_assists: Option<i64>,
    pub short_handed_points: Option<i64>,
    pub game_winning_goals: Option<i64>,
    pub overtime_goals: Option<i64>,
    pub first_goals: Option<i64>,
    pub insurance_goals: Option<i64>,
    pub shots: Option<i64>,
    pub shooting_pct: Option<f64>,
    pub toi_per_game_secs: Option<i64>,
    pub shifts_per_game: Option<f64>,
    pub faceoff_attempts: Option<i64>,
    pub faceoff_wins: Option<i64>,
    pub faceoff_pct: Option<f64>,
    pub shootout_games_played: Option<i64>,
    pub shootout_goals: Option<i64>,
    pub shootout_attempts: Option<i64>,
    pub shootout_winning_goals: Option<i64>,
    pub shootout_pct: Option<f64>,
    pub penalty_minutes_per_game: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSeasonStatistic {
    pub league: League,
    pub player_id: String,
    pub season: String,
    pub season_type: SeasonType,
    pub name: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub active: bool,
    pub rookie: bool,
    pub stats: SeasonStats,
}

use crate::error::{Result, ScrapeError};
use crate::model::{League, PlayerSeasonStatistic, SeasonStats, SeasonType};

use super::coerce;
use super::schema::{Field, MappedRow};

/// Row-independent context for one stats table.
#[derive(Debug, Clone)]
pub struct SeasonContext {
    pub league: League,
    pub season: String,
    pub season_type: SeasonType,
}

/// Build one player-season from a mapped row. `row` is the data-row index,
/// used only for reporting.
pub fn build(ctx: &SeasonContext, row: usize, cells: &MappedRow) -> Result<PlayerSeasonStatistic> {
    let name = coerce::display_name(cells.text(Field::Name));
    let player_id = cells
        .link(Field::Name)
        .and_then(coerce::trailing_segment)
        .ok_or_else(|| ScrapeError::MissingIdentity {
            row,
            name: name.clone(),
        })?;

    let int = |f: Field| coerce::int(cells.text(f));
    let float = |f: Field| coerce::float(cells.text(f));

    let stats = SeasonStats {
        games_played: int(Field::GamesPlayed),
        goals: int(Field::Goals),
        assists: int(Field::Assists),
        points: int(Field::Points),
        plus_minus: int(Field::PlusMinus),
        penalty_minutes: int(Field::PenaltyMinutes),
        points_per_game: float(Field::PointsPerGame),
        power_play_goals: int(Field::PowerPlayGoals),
        power_play_assists: int(Field::PowerPlayAssists),
        power_play_points: int(Field::PowerPlayPoints),
        short_handed_goals: int(Field::ShortHandedGoals),
        short_handed_assists: int(Field::ShortHandedAssists),
        short_handed_points: int(Field::ShortHandedPoints),
        game_winning_goals: int(Field::GameWinningGoals),
        overtime_goals: int(Field::OvertimeGoals),
        first_goals: int(Field::FirstGoals),
        insurance_goals: int(Field::InsuranceGoals),
        shots: int(Field::Shots),
        shooting_pct: float(Field::ShootingPct),
        toi_per_game_secs: coerce::clock_seconds(cells.text(Field::TimeOnIcePerGame)),
        shifts_per_game: float(Field::ShiftsPerGame),
        faceoff_attempts: int(Field::FaceoffAttempts),
        faceoff_wins: int(Field::FaceoffWins),
        faceoff_pct: float(Field::FaceoffPct),
        shootout_games_played: int(Field::ShootoutGamesPlayed),
        shootout_goals: int(Field::ShootoutGoals),
        shootout_attempts: int(Field::ShootoutAttempts),
        shootout_winning_goals: int(Field::ShootoutWinningGoals),
        shootout_pct: float(Field::ShootoutPct),
        penalty_minutes_per_game: float(Field::PenaltyMinutesPerGame),
    };

    Ok(PlayerSeasonStatistic {
        league: ctx.league,
        player_id,
        season: ctx.season.clone(),
        season_type: ctx.season_type,
        name,
        team: coerce::text(cells.text(Field::Team)),
        position: coerce::text(cells.text(Field::Position)),
        active: coerce::flag(cells.text(Field::Active)),
        rookie: coerce::flag(cells.text(Field::Rookie)),
        stats,
    })
}

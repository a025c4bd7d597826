pub mod bio;
pub mod coerce;
pub mod schema;
pub mod season;

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Result, ScrapeError};
use crate::model::PlayerSeasonStatistic;
use schema::{Field, RawCell, Schema};
use season::SeasonContext;

/// Records built from one stats table plus the rows that had to be dropped.
#[derive(Debug, Default)]
pub struct TableRecords {
    pub records: Vec<PlayerSeasonStatistic>,
    pub rejected: usize,
}

/// Two-step pipeline: headers → schema, then each row → record.
///
/// A header the schema does not know fails the whole table. A row without a
/// player link is dropped and counted; the rest of the table still builds.
/// So is a second row for a player already seen in the table, since the
/// store keys a season on the player and would keep only one of them.
pub fn parse_table(
    ctx: &SeasonContext,
    headers: &[String],
    rows: &[Vec<RawCell>],
) -> Result<TableRecords> {
    let schema = Schema::from_headers(headers)?;
    if !schema.has(Field::Name) && !rows.is_empty() {
        warn!("{} {}: no player column, every row will be rejected", ctx.league, ctx.season);
    }
    let mut out = TableRecords::default();
    let mut seen: HashMap<String, Option<String>> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        if row.len() != schema.width() {
            warn!(
                "row {} has {} cells for {} headers",
                i,
                row.len(),
                schema.width()
            );
        }
        match season::build(ctx, i, &schema.map_row(row)) {
            Ok(rec) => {
                if let Some(first) = seen.get(&rec.player_id) {
                    warn!(
                        "{} {}: player {} listed twice ({:?} and {:?}), keeping the first",
                        ctx.league, ctx.season, rec.player_id, first, rec.team
                    );
                    out.rejected += 1;
                    continue;
                }
                seen.insert(rec.player_id.clone(), rec.team.clone());
                out.records.push(rec);
            }
            Err(e @ ScrapeError::MissingIdentity { .. }) => {
                warn!("{} {}: {}", ctx.league, ctx.season, e);
                out.rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(out)
}

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Non-data columns: recognized so they do not trip the mismatch check.
    Rank,
    Blank,
    Season,
    Jersey,

    Name,
    Team,
    Position,
    Active,
    Rookie,

    GamesPlayed,
    Goals,
    Assists,
    Points,
    PlusMinus,
    PenaltyMinutes,
    PointsPerGame,
    PowerPlayGoals,
    PowerPlayAssists,
    PowerPlayPoints,
    ShortHandedGoals,
    ShortHandedAssists,
    ShortHandedPoints,
    GameWinningGoals,
    OvertimeGoals,
    FirstGoals,
    InsuranceGoals,
    Shots,
    ShootingPct,
    TimeOnIcePerGame,
    ShiftsPerGame,
    FaceoffAttempts,
    FaceoffWins,
    FaceoffPct,
    ShootoutGamesPlayed,
    ShootoutGoals,
    ShootoutAttempts,
    ShootoutWinningGoals,
    ShootoutPct,
    PenaltyMinutesPerGame,
}

impl Field {
    /// Columns that carry nothing the record keeps.
    pub fn is_ignored(self) -> bool {
        matches!(self, Field::Rank | Field::Blank | Field::Season | Field::Jersey)
    }
}

/// Canonical field → every header label the leagues print for it.
pub const HEADER_LABELS: &[(Field, &[&str])] = &[
    (Field::Rank, &["#", "RK", "Rank"]),
    (Field::Blank, &[""]),
    (Field::Season, &["Season", "SEASON"]),
    (Field::Jersey, &["No.", "NO", "Jersey"]),
    (Field::Name, &["Player", "PLAYER", "Name", "NAME"]),
    (Field::Team, &["Team", "TEAM", "Tm"]),
    (Field::Position, &["Pos", "POS", "Position"]),
    (Field::Active, &["Active", "ACT"]),
    (Field::Rookie, &["Rookie", "R"]),
    (Field::GamesPlayed, &["GP"]),
    (Field::Goals, &["G"]),
    (Field::Assists, &["A"]),
    (Field::Points, &["P", "PTS"]),
    (Field::PlusMinus, &["+/-"]),
    (Field::PenaltyMinutes, &["PIM"]),
    (Field::PointsPerGame, &["P/GP", "PTS/G"]),
    (Field::PowerPlayGoals, &["PPG"]),
    (Field::PowerPlayAssists, &["PPA"]),
    (Field::PowerPlayPoints, &["PPP"]),
    (Field::ShortHandedGoals, &["SHG"]),
    (Field::ShortHandedAssists, &["SHA"]),
    (Field::ShortHandedPoints, &["SHP"]),
    (Field::GameWinningGoals, &["GWG"]),
    (Field::OvertimeGoals, &["OTG"]),
    (Field::FirstGoals, &["FG"]),
    (Field::InsuranceGoals, &["IG"]),
    (Field::Shots, &["S", "SH"]),
    (Field::ShootingPct, &["S%", "SH%", "SPCT"]),
    (Field::TimeOnIcePerGame, &["TOI/GP"]),
    (Field::ShiftsPerGame, &["Shifts/GP"]),
    (Field::FaceoffAttempts, &["FOA"]),
    (Field::FaceoffWins, &["FOW"]),
    (Field::FaceoffPct, &["FOW%", "FO%"]),
    (Field::ShootoutGamesPlayed, &["SOGP"]),
    (Field::ShootoutGoals, &["SOG"]),
    (Field::ShootoutAttempts, &["SOA"]),
    (Field::ShootoutWinningGoals, &["SOWG"]),
    (Field::ShootoutPct, &["SO%", "SOPCT"]),
    (Field::PenaltyMinutesPerGame, &["PIM/G", "PIM/GP"]),
];

static LABEL_INDEX: LazyLock<HashMap<&'static str, Field>> = LazyLock::new(|| {
    HEADER_LABELS
        .iter()
        .flat_map(|(field, labels)| labels.iter().map(move |l| (*l, *field)))
        .collect()
});

pub fn field_for_label(label: &str) -> Option<Field> {
    LABEL_INDEX.get(label.trim()).copied()
}

/// One table cell as read off the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    pub link: Option<String>,
}

impl RawCell {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            link: None,
        }
    }

    pub fn linked(text: &str, href: &str) -> Self {
        Self {
            text: text.to_string(),
            link: Some(href.to_string()),
        }
    }
}

/// Column slots for one table instance.
#[derive(Debug, Clone)]
pub struct Schema {
    slots: Vec<Option<Field>>,
}

impl Schema {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let mut slots = Vec::with_capacity(headers.len());
        let mut taken: HashMap<Field, usize> = HashMap::new();

        for (column, header) in headers.iter().enumerate() {
            let label = header.as_ref().trim();
            let field = field_for_label(label).ok_or_else(|| ScrapeError::SchemaMismatch {
                label: label.to_string(),
                column,
            })?;
            if field.is_ignored() {
                slots.push(None);
                continue;
            }
            if taken.insert(field, column).is_some() {
                return Err(ScrapeError::DuplicateColumn {
                    label: label.to_string(),
                    column,
                });
            }
            slots.push(Some(field));
        }

        Ok(Self { slots })
    }

    pub fn has(&self, field: Field) -> bool {
        self.slots.contains(&Some(field))
    }

    pub fn width(&self) -> usize {
        self.slots.len()
    }

    /// Pair each cell with its slot. Cells past the header width are dropped;
    /// short rows leave the tail fields unknown.
    pub fn map_row<'a>(&self, cells: &'a [RawCell]) -> MappedRow<'a> {
        let fields = self
            .slots
            .iter()
            .zip(cells)
            .filter_map(|(slot, cell)| slot.map(|f| (f, cell)))
            .collect();
        MappedRow { fields }
    }
}

/// Field → cell for one row. Absent fields are unknown.
#[derive(Debug, Default)]
pub struct MappedRow<'a> {
    fields: HashMap<Field, &'a RawCell>,
}

impl<'a> MappedRow<'a> {
    pub fn cell(&self, field: Field) -> Option<&'a RawCell> {
        self.fields.get(&field).copied()
    }

    pub fn text(&self, field: Field) -> &'a str {
        self.cell(field).map(|c| c.text.as_str()).unwrap_or("")
    }

    pub fn link(&self, field: Field) -> Option<&'a str> {
        self.cell(field).and_then(|c| c.link.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(texts: &[&str]) -> Vec<RawCell> {
        texts.iter().map(|t| RawCell::new(t)).collect()
    }

    #[test]
    fn every_label_is_unique() {
        let mut seen = HashMap::new();
        for (field, labels) in HEADER_LABELS {
            for label in *labels {
                assert!(
                    seen.insert(*label, *field).is_none(),
                    "label {label:?} listed twice"
                );
            }
        }
    }

    #[test]
    fn maps_by_label_not_position() {
        let schema = Schema::from_headers(&["#", "Player", "GP", "G", "A"]).unwrap();
        let row = cells(&["1", "Crosby, Sidney", "82", "44", "45"]);
        let mapped = schema.map_row(&row);
        assert_eq!(mapped.text(Field::GamesPlayed), "82");
        assert_eq!(mapped.text(Field::Assists), "45");
        assert!(mapped.cell(Field::Rank).is_none());
    }

    #[test]
    fn unknown_header_is_mismatch() {
        let err = Schema::from_headers(&["Player", "GP", "xGF"]).unwrap_err();
        match err {
            ScrapeError::SchemaMismatch { label, column } => {
                assert_eq!(label, "xGF");
                assert_eq!(column, 2);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_data_column_rejected() {
        let err = Schema::from_headers(&["Player", "G", "G"]).unwrap_err();
        assert!(matches!(err, ScrapeError::DuplicateColumn { column: 2, .. }));
        // Ignored columns may repeat.
        assert!(Schema::from_headers(&["", "Player", ""]).is_ok());
    }

    #[test]
    fn missing_columns_read_as_absent() {
        let schema = Schema::from_headers(&["Player", "GP"]).unwrap();
        assert!(!schema.has(Field::ShootoutGoals));
        let row = cells(&["A", "3"]);
        let mapped = schema.map_row(&row);
        assert!(mapped.cell(Field::ShootoutGoals).is_none());
        assert_eq!(mapped.text(Field::ShootoutGoals), "");
    }

    #[test]
    fn short_rows_leave_tail_unknown() {
        let schema = Schema::from_headers(&["Player", "GP", "G"]).unwrap();
        let row = cells(&["A", "3"]);
        let mapped = schema.map_row(&row);
        assert!(mapped.cell(Field::Goals).is_none());
        assert_eq!(schema.width(), 3);
    }

    #[test]
    fn labels_are_trimmed() {
        assert_eq!(field_for_label("  PTS/G "), Some(Field::PointsPerGame));
        assert_eq!(field_for_label("pts"), None);
    }
}

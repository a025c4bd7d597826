use thiserror::Error;

use crate::model::DraftKind;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A table header the mapper has no slot for. The page layout changed.
    #[error("unrecognized header {label:?} in column {column}")]
    SchemaMismatch { label: String, column: usize },

    /// A data field claimed by two columns of the same table.
    #[error("header {label:?} in column {column} maps to a field already taken")]
    DuplicateColumn { label: String, column: usize },

    #[error("row {row} has no player link ({name:?})")]
    MissingIdentity { row: usize, name: Option<String> },

    #[error("player {player_id} has more than one {kind} draft")]
    DuplicateDraft { player_id: String, kind: DraftKind },

    #[error("transport: {0}")]
    Transport(String),

    #[error("store: {0}")]
    Store(#[from] rusqlite::Error),
}

impl ScrapeError {
    /// Errors that poison the whole run rather than one unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrapeError::Store(_))
    }
}

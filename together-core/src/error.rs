use thiserror::Error;

/// Errors surfaced at the database boundary.
///
/// Nothing in the quest progress logic can fail; store errors are resolved
/// to success/failure where the mutation was issued and never propagate
/// into domain code.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("could not resolve data directory")]
    NoDataDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type DbResult<T> = Result<T, DbError>;

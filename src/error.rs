use thiserror::Error;

/// Errors from the collaborators around the metrics engine.
///
/// The engine itself is total and never returns these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("unknown item '{item}' in category '{category}'")]
    UnknownItem { category: String, item: String },

    #[error("invalid catalog file {file}: {reason}")]
    InvalidCatalog { file: String, reason: String },

    #[error("no state directory available")]
    NoStateDir,
}

pub type Result<T> = std::result::Result<T, Error>;

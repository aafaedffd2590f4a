use blogchain_shared::BlogError;
use thiserror::Error;

/// Errors produced by the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Value encoding or decoding failed.
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// A stored key or counter does not have the expected layout.
    #[error("Corrupt entry: {0}")]
    Corrupt(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<StoreError> for BlogError {
    fn from(err: StoreError) -> Self {
        BlogError::Storage(err.to_string())
    }
}

/// Convenience alias used by the raw storage modules.
pub type Result<T> = std::result::Result<T, StoreError>;

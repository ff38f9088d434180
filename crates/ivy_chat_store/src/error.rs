//! Store error type.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store lock poisoned: {0}")]
    Lock(String),
    #[error("invalid reaction value: {0}")]
    InvalidReaction(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

use thiserror::Error;
use wishlane_shared::EventId;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (database directory, object files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A point read or partial update targeted a document that does not exist.
    #[error("Record not found")]
    NotFound,

    /// An assignment targeted an event that does not exist.
    #[error("Event not found: {0}")]
    EventMissing(EventId),

    /// An assignment targeted an event held by another owner.
    #[error("Event {0} belongs to another owner")]
    ForeignEvent(EventId),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The backing store cannot be reached (poisoned connection, closed
    /// transport in a remote implementation).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// JSON (de)serialization of an embedded document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Object exceeds the configured upload limit.
    #[error("Object too large: {size} bytes (max {max})")]
    ObjectTooLarge { size: usize, max: usize },

    /// Object path escapes the storage root or is otherwise malformed.
    #[error("Invalid object path: {0}")]
    InvalidPath(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

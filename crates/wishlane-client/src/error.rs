use thiserror::Error;
use wishlane_store::StoreError;

/// Errors surfaced to the screen layer.  None of them is fatal to the
/// application; each one becomes a dismissible notice.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Transport or backend failure on create/update/delete.  Not retried.
    #[error("Write failed: {0}")]
    Write(String),

    /// The target vanished between read and write.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ownership scoping violated.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Input rejected before any write was attempted.
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl ClientError {
    /// Heading for the notice shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            ClientError::Write(_) => "Could not save",
            ClientError::NotFound(_) => "No longer available",
            ClientError::Permission(_) => "Not allowed",
            ClientError::Invalid(_) => "Check your input",
        }
    }

    /// Whether the armed gift / drag state should be dropped after this error.
    pub fn clears_selection(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<StoreError> for ClientError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ClientError::NotFound("record".to_string()),
            StoreError::EventMissing(id) => ClientError::NotFound(format!("event {id}")),
            StoreError::ForeignEvent(id) => {
                ClientError::Permission(format!("event {id} belongs to another user"))
            }
            StoreError::ObjectTooLarge { .. } | StoreError::InvalidPath(_) => {
                ClientError::Invalid(e.to_string())
            }
            other => ClientError::Write(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

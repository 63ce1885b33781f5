use thiserror::Error;

/// Input rejected before any state change happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Home name cannot be empty")]
    EmptyHomeName,
    #[error("Invalid time {hour:02}:{minute:02}: expected hour 0-23 and minute 0-59")]
    InvalidTime { hour: u32, minute: u32 },
    #[error("Unrecognized time '{0}': expected HH:MM")]
    UnparsableTime(String),
    #[error("Deadline {0} is already in the past")]
    DeadlineInPast(String),
    #[error("Deadline offset of {amount} {unit} is out of range")]
    DeadlineOutOfRange { amount: u32, unit: String },
    #[error("Invalid area name '{0}'")]
    InvalidArea(String),
    #[error("Already a member of home {0}; leave it first")]
    AlreadyInHome(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("document {collection}/{id} is corrupt: {reason}")]
    Corrupt {
        collection: String,
        id: String,
        reason: String,
    },
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

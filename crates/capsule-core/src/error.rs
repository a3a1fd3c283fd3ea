use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapsuleError {
    /// The requested delivery date does not leave the minimum lead time.
    #[error("scheduled date {scheduled} must be after {earliest}")]
    TooEarlyToSchedule {
        scheduled: DateTime<Utc>,
        earliest: DateTime<Utc>,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    #[error("a dispatch run is already in progress")]
    DispatchInProgress,
}

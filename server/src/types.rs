use shared::MalformedEvent;
use thiserror::Error;

/// Failure taxonomy for one proposal's sync. `SourceUnavailable` is
/// retryable and leaves prior state intact; `NotFound` signals the caller
/// to create-then-retry (or 404); `RepositoryWrite` means the transaction
/// rolled back and a manual resync is needed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("source unavailable: {0:#}")]
    SourceUnavailable(anyhow::Error),
    #[error("proposal #{0} not found")]
    NotFound(u64),
    #[error(transparent)]
    MalformedEvent(#[from] MalformedEvent),
    #[error("repository write failed: {0}")]
    RepositoryWrite(#[from] sqlx::Error),
}

impl From<octocrab::Error> for SyncError {
    fn from(err: octocrab::Error) -> Self {
        SyncError::SourceUnavailable(err.into())
    }
}

impl From<shared::github::IncompletePullRequest> for SyncError {
    fn from(err: shared::github::IncompletePullRequest) -> Self {
        SyncError::SourceUnavailable(err.into())
    }
}

//! Error types for signboard-sync.

use thiserror::Error;

use signboard_core::CoreError;

/// Everything that can go wrong during one refresh cycle.
///
/// None of these escape a cycle as a failure of the caller: the pipeline
/// handles each one locally (see [`crate::pipeline`]).
#[derive(Debug, Error)]
pub enum SyncError {
    /// No remote configuration has been loaded yet.
    #[error("remote configuration not loaded")]
    ConfigurationMissing,

    /// The database access layer could not be set up at all.
    #[error("database driver unavailable: {0}")]
    DriverUnavailable(String),

    /// Connecting to the remote failed (refused, timed out, bad credentials).
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// Connected, but a query failed or returned undecodable rows.
    #[error("remote query failed: {0}")]
    RemoteQueryFailed(String),

    /// The fallback cache is missing or at least a day old.
    #[error("notice cache is stale ({reason})")]
    CacheStale { reason: String },

    /// The fallback cache exists but cannot be deserialized.
    #[error("notice cache is corrupt: {0}")]
    CacheCorrupt(String),

    /// Reading or writing the cache document failed.
    #[error("cache store error: {0}")]
    Store(#[from] CoreError),
}

impl SyncError {
    /// True for failures after which the cache fallback applies.
    pub fn falls_back_to_cache(&self) -> bool {
        matches!(
            self,
            SyncError::DriverUnavailable(_)
                | SyncError::RemoteUnavailable(_)
                | SyncError::RemoteQueryFailed(_)
        )
    }
}

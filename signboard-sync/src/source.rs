//! Remote notice source contract.
//!
//! A source hands out sessions; a session answers the two queries the
//! pipeline needs. Implementations do no retrying of their own.

use async_trait::async_trait;

use signboard_core::NoticeRecord;

use crate::SyncError;

#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Open a session.
    ///
    /// Fails with `DriverUnavailable` or `RemoteUnavailable`.
    async fn connect(&self) -> Result<Box<dyn NoticeSession>, SyncError>;

    /// Short label for logs (e.g. `host:port/db`).
    fn describe(&self) -> String;
}

#[async_trait]
pub trait NoticeSession: Send {
    /// Total number of notices available remotely.
    async fn count_notices(&mut self) -> Result<u64, SyncError>;

    /// Up to `limit` notices, newest `created_at` first.
    async fn fetch_latest(&mut self, limit: u32) -> Result<Vec<NoticeRecord>, SyncError>;

    /// End the session, releasing the remote connection.
    async fn close(self: Box<Self>) -> Result<(), SyncError>;
}

//! # signboard-sync
//!
//! Remote fetch, fallback cache, and the refresh pipeline that publishes
//! notices into a [`signboard_core::LiveRegistry`].
//!
//! Call [`refresh`] with a [`NoticeSource`] (normally [`MySqlSource`]) to pull
//! the newest notices; when the remote cannot be reached it falls back to the
//! [`NoticeCache`] if that is less than a day old.

pub mod cache;
pub mod error;
pub mod freshness;
pub mod mysql;
pub mod pipeline;
pub mod source;
pub mod testing;

pub use cache::NoticeCache;
pub use error::SyncError;
pub use mysql::MySqlSource;
pub use pipeline::{load_from_cache, refresh, FallbackResult, PullReport, RefreshOutcome};
pub use source::{NoticeSession, NoticeSource};

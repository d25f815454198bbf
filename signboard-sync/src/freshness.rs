//! Fallback cache freshness.
//!
//! A snapshot is usable for at most [`max_cache_age`] (one day); at exactly that age it
//! is already stale. Snapshots stamped in the future count as fresh.

use chrono::{DateTime, Duration, Utc};

use signboard_core::CacheSnapshot;

/// One day, in milliseconds.
pub const MAX_CACHE_AGE_MS: i64 = 24 * 60 * 60 * 1000;

pub fn max_cache_age() -> Duration {
    Duration::milliseconds(MAX_CACHE_AGE_MS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheFreshness {
    /// No snapshot was ever written, or its stamp is unrepresentable.
    Missing,
    Fresh { age: Duration },
    Stale { age: Duration },
}

impl CacheFreshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheFreshness::Fresh { .. })
    }

    /// Human-readable reason for rejecting the cache.
    pub fn describe(&self) -> String {
        match self {
            CacheFreshness::Missing => "not found".to_string(),
            CacheFreshness::Fresh { age } => format!("{} old", format_age(*age)),
            CacheFreshness::Stale { age } => format!("{} old", format_age(*age)),
        }
    }
}

/// Classify `snapshot` against the current time.
pub fn check(snapshot: Option<&CacheSnapshot>) -> CacheFreshness {
    check_at(snapshot, Utc::now())
}

/// Classify `snapshot` against an explicit `now`.
pub fn check_at(snapshot: Option<&CacheSnapshot>, now: DateTime<Utc>) -> CacheFreshness {
    let Some(age) = snapshot.and_then(|s| s.age_at(now)) else {
        return CacheFreshness::Missing;
    };
    if age >= max_cache_age() {
        CacheFreshness::Stale { age }
    } else {
        CacheFreshness::Fresh { age }
    }
}

/// Compact age (`45s`, `12m`, `3h`, `2d`); negative ages render as `0s`.
pub fn format_age(age: Duration) -> String {
    let seconds = age.num_seconds().max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

//! Refresh pipeline.
//!
//! ## `refresh`: 8-step protocol
//!
//! 1. No remote configured → `ConfigurationMissing`; nothing else happens.
//! 2. Connect to the remote.
//! 3. Count notices. Zero → save an empty snapshot, clear the registry, done.
//! 4. `limit = min(max_count, total)`; a smaller limit is reported, not an error.
//! 5. Fetch up to `limit` notices, newest first.
//! 6. Convert each record to a [`RenderableNotice`].
//! 7. Swap the converted list into the registry in one critical section.
//! 8. Save a new snapshot of the pre-conversion records to the cache.
//!
//! A failure in steps 2-5 falls back to the cache ([`load_from_cache`]). The
//! registry is only written in step 7 (or 3), so a failed pull leaves the
//! previous contents in place. A failed cache save after step 7 is logged and
//! reported through `cache_saved`; it never undoes the swap.

use chrono::{DateTime, Duration, Utc};

use signboard_core::{CacheSnapshot, LiveRegistry, NoticeRecord, RenderableNotice};

use crate::cache::NoticeCache;
use crate::freshness::{self, format_age, CacheFreshness};
use crate::source::{NoticeSession, NoticeSource};
use crate::SyncError;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Counts from a successful pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullReport {
    /// Notices now in the registry.
    pub stored: usize,
    /// The configured maximum.
    pub requested: u32,
    /// Notices the remote reported in total.
    pub available: u64,
    pub cache_saved: bool,
}

impl PullReport {
    /// The remote held fewer notices than configured.
    pub fn is_degraded(&self) -> bool {
        (self.stored as u64) < u64::from(self.requested)
    }
}

/// What the cache fallback did.
#[derive(Debug)]
pub enum FallbackResult {
    Loaded { count: usize, age: Duration },
    /// `CacheStale` or `CacheCorrupt`; the registry was left untouched.
    Rejected(SyncError),
}

/// Result of one refresh cycle.
#[derive(Debug)]
pub enum RefreshOutcome {
    Pulled(PullReport),
    /// The remote holds no notices; the registry was cleared.
    Emptied { cache_saved: bool },
    /// The remote failed with `cause`; `result` says what the cache provided.
    Fallback {
        cause: SyncError,
        result: FallbackResult,
    },
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Pulled(report) if report.is_degraded() => "pulled-partial",
            RefreshOutcome::Pulled(_) => "pulled",
            RefreshOutcome::Emptied { .. } => "emptied",
            RefreshOutcome::Fallback {
                result: FallbackResult::Loaded { .. },
                ..
            } => "cache",
            RefreshOutcome::Fallback { .. } => "untouched",
        }
    }

    /// True when the registry contents were replaced by this cycle.
    pub fn registry_updated(&self) -> bool {
        !matches!(
            self,
            RefreshOutcome::Fallback {
                result: FallbackResult::Rejected(_),
                ..
            }
        )
    }
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

/// Pull the newest notices into `registry`, falling back to `cache`.
///
/// The only error is `ConfigurationMissing` (no `source`); remote failures
/// are handled here and described by the returned outcome.
pub async fn refresh(
    source: Option<&dyn NoticeSource>,
    cache: &mut NoticeCache,
    registry: &LiveRegistry,
    max_count: u32,
) -> Result<RefreshOutcome, SyncError> {
    // Step 1: nothing to try, and no reason to consult the cache.
    let Some(source) = source else {
        tracing::error!("remote configuration not loaded, skipping notice pull");
        return Err(SyncError::ConfigurationMissing);
    };

    match pull(source, cache, registry, max_count).await {
        Ok(outcome) => Ok(outcome),
        Err(cause) if !cause.falls_back_to_cache() => Err(cause),
        Err(cause) => {
            tracing::error!(
                source = %source.describe(),
                error = %cause,
                "notice pull failed, falling back to cache",
            );
            let result = load_from_cache(cache, registry);
            Ok(RefreshOutcome::Fallback { cause, result })
        }
    }
}

async fn pull(
    source: &dyn NoticeSource,
    cache: &mut NoticeCache,
    registry: &LiveRegistry,
    max_count: u32,
) -> Result<RefreshOutcome, SyncError> {
    // Step 2: connect. Steps 3-5 run on the session, which is closed
    // whether or not they succeed.
    let mut session = source.connect().await?;
    let fetched = fetch(session.as_mut(), max_count).await;
    if let Err(err) = session.close().await {
        tracing::warn!(source = %source.describe(), error = %err, "failed to close remote session");
    }
    let (available, records) = fetched?;

    if available == 0 {
        tracing::warn!(source = %source.describe(), "no notices found remotely");
        let cache_saved = persist(cache, &CacheSnapshot::new(Vec::new()));
        registry.clear();
        return Ok(RefreshOutcome::Emptied { cache_saved });
    }
    for record in &records {
        log_record(record);
    }

    // Steps 6-7: convert, then swap.
    registry.replace(records.iter().map(RenderableNotice::from_record).collect());

    // Step 8: cache the pre-conversion records.
    let stored = records.len();
    let cache_saved = persist(cache, &CacheSnapshot::new(records));

    let report = PullReport {
        stored,
        requested: max_count,
        available,
        cache_saved,
    };
    if report.is_degraded() {
        tracing::info!(
            stored,
            requested = max_count,
            available,
            "pulled notices (remote holds fewer than requested)",
        );
    } else {
        tracing::info!(stored, "pulled notices");
    }
    Ok(RefreshOutcome::Pulled(report))
}

/// Steps 3-5: the remote total and up to `min(max_count, total)` records.
/// A zero total skips the fetch.
async fn fetch(
    session: &mut dyn NoticeSession,
    max_count: u32,
) -> Result<(u64, Vec<NoticeRecord>), SyncError> {
    let available = session.count_notices().await?;
    tracing::info!(
        available,
        requested = max_count,
        "remote notice count",
    );
    if available == 0 {
        return Ok((0, Vec::new()));
    }

    let limit = clamp_limit(max_count, available);
    if limit < max_count {
        tracing::info!(
            requested = max_count,
            limit,
            available,
            "adjusted request limit to available notices",
        );
    }

    let mut records = session.fetch_latest(limit).await?;
    records.truncate(limit as usize);
    Ok((available, records))
}

/// `min(max_count, available)`.
pub fn clamp_limit(max_count: u32, available: u64) -> u32 {
    u32::try_from(available).map_or(max_count, |available| available.min(max_count))
}

fn persist(cache: &mut NoticeCache, snapshot: &CacheSnapshot) -> bool {
    match cache.write_snapshot(snapshot) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(
                path = %cache.path().display(),
                error = %err,
                "failed to save notice cache",
            );
            false
        }
    }
}

fn log_record(record: &NoticeRecord) {
    tracing::debug!(
        "notice: [{}] {} - {} (by {})",
        record.category,
        record.content,
        record.created_at,
        record.author,
    );
}

// ---------------------------------------------------------------------------
// Cache fallback
// ---------------------------------------------------------------------------

/// Publish the cached snapshot if it is less than a day old.
///
/// A missing, stale, empty or undeserializable cache leaves `registry`
/// untouched.
pub fn load_from_cache(cache: &NoticeCache, registry: &LiveRegistry) -> FallbackResult {
    load_from_cache_at(cache, registry, Utc::now())
}

/// `load_from_cache` against an explicit `now`.
pub fn load_from_cache_at(
    cache: &NoticeCache,
    registry: &LiveRegistry,
    now: DateTime<Utc>,
) -> FallbackResult {
    let snapshot = match cache.read_snapshot() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::error!(
                path = %cache.path().display(),
                error = %err,
                "failed to load notices from cache",
            );
            return FallbackResult::Rejected(err);
        }
    };

    let Some(snapshot) = snapshot else {
        return reject_stale(cache, &CacheFreshness::Missing);
    };
    let age = match freshness::check_at(Some(&snapshot), now) {
        CacheFreshness::Fresh { age } => age,
        other => return reject_stale(cache, &other),
    };
    if snapshot.items.is_empty() {
        tracing::warn!(path = %cache.path().display(), "no cached notices found");
        return FallbackResult::Rejected(SyncError::CacheStale {
            reason: "no cached notices".to_string(),
        });
    }

    for record in &snapshot.items {
        log_record(record);
    }
    let count = snapshot.items.len();
    registry.replace(
        snapshot
            .items
            .iter()
            .map(RenderableNotice::from_record)
            .collect(),
    );
    tracing::info!(count, age = %format_age(age), "loaded notices from cache");
    FallbackResult::Loaded { count, age }
}

fn reject_stale(cache: &NoticeCache, freshness: &CacheFreshness) -> FallbackResult {
    let reason = freshness.describe();
    tracing::warn!(
        path = %cache.path().display(),
        state = %reason,
        "notice cache too old or not found",
    );
    FallbackResult::Rejected(SyncError::CacheStale { reason })
}

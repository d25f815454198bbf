//! Domain types for notices.
//!
//! A [`NoticeRecord`] is what the remote source (or the fallback cache) hands
//! us; a [`RenderableNotice`] is the fixed four-line projection a sign shows.
//! Records serialize with the cache document's field names
//! (`createdAt`, `type`, `name`, `content`).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Number of display lines on a sign.
pub const NOTICE_LINES: usize = 4;

/// Characters of notice content shown per body line.
pub const LINE_WIDTH: usize = 10;

// ---------------------------------------------------------------------------
// NoticeRecord
// ---------------------------------------------------------------------------

/// One authored notice as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecord {
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(rename = "name")]
    pub author: String,
    pub content: String,
}

impl NoticeRecord {
    pub fn new(
        created_at: DateTime<Utc>,
        category: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            created_at,
            category: category.into(),
            author: author.into(),
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RenderableNotice
// ---------------------------------------------------------------------------

/// Display-ready projection of a [`NoticeRecord`].
///
/// Line 0 is `"[<category>] <author>"`; lines 1-3 are consecutive
/// [`LINE_WIDTH`]-character slices of the content. Content past the third
/// slice is dropped and missing slices are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderableNotice {
    lines: [String; NOTICE_LINES],
}

impl RenderableNotice {
    /// Project a record into its four sign lines. Slicing counts `char`s.
    pub fn from_record(record: &NoticeRecord) -> Self {
        let header = format!("[{}] {}", record.category, record.author);
        let mut chars = record.content.chars();
        let mut next_slice = || -> String { chars.by_ref().take(LINE_WIDTH).collect() };
        Self {
            lines: [header, next_slice(), next_slice(), next_slice()],
        }
    }

    pub fn lines(&self) -> &[String; NOTICE_LINES] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// CacheSnapshot
// ---------------------------------------------------------------------------

/// The records of one successful pull, stamped with the wall-clock time of
/// the write that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Unix epoch milliseconds.
    pub last_update_ms: i64,
    pub items: Vec<NoticeRecord>,
}

impl CacheSnapshot {
    /// Snapshot stamped with the current time.
    pub fn new(items: Vec<NoticeRecord>) -> Self {
        Self::taken_at(items, Utc::now())
    }

    /// Snapshot stamped with an explicit time.
    pub fn taken_at(items: Vec<NoticeRecord>, now: DateTime<Utc>) -> Self {
        Self {
            last_update_ms: now.timestamp_millis(),
            items,
        }
    }

    /// `None` when the stored millisecond value is outside chrono's range.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.last_update_ms)
    }

    /// Age of the snapshot relative to `now`; negative for future stamps.
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_update().map(|at| now.signed_duration_since(at))
    }
}

//! Notice cache: the on-disk fallback used when the remote is unreachable.
//!
//! Persists into a [`JsonDocument`] at `<home>/.signboard/notice_cache.json`
//! under two keys only:
//!
//! - `lastUpdate`: epoch milliseconds of the write
//! - `newsItems` : the fetched records, newest first
//!
//! Any other keys in the document are left alone.

use std::path::{Path, PathBuf};

use signboard_core::{config, CacheSnapshot, CoreError, JsonDocument, NoticeRecord};

use crate::SyncError;

pub const LAST_UPDATE_KEY: &str = "lastUpdate";
pub const ITEMS_KEY: &str = "newsItems";

#[derive(Debug)]
pub struct NoticeCache {
    doc: JsonDocument,
}

impl NoticeCache {
    /// Open the cache document at `path`.
    ///
    /// A file that is not valid JSON is not fatal: the cache starts empty and
    /// the next successful pull overwrites it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path = path.into();
        match JsonDocument::open(&path) {
            Ok(doc) => Ok(Self { doc }),
            Err(CoreError::Parse { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "notice cache unreadable, starting empty",
                );
                Ok(Self {
                    doc: JsonDocument::empty(path),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// `<home>/.signboard/notice_cache.json`
    pub fn open_at(home: &Path) -> Result<Self, SyncError> {
        Self::open(config::cache_path_at(home))
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    /// Read the stored snapshot.
    ///
    /// `Ok(None)` when no `lastUpdate` was ever written; `CacheCorrupt` when
    /// either key holds something that does not deserialize.
    pub fn read_snapshot(&self) -> Result<Option<CacheSnapshot>, SyncError> {
        let last_update_ms: Option<i64> = self.doc.get(LAST_UPDATE_KEY).map_err(corrupt)?;
        let Some(last_update_ms) = last_update_ms else {
            return Ok(None);
        };
        let items: Vec<NoticeRecord> = self
            .doc
            .get(ITEMS_KEY)
            .map_err(corrupt)?
            .ok_or_else(|| SyncError::CacheCorrupt(format!("'{ITEMS_KEY}' missing")))?;
        Ok(Some(CacheSnapshot {
            last_update_ms,
            items,
        }))
    }

    /// Store `snapshot` and save the document.
    pub fn write_snapshot(&mut self, snapshot: &CacheSnapshot) -> Result<(), SyncError> {
        self.doc.set(LAST_UPDATE_KEY, snapshot.last_update_ms)?;
        self.doc.set(ITEMS_KEY, &snapshot.items)?;
        self.doc.commit()?;
        Ok(())
    }
}

fn corrupt(err: CoreError) -> SyncError {
    SyncError::CacheCorrupt(err.to_string())
}

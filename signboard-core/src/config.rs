//! Typed settings loaded from `~/.signboard/config.json`.
//!
//! # Keys and defaults
//!
//! | key                   | type   | default             |
//! |-----------------------|--------|---------------------|
//! | `db_host`             | string | `"example.com"`     |
//! | `db_user`             | string | `"ExampleUser"`     |
//! | `db_password`         | string | `"ExamplePassword"` |
//! | `db_database`         | string | `"example_db"`      |
//! | `db_port`             | int    | `3306`              |
//! | `maxNewsCount`        | int    | `5`                 |
//! | `autoRefreshInterval` | int, s | `300`               |
//!
//! Missing keys are filled with their defaults and written back, so the first
//! load leaves a complete, editable file behind.
//!
//! Every path function takes the home directory explicitly (`*_at(home)`);
//! binaries resolve it once with [`home`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::document::JsonDocument;
use crate::error::CoreError;

pub const CONFIG_FILE: &str = "config.json";
pub const CACHE_FILE: &str = "notice_cache.json";

/// Host ticks per second; `autoRefreshInterval` is stored in seconds.
pub const TICKS_PER_SECOND: u64 = 20;

pub const DEFAULT_DB_HOST: &str = "example.com";
pub const DEFAULT_DB_USER: &str = "ExampleUser";
pub const DEFAULT_DB_PASSWORD: &str = "ExamplePassword";
pub const DEFAULT_DB_DATABASE: &str = "example_db";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_MAX_NOTICE_COUNT: u32 = 5;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.signboard/`
pub fn signboard_root(home: &Path) -> PathBuf {
    home.join(".signboard")
}

/// `<home>/.signboard/config.json`
pub fn config_path_at(home: &Path) -> PathBuf {
    signboard_root(home).join(CONFIG_FILE)
}

/// `<home>/.signboard/notice_cache.json`
pub fn cache_path_at(home: &Path) -> PathBuf {
    signboard_root(home).join(CACHE_FILE)
}

pub fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Connection parameters for the remote notice table.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RemoteConfig {
    pub host: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    pub port: u16,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .finish()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            database: DEFAULT_DB_DATABASE.to_string(),
            port: DEFAULT_DB_PORT,
        }
    }
}

/// How many notices to keep and how often to refresh them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncConfig {
    pub max_notice_count: u32,
    /// Always > 0.
    pub refresh_interval_secs: u64,
}

impl SyncConfig {
    /// Refresh cadence expressed in host ticks.
    pub fn refresh_interval_ticks(&self) -> u64 {
        self.refresh_interval_secs.saturating_mul(TICKS_PER_SECOND)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_notice_count: DEFAULT_MAX_NOTICE_COUNT,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Settings {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
}

impl Settings {
    /// Read settings from an open document, inserting defaults for missing
    /// keys. The caller decides whether to save (see [`JsonDocument::is_dirty`]).
    pub fn from_document(doc: &mut JsonDocument) -> Result<Self, CoreError> {
        let remote = RemoteConfig {
            host: doc.get_or_insert("db_host", DEFAULT_DB_HOST.to_string())?,
            user: doc.get_or_insert("db_user", DEFAULT_DB_USER.to_string())?,
            password: doc.get_or_insert("db_password", DEFAULT_DB_PASSWORD.to_string())?,
            database: doc.get_or_insert("db_database", DEFAULT_DB_DATABASE.to_string())?,
            port: bounded(doc, "db_port", i64::from(DEFAULT_DB_PORT), 1)?,
        };

        let sync = SyncConfig {
            max_notice_count: bounded(
                doc,
                "maxNewsCount",
                i64::from(DEFAULT_MAX_NOTICE_COUNT),
                0,
            )?,
            refresh_interval_secs: bounded(
                doc,
                "autoRefreshInterval",
                DEFAULT_REFRESH_INTERVAL_SECS as i64,
                1,
            )?,
        };

        Ok(Self { remote, sync })
    }

    /// Load `<home>/.signboard/config.json`, writing back any defaults filled in.
    pub fn load_at(home: &Path) -> Result<Self, CoreError> {
        let mut doc = JsonDocument::open(config_path_at(home))?;
        let settings = Self::from_document(&mut doc)?;
        if doc.is_dirty() {
            doc.commit()?;
        }
        Ok(settings)
    }
}

/// Read an integer key (inserting `default` when absent) and check it lies
/// in `[min, T::MAX]`.
fn bounded<T>(doc: &mut JsonDocument, key: &'static str, default: i64, min: i64) -> Result<T, CoreError>
where
    T: TryFrom<i64>,
{
    let raw: i64 = doc.get_or_insert(key, default)?;
    if raw < min {
        return Err(CoreError::InvalidSetting {
            key,
            reason: format!("must be at least {min}, got {raw}"),
        });
    }
    T::try_from(raw).map_err(|_| CoreError::InvalidSetting {
        key,
        reason: format!("{raw} is out of range"),
    })
}

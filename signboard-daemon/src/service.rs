//! Host-facing notice service.
//!
//! [`NoticeService`] is the handle a host (the daemon runtime, the CLI, or a
//! renderer) holds. It owns the live registry and the loaded settings and
//! exposes the two trigger operations (`load_config`, `pull_news`) next to the
//! renderer queries (`sign_number`, `lookup`, `render_marker`).
//!
//! Renderer queries only take the registry's read lock and never wait on a
//! refresh. Refreshes are serialised by the cache mutex.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::task::JoinHandle;

use signboard_core::config::{DEFAULT_MAX_NOTICE_COUNT, DEFAULT_REFRESH_INTERVAL_SECS};
use signboard_core::{resolve_index, LiveRegistry, RemoteConfig, RenderableNotice, Settings};
use signboard_sync::{refresh, MySqlSource, NoticeCache, NoticeSource, RefreshOutcome, SyncError};

use crate::error::DaemonError;

/// Builds the remote source for the currently loaded connection settings.
pub type SourceFactory = Arc<dyn Fn(&RemoteConfig) -> Box<dyn NoticeSource> + Send + Sync>;

#[derive(Clone)]
pub struct NoticeService {
    inner: Arc<Inner>,
}

struct Inner {
    home: PathBuf,
    registry: LiveRegistry,
    settings: RwLock<Option<Settings>>,
    cache: tokio::sync::Mutex<NoticeCache>,
    source_factory: SourceFactory,
    last_pull: Mutex<Option<LastPull>>,
}

#[derive(Debug, Clone)]
struct LastPull {
    at_unix: u64,
    outcome: String,
}

/// Snapshot of the service state reported by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub config_loaded: bool,
    pub max_notice_count: u32,
    pub refresh_interval_secs: u64,
    pub notices: usize,
    pub last_pull_at_unix: Option<u64>,
    pub last_outcome: Option<String>,
    pub cache_path: String,
}

impl std::fmt::Debug for NoticeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeService")
            .field("home", &self.inner.home)
            .field("notices", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

impl NoticeService {
    /// Service pulling from MySQL with the cache under `<home>/.signboard`.
    pub fn new(home: &Path) -> Result<Self, DaemonError> {
        Self::with_source_factory(
            home,
            Arc::new(|remote: &RemoteConfig| {
                Box::new(MySqlSource::new(remote)) as Box<dyn NoticeSource>
            }),
        )
    }

    pub fn with_source_factory(
        home: &Path,
        source_factory: SourceFactory,
    ) -> Result<Self, DaemonError> {
        let cache = NoticeCache::open_at(home)?;
        Ok(Self {
            inner: Arc::new(Inner {
                home: home.to_path_buf(),
                registry: LiveRegistry::new(),
                settings: RwLock::new(None),
                cache: tokio::sync::Mutex::new(cache),
                source_factory,
                last_pull: Mutex::new(None),
            }),
        })
    }

    pub fn home(&self) -> &Path {
        &self.inner.home
    }

    pub fn registry(&self) -> &LiveRegistry {
        &self.inner.registry
    }

    /// Current settings, `None` until `load_config` has succeeded once.
    pub fn settings(&self) -> Option<Settings> {
        self.read_settings().clone()
    }

    /// Re-read `config.json`. On failure the previously loaded settings stay.
    pub fn load_config(&self) -> Result<Settings, DaemonError> {
        let settings = Settings::load_at(&self.inner.home)?;
        tracing::info!(
            remote = ?settings.remote,
            max_notice_count = settings.sync.max_notice_count,
            refresh_interval_secs = settings.sync.refresh_interval_secs,
            refresh_interval_ticks = settings.sync.refresh_interval_ticks(),
            "configuration loaded",
        );
        *self
            .inner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(settings)
    }

    /// Run one refresh cycle and wait for it.
    ///
    /// Overlapping calls queue on the cache lock, so the remote is never
    /// queried twice at once.
    pub async fn pull_now(&self) -> Result<RefreshOutcome, SyncError> {
        let mut cache = self.inner.cache.lock().await;
        let (source, max_count) = match self.settings() {
            Some(settings) => (
                Some((self.inner.source_factory)(&settings.remote)),
                settings.sync.max_notice_count,
            ),
            None => (None, DEFAULT_MAX_NOTICE_COUNT),
        };

        let result = refresh(source.as_deref(), &mut cache, &self.inner.registry, max_count).await;
        drop(cache);

        let outcome = match &result {
            Ok(outcome) => outcome.label().to_string(),
            Err(err) => err.to_string(),
        };
        *self
            .inner
            .last_pull
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(LastPull {
            at_unix: unix_seconds_now(),
            outcome,
        });
        result
    }

    /// Fire-and-forget refresh. The result is logged, never returned.
    pub fn pull_news(&self) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            match service.pull_now().await {
                Ok(outcome) => tracing::info!(
                    outcome = outcome.label(),
                    notices = service.registry().len(),
                    "notice refresh finished",
                ),
                Err(err) => tracing::error!(error = %err, "notice refresh failed"),
            }
        })
    }

    /// Notice number a marker refers to, 0 when it is not a notice marker.
    pub fn sign_number<S: AsRef<str>>(&self, marker: &[S]) -> i32 {
        resolve_index(marker)
    }

    /// Notice `number` (1-based), bounded by the configured maximum.
    pub fn lookup(&self, number: i32) -> Option<RenderableNotice> {
        self.inner
            .registry
            .lookup_by_number(number, self.max_notice_count())
    }

    /// The notice a marker should be rendered as, or `None` to keep the
    /// marker's own text.
    pub fn render_marker<S: AsRef<str>>(&self, marker: &[S]) -> Option<RenderableNotice> {
        match self.sign_number(marker) {
            0 => None,
            number => self.lookup(number),
        }
    }

    /// Delay between scheduled refreshes.
    pub fn refresh_interval(&self) -> Duration {
        self.read_settings()
            .as_ref()
            .map(|settings| settings.sync.refresh_interval())
            .unwrap_or(Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS))
    }

    pub fn status(&self) -> ServiceStatus {
        let settings = self.settings();
        let last_pull = self
            .inner
            .last_pull
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        ServiceStatus {
            config_loaded: settings.is_some(),
            max_notice_count: self.max_notice_count(),
            refresh_interval_secs: self.refresh_interval().as_secs(),
            notices: self.inner.registry.len(),
            last_pull_at_unix: last_pull.as_ref().map(|pull| pull.at_unix),
            last_outcome: last_pull.map(|pull| pull.outcome),
            cache_path: signboard_core::config::cache_path_at(&self.inner.home)
                .display()
                .to_string(),
        }
    }

    fn max_notice_count(&self) -> u32 {
        self.read_settings()
            .as_ref()
            .map_or(DEFAULT_MAX_NOTICE_COUNT, |settings| {
                settings.sync.max_notice_count
            })
    }

    fn read_settings(&self) -> std::sync::RwLockReadGuard<'_, Option<Settings>> {
        self.inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

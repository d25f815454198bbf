//! Signboard core library: notice types, JSON documents, settings, live registry.
//!
//! Public API surface:
//! - [`types`]: notice records, renderable notices, cache snapshots
//! - [`error`]: [`CoreError`]
//! - [`document`]: generic key/value JSON document with explicit save
//! - [`config`]: typed settings loaded from `config.json`
//! - [`registry`]: the live, lock-guarded notice list read by renderers
//! - [`marker`]: resolves a 4-line sign marker to a notice number

pub mod config;
pub mod document;
pub mod error;
pub mod marker;
pub mod registry;
pub mod types;

pub use config::{RemoteConfig, Settings, SyncConfig};
pub use document::JsonDocument;
pub use error::CoreError;
pub use marker::resolve_index;
pub use registry::LiveRegistry;
pub use types::{CacheSnapshot, NoticeRecord, RenderableNotice};

//! Error types for signboard-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from document and settings operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, with the path that was being touched.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write/save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error on load: the document on disk is not a JSON object.
    #[error("failed to parse document at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A key holds a value of the wrong shape for its typed accessor.
    #[error("invalid value for '{key}': {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value parsed but is outside its allowed range.
    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.signboard/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}

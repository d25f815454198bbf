//! Signboard daemon: notice service, refresh scheduler and socket server.

mod error;
pub mod paths;
pub mod protocol;
mod runtime;
pub mod service;

pub use error::DaemonError;
pub use protocol::{request, DaemonRequest, DaemonResponse};
pub use runtime::{init_tracing, run, start_blocking};
pub use service::{NoticeService, ServiceStatus, SourceFactory};

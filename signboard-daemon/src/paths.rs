use std::path::{Path, PathBuf};

use signboard_core::config::signboard_root;

pub const DAEMON_SOCKET: &str = "daemon.sock";

pub fn socket_path(home: &Path) -> PathBuf {
    signboard_root(home).join(DAEMON_SOCKET)
}

//! Control socket protocol: one JSON object per line in each direction.
//!
//! Requests are tagged by `cmd` (`{"cmd":"lookup","number":2}`); a request
//! with an unknown `cmd` or a missing argument fails to decode. Replies are
//! `{"ok":true,"data":...}` or `{"ok":false,"error":"..."}`.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{io_err, DaemonError};
use crate::paths::socket_path;

/// Connection attempts for `status` before reporting the daemon as stopped.
const STATUS_ATTEMPTS: u32 = 5;
const STATUS_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum DaemonRequest {
    Status,
    Pull,
    Reload,
    /// Notice by 1-based number.
    Lookup { number: i32 },
    /// Marker lines to resolve and render.
    Resolve { lines: Vec<String> },
    Stop,
}

impl DaemonRequest {
    /// Retry a refused connection briefly, so a daemon that is still
    /// binding its socket is not reported as stopped.
    fn attempts(&self) -> u32 {
        match self {
            DaemonRequest::Status => STATUS_ATTEMPTS,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonResponse {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The `data` payload, or the daemon's error as `Protocol`.
    pub fn into_data(self) -> Result<Value, DaemonError> {
        match (self.ok, self.error) {
            (true, _) => Ok(self.data.unwrap_or(Value::Null)),
            (false, error) => Err(DaemonError::Protocol(
                error.unwrap_or_else(|| "daemon reported an unspecified failure".to_string()),
            )),
        }
    }
}

/// Send `request` to the daemon serving `home` and return the reply's data.
///
/// Fails with `DaemonNotRunning` when nothing is listening on the socket.
pub fn request(home: &Path, request: &DaemonRequest) -> Result<Value, DaemonError> {
    let socket = socket_path(home);
    let mut attempt = 1;
    loop {
        match exchange(&socket, request) {
            Err(DaemonError::DaemonNotRunning { .. }) if attempt < request.attempts() => {
                attempt += 1;
                sleep(STATUS_RETRY_DELAY);
            }
            reply => return reply?.into_data(),
        }
    }
}

fn exchange(socket: &Path, request: &DaemonRequest) -> Result<DaemonResponse, DaemonError> {
    let stream = UnixStream::connect(socket).map_err(|err| match err.kind() {
        ErrorKind::NotFound | ErrorKind::ConnectionRefused => DaemonError::DaemonNotRunning {
            socket: socket.to_path_buf(),
        },
        _ => io_err(socket, err),
    })?;

    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    (&stream)
        .write_all(line.as_bytes())
        .map_err(|e| io_err(socket, e))?;

    let mut reply = String::new();
    BufReader::new(&stream)
        .read_line(&mut reply)
        .map_err(|e| io_err(socket, e))?;
    if reply.trim().is_empty() {
        return Err(DaemonError::Protocol(
            "daemon hung up without a reply".to_string(),
        ));
    }
    Ok(serde_json::from_str(&reply)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn requests_are_tagged_by_cmd() {
        let encoded = serde_json::to_value(DaemonRequest::Status).unwrap();
        assert_eq!(encoded, json!({"cmd": "status"}));

        let encoded = serde_json::to_value(DaemonRequest::Lookup { number: 3 }).unwrap();
        assert_eq!(encoded, json!({"cmd": "lookup", "number": 3}));

        let decoded: DaemonRequest =
            serde_json::from_str(r#"{"cmd":"resolve","lines":["[Notice]","1","","SyncSign"]}"#)
                .unwrap();
        assert!(matches!(decoded, DaemonRequest::Resolve { lines } if lines.len() == 4));
    }

    #[test]
    fn malformed_requests_do_not_decode() {
        for raw in [
            r#"{"cmd":"lookup"}"#,
            r#"{"cmd":"resolve","number":2}"#,
            r#"{"cmd":"bogus"}"#,
            r#"{"number":2}"#,
        ] {
            assert!(serde_json::from_str::<DaemonRequest>(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn only_status_is_retried() {
        assert_eq!(DaemonRequest::Status.attempts(), STATUS_ATTEMPTS);
        assert_eq!(DaemonRequest::Pull.attempts(), 1);
        assert_eq!(DaemonRequest::Stop.attempts(), 1);
    }

    #[test]
    fn failure_reply_becomes_protocol_error() {
        let err = DaemonResponse::failure("boom").into_data().unwrap_err();
        assert!(matches!(err, DaemonError::Protocol(message) if message == "boom"));

        let reply: DaemonResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert_eq!(reply.into_data().unwrap(), Value::Null);
    }

    #[test]
    fn missing_socket_is_not_running() {
        let home = TempDir::new().unwrap();
        for req in [DaemonRequest::Status, DaemonRequest::Lookup { number: 1 }] {
            let err = request(home.path(), &req).unwrap_err();
            assert!(matches!(err, DaemonError::DaemonNotRunning { .. }), "{req:?}");
        }
    }
}

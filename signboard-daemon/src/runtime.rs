use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;

use signboard_core::{config::signboard_root, RenderableNotice};

use crate::error::{io_err, DaemonError};
use crate::paths::socket_path;
use crate::protocol::{DaemonRequest, DaemonResponse};
use crate::service::{unix_seconds_now, NoticeService};

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(home: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf()))
}

/// Run the daemon runtime.
///
/// Loads the configuration and pulls once, then refreshes on the configured
/// interval and serves the control socket until ctrl-c or a `stop` request.
pub async fn run(home: PathBuf) -> Result<(), DaemonError> {
    let root = signboard_root(&home);
    fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;

    let service = NoticeService::new(&home)?;
    if let Err(err) = service.load_config() {
        tracing::error!(error = %err, "failed to load configuration");
    }
    service.pull_news();

    let started_at_unix = unix_seconds_now();
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let service = service.clone();
        tokio::spawn(async move {
            let result = scheduler_task(service, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let service = service.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                service,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (scheduler_result, socket_result, signal_result) =
        tokio::join!(scheduler_handle, socket_handle, signal_handle);

    handle_join("scheduler", scheduler_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

/// Trigger `pull_news` every `refresh_interval`. The interval is read again
/// before each wait so a `reload` changes the cadence from the next cycle.
async fn scheduler_task(
    service: NoticeService,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        let interval = service.refresh_interval();
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep(interval) => {
                tracing::debug!(interval_secs = interval.as_secs(), "scheduled notice refresh");
                service.pull_news();
            }
        }
    }
    Ok(())
}

async fn socket_server_task(
    service: NoticeService,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let socket = socket_path(service.home());
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;
    tracing::info!(socket = %socket.display(), "daemon listening");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let service = service.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) =
                        handle_socket_client(stream, service, shutdown_tx, started_at_unix).await
                    {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    service: NoticeService,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<DaemonRequest>(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::failure(format!("invalid request: {err}")),
                )
                .await?;
                continue;
            }
        };

        let response = handle_request(&service, &request, &shutdown_tx, started_at_unix).await;
        write_response(&mut writer, &response).await?;
        if request == DaemonRequest::Stop {
            break;
        }
    }

    Ok(())
}

async fn handle_request(
    service: &NoticeService,
    request: &DaemonRequest,
    shutdown_tx: &broadcast::Sender<()>,
    started_at_unix: u64,
) -> DaemonResponse {
    match request {
        DaemonRequest::Status => {
            let mut payload = json!(service.status());
            payload["running"] = json!(true);
            payload["started_at_unix"] = json!(started_at_unix);
            payload["socket"] = json!(socket_path(service.home()).display().to_string());
            DaemonResponse::success(payload)
        }
        DaemonRequest::Pull => match service.pull_now().await {
            Ok(outcome) => DaemonResponse::success(json!({
                "outcome": outcome.label(),
                "registry_updated": outcome.registry_updated(),
                "notices": service.registry().len(),
            })),
            Err(err) => DaemonResponse::failure(err.to_string()),
        },
        DaemonRequest::Reload => match service.load_config() {
            Ok(settings) => DaemonResponse::success(json!({
                "maxNewsCount": settings.sync.max_notice_count,
                "autoRefreshInterval": settings.sync.refresh_interval_secs,
            })),
            Err(err) => DaemonResponse::failure(err.to_string()),
        },
        DaemonRequest::Lookup { number } => DaemonResponse::success(json!({
            "number": number,
            "notice": notice_json(service.lookup(*number)),
        })),
        DaemonRequest::Resolve { lines } => DaemonResponse::success(json!({
            "number": service.sign_number(lines.as_slice()),
            "notice": notice_json(service.render_marker(lines.as_slice())),
        })),
        DaemonRequest::Stop => {
            let _ = shutdown_tx.send(());
            DaemonResponse::success(json!({ "stopping": true }))
        }
    }
}

fn notice_json(notice: Option<RenderableNotice>) -> Value {
    notice.map_or(Value::Null, |notice| json!(notice.lines()))
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

/// Install the global `tracing` subscriber (`RUST_LOG`, default `info`).
/// Safe to call more than once.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

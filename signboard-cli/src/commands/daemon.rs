//! `signboard daemon`: foreground runtime and socket control.

use anyhow::{Context, Result};
use clap::Subcommand;

use signboard_daemon::paths::socket_path;
use signboard_daemon::{request, start_blocking, DaemonError, DaemonRequest};

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Run the daemon in the foreground (scheduler + socket server).
    Start,
    /// Request graceful daemon shutdown over the Unix socket.
    Stop,
    /// Query daemon runtime status over the Unix socket.
    Status,
    /// Ask the daemon to re-read `config.json`.
    Reload,
}

pub fn run(command: DaemonCommand) -> Result<()> {
    let home = super::home_dir()?;

    match command {
        DaemonCommand::Start => {
            start_blocking(&home).context("daemon exited with error")?;
        }
        DaemonCommand::Stop => match request(&home, &DaemonRequest::Stop) {
            Ok(_) => println!("daemon stop requested"),
            Err(DaemonError::DaemonNotRunning { .. }) => {
                println!("daemon is not running");
            }
            Err(err) => return Err(err).context("failed to stop daemon"),
        },
        DaemonCommand::Status => {
            let status = match request(&home, &DaemonRequest::Status) {
                Ok(status) => status,
                Err(DaemonError::DaemonNotRunning { .. }) => serde_json::json!({
                    "running": false,
                    "socket": socket_path(&home).display().to_string(),
                }),
                Err(err) => return Err(err).context("failed to query daemon status"),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&status)
                    .context("failed to render daemon status JSON")?
            );
        }
        DaemonCommand::Reload => {
            let settings = request(&home, &DaemonRequest::Reload).context("failed to reload daemon config")?;
            println!(
                "daemon reloaded: maxNewsCount={} autoRefreshInterval={}s",
                settings["maxNewsCount"], settings["autoRefreshInterval"]
            );
        }
    }

    Ok(())
}

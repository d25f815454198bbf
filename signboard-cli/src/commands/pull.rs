//! `signboard pull`: one refresh cycle, via the daemon or in-process.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use signboard_daemon::{request, DaemonError, DaemonRequest, NoticeService};
use signboard_sync::{FallbackResult, RefreshOutcome};

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Pull in this process even when the daemon is running.
    #[arg(long)]
    pub local: bool,
}

impl PullArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;

        if !self.local {
            match request(&home, &DaemonRequest::Pull) {
                Ok(data) => {
                    println!(
                        "daemon pull: {} ({} notices)",
                        data["outcome"].as_str().unwrap_or("unknown"),
                        data["notices"]
                    );
                    return Ok(());
                }
                Err(DaemonError::DaemonNotRunning { .. }) => {
                    println!("daemon is not running, pulling locally");
                }
                Err(err) => return Err(err).context("daemon pull failed"),
            }
        }

        pull_locally(&home)
    }
}

fn pull_locally(home: &Path) -> Result<()> {
    let service = NoticeService::new(home).context("failed to open notice cache")?;
    service.load_config().context("failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let outcome = runtime
        .block_on(service.pull_now())
        .context("notice pull failed")?;

    println!("outcome: {}", outcome.label());
    match &outcome {
        RefreshOutcome::Pulled(report) => {
            println!(
                "stored {} of {} requested ({} available)",
                report.stored, report.requested, report.available
            );
            if !report.cache_saved {
                println!("warning: notice cache was not saved");
            }
        }
        RefreshOutcome::Emptied { .. } => println!("remote holds no notices"),
        RefreshOutcome::Fallback { cause, result } => {
            println!("remote failed: {cause}");
            match result {
                FallbackResult::Loaded { count, .. } => {
                    println!("loaded {count} notices from cache")
                }
                FallbackResult::Rejected(reason) => println!("cache not used: {reason}"),
            }
        }
    }

    for (index, notice) in service.registry().snapshot().iter().enumerate() {
        super::print_notice(&format!("#{}", index + 1), notice.lines());
    }
    Ok(())
}

//! `signboard lookup`: ask the daemon which notice a number shows.

use anyhow::{Context, Result};
use clap::Args;

use signboard_daemon::{request, DaemonError, DaemonRequest};

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// 1-based notice number.
    #[arg(allow_hyphen_values = true)]
    pub number: i32,
}

impl LookupArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let data = match request(&home, &DaemonRequest::Lookup { number: self.number }) {
            Ok(data) => data,
            Err(err @ DaemonError::DaemonNotRunning { .. }) => {
                return Err(err).context("start it with `signboard daemon start`");
            }
            Err(err) => return Err(err).context("lookup failed"),
        };

        let lines: Option<Vec<String>> = serde_json::from_value(data["notice"].clone())
            .context("daemon returned an unexpected notice shape")?;
        match lines {
            Some(lines) => super::print_notice(&format!("#{}", self.number), &lines),
            None => println!("no notice #{}", self.number),
        }
        Ok(())
    }
}

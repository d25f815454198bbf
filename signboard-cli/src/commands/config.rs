//! `signboard config`: create and inspect `config.json`.

use anyhow::{Context, Result};
use clap::Subcommand;

use signboard_core::{config::config_path_at, Settings};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Create the config file, filling in defaults for missing keys.
    Init,
    /// Print the effective settings (the password is never shown).
    Show {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: ConfigCommand) -> Result<()> {
    let home = super::home_dir()?;
    let path = config_path_at(&home);
    let settings = Settings::load_at(&home)
        .with_context(|| format!("failed to load {}", path.display()))?;

    match command {
        ConfigCommand::Init => {
            println!("config ready: {}", path.display());
        }
        ConfigCommand::Show { json: true } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&settings).context("failed to render settings JSON")?
            );
        }
        ConfigCommand::Show { json: false } => {
            let remote = &settings.remote;
            println!("config: {}", path.display());
            println!("  db_host             {}", remote.host);
            println!("  db_user             {}", remote.user);
            println!("  db_password         <redacted>");
            println!("  db_database         {}", remote.database);
            println!("  db_port             {}", remote.port);
            println!("  maxNewsCount        {}", settings.sync.max_notice_count);
            println!(
                "  autoRefreshInterval {}s ({} ticks)",
                settings.sync.refresh_interval_secs,
                settings.sync.refresh_interval_ticks()
            );
        }
    }
    Ok(())
}

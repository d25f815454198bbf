//! Signboard: notice sync for in-world signs.
//!
//! # Usage
//!
//! ```text
//! signboard config init|show
//! signboard pull [--local]
//! signboard cache show [--json]
//! signboard resolve <line>...
//! signboard lookup <number>
//! signboard daemon start|stop|status|reload
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    cache::CacheCommand, config::ConfigCommand, daemon::DaemonCommand, lookup::LookupArgs,
    pull::PullArgs, resolve::ResolveArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "signboard",
    version,
    about = "Sync remote notices onto in-world signs",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or inspect the configuration file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Pull the newest notices (through the daemon when it is running).
    Pull(PullArgs),

    /// Inspect the fallback notice cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Print the notice number a four-line sign marker refers to.
    Resolve(ResolveArgs),

    /// Print the notice the running daemon shows for a number.
    Lookup(LookupArgs),

    /// Run or control the background daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Config { command } => commands::config::run(command),
        Commands::Pull(args) => args.run(),
        Commands::Cache { command } => commands::cache::run(command),
        Commands::Resolve(args) => args.run(),
        Commands::Lookup(args) => args.run(),
        Commands::Daemon { command } => commands::daemon::run(command),
    }
}

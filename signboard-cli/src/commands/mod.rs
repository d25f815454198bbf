pub mod cache;
pub mod config;
pub mod daemon;
pub mod lookup;
pub mod pull;
pub mod resolve;

use std::path::PathBuf;

use anyhow::{Context, Result};

pub(crate) fn home_dir() -> Result<PathBuf> {
    signboard_core::config::home().context("could not determine home directory")
}

/// Print a notice's four lines indented under a heading.
pub(crate) fn print_notice(heading: &str, lines: &[String]) {
    println!("{heading}");
    for line in lines {
        println!("  | {line}");
    }
}

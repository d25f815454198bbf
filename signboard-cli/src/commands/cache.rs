//! `signboard cache`: show the fallback snapshot and whether a pull could use it.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use tabled::{settings::Style, Table, Tabled};

use signboard_sync::{
    freshness::{check, format_age, CacheFreshness},
    NoticeCache,
};

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print the cached notices and the snapshot's age.
    Show {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct CacheRow {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "created")]
    created_at: String,
    #[tabled(rename = "type")]
    category: String,
    #[tabled(rename = "name")]
    author: String,
    content: String,
}

pub fn run(command: CacheCommand) -> Result<()> {
    let home = super::home_dir()?;
    let cache = NoticeCache::open_at(&home).context("failed to open notice cache")?;
    let CacheCommand::Show { json } = command;

    let snapshot = cache
        .read_snapshot()
        .with_context(|| format!("failed to read {}", cache.path().display()))?;
    let freshness = check(snapshot.as_ref());

    if json {
        let payload = json!({
            "path": cache.path().display().to_string(),
            "lastUpdate": snapshot.as_ref().map(|s| s.last_update_ms),
            "fresh": freshness.is_fresh(),
            "state": freshness.describe(),
            "newsItems": snapshot.as_ref().map(|s| &s.items),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to render cache JSON")?
        );
        return Ok(());
    }

    println!("cache: {}", cache.path().display());
    let Some(snapshot) = snapshot else {
        println!("no cached notices");
        return Ok(());
    };

    let updated = snapshot
        .last_update()
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| snapshot.last_update_ms.to_string());
    let state = match &freshness {
        CacheFreshness::Fresh { age } => format!("fresh, {} old", format_age(*age)).green(),
        CacheFreshness::Stale { age } => format!("stale, {} old", format_age(*age)).yellow(),
        CacheFreshness::Missing => "unreadable timestamp".red(),
    };
    println!("updated: {updated} ({state})");

    if snapshot.items.is_empty() {
        println!("no cached notices");
        return Ok(());
    }

    let rows: Vec<CacheRow> = snapshot
        .items
        .iter()
        .enumerate()
        .map(|(index, record)| CacheRow {
            number: index + 1,
            created_at: record.created_at.to_rfc3339(),
            category: record.category.clone(),
            author: record.author.clone(),
            content: record.content.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

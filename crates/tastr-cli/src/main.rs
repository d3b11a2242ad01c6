//! CLI entrypoint for tastr
//!
//! Wires the in-memory store, the broadcast hub and the round coordinator together,
//! then drives a simulated taste test.

mod cli;
mod config;
mod simulate;

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;
use tastr_core::CoordinatorBuilder;
use tastr_core::domain::{CategoryId, Item};
use tastr_core::impls::{BroadcastHub, InMemorySessionStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::simulate::Plan;

#[derive(Debug, Serialize)]
struct Standing<'a> {
    rank: usize,
    name: &'a str,
    alias: &'a str,
    rating: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(path) = &cli.config
        && !path.exists()
    {
        bail!("config file not found: {}", path.display());
    }
    let config = config::load(cli.config.as_deref())?;
    info!(?config, "configuration loaded");

    // === Dependency Injection ===
    let hub = Arc::new(BroadcastHub::new(config.events.channel_capacity));
    let mut builder = CoordinatorBuilder::new()
        .store(Arc::new(InMemorySessionStore::new()))
        .events(hub.clone())
        .config(config);
    if let Some(seed) = cli.seed {
        builder = builder.rng_seed(seed);
    }
    let coordinator = Arc::new(builder.build()?);

    let plan = Plan {
        category: CategoryId::new(cli.category.as_str()),
        items: cli.items.clone(),
        tasters: cli.tasters,
        rounds: cli.rounds,
        seed: cli.seed,
    };
    let leaderboard = simulate::run(coordinator, hub, &plan).await?;

    print_leaderboard(&leaderboard, cli.json)?;
    Ok(())
}

fn print_leaderboard(items: &[Item], json: bool) -> Result<()> {
    let standings: Vec<Standing<'_>> = items
        .iter()
        .enumerate()
        .map(|(i, item)| Standing {
            rank: i + 1,
            name: &item.name,
            alias: &item.alias,
            rating: item.rating,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&standings)?);
        return Ok(());
    }

    println!();
    println!("{:>4}  {:<20} {:>5} {:>9}", "rank", "item", "alias", "rating");
    for s in &standings {
        println!(
            "{:>4}  {:<20} {:>5} {:>9.1}",
            s.rank, s.name, s.alias, s.rating
        );
    }
    Ok(())
}

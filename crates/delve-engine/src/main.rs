//! # Delve
//!
//! Headless driver for the Delve world core. Loads the engine config, sends
//! a scripted explorer through the world and reports what it found.
//!
//! Usage: `delve [CONFIG_PATH]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("delve=info".parse()?))
        .init();

    info!("Delve starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };

    let summary = app::run(&config)?;
    info!(
        "Explored world {}: {} steps, {} transitions ({} generated, {} loaded), ended in {}",
        summary.seed,
        summary.steps,
        summary.transitions,
        summary.chunks_generated,
        summary.chunks_loaded,
        summary.final_chunk
    );
    info!(
        "Collected {} items and {} gold, {} blessings, {}/{} quests ready to turn in",
        summary.items_collected,
        summary.gold,
        summary.blessings,
        summary.quests_satisfied,
        summary.quests_accepted
    );
    if summary.save_failures > 0 {
        info!("{} chunk saves failed", summary.save_failures);
    }

    info!("Delve shutdown complete");
    Ok(())
}

//! Headless Ember skill simulation.
//!
//! Runs one authoritative host and N client sessions over the in-process
//! loopback transport, plays a scripted party-versus-dummies encounter, and
//! prints a summary.
//!
//! Run with: `cargo run -p ember-sim -- --clients 2 --latency-ticks 3`

mod encounter;

use clap::Parser;
use ember_config::{CliArgs, Config, default_config_dir};
use ember_skills::SkillCatalog;
use tracing::{error, info};

use crate::encounter::Encounter;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_dir.display());
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    ember_log::init_logging(
        config.debug.log_dir.as_deref(),
        cfg!(debug_assertions),
        Some(&config),
    );

    let catalog = match SkillCatalog::load(config.skills.catalog_path.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to load skill catalog: {e}");
            std::process::exit(1);
        }
    };

    info!(
        "Ember sim: {} Hz, {:.1}s, {} client(s), latency {} tick(s), {} skills",
        config.simulation.tick_rate,
        config.simulation.duration_secs,
        config.simulation.client_count,
        config.network.latency_ticks,
        catalog.len(),
    );

    let summary = Encounter::new(&config, catalog).run();
    println!("{summary}");
}

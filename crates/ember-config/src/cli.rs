//! Command-line arguments for the simulation binary.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Ember simulation command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "ember-sim", about = "Headless Ember skill simulation")]
pub struct CliArgs {
    /// Simulation tick rate in Hz.
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Encounter length in seconds.
    #[arg(long)]
    pub duration: Option<f32>,

    /// Number of client sessions.
    #[arg(long)]
    pub clients: Option<u32>,

    /// One-way transport delay in ticks.
    #[arg(long)]
    pub latency_ticks: Option<u32>,

    /// Path to an external skill catalog (RON).
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(rate) = args.tick_rate {
            self.simulation.tick_rate = rate;
        }
        if let Some(secs) = args.duration {
            self.simulation.duration_secs = secs;
        }
        if let Some(clients) = args.clients {
            self.simulation.client_count = clients;
        }
        if let Some(latency) = args.latency_ticks {
            self.network.latency_ticks = latency;
        }
        if let Some(ref path) = args.catalog {
            self.skills.catalog_path = Some(path.clone());
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            tick_rate: Some(30),
            latency_ticks: Some(0),
            catalog: Some(PathBuf::from("custom.ron")),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.simulation.tick_rate, 30);
        assert_eq!(config.network.latency_ticks, 0);
        assert_eq!(
            config.skills.catalog_path.as_deref(),
            Some(std::path::Path::new("custom.ron"))
        );
        // Non-overridden fields retain defaults
        assert_eq!(config.simulation.client_count, 2);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["ember-sim", "--clients", "4", "--log-level", "debug"]);
        assert_eq!(args.clients, Some(4));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.tick_rate.is_none());
    }
}

//! Structured logging for Ember hosts, clients, and tools.
//!
//! Every Ember crate logs through `tracing` with structured fields
//! (`entity`, `skill`, `session`). This crate installs the subscriber: an
//! uptime-stamped console layer, plus a JSON file layer in debug builds.

use std::path::Path;

use ember_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written into the log directory.
pub const LOG_FILE_NAME: &str = "ember.log";

/// Picks the filter string: config `debug.log_level` if non-empty, else [`DEFAULT_FILTER`].
pub fn filter_directives(config: Option<&Config>) -> String {
    config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Builds the env filter. `RUST_LOG` takes precedence over `directives`.
pub fn build_env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (only used when `debug_build`)
/// * `debug_build` - enables the file layer
/// * `config` - optional configuration supplying the log level
///
/// Calling this twice is a no-op for the second call.
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let env_filter = build_env_filter(&filter_directives(config));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        let _ = subscriber.with(file_layer).try_init();
        return;
    }

    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_info() {
        assert_eq!(filter_directives(None), "info");

        let mut config = Config::default();
        config.debug.log_level = "   ".to_string();
        assert_eq!(filter_directives(Some(&config)), "info");
    }

    #[test]
    fn test_filter_uses_config_level() {
        let mut config = Config::default();
        config.debug.log_level = "debug,ember_combat=trace".to_string();
        assert_eq!(filter_directives(Some(&config)), "debug,ember_combat=trace");
    }

    #[test]
    fn test_subsystem_directives_parse() {
        for directives in [
            "info",
            "warn,ember_combat=debug",
            "debug,ember_movement=trace,ember_net=warn",
        ] {
            assert!(
                EnvFilter::try_new(directives).is_ok(),
                "failed to parse {directives}"
            );
        }
    }

    #[test]
    fn test_init_logging_with_file_layer() {
        let dir = tempfile::tempdir().unwrap();
        init_logging(Some(dir.path()), true, None);
        tracing::info!(target: "ember_log::test", "hello");
        assert!(dir.path().join(LOG_FILE_NAME).exists());

        // Second init must not panic.
        init_logging(None, false, None);
    }
}

//! Simulation settings with defaults, validation, and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration for hosts, clients, and the simulation binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Tick rate and run length.
    pub simulation: SimulationConfig,
    /// Loopback transport behaviour.
    pub network: NetworkConfig,
    /// Skill catalog source and progression tuning.
    pub skills: SkillsConfig,
    /// Logging and diagnostics.
    pub debug: DebugConfig,
}

/// Fixed-step simulation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks per second on every session.
    pub tick_rate: u32,
    /// How long the scripted encounter runs, in seconds.
    pub duration_secs: f32,
    /// Number of client sessions connected to the host.
    pub client_count: u32,
}

/// Transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// One-way delivery delay of the loopback transport, in ticks.
    pub latency_ticks: u32,
    /// Capacity of each session's inbound queue.
    pub queue_capacity: usize,
}

/// Skill catalog and progression settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkillsConfig {
    /// External RON catalog. `None` uses the catalog built into the binary.
    pub catalog_path: Option<PathBuf>,
    /// Scales every skill XP grant.
    pub experience_multiplier: f32,
}

/// Debug/development settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g. "info", "debug,ember_combat=trace").
    pub log_level: String,
    /// Directory for JSON log files in debug builds.
    pub log_dir: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            duration_secs: 12.0,
            client_count: 2,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            latency_ticks: 3,
            queue_capacity: 1024,
        }
    }
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            experience_multiplier: 1.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Platform config directory (`<config_dir>/ember`), falling back to `./ember`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("ember"))
        .unwrap_or_else(|| PathBuf::from("ember"))
}

impl Config {
    /// Load config from `config_dir`, writing a default file if none exists.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if path.exists() {
            let config = Self::read(&path)?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to `config_dir/config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(&path, serialized).map_err(|source| ConfigError::Write { path, source })
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed on disk.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read(&config_dir.join(CONFIG_FILE))?;
        if &fresh != self {
            log::info!("Config reloaded with changes");
            Ok(Some(fresh))
        } else {
            Ok(None)
        }
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_rate == 0 || self.simulation.tick_rate > 1000 {
            return Err(ConfigError::Invalid {
                field: "simulation.tick_rate",
                reason: format!("{} is outside 1..=1000", self.simulation.tick_rate),
            });
        }
        if !(self.simulation.duration_secs > 0.0) {
            return Err(ConfigError::Invalid {
                field: "simulation.duration_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.network.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "network.queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.skills.experience_multiplier >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "skills.experience_multiplier",
                reason: "must be zero or positive".to_string(),
            });
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = ron::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("tick_rate: 60"));
        assert!(ron_str.contains("latency_ticks: 3"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let partial = "(simulation: (tick_rate: 30))";
        let config: Config = ron::from_str(partial).unwrap();
        assert_eq!(config.simulation.tick_rate, 30);
        assert_eq!(config.simulation.client_count, 2);
        assert_eq!(config.skills.experience_multiplier, 1.0);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());

        let again = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn test_reload_detects_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());

        let mut changed = config.clone();
        changed.network.latency_ticks = 9;
        changed.save(dir.path()).unwrap();
        let reloaded = config.reload(dir.path()).unwrap().unwrap();
        assert_eq!(reloaded.network.latency_ticks, 9);
    }

    #[test]
    fn test_validate_rejects_zero_tick_rate() {
        let mut config = Config::default();
        config.simulation.tick_rate = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "simulation.tick_rate",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "(simulation: [").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

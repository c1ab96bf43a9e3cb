//! Engine configuration.
//!
//! Loaded from `delve.toml` in the platform config directory, or from a path
//! given on the command line. Missing or invalid files fall back to defaults.

use delve_common::WorldSeed;
use delve_world::WorldConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "delve.toml";

/// Where chunks are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Kept in memory for the lifetime of the process
    Memory,
    /// JSON files under the save directory
    #[default]
    File,
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World seed (None = random)
    pub world_seed: Option<u32>,
    /// Chunk storage
    pub storage: StorageKind,
    /// Save directory (None = platform data dir)
    pub save_dir: Option<PathBuf>,
    /// Steps taken by the scripted explorer
    pub walk_steps: u32,
    /// Seed of the explorer's own choices (None = derived from the world seed)
    pub walk_seed: Option<u64>,
    /// Clear stored chunks before exploring
    pub reset_on_start: bool,
    /// World settings
    pub world: WorldConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            world_seed: None,
            storage: StorageKind::File,
            save_dir: None,
            walk_steps: 500,
            walk_seed: None,
            reset_on_start: false,
            world: WorldConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Default configuration file path.
    fn config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE),
            |dir| dir.join("delve").join(CONFIG_FILE),
        )
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.walk_steps = self.walk_steps.clamp(1, 1_000_000);
        self.world.validate();
    }

    /// The configured seed, or a random one.
    pub fn resolve_seed(&self) -> WorldSeed {
        WorldSeed::new(self.world_seed.unwrap_or_else(|| fastrand::u32(..)))
    }

    /// Directory for file storage and session state.
    #[must_use]
    pub fn resolve_save_dir(&self) -> PathBuf {
        self.save_dir.clone().unwrap_or_else(|| {
            dirs::data_dir().map_or_else(
                || PathBuf::from("saves"),
                |dir| dir.join("delve").join("saves"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_common::GridSize;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.walk_steps, 500);
        assert_eq!(config.world.grid, GridSize::new(48, 22));
        assert!(config.world_seed.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig {
            walk_steps: 0,
            ..EngineConfig::default()
        };
        config.world.grid = GridSize::new(2, 2);

        config.validate();

        assert_eq!(config.walk_steps, 1);
        assert_eq!(config.world.grid, GridSize::new(16, 8));
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("delve.toml");

        let mut config = EngineConfig::default();
        config.world_seed = Some(12345);
        config.storage = StorageKind::Memory;
        config.world.grid = GridSize::new(40, 20);

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/delve.toml");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_config_load_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("delve.toml");
        fs::write(&config_path, "world_seed = [not toml").expect("write");
        assert_eq!(EngineConfig::load_from(&config_path), EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            world_seed = 7
            storage = "memory"

            [world]
            namespace = "test.chunk"
            "#,
        )
        .expect("parse");
        assert_eq!(config.resolve_seed(), WorldSeed::new(7));
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.world.namespace, "test.chunk");
        assert_eq!(config.world.grid, GridSize::new(48, 22));
        assert_eq!(config.walk_steps, 500);
    }

    #[test]
    fn test_explicit_save_dir() {
        let config = EngineConfig {
            save_dir: Some(PathBuf::from("/tmp/delve-test")),
            ..EngineConfig::default()
        };
        assert_eq!(config.resolve_save_dir(), PathBuf::from("/tmp/delve-test"));
    }
}

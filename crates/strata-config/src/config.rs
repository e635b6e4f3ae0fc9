//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Top-level tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World shape and block state source.
    pub world: WorldConfig,
    /// Chunk codec settings.
    pub codec: CodecConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Lowest block height, on a 16-block boundary.
    pub min_y: i32,
    /// Highest block height, inclusive, ending a 16-block slice.
    pub max_y: i32,
    /// Block state table to build the registry from.
    pub state_table: Option<PathBuf>,
    /// NBT flavour of the state table.
    pub state_table_flavor: StateTableFlavor,
    /// Biome ID of freshly created chunks (1 = plains).
    pub default_biome: u32,
}

/// NBT flavour of a state table file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum StateTableFlavor {
    /// Fixed-width little-endian integers.
    LittleEndian,
    /// Varint lengths and integers.
    #[default]
    NetworkLittleEndian,
}

/// Codec configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum idle scratch buffers kept by the pool.
    pub pool_capacity: usize,
    /// Initial size of a freshly allocated scratch buffer, in bytes.
    pub buffer_capacity: usize,
    /// Encoding used when none is given on the command line.
    pub encoding: EncodingSetting,
}

/// Chunk encoding selected in the config or on the command line.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
pub enum EncodingSetting {
    #[default]
    Network,
    Disk,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_y: -64,
            max_y: 319,
            state_table: None,
            state_table_flavor: StateTableFlavor::default(),
            default_biome: 1,
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 64,
            buffer_capacity: 1024,
            encoding: EncodingSetting::default(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for the tools, e.g. `~/.config/strata`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("strata"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Checks values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.min_y.rem_euclid(16) != 0 {
            return Err(ConfigError::Invalid {
                field: "world.min_y",
                reason: format!("{} is not a multiple of 16", world.min_y),
            });
        }
        if (world.max_y + 1).rem_euclid(16) != 0 {
            return Err(ConfigError::Invalid {
                field: "world.max_y",
                reason: format!("{} does not end a 16-block slice", world.max_y),
            });
        }
        if world.max_y <= world.min_y {
            return Err(ConfigError::Invalid {
                field: "world.max_y",
                reason: format!("{} is not above min_y {}", world.max_y, world.min_y),
            });
        }
        if (world.max_y - world.min_y + 1) / 16 > 128 {
            return Err(ConfigError::Invalid {
                field: "world.max_y",
                reason: "range spans more than 128 sub-chunks".to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.debug.log_level.as_str()) {
            return Err(ConfigError::Invalid {
                field: "debug.log_level",
                reason: format!("unknown level {:?}", self.debug.log_level),
            });
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(ConfigError::Parse)
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
        assert!(ron_str.contains("min_y: -64"));
        assert!(ron_str.contains("pool_capacity: 64"));
        assert!(ron_str.contains("NetworkLittleEndian"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.world.state_table = Some(PathBuf::from("/data/block_states.nbt"));
        config.codec.encoding = EncodingSetting::Disk;
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(world: (min_y: 0, max_y: 255))").unwrap();
        assert_eq!(config.world.min_y, 0);
        assert_eq!(config.world.default_biome, 1);
        assert_eq!(config.codec, CodecConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.world.min_y = 0;
        config.world.max_y = 255;
        config.codec.pool_capacity = 8;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.debug.log_level = "debug".to_string();
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().debug.log_level, "debug");
        assert!(modified.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.world.min_y = -60;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "world.min_y", .. })
        ));

        let mut config = Config::default();
        config.world.max_y = 300;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "world.max_y", .. })
        ));

        let mut config = Config::default();
        config.debug.log_level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "debug.log_level", .. })
        ));
    }
}

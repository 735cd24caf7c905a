//! Fabrication settings loading and config file resolution
//!
//! Settings come from a TOML file. Every field has a built-in default, so a
//! missing or partial file never prevents fabrication from starting; it only
//! produces a warning.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/chainweave/config.toml`)
//! 4. Compiled defaults (fallback)

use crate::chain_config::ChainConfigType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming a settings file
pub const CONFIG_ENV_VAR: &str = "CHAINWEAVE_CONFIG";

/// Default time-map resolution, in frames per beat
pub const DEFAULT_FRAMES_PER_BEAT: u32 = 64;

/// Default quantization of computed seconds, in steps per second
pub const DEFAULT_RESOLUTION_HZ: u32 = 1_000_000;

/// Default bound on memoized segment lookups per fabricator
pub const DEFAULT_RETROSPECTIVE_CACHE_CAPACITY: usize = 64;

/// Settings shared by every fabricator in a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricationSettings {
    /// Time-map step count per beat used when integrating tempo
    pub frames_per_beat: u32,

    /// Computed seconds are floored to a multiple of `1 / resolution_hz`
    pub resolution_hz: u32,

    /// Prefix joined with a segment's waveform key to form its output file path
    pub temp_file_path_prefix: String,

    /// Maximum number of segments memoized by one retrospective
    pub retrospective_cache_capacity: usize,

    /// Default values for chain config keys a chain leaves unset
    ///
    /// Keys are [`ChainConfigType`] names. A table given in a settings file
    /// replaces the built-in table entirely, so a key left out of it has no
    /// configured default.
    pub chain_config_defaults: BTreeMap<String, String>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for FabricationSettings {
    fn default() -> Self {
        Self {
            frames_per_beat: DEFAULT_FRAMES_PER_BEAT,
            resolution_hz: DEFAULT_RESOLUTION_HZ,
            temp_file_path_prefix: "/tmp/".to_string(),
            retrospective_cache_capacity: DEFAULT_RETROSPECTIVE_CACHE_CAPACITY,
            chain_config_defaults: ChainConfigType::ALL
                .into_iter()
                .map(|key| (key.as_str().to_string(), key.builtin_default().to_string()))
                .collect(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FabricationSettings {
    /// Parse settings from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: FabricationSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Configured default for a chain config key, if any
    pub fn chain_config_default(&self, key: ChainConfigType) -> Option<&str> {
        self.chain_config_defaults
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key.as_str()))
            .map(|(_, value)| value.as_str())
    }

    fn validate(&self) -> Result<()> {
        if self.frames_per_beat == 0 {
            return Err(Error::Config("frames_per_beat must be positive".to_string()));
        }
        if self.resolution_hz == 0 {
            return Err(Error::Config("resolution_hz must be positive".to_string()));
        }
        for name in self.chain_config_defaults.keys() {
            name.parse::<ChainConfigType>()
                .map_err(|_| Error::Config(format!("Unknown chain config default: {}", name)))?;
        }
        Ok(())
    }
}

/// Resolve which settings file to read, following the priority order above
///
/// Returns `None` when no candidate exists, meaning compiled defaults apply.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir()
        .map(|dir| dir.join("chainweave").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load settings with graceful degradation
///
/// A missing or unreadable file logs a warning and yields compiled defaults.
pub fn load_settings(cli_arg: Option<&Path>, env_var_name: &str) -> FabricationSettings {
    let Some(path) = resolve_config_path(cli_arg, env_var_name) else {
        info!("No settings file found, using compiled defaults");
        return FabricationSettings::default();
    };

    match FabricationSettings::load(&path) {
        Ok(settings) => {
            info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            warn!("Could not load settings from {}: {}; using compiled defaults", path.display(), e);
            FabricationSettings::default()
        }
    }
}

// Configuration module
// Loads the key=value settings file, creating it with defaults when missing

use crate::error::ConfigError;
use crate::viewer::DisplayMode;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GRID_STEP: u32 = 20;

const CONFIG_DIR: &str = "pixview";
const CONFIG_FILE: &str = "pixview.conf";

/// Settings seeding the background renderer and the initial viewer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Side of one background checker cell, in pixels
    pub grid_step: u32,
    pub default_mode: DisplayMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_step: DEFAULT_GRID_STEP,
            default_mode: DisplayMode::Centered,
        }
    }
}

/// On-disk shape of the settings file
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    grid_step: u32,
    default_mode: i64,
}

impl From<&Config> for ConfigFile {
    fn from(config: &Config) -> Self {
        Self {
            grid_step: config.grid_step,
            default_mode: config.default_mode.config_value(),
        }
    }
}

/// `<config dir>/pixview/pixview.conf`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Read the settings at `path`, writing a default file first if there is none
pub fn load_or_create(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        let config = Config::default();
        save(&config, path)?;
        info!("Created default config at {}", path.display());
        return Ok(config);
    }

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Config::parse(&text))
}

pub fn save(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let text = toml::to_string(&ConfigFile::from(config))?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, text).map_err(write_err)
}

impl Config {
    /// Parse settings text. Entries that are malformed or out of range are
    /// dropped one by one and the default is kept for them.
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();

        match toml::from_str::<toml::Table>(text) {
            Ok(table) => config.apply(&table),
            Err(e) => {
                debug!("Config is not valid as a whole, reading line by line: {}", e);
                for line in text.lines() {
                    match toml::from_str::<toml::Table>(line) {
                        Ok(table) => config.apply(&table),
                        Err(_) => warn!("Ignoring malformed config line: {}", line.trim()),
                    }
                }
            }
        }

        config
    }

    fn apply(&mut self, table: &toml::Table) {
        for (key, value) in table {
            match key.as_str() {
                "gridStep" => match value
                    .as_integer()
                    .and_then(|v| u32::try_from(v).ok())
                    .filter(|v| *v > 0)
                {
                    Some(step) => self.grid_step = step,
                    None => warn!("Ignoring invalid gridStep value: {}", value),
                },
                "defaultMode" => match value.as_integer().and_then(DisplayMode::from_config_value)
                {
                    Some(mode) => self.default_mode = mode,
                    None => warn!("Ignoring invalid defaultMode value: {}", value),
                },
                other => debug!("Ignoring unknown config key: {}", other),
            }
        }
    }
}

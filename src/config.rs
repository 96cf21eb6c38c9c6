use std::fs;
use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::error::DumpError;
use crate::image::DumpFormat;

/// Settings for acquiring and reporting a dump. Every field has a default,
/// so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format: DumpFormat,
    pub show_garbage: bool,
    pub show_elements: bool,
    pub show_regions: bool,
    /// List every heap block with the variables that reference it
    pub show_heap: bool,
    /// How long to wait for more monitor output before assuming it is done
    pub monitor_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            format: DumpFormat::Auto,
            show_garbage: true,
            show_elements: true,
            show_regions: false,
            show_heap: false,
            monitor_timeout_ms: 250,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config, DumpError> {
        toml::from_str(text).map_err(|e| DumpError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Config, DumpError> {
        debug!("Loading configuration from {:?}", path);
        let text = fs::read_to_string(path)
            .map_err(|e| DumpError::Config(format!("{}: {}", path.display(), e)))?;
        Config::from_toml_str(&text)
    }

    pub fn monitor_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor_timeout_ms)
    }
}

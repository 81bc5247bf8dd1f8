//! Configuration file loading.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use xkcd_core::{layout::RenderSettings, playback::PlaybackSettings, settings::SettingsError};
use xkcd_hal_linux::DeviceConfig;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/xkcd-display.toml";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Default `env_logger` filter; `RUST_LOG` takes precedence.
    pub log_level: String,
    pub playback: PlaybackSettings,
    pub render: RenderSettings,
    pub device: DeviceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            playback: PlaybackSettings::default(),
            render: RenderSettings::default(),
            device: DeviceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `explicit`, else the default path when it exists, else defaults.
    ///
    /// A relative font path is resolved against the config file's directory, or
    /// the working directory when no file is used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                default.is_file().then_some(default)
            }
        };

        let (mut config, base) = match path {
            None => (
                Self::default(),
                std::env::current_dir().context("cannot resolve the working directory")?,
            ),
            Some(path) => {
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                let config = Self::parse(&contents)
                    .with_context(|| format!("invalid config {}", path.display()))?;
                let base = std::path::absolute(&path)
                    .with_context(|| format!("cannot resolve {}", path.display()))?
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                (config, base)
            }
        };

        config.resolve_paths(&base);
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// Checks the sections that would otherwise fail on every dialog.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.playback.validate()?;
        self.render.validate()
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.render.font_path.is_relative() {
            self.render.font_path = base.join(&self.render.font_path);
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

//! Application configuration
//!
//! Window size, layout geometry and logging, stored as JSON in the platform
//! config dir. The design preference is not part of it; see
//! [`crate::preference`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::paths::{APP_DIR, CONFIG_FILENAME};
use crate::layout::LayoutSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    /// Follow design changes made in other views
    #[serde(default = "default_sync_enabled")]
    pub sync_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_window_width")]
    pub width: u16,
    #[serde(default = "default_window_height")]
    pub height: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sync_enabled() -> bool {
    true
}

fn default_window_width() -> u16 {
    1100
}

fn default_window_height() -> u16 {
    900
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            window: WindowSettings::default(),
            layout: LayoutSettings::default(),
            sync_enabled: default_sync_enabled(),
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(CONFIG_FILENAME);
        path
    }

    /// Load configuration from the default path or create it
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Load configuration from JSON file or create default
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, creating default config at {:?}", config_path);
            let config = Config::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON from {:?}", config_path))?;
        config.layout.validate_and_clamp();

        info!(path = %config_path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, json)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        info!(path = %config_path.display(), "Saved config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Density;

    #[test]
    fn test_missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dental-chart").join("config.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"log_level": "debug", "layout": {"cell_size": 40.0, "ring_density": "detailed"}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.layout.cell_size, 40.0);
        assert_eq!(config.layout.ring_density, Density::Detailed);
        assert_eq!(config.layout.arc, LayoutSettings::default().arc);
        assert_eq!(config.window, WindowSettings::default());
        assert!(config.sync_enabled);
    }

    #[test]
    fn test_unusable_cell_size_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"layout": {"cell_size": -6.0}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.layout.cell_size, LayoutSettings::default().cell_size);

        let store = crate::chart::ToothRecordStore::new();
        let interaction = crate::interaction::InteractionState::new();
        for design in crate::preference::DesignPreference::ALL {
            let tree = crate::dispatcher::select(design, &config.layout).render(&store, &interaction);
            for glyph in &tree.teeth {
                assert_eq!(tree.hit_test(glyph.placement.center), Some(glyph.number), "{design}");
            }
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.window.width = 1400;
        config.sync_enabled = false;
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}

//! User-tunable editor settings, persisted as TOML in the OS config dir.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::export::ExportOptions;
use crate::viewport::GridConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// `k` in `zoom * (1 - delta_y * k)`.
    pub wheel_zoom_sensitivity: f32,
    pub zoom_step: f32,
    /// Screen pixels.
    pub handle_hit_tolerance: f32,
    /// Screen pixels kept free around the fitted image.
    pub display_padding: f32,
    pub export: ExportOptions,
    pub grid: GridConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            wheel_zoom_sensitivity: 0.001,
            zoom_step: 0.1,
            handle_hit_tolerance: 10.0,
            display_padding: 40.0,
            export: ExportOptions::default(),
            grid: GridConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("crop_studio");
        path.push("config.toml");
        path
    }

    /// Stored config, or the defaults if it is missing or unreadable.
    pub fn load() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded config");
                config
            }
            Err(err) => {
                warn!(error = %err, "falling back to default config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(io_err)
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `$XDG_CONFIG_HOME/photoshot/config.json`. Missing or
//! unreadable files fall back to defaults; unknown fields are ignored and
//! missing ones take their default value.

use crate::backends::camera::{CameraBackendType, CameraFacing, SessionPreset};
use crate::constants::app_info;
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::EncodingQuality;
use crate::storage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use (PipeWire or Virtual)
    pub backend: CameraBackendType,
    /// Camera facing selected at start-up
    pub initial_facing: CameraFacing,
    /// Initial state of the high-resolution toggle
    pub high_resolution: bool,
    /// Session preset used when opening the camera
    pub session_preset: SessionPreset,
    /// JPEG quality preset
    pub jpeg_quality: EncodingQuality,
    /// Photo library directory override
    pub library_dir: Option<PathBuf>,
    /// Scratch directory override
    pub scratch_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            initial_facing: CameraFacing::Back,
            high_resolution: true,
            session_preset: SessionPreset::Photo,
            jpeg_quality: EncodingQuality::default(),
            library_dir: None,
            scratch_dir: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_ID).join(CONFIG_FILE))
    }

    /// Load from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`, falling back to defaults when the file is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No config file, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                Self::default()
            }
        }
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Config(e.to_string()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Photo library directory (override or the default pictures folder)
    pub fn library_dir(&self) -> PathBuf {
        self.library_dir
            .clone()
            .unwrap_or_else(storage::default_library_dir)
    }

    /// Scratch directory for temporary files
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(storage::default_scratch_dir)
    }
}

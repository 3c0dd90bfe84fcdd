// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CameraBackendType, CaptureSettings};
use crate::constants::{self, http, scan};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Persistent scanner settings, stored as JSON in the user config dir
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// REST API root, e.g. `https://host/api`
    pub api_base_url: String,
    /// Camera backend to use (V4L2 or an image directory)
    pub backend: CameraBackendType,
    /// Directory served by the image-file backend
    pub image_dir: Option<PathBuf>,
    /// Last used camera device path
    pub last_camera_path: Option<String>,
    /// Event the scanner was last used for
    pub last_event_id: Option<String>,
    /// Frames sampled per second while scanning
    pub scan_fps: u32,
    /// Side of the centred detection window in pixels (0 = full frame)
    pub detection_window: u32,
    /// Per-request timeout for API calls
    pub request_timeout_secs: u64,
    /// Bearer token saved by `login`
    pub session_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: constants::DEFAULT_API_BASE_URL.to_string(),
            backend: CameraBackendType::default(), // V4L2
            image_dir: None,
            last_camera_path: None,
            last_event_id: None,
            scan_fps: scan::DEFAULT_FPS,
            detection_window: scan::DEFAULT_WINDOW_SIZE,
            request_timeout_secs: http::DEFAULT_TIMEOUT_SECS,
            session_token: None,
        }
    }
}

impl Config {
    /// Location of the config file, if the platform has a config dir
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::CONFIG_DIR_NAME)
                .join(constants::CONFIG_FILE_NAME)
        })
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory on this platform, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or unreadable file yields defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
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

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Storage(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Edit the config file at the default location
    pub fn update(edit: impl FnOnce(&mut Config)) -> AppResult<()> {
        let path = Self::path()
            .ok_or_else(|| AppError::Config("no config directory on this platform".to_string()))?;
        Self::update_at(&path, edit)
    }

    /// Re-read the file at `path`, apply `edit` and write it back
    ///
    /// Overrides applied to a running config (environment, flags) are not
    /// in the re-read copy, so they never reach disk.
    pub fn update_at(path: &Path, edit: impl FnOnce(&mut Config)) -> AppResult<()> {
        let mut stored = Self::load_from(path);
        edit(&mut stored);
        stored.save_to(path)
    }

    /// Apply `CHECKIN_API_URL` / `CHECKIN_TOKEN` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(constants::API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(url = %url, "API URL overridden from environment");
            self.api_base_url = url;
        }
        if let Some(token) = lookup(constants::TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.session_token = Some(token);
        }
    }

    /// Capture settings with out-of-range values clamped
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            fps: self.scan_fps.clamp(1, scan::MAX_FPS),
            window: self.detection_window,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Image directory, defaulting to `~/Pictures/checkin-tickets`
    pub fn image_dir_or_default(&self) -> PathBuf {
        self.image_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("checkin-tickets")
        })
    }
}

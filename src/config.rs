// SPDX-License-Identifier: GPL-3.0-only

//! Kiosk configuration
//!
//! Stored as JSON at `<config dir>/pixelbooth/config.json`. Every field has a
//! default, so a partial file (or none at all) yields a working booth.

use crate::app::state::CaptureMode;
use crate::backends::camera::types::StreamConstraints;
use crate::constants::{DEFAULT_COUNTDOWN_SECONDS, MAX_VIDEO_DURATION_SECS, PHOTO_JPEG_QUALITY};
use crate::errors::ConfigError;
use crate::pipelines::photo::burst_mode::BurstModeConfig;
use crate::pipelines::photo::overlay::Branding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Current on-disk format version
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Format version of the file this was loaded from
    pub version: u32,
    /// Seconds shown before a photo or burst fires
    pub countdown_seconds: u32,
    /// Stream requested in photo mode
    pub photo_constraints: StreamConstraints,
    /// Stream requested in gif and boomerang modes
    pub burst_constraints: StreamConstraints,
    /// Stream requested in video mode
    pub video_constraints: StreamConstraints,
    pub gif: BurstModeConfig,
    pub boomerang: BurstModeConfig,
    /// Recordings stop automatically after this many seconds
    pub max_video_secs: u64,
    /// JPEG quality for exported photos (1-100)
    pub jpeg_quality: u8,
    /// Where the local store writes artifacts
    pub output_dir: PathBuf,
    /// Event name printed in the watermark band
    pub event_name: Option<String>,
    /// Event identifier recorded in artifact metadata
    pub event_id: Option<String>,
    /// Logo drawn at the left of the watermark band
    pub logo_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            photo_constraints: StreamConstraints::photo(),
            burst_constraints: StreamConstraints::burst(),
            video_constraints: StreamConstraints::video(),
            gif: BurstModeConfig::gif(),
            boomerang: BurstModeConfig::boomerang(),
            max_video_secs: MAX_VIDEO_DURATION_SECS,
            jpeg_quality: PHOTO_JPEG_QUALITY,
            output_dir: default_output_dir(),
            event_name: None,
            event_id: None,
            logo_path: None,
        }
    }
}

/// `~/Pictures/pixelbooth`, falling back to the working directory
fn default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pixelbooth")
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pixelbooth").join("config.json"))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;

        if config.version > CONFIG_VERSION {
            warn!(
                path = %path.display(),
                version = config.version,
                supported = CONFIG_VERSION,
                "Config written by a newer version, unknown fields ignored"
            );
        }

        config.gif.validate().map_err(|e| ConfigError::Parse(format!("gif: {}", e)))?;
        config
            .boomerang
            .validate()
            .map_err(|e| ConfigError::Parse(format!("boomerang: {}", e)))?;

        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Load `path` (or the default location), falling back to defaults
    ///
    /// A missing file is normal on first start. A broken file is logged and
    /// replaced by defaults in memory; it is never overwritten.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Stream constraints for `mode`
    pub fn constraints_for(&self, mode: CaptureMode) -> StreamConstraints {
        match mode {
            CaptureMode::Photo => self.photo_constraints,
            CaptureMode::Video => self.video_constraints,
            CaptureMode::Gif | CaptureMode::Boomerang => self.burst_constraints,
        }
    }

    /// Burst profile for an animated mode
    pub fn burst_for(&self, mode: CaptureMode) -> Option<BurstModeConfig> {
        match mode {
            CaptureMode::Gif => Some(self.gif),
            CaptureMode::Boomerang => Some(self.boomerang),
            CaptureMode::Photo | CaptureMode::Video => None,
        }
    }

    pub fn max_video_duration(&self) -> Duration {
        Duration::from_secs(self.max_video_secs)
    }

    /// Branding for the watermark, decoding the logo if one is configured
    pub fn branding(&self) -> Result<Branding, ConfigError> {
        let logo = match &self.logo_path {
            Some(path) => {
                let logo = image::open(path)
                    .map_err(|e| ConfigError::Asset(format!("{}: {}", path.display(), e)))?
                    .to_rgba8();
                debug!(path = %path.display(), width = logo.width(), height = logo.height(), "Logo loaded");
                Some(Arc::new(logo))
            }
            None => None,
        };

        Ok(Branding {
            event_name: self.event_name.clone(),
            logo,
            event_id: self.event_id.clone(),
        })
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::errors::{CompositingError, DeviceError};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result type for device operations
pub type BackendResult<T> = Result<T, DeviceError>;

/// Which camera the stream should prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the guest
    #[default]
    User,
    /// Rear camera
    Environment,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What a live stream must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamConstraints {
    pub resolution: Resolution,
    pub facing: FacingMode,
    /// Microphone track required (video mode only)
    pub audio: bool,
}

impl StreamConstraints {
    /// Single photo capture: 720p, front camera, no audio
    pub const fn photo() -> Self {
        Self {
            resolution: Resolution::new(1280, 720),
            facing: FacingMode::User,
            audio: false,
        }
    }

    /// Burst capture: square source, front camera, no audio
    pub const fn burst() -> Self {
        Self {
            resolution: Resolution::new(640, 640),
            facing: FacingMode::User,
            audio: false,
        }
    }

    /// Video recording: 720p, front camera, with microphone
    pub const fn video() -> Self {
        Self {
            resolution: Resolution::new(1280, 720),
            facing: FacingMode::User,
            audio: true,
        }
    }
}

impl std::fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.resolution,
            self.facing,
            if self.audio { " +audio" } else { "" }
        )
    }
}

/// A single still frame pulled from a live stream
///
/// Pixel data is tightly packed RGBA (4 bytes per pixel, no row padding) and
/// shared via `Arc` so frames can be passed through the pipeline without copies.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// When the frame was pulled from the stream
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap raw RGBA bytes
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            captured_at: Instant::now(),
        }
    }

    /// Wrap an already decoded image
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }

    /// Number of bytes a well-formed frame of these dimensions carries
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Validate the frame and copy it into an [`RgbaImage`]
    pub fn to_image(&self) -> Result<RgbaImage, CompositingError> {
        if self.width == 0 || self.height == 0 {
            return Err(CompositingError::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }

        let expected = self.expected_len();
        if self.data.len() != expected {
            return Err(CompositingError::MalformedFrame {
                expected,
                actual: self.data.len(),
            });
        }

        RgbaImage::from_raw(self.width, self.height, self.data.to_vec()).ok_or(
            CompositingError::MalformedFrame {
                expected,
                actual: self.data.len(),
            },
        )
    }
}

/// Container blob produced by the platform recorder when a recording stops
#[derive(Debug, Clone)]
pub struct RecordedClip {
    pub data: Vec<u8>,
    /// MIME type of the container (e.g. "video/webm")
    pub mime: String,
    pub duration: Duration,
}

// SPDX-License-Identifier: GPL-3.0-only

//! Async photo pipeline
//!
//! This pipeline turns captured stills into finished artifacts:
//!
//! ```text
//! Live stream → Capture → Compositing → Encoding → MediaStore
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Capture**: Grab a still (or a timed burst) from the live stream
//! 2. **Compositing**: Filters, stickers and the watermark band (blocking pool)
//! 3. **Encoding**: JPEG for photos, looping GIF for bursts (blocking pool)
//!
//! Storage is handled by the session through [`crate::storage::MediaStore`].

pub mod burst_mode;
pub mod canvas;
pub mod capture;
pub mod compositor;
pub mod encoding;
pub mod overlay;
pub mod processing;
pub mod stickers;

pub use burst_mode::{BurstBuffer, BurstModeConfig, BurstProgress, BurstSampler};
pub use compositor::{CompositionRequest, render};
pub use encoding::{EncodedImage, EncodingFormat, PhotoEncoder, Playback};
pub use overlay::{Branding, Watermark};
pub use processing::{FilterControls, FilterField, FilterPreset, FilterSettings, PresetMarker};
pub use stickers::{StickerBoard, StickerColor, StickerGlyph, StickerPlacement};

use crate::errors::CompositingError;
use image::RgbaImage;
use std::time::Duration;

/// Compositing plus encoding
///
/// Orchestrates the compose → encode workflow for photos and bursts.
#[derive(Debug, Clone, Default)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    /// Create a new photo pipeline with default settings
    pub fn new() -> Self {
        Self {
            encoder: PhotoEncoder::new(),
        }
    }

    /// Create a pipeline with a specific JPEG quality
    pub fn with_quality(quality: u8) -> Self {
        let mut encoder = PhotoEncoder::new();
        encoder.set_quality(quality);
        Self { encoder }
    }

    /// Render every layer for review
    pub async fn compose(&self, request: CompositionRequest) -> Result<RgbaImage, CompositingError> {
        compositor::render_async(request).await
    }

    /// Encode a reviewed photo for export
    pub async fn encode_photo(&self, image: RgbaImage) -> Result<EncodedImage, CompositingError> {
        self.encoder.encode_jpeg(image).await
    }

    /// Compose and encode in one pass
    ///
    /// Same as calling [`PhotoPipeline::compose`] then
    /// [`PhotoPipeline::encode_photo`], with a progress callback at each stage.
    pub async fn compose_and_encode_with_progress<F>(
        &self,
        request: CompositionRequest,
        mut progress: F,
    ) -> Result<EncodedImage, CompositingError>
    where
        F: FnMut(f32) + Send,
    {
        progress(0.0);

        let composed = self.compose(request).await?;
        progress(0.5);

        let encoded = self.encode_photo(composed).await?;
        progress(1.0);

        Ok(encoded)
    }

    /// Encode a finished burst as a looping GIF
    pub async fn encode_burst(
        &self,
        buffer: BurstBuffer,
        frame_delay: Duration,
        playback: Playback,
    ) -> Result<EncodedImage, CompositingError> {
        self.encoder
            .encode_animation(buffer.into_frames(), frame_delay, playback)
            .await
    }

    /// Update JPEG quality
    pub fn set_quality(&mut self, quality: u8) {
        self.encoder.set_quality(quality);
    }
}

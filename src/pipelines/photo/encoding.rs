// SPDX-License-Identifier: GPL-3.0-only

//! Async artifact encoding
//!
//! This module handles encoding composited images and burst buffers:
//! - JPEG (with quality control) for photos
//! - Looping animated GIF for gif and boomerang bursts
//!
//! All encoding operations run on the blocking pool to avoid stalling timers.

use crate::constants::{GIF_ENCODER_SPEED, PHOTO_JPEG_QUALITY};
use crate::errors::CompositingError;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, RgbaImage};
use std::time::Duration;
use tracing::{debug, info};

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    Jpeg,
    /// Animated GIF (palette, looping)
    Gif,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Gif => "gif",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Gif => "image/gif",
        }
    }
}

/// Frame order for animated exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Frames in capture order
    Forward,
    /// Forward, then back again without repeating the first or last frame
    Boomerang,
}

impl Playback {
    /// Indices into a burst of `len` frames, in display order
    pub fn order(&self, len: usize) -> Vec<usize> {
        match self {
            Playback::Forward => (0..len).collect(),
            Playback::Boomerang => {
                let mut order: Vec<usize> = (0..len).collect();
                if len > 2 {
                    order.extend((1..len - 1).rev());
                }
                order
            }
        }
    }
}

/// Encoded image data ready for the store
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

/// Photo and animation encoder
#[derive(Debug, Clone)]
pub struct PhotoEncoder {
    quality: u8,
}

impl PhotoEncoder {
    /// Create an encoder with the default photo quality
    pub fn new() -> Self {
        Self {
            quality: PHOTO_JPEG_QUALITY,
        }
    }

    /// Set JPEG quality (1-100)
    pub fn set_quality(&mut self, quality: u8) {
        self.quality = quality.clamp(1, 100);
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a composited photo as JPEG on the blocking pool
    pub async fn encode_jpeg(&self, image: RgbaImage) -> Result<EncodedImage, CompositingError> {
        info!(
            width = image.width(),
            height = image.height(),
            quality = self.quality,
            "Starting JPEG encoding"
        );

        let quality = self.quality;
        tokio::task::spawn_blocking(move || {
            let (width, height) = image.dimensions();
            let data = encode_jpeg(image, quality)?;
            debug!(size = data.len(), "Encoding complete");
            Ok(EncodedImage {
                data,
                format: EncodingFormat::Jpeg,
                width,
                height,
            })
        })
        .await
        .map_err(|e| CompositingError::Task(format!("Encoding task error: {}", e)))?
    }

    /// Encode a burst as a looping animated GIF on the blocking pool
    ///
    /// Every frame is shown for `frame_delay`.
    pub async fn encode_animation(
        &self,
        frames: Vec<RgbaImage>,
        frame_delay: Duration,
        playback: Playback,
    ) -> Result<EncodedImage, CompositingError> {
        let Some(first) = frames.first() else {
            return Err(CompositingError::EmptyFrame {
                width: 0,
                height: 0,
            });
        };
        let (width, height) = first.dimensions();
        if let Some(odd) = frames.iter().find(|f| f.dimensions() != (width, height)) {
            return Err(CompositingError::Encoding(format!(
                "Burst frames differ in size: {}x{} vs {}x{}",
                width,
                height,
                odd.width(),
                odd.height()
            )));
        }

        info!(
            frames = frames.len(),
            width,
            height,
            delay_ms = frame_delay.as_millis() as u64,
            playback = ?playback,
            "Starting GIF encoding"
        );

        tokio::task::spawn_blocking(move || {
            let data = encode_gif(&frames, frame_delay, playback)?;
            debug!(size = data.len(), "Encoding complete");
            Ok(EncodedImage {
                data,
                format: EncodingFormat::Gif,
                width,
                height,
            })
        })
        .await
        .map_err(|e| CompositingError::Task(format!("Encoding task error: {}", e)))?
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode image as baseline JPEG (alpha dropped)
fn encode_jpeg(image: RgbaImage, quality: u8) -> Result<Vec<u8>, CompositingError> {
    let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
    let mut buffer = Vec::new();

    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CompositingError::Encoding(format!("JPEG encoding failed: {}", e)))?;

    Ok(buffer)
}

fn encode_gif(
    frames: &[RgbaImage],
    frame_delay: Duration,
    playback: Playback,
) -> Result<Vec<u8>, CompositingError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buffer, GIF_ENCODER_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| CompositingError::Encoding(format!("GIF encoding failed: {}", e)))?;

        let delay = Delay::from_saturating_duration(frame_delay);
        for index in playback.order(frames.len()) {
            let frame = Frame::from_parts(frames[index].clone(), 0, 0, delay);
            encoder
                .encode_frame(frame)
                .map_err(|e| CompositingError::Encoding(format!("GIF encoding failed: {}", e)))?;
        }
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, Rgba};
    use std::io::Cursor;

    #[test]
    fn test_format_extensions() {
        assert_eq!(EncodingFormat::Jpeg.extension(), "jpg");
        assert_eq!(EncodingFormat::Gif.extension(), "gif");
        assert_eq!(EncodingFormat::Gif.mime(), "image/gif");
    }

    #[test]
    fn test_boomerang_order() {
        assert_eq!(
            Playback::Boomerang.order(8),
            vec![0, 1, 2, 3, 4, 5, 6, 7, 6, 5, 4, 3, 2, 1]
        );
        assert_eq!(Playback::Boomerang.order(2), vec![0, 1]);
        assert_eq!(Playback::Forward.order(4), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_jpeg_has_markers() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 255]));
        let encoded = PhotoEncoder::new().encode_jpeg(image).await.unwrap();
        assert!(encoded.data.starts_with(&[0xFF, 0xD8]));
        assert!(encoded.data.ends_with(&[0xFF, 0xD9]));
        assert_eq!((encoded.width, encoded.height), (16, 16));
    }

    #[tokio::test]
    async fn test_gif_frame_count_and_delay() {
        let frames: Vec<RgbaImage> = (0..4)
            .map(|i| RgbaImage::from_pixel(8, 8, Rgba([i * 60, 0, 0, 255])))
            .collect();
        let encoded = PhotoEncoder::new()
            .encode_animation(frames, Duration::from_millis(200), Playback::Boomerang)
            .await
            .unwrap();
        assert!(encoded.data.starts_with(b"GIF89a"));

        let decoded = GifDecoder::new(Cursor::new(encoded.data))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(decoded.len(), 6);
        let (num, den) = decoded[0].delay().numer_denom_ms();
        assert_eq!(num / den, 200);
    }

    #[tokio::test]
    async fn test_empty_burst_is_rejected() {
        let result = PhotoEncoder::new()
            .encode_animation(Vec::new(), Duration::from_millis(800), Playback::Forward)
            .await;
        assert!(matches!(result, Err(CompositingError::EmptyFrame { .. })));
    }
}

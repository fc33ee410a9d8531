// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources for the virtual camera
//!
//! Provides the synthetic test pattern and still-image sources the virtual
//! camera streams from.

use crate::backends::camera::types::{BackendResult, Resolution};
use crate::errors::DeviceError;
use crate::pipelines::photo::capture::fit_cover;
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// What the virtual camera shows
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Gradient with a bar that moves one step per frame
    TestPattern,
    /// A still image, cover-fitted to the requested resolution
    Image(Arc<RgbaImage>),
}

/// Load an image file as a virtual camera source
pub fn load_image_source(path: &Path) -> BackendResult<FrameSource> {
    info!(path = %path.display(), "Loading image file");

    if !path.exists() {
        return Err(DeviceError::NotFound(path.display().to_string()));
    }

    let img = image::open(path).map_err(|e| {
        DeviceError::Backend(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    info!(width = rgba.width(), height = rgba.height(), "Image loaded successfully");

    Ok(FrameSource::Image(Arc::new(rgba)))
}

/// Render the gradient test pattern for frame `index`
///
/// Red follows x, green follows y, and a white bar one sixteenth of the width
/// wide steps right with each frame so consecutive frames differ.
pub fn render_test_pattern(resolution: Resolution, index: u64) -> RgbaImage {
    let Resolution { width, height } = resolution;
    let bar_width = (width / 16).max(1);
    let steps = (width / bar_width).max(1) as u64;
    let bar_x = ((index % steps) as u32) * bar_width;

    RgbaImage::from_fn(width, height, |x, y| {
        if x >= bar_x && x < bar_x + bar_width {
            return Rgba([255, 255, 255, 255]);
        }
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgba([r, g, 128, 255])
    })
}

/// Render `source` at `resolution`
pub fn render_source(source: &FrameSource, resolution: Resolution, index: u64) -> RgbaImage {
    match source {
        FrameSource::TestPattern => render_test_pattern(resolution, index),
        FrameSource::Image(image) => fit_cover(image, resolution.width, resolution.height),
    }
}

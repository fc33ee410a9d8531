// SPDX-License-Identifier: GPL-3.0-only

//! Still capture from a live stream
//!
//! This module grabs a single frame from the live stream without pausing it,
//! and rasterizes frames onto fixed-size canvases for burst capture.

use crate::backends::camera::LiveStream;
use crate::backends::camera::types::CameraFrame;
use crate::errors::{CompositingError, DeviceError};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::{debug, info};

/// Photo capture handler
///
/// Responsible for grabbing a single frame from the live stream
/// without interrupting the preview.
pub struct PhotoCapture;

impl PhotoCapture {
    /// Capture a still at the stream's native resolution
    ///
    /// # Returns
    /// * `Ok(CameraFrame)` - The current stream content
    /// * `Err(DeviceError)` - The stream is no longer delivering frames
    pub fn capture_still<S: LiveStream + ?Sized>(stream: &S) -> Result<CameraFrame, DeviceError> {
        info!(device = %stream.device_id(), "Capturing still from live stream");

        let frame = stream.snapshot()?;

        debug!(
            width = frame.width,
            height = frame.height,
            "Frame captured from stream"
        );

        Ok(frame)
    }
}

/// Center-crop `image` to the aspect ratio of `width`x`height`, then scale it
///
/// Returns the image unchanged when it already has the target dimensions.
pub fn fit_cover(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (src_w, src_h) = image.dimensions();
    if (src_w, src_h) == (width, height) {
        return image.clone();
    }

    // Compare aspect ratios without floating point: src_w/src_h vs width/height
    let (crop_w, crop_h) = if src_w as u64 * height as u64 > width as u64 * src_h as u64 {
        ((src_h as u64 * width as u64 / height as u64) as u32, src_h)
    } else {
        (src_w, (src_w as u64 * height as u64 / width as u64) as u32)
    };
    let crop_w = crop_w.clamp(1, src_w);
    let crop_h = crop_h.clamp(1, src_h);
    let x = (src_w - crop_w) / 2;
    let y = (src_h - crop_h) / 2;

    let cropped = imageops::crop_imm(image, x, y, crop_w, crop_h).to_image();
    if (crop_w, crop_h) == (width, height) {
        return cropped;
    }
    imageops::resize(&cropped, width, height, FilterType::Triangle)
}

/// Draw `frame` onto a `width`x`height` canvas, filling it edge to edge
pub fn rasterize(frame: &CameraFrame, width: u32, height: u32) -> Result<RgbaImage, CompositingError> {
    if width == 0 || height == 0 {
        return Err(CompositingError::EmptyFrame { width, height });
    }
    let image = frame.to_image()?;
    Ok(fit_cover(&image, width, height))
}

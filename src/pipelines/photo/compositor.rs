// SPDX-License-Identifier: GPL-3.0-only

//! Layer compositing for captured stills
//!
//! ```text
//! Raw still → Filters → Stickers (id order) → Watermark band
//! ```
//!
//! [`render`] is a pure function of its inputs: the same frame, settings,
//! stickers and watermark always produce the same pixels.

use super::canvas::Canvas;
use super::overlay::{Watermark, draw_watermark};
use super::processing::{FilterSettings, apply_filters};
use super::stickers::{StickerPlacement, draw_stickers};
use crate::backends::camera::types::CameraFrame;
use crate::errors::CompositingError;
use image::RgbaImage;
use std::sync::Arc;
use tracing::{debug, info};

/// Inputs for one compositing pass
#[derive(Debug, Clone)]
pub struct CompositionRequest {
    pub frame: Arc<CameraFrame>,
    pub filters: FilterSettings,
    pub stickers: Vec<StickerPlacement>,
    pub watermark: Watermark,
}

/// Composite every layer onto `frame`
///
/// # Returns
/// * `Ok(RgbaImage)` - Image at the frame's native dimensions
/// * `Err(CompositingError)` - The frame is empty, its buffer is malformed,
///   or it is too large for the overlay canvas
pub fn render(
    frame: &CameraFrame,
    filters: &FilterSettings,
    stickers: &[StickerPlacement],
    watermark: &Watermark,
) -> Result<RgbaImage, CompositingError> {
    let image = frame.to_image()?;

    let filtered = apply_filters(image, filters);
    let (width, height) = filtered.dimensions();

    let mut canvas = Canvas::new(&filtered)?;
    draw_stickers(&mut canvas, stickers);
    draw_watermark(&mut canvas, width, height, watermark)?;
    let image = canvas.finish();

    debug!(
        width = image.width(),
        height = image.height(),
        stickers = stickers.len(),
        "Composition rendered"
    );
    Ok(image)
}

/// Run [`render`] on the blocking pool
pub async fn render_async(request: CompositionRequest) -> Result<RgbaImage, CompositingError> {
    info!(
        width = request.frame.width,
        height = request.frame.height,
        filters = %request.filters.to_css(),
        stickers = request.stickers.len(),
        "Starting composition"
    );

    tokio::task::spawn_blocking(move || {
        render(
            &request.frame,
            &request.filters,
            &request.stickers,
            &request.watermark,
        )
    })
    .await
    .map_err(|e| CompositingError::Task(e.to_string()))?
}

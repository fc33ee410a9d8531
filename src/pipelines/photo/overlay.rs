// SPDX-License-Identifier: GPL-3.0-only

//! Branding watermark
//!
//! Draws the bottom band with the event title, the capture timestamp and an
//! optional logo onto a [`Canvas`].

use super::canvas::{Canvas, TextShaper};
use crate::constants::{
    DEFAULT_BRANDING_TEXT, WATERMARK_BAND_HEIGHT, WATERMARK_BAND_OPACITY, WATERMARK_LOGO_INSET,
    WATERMARK_LOGO_SIZE, WATERMARK_TIMESTAMP_FONT_SIZE, WATERMARK_TIMESTAMP_FORMAT,
    WATERMARK_TIMESTAMP_MARGIN_BOTTOM, WATERMARK_TIMESTAMP_MARGIN_RIGHT,
    WATERMARK_TIMESTAMP_OPACITY, WATERMARK_TITLE_FONT_SIZE, WATERMARK_TITLE_MIN_FONT_SIZE,
};
use crate::errors::CompositingError;
use chrono::NaiveDateTime;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::Rect;
use std::sync::Arc;

const TITLE_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Event branding shown on every exported photo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branding {
    pub event_name: Option<String>,
    pub logo: Option<Arc<RgbaImage>>,
    pub event_id: Option<String>,
}

impl Branding {
    /// Text for the band: the event name, or the product name when unset
    pub fn title(&self) -> &str {
        self.event_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_BRANDING_TEXT)
    }
}

/// Everything the watermark layer draws
///
/// The timestamp is the capture time, passed in so rendering is repeatable.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub branding: Branding,
    pub timestamp: NaiveDateTime,
}

impl Watermark {
    pub fn new(branding: Branding, timestamp: NaiveDateTime) -> Self {
        Self {
            branding,
            timestamp,
        }
    }

    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(WATERMARK_TIMESTAMP_FORMAT).to_string()
    }
}

fn alpha(opacity: f32) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Draw the watermark layer onto a `width`x`height` canvas
pub fn draw_watermark(
    canvas: &mut Canvas,
    width: u32,
    height: u32,
    watermark: &Watermark,
) -> Result<(), CompositingError> {
    let (w, h) = (f64::from(width), f64::from(height));
    let band_top = (h - f64::from(WATERMARK_BAND_HEIGHT)).max(0.0);
    canvas.fill_rect(
        Rect::new(0.0, band_top, w, h),
        [0, 0, 0, alpha(WATERMARK_BAND_OPACITY)],
    );

    if let Some(logo) = &watermark.branding.logo {
        draw_logo(canvas, logo, band_top, h)?;
    }

    let mut shaper = TextShaper::new()?;

    // Title centered in the band, shrunk to fit narrow frames
    let max_title_width = (w - 2.0 * f64::from(WATERMARK_LOGO_INSET)).max(0.0);
    let title = fit_title(&mut shaper, watermark.branding.title(), max_title_width);
    let band_center = band_top + (h - band_top) / 2.0;
    canvas.draw_text(
        &shaper,
        &title,
        ((w - title.width()) / 2.0).round(),
        (band_center - title.height() / 2.0).round(),
    );

    // Timestamp right-aligned, bottom-anchored
    let stamp = shaper.layout(
        &watermark.timestamp_text(),
        WATERMARK_TIMESTAMP_FONT_SIZE,
        [255, 255, 255, alpha(WATERMARK_TIMESTAMP_OPACITY)],
    );
    canvas.draw_text(
        &shaper,
        &stamp,
        (w - f64::from(WATERMARK_TIMESTAMP_MARGIN_RIGHT) - stamp.width()).round(),
        (h - f64::from(WATERMARK_TIMESTAMP_MARGIN_BOTTOM) - stamp.height()).round(),
    );
    Ok(())
}

fn draw_logo(
    canvas: &mut Canvas,
    logo: &RgbaImage,
    band_top: f64,
    height: f64,
) -> Result<(), CompositingError> {
    let (lw, lh) = logo.dimensions();
    if lw == 0 || lh == 0 {
        return Ok(());
    }

    // Contain within the logo box, preserving aspect
    let box_size = WATERMARK_LOGO_SIZE as f32;
    let ratio = (box_size / lw as f32).min(box_size / lh as f32);
    let w = ((lw as f32 * ratio).round() as u32).max(1);
    let h = ((lh as f32 * ratio).round() as u32).max(1);
    let scaled = imageops::resize(logo, w, h, FilterType::Triangle);

    let x = f64::from(WATERMARK_LOGO_INSET + (WATERMARK_LOGO_SIZE - w) / 2);
    let y = (band_top + (height - band_top - f64::from(h)) / 2.0).round();
    canvas.draw_image(&scaled, x, y)
}

/// Largest title size (down to the minimum) that fits, then truncate
fn fit_title(shaper: &mut TextShaper, text: &str, max_width: f64) -> super::canvas::TextLayout {
    let mut size = WATERMARK_TITLE_FONT_SIZE;
    let mut layout = shaper.layout(text, size, TITLE_COLOR);
    while layout.width() > max_width && size > WATERMARK_TITLE_MIN_FONT_SIZE {
        size = (size - 1.0).max(WATERMARK_TITLE_MIN_FONT_SIZE);
        layout = shaper.layout(text, size, TITLE_COLOR);
    }

    let mut chars: Vec<char> = text.chars().collect();
    while layout.width() > max_width && !chars.is_empty() {
        chars.pop();
        let truncated: String = chars.iter().collect();
        layout = shaper.layout(&truncated, size, TITLE_COLOR);
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::Rgba;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .and_then(|d| d.and_hms_opt(15, 4, 5))
            .unwrap()
    }

    fn watermarked(base: RgbaImage, watermark: &Watermark) -> RgbaImage {
        let (w, h) = base.dimensions();
        let mut canvas = Canvas::new(&base).unwrap();
        draw_watermark(&mut canvas, w, h, watermark).unwrap();
        canvas.finish()
    }

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
    }

    #[test]
    fn test_default_title() {
        assert_eq!(Branding::default().title(), DEFAULT_BRANDING_TEXT);
        let blank = Branding {
            event_name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.title(), DEFAULT_BRANDING_TEXT);
    }

    #[test]
    fn test_timestamp_format() {
        let mark = Watermark::new(Branding::default(), sample_time());
        assert_eq!(mark.timestamp_text(), "10/17/2026, 3:04:05 PM");
    }

    #[test]
    fn test_band_darkens_bottom_only() {
        let base = RgbaImage::from_pixel(400, 200, Rgba([200, 200, 200, 255]));
        let out = watermarked(base, &Watermark::new(Branding::default(), sample_time()));

        // Above the band: untouched
        assert!(close(out.get_pixel(5, 5).0, [200, 200, 200, 255]));
        // Band corner away from text: 30% of the original
        assert!(close(out.get_pixel(1, 121).0, [60, 60, 60, 255]));
        // Title glyphs are painted white
        let bright = (120..200)
            .flat_map(|y| (0..400).map(move |x| (x, y)))
            .filter(|&(x, y)| out.get_pixel(x, y).0[0] >= 240)
            .count();
        assert!(bright > 0);
    }

    #[test]
    fn test_title_changes_band_pixels() {
        let base = RgbaImage::from_pixel(400, 200, Rgba([200, 200, 200, 255]));
        let named = Branding {
            event_name: Some("Ada & Grace".into()),
            ..Default::default()
        };
        let a = watermarked(base.clone(), &Watermark::new(Branding::default(), sample_time()));
        let b = watermarked(base, &Watermark::new(named, sample_time()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_logo_drawn_in_band() {
        let logo = Arc::new(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let branding = Branding {
            logo: Some(logo),
            ..Default::default()
        };
        let base = RgbaImage::from_pixel(400, 200, Rgba([0, 0, 0, 255]));
        let out = watermarked(base, &Watermark::new(branding, sample_time()));
        // Logo box spans x 20..76, centered vertically in the band (120..200)
        assert!(close(out.get_pixel(48, 160).0, [255, 0, 0, 255]));
    }

    #[test]
    fn test_tiny_frame_does_not_panic() {
        let base = RgbaImage::from_pixel(3, 2, Rgba([10, 10, 10, 255]));
        let out = watermarked(base, &Watermark::new(Branding::default(), sample_time()));
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn test_fit_title_shrinks_then_truncates() {
        let mut shaper = TextShaper::new().unwrap();
        let text = "A very long event name for a tiny frame";

        let full = shaper.layout(text, WATERMARK_TITLE_FONT_SIZE, TITLE_COLOR);
        let roomy = fit_title(&mut shaper, text, full.width() + 1.0);
        assert_eq!(roomy.width(), full.width());

        let narrow = fit_title(&mut shaper, text, 60.0);
        assert!(narrow.width() <= 60.0);
        assert!(narrow.width() > 0.0);
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Filter adjustments for captured photos
//!
//! This module owns the operator's filter panel state and applies it to
//! RGBA pixels:
//! - Brightness/contrast/saturation adjustments
//! - Sepia and grayscale toning
//! - Gaussian blur
//!
//! The math follows CSS filter-effects so the exported photo matches the
//! live preview, which is styled with a CSS `filter:` string.

use crate::constants::MAX_BLUR_PX;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

/// One adjustable filter parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Brightness,
    Contrast,
    Saturation,
    Sepia,
    Grayscale,
    Blur,
}

impl FilterField {
    pub const ALL: [FilterField; 6] = [
        FilterField::Brightness,
        FilterField::Contrast,
        FilterField::Saturation,
        FilterField::Sepia,
        FilterField::Grayscale,
        FilterField::Blur,
    ];

    /// Accepted range (percent, or pixels for blur)
    pub fn range(&self) -> RangeInclusive<f32> {
        match self {
            FilterField::Brightness => 50.0..=150.0,
            FilterField::Contrast => 50.0..=200.0,
            FilterField::Saturation => 0.0..=200.0,
            FilterField::Sepia => 0.0..=100.0,
            FilterField::Grayscale => 0.0..=100.0,
            FilterField::Blur => 0.0..=MAX_BLUR_PX,
        }
    }

    /// Value that leaves the image unchanged
    pub fn neutral(&self) -> f32 {
        match self {
            FilterField::Brightness | FilterField::Contrast | FilterField::Saturation => 100.0,
            FilterField::Sepia | FilterField::Grayscale | FilterField::Blur => 0.0,
        }
    }

    /// Clamp `value` into range; non-finite values become neutral
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.neutral();
        }
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }
}

/// Filter panel values
///
/// Percentages for the color adjustments, pixels for blur. Construct through
/// [`FilterSettings::clamped`] or [`FilterControls`] to keep values in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sepia: f32,
    pub grayscale: f32,
    pub blur: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl FilterSettings {
    pub const NEUTRAL: FilterSettings = FilterSettings {
        brightness: 100.0,
        contrast: 100.0,
        saturation: 100.0,
        sepia: 0.0,
        grayscale: 0.0,
        blur: 0.0,
    };

    /// Build settings, clamping each value independently
    pub fn clamped(
        brightness: f32,
        contrast: f32,
        saturation: f32,
        sepia: f32,
        grayscale: f32,
        blur: f32,
    ) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            sepia,
            grayscale,
            blur,
        }
        .clamp()
    }

    /// Copy with every value clamped into range
    pub fn clamp(mut self) -> Self {
        for field in FilterField::ALL {
            let value = self.get(field);
            self.set_raw(field, field.clamp(value));
        }
        self
    }

    pub fn get(&self, field: FilterField) -> f32 {
        match field {
            FilterField::Brightness => self.brightness,
            FilterField::Contrast => self.contrast,
            FilterField::Saturation => self.saturation,
            FilterField::Sepia => self.sepia,
            FilterField::Grayscale => self.grayscale,
            FilterField::Blur => self.blur,
        }
    }

    fn set_raw(&mut self, field: FilterField, value: f32) {
        match field {
            FilterField::Brightness => self.brightness = value,
            FilterField::Contrast => self.contrast = value,
            FilterField::Saturation => self.saturation = value,
            FilterField::Sepia => self.sepia = value,
            FilterField::Grayscale => self.grayscale = value,
            FilterField::Blur => self.blur = value,
        }
    }

    /// Set one value, clamped
    pub fn set(&mut self, field: FilterField, value: f32) {
        self.set_raw(field, field.clamp(value));
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// CSS `filter:` string for the live preview
    pub fn to_css(&self) -> String {
        format!(
            "brightness({}%) contrast({}%) saturate({}%) sepia({}%) grayscale({}%) blur({}px)",
            self.brightness, self.contrast, self.saturation, self.sepia, self.grayscale, self.blur
        )
    }
}

/// Named filter presets offered on the review screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPreset {
    #[serde(alias = "none")]
    Original,
    Vintage,
    #[serde(rename = "bw")]
    BlackAndWhite,
    Warm,
    Cool,
    Dramatic,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 6] = [
        FilterPreset::Original,
        FilterPreset::Vintage,
        FilterPreset::BlackAndWhite,
        FilterPreset::Warm,
        FilterPreset::Cool,
        FilterPreset::Dramatic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterPreset::Original => "Original",
            FilterPreset::Vintage => "Vintage",
            FilterPreset::BlackAndWhite => "B&W",
            FilterPreset::Warm => "Warm",
            FilterPreset::Cool => "Cool",
            FilterPreset::Dramatic => "Dramatic",
        }
    }

    pub fn settings(&self) -> FilterSettings {
        let (brightness, contrast, saturation, sepia, grayscale) = match self {
            FilterPreset::Original => (100.0, 100.0, 100.0, 0.0, 0.0),
            FilterPreset::Vintage => (110.0, 120.0, 80.0, 30.0, 0.0),
            FilterPreset::BlackAndWhite => (100.0, 110.0, 0.0, 0.0, 100.0),
            FilterPreset::Warm => (105.0, 105.0, 120.0, 20.0, 0.0),
            FilterPreset::Cool => (95.0, 110.0, 90.0, 0.0, 0.0),
            FilterPreset::Dramatic => (90.0, 140.0, 110.0, 0.0, 0.0),
        };
        FilterSettings {
            brightness,
            contrast,
            saturation,
            sepia,
            grayscale,
            blur: 0.0,
        }
    }

    /// Look up a preset by label or serde name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|preset| {
            preset.label().eq_ignore_ascii_case(name)
                || (*preset == FilterPreset::Original && name.eq_ignore_ascii_case("none"))
                || serde_json::to_value(preset)
                    .ok()
                    .and_then(|v| v.as_str().map(|s| s.eq_ignore_ascii_case(name)))
                    .unwrap_or(false)
        })
    }
}

/// Which preset the panel highlights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetMarker {
    Preset(FilterPreset),
    /// A slider was moved after the last preset selection
    Custom,
}

/// Filter panel state: current values plus the active preset marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterControls {
    settings: FilterSettings,
    active: PresetMarker,
}

impl Default for FilterControls {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterControls {
    pub fn new() -> Self {
        Self {
            settings: FilterSettings::NEUTRAL,
            active: PresetMarker::Preset(FilterPreset::Original),
        }
    }

    pub fn settings(&self) -> FilterSettings {
        self.settings
    }

    pub fn active(&self) -> PresetMarker {
        self.active
    }

    /// Replace every value with the preset's and mark it active
    pub fn apply_preset(&mut self, preset: FilterPreset) {
        debug!(preset = preset.label(), "Applying filter preset");
        self.settings = preset.settings();
        self.active = PresetMarker::Preset(preset);
    }

    /// Manual slider edit; the marker becomes [`PresetMarker::Custom`]
    pub fn set(&mut self, field: FilterField, value: f32) {
        self.settings.set(field, value);
        self.active = PresetMarker::Custom;
    }

    /// Back to the Original preset
    pub fn reset(&mut self) {
        self.apply_preset(FilterPreset::Original);
    }
}

/// Luma-weighted 3x3 color matrix, row-major
type ColorMatrix = [[f32; 3]; 3];

fn saturate_matrix(s: f32) -> ColorMatrix {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn sepia_matrix(amount: f32) -> ColorMatrix {
    let k = 1.0 - amount;
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}

fn grayscale_matrix(amount: f32) -> ColorMatrix {
    let k = 1.0 - amount;
    [
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ]
}

fn apply_matrix(m: &ColorMatrix, c: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (row, value) in m.iter().zip(out.iter_mut()) {
        *value = (row[0] * c[0] + row[1] * c[1] + row[2] * c[2]).clamp(0.0, 1.0);
    }
    out
}

/// Apply `settings` to `image`
///
/// Steps run in CSS order (brightness, contrast, saturation, sepia,
/// grayscale, blur) with every channel clamped to [0, 1] after each step.
/// Neutral steps are skipped, so neutral settings return the input unchanged.
pub fn apply_filters(mut image: RgbaImage, settings: &FilterSettings) -> RgbaImage {
    let settings = settings.clamp();
    if settings.is_neutral() {
        return image;
    }

    let brightness = settings.brightness / 100.0;
    let contrast = settings.contrast / 100.0;
    let mut matrices: Vec<ColorMatrix> = Vec::with_capacity(3);
    if settings.saturation != 100.0 {
        matrices.push(saturate_matrix(settings.saturation / 100.0));
    }
    if settings.sepia > 0.0 {
        matrices.push(sepia_matrix(settings.sepia / 100.0));
    }
    if settings.grayscale > 0.0 {
        matrices.push(grayscale_matrix(settings.grayscale / 100.0));
    }

    let color_steps = brightness != 1.0 || contrast != 1.0 || !matrices.is_empty();
    if color_steps {
        for pixel in image.pixels_mut() {
            let mut c = [
                pixel[0] as f32 / 255.0,
                pixel[1] as f32 / 255.0,
                pixel[2] as f32 / 255.0,
            ];

            if brightness != 1.0 {
                c = c.map(|v| (v * brightness).clamp(0.0, 1.0));
            }
            if contrast != 1.0 {
                c = c.map(|v| ((v - 0.5) * contrast + 0.5).clamp(0.0, 1.0));
            }
            for m in &matrices {
                c = apply_matrix(m, c);
            }

            pixel[0] = (c[0] * 255.0).round() as u8;
            pixel[1] = (c[1] * 255.0).round() as u8;
            pixel[2] = (c[2] * 255.0).round() as u8;
        }
    }

    if settings.blur > 0.0 {
        // CSS blur radius is the Gaussian standard deviation
        image = image::imageops::blur(&image, settings.blur);
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_clamp_is_idempotent() {
        let wild = FilterSettings {
            brightness: 400.0,
            contrast: -3.0,
            saturation: f32::NAN,
            sepia: 55.5,
            grayscale: f32::INFINITY,
            blur: 99.0,
        };
        let once = wild.clamp();
        assert_eq!(once, once.clamp());
        assert_eq!(once.brightness, 150.0);
        assert_eq!(once.contrast, 50.0);
        assert_eq!(once.saturation, 100.0);
        assert_eq!(once.sepia, 55.5);
        assert_eq!(once.grayscale, 0.0);
        assert_eq!(once.blur, MAX_BLUR_PX);
    }

    #[test]
    fn test_manual_edit_marks_custom() {
        let mut controls = FilterControls::new();
        controls.apply_preset(FilterPreset::Vintage);
        assert_eq!(controls.active(), PresetMarker::Preset(FilterPreset::Vintage));
        assert_eq!(controls.settings().sepia, 30.0);

        controls.set(FilterField::Brightness, 120.0);
        assert_eq!(controls.active(), PresetMarker::Custom);
        assert_eq!(controls.settings().sepia, 30.0);

        controls.reset();
        assert_eq!(controls.settings(), FilterSettings::NEUTRAL);
        assert_eq!(controls.active(), PresetMarker::Preset(FilterPreset::Original));
    }

    #[test]
    fn test_presets_are_in_range() {
        for preset in FilterPreset::ALL {
            assert_eq!(preset.settings(), preset.settings().clamp(), "{}", preset.label());
        }
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(FilterPreset::from_name("b&w"), Some(FilterPreset::BlackAndWhite));
        assert_eq!(FilterPreset::from_name("bw"), Some(FilterPreset::BlackAndWhite));
        assert_eq!(FilterPreset::from_name("Dramatic"), Some(FilterPreset::Dramatic));
        assert_eq!(FilterPreset::from_name("neon"), None);
        assert_eq!(FilterPreset::from_name("none"), Some(FilterPreset::Original));
    }

    #[test]
    fn test_neutral_preset_reads_legacy_name() {
        let legacy: FilterPreset = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(legacy, FilterPreset::Original);
        let current: FilterPreset = serde_json::from_str("\"original\"").unwrap();
        assert_eq!(current, FilterPreset::Original);
        assert_eq!(serde_json::to_string(&legacy).unwrap(), "\"original\"");
    }

    #[test]
    fn test_neutral_filters_are_identity() {
        let image = RgbaImage::from_fn(8, 8, |x, y| Rgba([x as u8 * 30, y as u8 * 30, 77, 255]));
        assert_eq!(apply_filters(image.clone(), &FilterSettings::NEUTRAL), image);
    }

    #[test]
    fn test_full_grayscale_equalizes_channels() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([200, 40, 90, 255]));
        let mut settings = FilterSettings::NEUTRAL;
        settings.set(FilterField::Grayscale, 100.0);
        let out = apply_filters(image, &settings);
        let p = out.get_pixel(0, 0);
        assert!(p[0].abs_diff(p[1]) <= 1 && p[1].abs_diff(p[2]) <= 1);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_brightness_scales_channels() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let mut settings = FilterSettings::NEUTRAL;
        settings.set(FilterField::Brightness, 150.0);
        let out = apply_filters(image, &settings);
        assert_eq!(out.get_pixel(0, 0).0, [150, 150, 150, 255]);
    }

    #[test]
    fn test_css_string() {
        let settings = FilterPreset::Vintage.settings();
        assert_eq!(
            settings.to_css(),
            "brightness(110%) contrast(120%) saturate(80%) sepia(30%) grayscale(0%) blur(0px)"
        );
    }
}

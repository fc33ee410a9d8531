// SPDX-License-Identifier: GPL-3.0-only

//! CPU vector canvas for the overlay layers
//!
//! Stickers and the watermark band are painted with `vello_cpu` on top of the
//! filtered frame. Text is shaped with `parley` against the bundled DejaVu
//! Sans Bold face, so the output never depends on fonts installed on the
//! kiosk.

use crate::errors::CompositingError;
use image::RgbaImage;
use kurbo::{Affine, BezPath, PathEl, Rect};
use std::borrow::Cow;
use std::sync::Arc;

/// Font used for every watermark string
static BUNDLED_FONT: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans-Bold.ttf");

/// RGBA8 color attached to parley runs
pub type TextBrush = [u8; 4];

/// A shaped single-line string
pub struct TextLayout {
    layout: parley::Layout<TextBrush>,
    width: f64,
    height: f64,
}

impl TextLayout {
    /// Advance width in pixels
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Line height (ascent + descent + leading) in pixels
    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Shapes text against the bundled font
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl TextShaper {
    pub fn new() -> Result<Self, CompositingError> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(BUNDLED_FONT.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CompositingError::Render("bundled font has no families".into()))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CompositingError::Render("bundled font family has no name".into()))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(BUNDLED_FONT.to_vec()),
                0,
            ),
        })
    }

    /// Lay out `text` on one line at `size_px`
    pub fn layout(&mut self, text: &str, size_px: f32, brush: TextBrush) -> TextLayout {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);

        let mut width = 0.0f64;
        let mut height = 0.0f64;
        for line in layout.lines() {
            let m = line.metrics();
            width = width.max(f64::from(m.advance));
            height += f64::from(m.ascent + m.descent + m.leading);
        }

        TextLayout {
            layout,
            width,
            height,
        }
    }
}

/// Paint target sized to one frame
pub struct Canvas {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
}

impl Canvas {
    /// Start a canvas with `base` as the bottom layer
    pub fn new(base: &RgbaImage) -> Result<Self, CompositingError> {
        let (width, height) = canvas_size(base)?;
        let mut canvas = Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            width,
            height,
        };
        canvas.draw_image(base, 0.0, 0.0)?;
        Ok(canvas)
    }

    /// Fill `path` after applying `transform`
    pub fn fill_path(&mut self, path: &BezPath, transform: Affine, color: [u8; 4]) {
        self.reset_paint_transform();
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(to_color(color));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        self.reset_paint_transform();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(to_color(color));
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
    }

    /// Draw `image` unscaled with its top-left at `(x, y)`
    pub fn draw_image(&mut self, image: &RgbaImage, x: f64, y: f64) -> Result<(), CompositingError> {
        let (w, h) = canvas_size(image)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(image_to_pixmap(image, w, h))),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.reset_paint_transform();
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
        Ok(())
    }

    /// Draw a shaped layout with its line box top-left at `(x, y)`
    pub fn draw_text(&mut self, shaper: &TextShaper, text: &TextLayout, x: f64, y: f64) {
        self.reset_paint_transform();
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((x, y)));

        for line in text.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                self.ctx.set_paint(to_color(run.style().brush));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&shaper.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    /// Rasterize everything drawn so far
    pub fn finish(mut self) -> RgbaImage {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);

        let mut bytes = pixmap.data_as_u8_slice().to_vec();
        for px in bytes.chunks_exact_mut(4) {
            unpremultiply(px);
        }
        // Length always matches width * height * 4
        RgbaImage::from_raw(u32::from(self.width), u32::from(self.height), bytes)
            .unwrap_or_else(|| RgbaImage::new(u32::from(self.width), u32::from(self.height)))
    }

    fn reset_paint_transform(&mut self) {
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

fn canvas_size(image: &RgbaImage) -> Result<(u16, u16), CompositingError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CompositingError::EmptyFrame { width, height });
    }
    let w = u16::try_from(width)
        .map_err(|_| CompositingError::Render(format!("width {} exceeds u16", width)))?;
    let h = u16::try_from(height)
        .map_err(|_| CompositingError::Render(format!("height {} exceeds u16", height)))?;
    Ok((w, h))
}

fn image_to_pixmap(image: &RgbaImage, width: u16, height: u16) -> vello_cpu::Pixmap {
    let mut may_have_opacities = false;
    let pixels = image
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            may_have_opacities |= a != 255;
            let [r, g, b, a] = premultiply(r, g, b, a);
            vello_cpu::peniko::color::PremulRgba8 { r, g, b, a }
        })
        .collect();
    vello_cpu::Pixmap::from_parts_with_opacity(pixels, width, height, may_have_opacities)
}

fn premultiply(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let af = (a as u16) + 1;
    let premul = |c: u8| -> u8 { (((c as u16) * af) >> 8) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn unpremultiply(px: &mut [u8]) {
    let a = px[3] as u32;
    if a == 0 || a == 255 {
        return;
    }
    for c in &mut px[..3] {
        *c = ((*c as u32 * 255 + a / 2) / a).min(255) as u8;
    }
}

fn to_color([r, g, b, a]: [u8; 4]) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
    }

    #[test]
    fn test_base_layer_round_trips() {
        let base = RgbaImage::from_fn(40, 30, |x, y| Rgba([(x * 6) as u8, (y * 8) as u8, 77, 255]));
        let out = Canvas::new(&base).unwrap().finish();
        assert_eq!(out.dimensions(), (40, 30));
        for (a, b) in out.pixels().zip(base.pixels()) {
            assert!(close(a.0, b.0), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_translucent_rect_blends() {
        let base = RgbaImage::from_pixel(20, 20, Rgba([200, 200, 200, 255]));
        let mut canvas = Canvas::new(&base).unwrap();
        canvas.fill_rect(Rect::new(0.0, 10.0, 20.0, 20.0), [0, 0, 0, 128]);
        let out = canvas.finish();
        assert!(close(out.get_pixel(5, 5).0, [200, 200, 200, 255]));
        assert!(close(out.get_pixel(5, 15).0, [100, 100, 100, 255]));
    }

    #[test]
    fn test_text_is_shaped_and_painted() {
        let mut shaper = TextShaper::new().unwrap();
        let short = shaper.layout("Hi", 24.0, [255, 255, 255, 255]);
        let long = shaper.layout("Hello booth", 24.0, [255, 255, 255, 255]);
        assert!(short.width() > 0.0);
        assert!(long.width() > short.width());
        assert!(long.height() >= 24.0);

        let base = RgbaImage::from_pixel(200, 40, Rgba([0, 0, 0, 255]));
        let mut canvas = Canvas::new(&base).unwrap();
        canvas.draw_text(&shaper, &long, 4.0, 4.0);
        let out = canvas.finish();
        assert!(out.pixels().any(|p| p.0[0] > 200));
    }

    #[test]
    fn test_empty_and_oversized_rejected() {
        assert!(matches!(
            Canvas::new(&RgbaImage::new(0, 5)),
            Err(CompositingError::EmptyFrame { .. })
        ));
        assert!(matches!(
            Canvas::new(&RgbaImage::new(70_000, 1)),
            Err(CompositingError::Render(_))
        ));
    }
}

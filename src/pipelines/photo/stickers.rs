// SPDX-License-Identifier: GPL-3.0-only

//! Sticker placements and glyph rendering
//!
//! A [`StickerBoard`] owns the operator's placements in frame pixel space and
//! keeps every sticker's bounding box on the board. Glyphs are vector shapes
//! (kurbo paths in a unit square) that are transformed per placement and
//! filled on the overlay [`Canvas`].

use super::canvas::Canvas;
use crate::constants::{STICKER_DEFAULT_SIZE, STICKER_MAX_SIZE, STICKER_MIN_SIZE};
use kurbo::{Affine, BezPath, Circle, Point, Shape};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Offset applied to each new sticker so stacked additions stay visible
const ADD_CASCADE_STEP: f32 = 16.0;

/// Path flattening tolerance in unit-square coordinates
const PATH_TOLERANCE: f64 = 1e-3;

/// Available sticker shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerGlyph {
    Smile,
    Heart,
    Star,
    #[serde(alias = "zap")]
    Lightning,
}

impl StickerGlyph {
    pub const ALL: [StickerGlyph; 4] = [
        StickerGlyph::Smile,
        StickerGlyph::Heart,
        StickerGlyph::Star,
        StickerGlyph::Lightning,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StickerGlyph::Smile => "Smile",
            StickerGlyph::Heart => "Heart",
            StickerGlyph::Star => "Star",
            StickerGlyph::Lightning => "Lightning",
        }
    }

    /// Palette color for the glyph
    pub fn default_color(&self) -> StickerColor {
        match self {
            StickerGlyph::Smile => StickerColor([0xFF, 0xD7, 0x00]),
            StickerGlyph::Heart => StickerColor([0xFF, 0x69, 0xB4]),
            StickerGlyph::Star => StickerColor([0x00, 0xBF, 0xFF]),
            StickerGlyph::Lightning => StickerColor([0xFF, 0x45, 0x00]),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "smile" => Some(StickerGlyph::Smile),
            "heart" => Some(StickerGlyph::Heart),
            "star" => Some(StickerGlyph::Star),
            "lightning" | "zap" => Some(StickerGlyph::Lightning),
            _ => None,
        }
    }

    /// Filled layers in the unit square, painted in order
    fn layers(&self, color: StickerColor) -> Vec<(BezPath, [u8; 3])> {
        match self {
            StickerGlyph::Smile => {
                let ink = [0x3A, 0x2A, 0x00];
                let mut mouth = BezPath::new();
                mouth.move_to((0.28, 0.58));
                mouth.quad_to((0.5, 0.88), (0.72, 0.58));
                mouth.quad_to((0.5, 0.74), (0.28, 0.58));
                mouth.close_path();
                vec![
                    (Circle::new((0.5, 0.5), 0.48).to_path(PATH_TOLERANCE), color.0),
                    (Circle::new((0.35, 0.38), 0.06).to_path(PATH_TOLERANCE), ink),
                    (Circle::new((0.65, 0.38), 0.06).to_path(PATH_TOLERANCE), ink),
                    (mouth, ink),
                ]
            }
            StickerGlyph::Heart => {
                let mut heart = BezPath::new();
                heart.move_to((0.5, 0.92));
                heart.curve_to((0.2, 0.7), (0.02, 0.5), (0.02, 0.3));
                heart.curve_to((0.02, 0.12), (0.16, 0.05), (0.28, 0.05));
                heart.curve_to((0.4, 0.05), (0.47, 0.12), (0.5, 0.22));
                heart.curve_to((0.53, 0.12), (0.6, 0.05), (0.72, 0.05));
                heart.curve_to((0.84, 0.05), (0.98, 0.12), (0.98, 0.3));
                heart.curve_to((0.98, 0.5), (0.8, 0.7), (0.5, 0.92));
                heart.close_path();
                vec![(heart, color.0)]
            }
            StickerGlyph::Star => {
                let mut star = BezPath::new();
                for i in 0..10 {
                    let radius = if i % 2 == 0 { 0.5 } else { 0.2 };
                    let angle = -std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::PI / 5.0;
                    let p = Point::new(0.5 + radius * angle.cos(), 0.5 + radius * angle.sin());
                    if i == 0 {
                        star.move_to(p);
                    } else {
                        star.line_to(p);
                    }
                }
                star.close_path();
                vec![(star, color.0)]
            }
            StickerGlyph::Lightning => {
                let mut bolt = BezPath::new();
                bolt.move_to((0.62, 0.02));
                bolt.line_to((0.18, 0.56));
                bolt.line_to((0.46, 0.56));
                bolt.line_to((0.36, 0.98));
                bolt.line_to((0.84, 0.40));
                bolt.line_to((0.55, 0.40));
                bolt.line_to((0.70, 0.02));
                bolt.close_path();
                vec![(bolt, color.0)]
            }
        }
    }
}

impl std::fmt::Display for StickerGlyph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Opaque sRGB fill color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StickerColor(pub [u8; 3]);

impl StickerColor {
    /// `#RRGGBB` form
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// One sticker on the board
///
/// `(x, y)` is the top-left of the `size`x`size` bounding box in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StickerPlacement {
    pub id: u64,
    pub glyph: StickerGlyph,
    pub color: StickerColor,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Degrees, in [0, 360)
    pub rotation: f32,
}

impl StickerPlacement {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    /// Unit-square to frame transform: scale, rotate about the center, place
    fn transform(&self) -> Affine {
        let (cx, cy) = self.center();
        Affine::translate((cx as f64, cy as f64))
            * Affine::rotate((self.rotation as f64).to_radians())
            * Affine::scale(self.size as f64)
            * Affine::translate((-0.5, -0.5))
    }
}

fn wrap_rotation(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn clamp_size(size: f32) -> f32 {
    if !size.is_finite() {
        return STICKER_DEFAULT_SIZE;
    }
    size.clamp(STICKER_MIN_SIZE, STICKER_MAX_SIZE)
}

/// The operator's sticker layer
///
/// Ids increase in creation order and are never reused within a board.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerBoard {
    width: f32,
    height: f32,
    placements: Vec<StickerPlacement>,
    next_id: u64,
    selected: Option<u64>,
}

impl StickerBoard {
    /// Empty board covering a `width`x`height` frame
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            placements: Vec::new(),
            next_id: 1,
            selected: None,
        }
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Placements in creation order
    pub fn stickers(&self) -> &[StickerPlacement] {
        &self.placements
    }

    pub fn get(&self, id: u64) -> Option<&StickerPlacement> {
        self.placements.iter().find(|s| s.id == id)
    }

    pub fn selected(&self) -> Option<u64> {
        self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    fn clamp_position(&self, x: f32, y: f32, size: f32) -> (f32, f32) {
        let max_x = (self.width - size).max(0.0);
        let max_y = (self.height - size).max(0.0);
        let x = if x.is_finite() { x } else { 0.0 };
        let y = if y.is_finite() { y } else { 0.0 };
        (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
    }

    /// Add a glyph near the board center
    ///
    /// Each sticker already present shifts the new one down and right by a
    /// small step so repeated adds do not stack exactly.
    pub fn add(&mut self, glyph: StickerGlyph) -> u64 {
        let offset = (self.placements.len() % 8) as f32 * ADD_CASCADE_STEP;
        let x = (self.width - STICKER_DEFAULT_SIZE) / 2.0 + offset;
        let y = (self.height - STICKER_DEFAULT_SIZE) / 2.0 + offset;
        self.add_at(glyph, x, y)
    }

    /// Add a glyph with its top-left at `(x, y)`, clamped onto the board
    pub fn add_at(&mut self, glyph: StickerGlyph, x: f32, y: f32) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let size = STICKER_DEFAULT_SIZE;
        let (x, y) = self.clamp_position(x, y, size);
        self.placements.push(StickerPlacement {
            id,
            glyph,
            color: glyph.default_color(),
            x,
            y,
            size,
            rotation: 0.0,
        });
        self.selected = Some(id);

        debug!(id, glyph = %glyph, x, y, "Sticker added");
        id
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.placements.len();
        self.placements.retain(|s| s.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.placements.len() != before
    }

    pub fn select(&mut self, id: Option<u64>) {
        self.selected = id.filter(|id| self.get(*id).is_some());
    }

    fn update(&mut self, id: u64, f: impl FnOnce(&mut StickerPlacement)) -> bool {
        match self.placements.iter_mut().find(|s| s.id == id) {
            Some(placement) => {
                f(placement);
                true
            }
            None => false,
        }
    }

    /// Drag so the sticker is centered on the pointer
    pub fn drag_to(&mut self, id: u64, pointer_x: f32, pointer_y: f32) -> bool {
        let Some(size) = self.get(id).map(|s| s.size) else {
            return false;
        };
        let (x, y) = self.clamp_position(pointer_x - size / 2.0, pointer_y - size / 2.0, size);
        self.update(id, |s| {
            s.x = x;
            s.y = y;
        })
    }

    /// Move by a delta
    pub fn move_by(&mut self, id: u64, dx: f32, dy: f32) -> bool {
        let Some(current) = self.get(id).copied() else {
            return false;
        };
        let (x, y) = self.clamp_position(current.x + dx, current.y + dy, current.size);
        self.update(id, |s| {
            s.x = x;
            s.y = y;
        })
    }

    /// Resize, keeping the top-left fixed unless that would leave the board
    pub fn set_size(&mut self, id: u64, size: f32) -> bool {
        let Some(current) = self.get(id).copied() else {
            return false;
        };
        let size = clamp_size(size);
        let (x, y) = self.clamp_position(current.x, current.y, size);
        self.update(id, |s| {
            s.size = size;
            s.x = x;
            s.y = y;
        })
    }

    pub fn set_rotation(&mut self, id: u64, degrees: f32) -> bool {
        self.update(id, |s| s.rotation = wrap_rotation(degrees))
    }

    pub fn set_color(&mut self, id: u64, color: StickerColor) -> bool {
        self.update(id, |s| s.color = color)
    }

    /// Change the board size and pull every sticker back on-board
    pub fn resize_bounds(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
        let positions: Vec<(f32, f32)> = self
            .placements
            .iter()
            .map(|s| self.clamp_position(s.x, s.y, s.size))
            .collect();
        for (placement, (x, y)) in self.placements.iter_mut().zip(positions) {
            placement.x = x;
            placement.y = y;
        }
    }

    /// Remove every sticker; ids keep increasing
    pub fn clear(&mut self) {
        self.placements.clear();
        self.selected = None;
    }
}

/// Paint `placements` onto `canvas` in id order
pub fn draw_stickers(canvas: &mut Canvas, placements: &[StickerPlacement]) {
    let mut ordered: Vec<&StickerPlacement> = placements.iter().collect();
    ordered.sort_by_key(|s| s.id);
    for placement in ordered {
        let transform = placement.transform();
        for (path, [r, g, b]) in placement.glyph.layers(placement.color) {
            canvas.fill_path(&path, transform, [r, g, b, 255]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn on_board(board: &StickerBoard, s: &StickerPlacement) -> bool {
        let (w, h) = board.bounds();
        s.x >= 0.0 && s.y >= 0.0 && s.x + s.size <= w && s.y + s.size <= h
    }

    #[test]
    fn test_ids_follow_creation_order() {
        let mut board = StickerBoard::new(400, 300);
        let a = board.add(StickerGlyph::Heart);
        let b = board.add(StickerGlyph::Star);
        board.remove(a);
        let c = board.add(StickerGlyph::Smile);
        assert!(a < b && b < c);
        assert_eq!(board.get(c).unwrap().color, StickerGlyph::Smile.default_color());
    }

    #[test]
    fn test_drag_and_move_stay_on_board() {
        let mut board = StickerBoard::new(200, 100);
        let id = board.add(StickerGlyph::Lightning);
        for (dx, dy) in [(1e6, 0.0), (-1e6, 5.0), (3.0, -1e9), (f32::NAN, 12.0), (50.0, 50.0)] {
            board.move_by(id, dx, dy);
            assert!(on_board(&board, board.get(id).unwrap()));
        }
        for (px, py) in [(-50.0, -50.0), (1000.0, 1000.0), (100.0, 50.0)] {
            board.drag_to(id, px, py);
            assert!(on_board(&board, board.get(id).unwrap()));
        }
        board.drag_to(id, 100.0, 50.0);
        assert_eq!(board.get(id).unwrap().center(), (100.0, 50.0));
    }

    #[test]
    fn test_resize_clamps_size_and_position() {
        let mut board = StickerBoard::new(100, 100);
        let id = board.add_at(StickerGlyph::Star, 60.0, 60.0);
        board.set_size(id, 500.0);
        let s = *board.get(id).unwrap();
        assert_eq!(s.size, STICKER_MAX_SIZE);
        assert!(on_board(&board, &s));

        board.set_size(id, 1.0);
        assert_eq!(board.get(id).unwrap().size, STICKER_MIN_SIZE);

        board.resize_bounds(30, 30);
        assert!(on_board(&board, board.get(id).unwrap()));
    }

    #[test]
    fn test_rotation_wraps() {
        let mut board = StickerBoard::new(100, 100);
        let id = board.add(StickerGlyph::Heart);
        board.set_rotation(id, 370.0);
        assert_eq!(board.get(id).unwrap().rotation, 10.0);
        board.set_rotation(id, -90.0);
        assert_eq!(board.get(id).unwrap().rotation, 270.0);
        board.set_rotation(id, f32::NAN);
        assert_eq!(board.get(id).unwrap().rotation, 0.0);
    }

    fn painted(placements: &[StickerPlacement]) -> RgbaImage {
        let base = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let mut canvas = Canvas::new(&base).unwrap();
        draw_stickers(&mut canvas, placements);
        canvas.finish()
    }

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
    }

    #[test]
    fn test_sticker_paints_its_color_at_center() {
        let mut board = StickerBoard::new(100, 100);
        board.add_at(StickerGlyph::Star, 30.0, 30.0);
        let out = painted(board.stickers());

        assert!(close(out.get_pixel(50, 50).0, [0x00, 0xBF, 0xFF, 255]));
        assert!(close(out.get_pixel(2, 2).0, [0, 0, 0, 255]));
    }

    #[test]
    fn test_later_sticker_paints_on_top() {
        let mut board = StickerBoard::new(100, 100);
        board.add_at(StickerGlyph::Heart, 30.0, 30.0);
        board.add_at(StickerGlyph::Star, 30.0, 30.0);
        let mut reversed = board.stickers().to_vec();
        reversed.reverse();
        let out = painted(&reversed);

        assert!(close(out.get_pixel(50, 50).0, [0x00, 0xBF, 0xFF, 255]));
    }

    #[test]
    fn test_rotation_moves_painted_pixels() {
        let mut board = StickerBoard::new(100, 100);
        let id = board.add_at(StickerGlyph::Lightning, 30.0, 30.0);
        let upright = painted(board.stickers());
        board.set_rotation(id, 90.0);
        let turned = painted(board.stickers());
        assert_ne!(upright, turned);
    }

    #[test]
    fn test_glyph_names() {
        assert_eq!(StickerGlyph::from_name("zap"), Some(StickerGlyph::Lightning));
        assert_eq!(StickerGlyph::from_name("Heart"), Some(StickerGlyph::Heart));
        assert_eq!(StickerGlyph::Heart.default_color().to_hex(), "#FF69B4");
    }
}

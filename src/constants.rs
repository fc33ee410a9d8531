// SPDX-License-Identifier: GPL-3.0-only

//! Calibrated constants for capture timing, burst profiles and overlays

use std::time::Duration;

/// Default countdown length before a capture fires
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 3;

/// Spacing between countdown ticks
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Delay between the final "0" tick and the fire event, so the last tick stays visible
pub const COUNTDOWN_FIRE_GRACE: Duration = Duration::from_secs(1);

/// Edge length of every burst frame (square)
pub const BURST_FRAME_SIZE: u32 = 320;

/// GIF mode: slow, posed sequence
pub const GIF_FRAME_COUNT: usize = 4;
pub const GIF_FRAME_INTERVAL_MS: u64 = 800;

/// Boomerang mode: fast motion sequence played forward then in reverse
pub const BOOMERANG_FRAME_COUNT: usize = 8;
pub const BOOMERANG_FRAME_INTERVAL_MS: u64 = 200;

/// Burst configuration limits
pub const MIN_BURST_FRAMES: usize = 2;
pub const MAX_BURST_FRAMES: usize = 50;
pub const MIN_BURST_INTERVAL_MS: u64 = 10;
pub const MAX_BURST_INTERVAL_MS: u64 = 5_000;

/// Video recordings stop automatically after this long
pub const MAX_VIDEO_DURATION_SECS: u64 = 30;

/// JPEG quality for exported photos
pub const PHOTO_JPEG_QUALITY: u8 = 90;

/// GIF encoder speed (1 = best palette, 30 = fastest)
pub const GIF_ENCODER_SPEED: i32 = 10;

/// Watermark text used when no event name is configured
pub const DEFAULT_BRANDING_TEXT: &str = "PixelBooth Lite";

/// Watermark band geometry
pub const WATERMARK_BAND_HEIGHT: u32 = 80;
pub const WATERMARK_BAND_OPACITY: f32 = 0.7;
pub const WATERMARK_TITLE_FONT_SIZE: f32 = 24.0;
/// Long titles shrink down to this size before being truncated
pub const WATERMARK_TITLE_MIN_FONT_SIZE: f32 = 12.0;
pub const WATERMARK_TIMESTAMP_FONT_SIZE: f32 = 14.0;
pub const WATERMARK_TIMESTAMP_OPACITY: f32 = 0.8;
pub const WATERMARK_TIMESTAMP_MARGIN_RIGHT: u32 = 20;
pub const WATERMARK_TIMESTAMP_MARGIN_BOTTOM: u32 = 10;
pub const WATERMARK_LOGO_SIZE: u32 = 56;
pub const WATERMARK_LOGO_INSET: u32 = 20;

/// chrono format for the watermark timestamp (e.g. "10/17/2026, 3:04:05 PM")
pub const WATERMARK_TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Largest blur radius accepted by the filter panel (pixels)
pub const MAX_BLUR_PX: f32 = 10.0;

/// Sticker size limits (pixels)
pub const STICKER_MIN_SIZE: f32 = 20.0;
pub const STICKER_MAX_SIZE: f32 = 80.0;
pub const STICKER_DEFAULT_SIZE: f32 = 40.0;

/// Frame rate of the synthetic recorder used by the virtual camera
pub const VIRTUAL_RECORDING_FPS: u32 = 5;

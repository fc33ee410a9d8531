// SPDX-License-Identifier: GPL-3.0-only
//! Burst capture for animated modes
//!
//! Samples a fixed number of stills from the live stream at a fixed cadence
//! and hands them to the GIF encoder.
//!
//! # Pipeline Overview
//!
//! ```text
//! Live stream
//!        │  one snapshot per interval boundary
//!        ▼
//! Rasterize (center crop, 320x320)
//!        │
//!        ▼
//! BurstBuffer (single writer)  ──▶  BurstProgress (read-only counter)
//!        │
//!        ▼
//! Animated GIF
//! ```

pub mod burst;

pub use burst::BurstSampler;

use crate::constants::{
    BOOMERANG_FRAME_COUNT, BOOMERANG_FRAME_INTERVAL_MS, BURST_FRAME_SIZE, GIF_FRAME_COUNT,
    GIF_FRAME_INTERVAL_MS, MAX_BURST_FRAMES, MAX_BURST_INTERVAL_MS, MIN_BURST_FRAMES,
    MIN_BURST_INTERVAL_MS,
};
use crate::errors::SamplingError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Burst capture configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstModeConfig {
    /// Number of frames to capture
    pub frame_count: usize,
    /// Spacing between frames in milliseconds
    pub frame_interval_ms: u64,
    /// Edge length of each square frame
    pub frame_size: u32,
}

impl BurstModeConfig {
    /// Slow posed sequence: 4 frames, 800 ms apart
    pub const fn gif() -> Self {
        Self {
            frame_count: GIF_FRAME_COUNT,
            frame_interval_ms: GIF_FRAME_INTERVAL_MS,
            frame_size: BURST_FRAME_SIZE,
        }
    }

    /// Fast motion sequence: 8 frames, 200 ms apart
    pub const fn boomerang() -> Self {
        Self {
            frame_count: BOOMERANG_FRAME_COUNT,
            frame_interval_ms: BOOMERANG_FRAME_INTERVAL_MS,
            frame_size: BURST_FRAME_SIZE,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Time from the first deadline to the last frame
    pub fn total_duration(&self) -> Duration {
        self.interval() * self.frame_count as u32
    }

    /// Burst capture configuration validation
    pub fn validate(&self) -> Result<(), SamplingError> {
        if self.frame_count < MIN_BURST_FRAMES {
            return Err(SamplingError::InvalidConfig(format!(
                "Frame count must be at least {}",
                MIN_BURST_FRAMES
            )));
        }
        if self.frame_count > MAX_BURST_FRAMES {
            return Err(SamplingError::InvalidConfig(format!(
                "Frame count must not exceed {}",
                MAX_BURST_FRAMES
            )));
        }
        if self.frame_interval_ms < MIN_BURST_INTERVAL_MS {
            return Err(SamplingError::InvalidConfig(format!(
                "Frame interval must be at least {}ms",
                MIN_BURST_INTERVAL_MS
            )));
        }
        if self.frame_interval_ms > MAX_BURST_INTERVAL_MS {
            return Err(SamplingError::InvalidConfig(format!(
                "Frame interval must not exceed {}ms",
                MAX_BURST_INTERVAL_MS
            )));
        }
        if self.frame_size == 0 {
            return Err(SamplingError::InvalidConfig(
                "Frame size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BurstModeConfig {
    fn default() -> Self {
        Self::gif()
    }
}

/// Ordered burst stills, never more than the configured count
#[derive(Debug, Clone, PartialEq)]
pub struct BurstBuffer {
    frames: Vec<RgbaImage>,
    capacity: usize,
}

impl BurstBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a still; refused once the buffer is full
    pub fn push(&mut self, frame: RgbaImage) -> bool {
        if self.is_complete() {
            return false;
        }
        self.frames.push(frame);
        true
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_complete(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<RgbaImage> {
        self.frames
    }
}

/// Read-only view of burst progress
///
/// Cloned out of the sampler before it runs; the count only ever increases.
#[derive(Debug, Clone)]
pub struct BurstProgress {
    captured: Arc<AtomicUsize>,
    complete: Arc<AtomicBool>,
    expected: usize,
}

impl BurstProgress {
    pub(crate) fn new(expected: usize) -> Self {
        Self {
            captured: Arc::new(AtomicUsize::new(0)),
            complete: Arc::new(AtomicBool::new(false)),
            expected,
        }
    }

    pub(crate) fn advance(&self) -> usize {
        self.captured.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn finish(&self) {
        self.complete.store(true, Ordering::SeqCst);
    }

    /// Frames captured so far
    pub fn captured(&self) -> usize {
        self.captured.load(Ordering::SeqCst)
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::SeqCst)
    }

    /// Fraction captured (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        if self.expected == 0 {
            return 1.0;
        }
        self.captured() as f32 / self.expected as f32
    }
}

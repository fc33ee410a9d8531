// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera device
//!
//! A synthetic [`CameraDevice`] that streams a test pattern or a still image.
//! It backs the CLI on machines without a webcam and drives the integration
//! tests, including failure injection (permission refusal, mid-stream
//! disconnect, truncated frame buffers, missing microphone).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  FrameSource     │  ← Test pattern or image file
//! └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  VirtualStream   │  ← Snapshot, MJPEG recorder
//! └──────────────────┘
//!        │
//!        ▼
//!   CameraStreamManager
//! ```

mod file_source;

pub use file_source::{FrameSource, load_image_source, render_source, render_test_pattern};

use crate::backends::camera::types::*;
use crate::backends::camera::{CameraDevice, LiveStream};
use crate::constants::VIRTUAL_RECORDING_FPS;
use crate::errors::{DeviceError, RecordingError};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Recorder frame size; the synthetic clip is a preview-sized MJPEG
const RECORDING_SIZE: Resolution = Resolution::new(320, 180);

/// Counters shared between a virtual camera and its streams
#[derive(Debug, Default)]
pub struct VirtualCameraStats {
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    snapshots: AtomicUsize,
}

impl VirtualCameraStats {
    /// Streams successfully opened
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Streams stopped
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Frames handed out across all streams
    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }

    /// Streams currently live
    pub fn live_streams(&self) -> usize {
        self.acquisitions().saturating_sub(self.releases())
    }
}

/// Synthetic camera device
#[derive(Debug, Clone)]
pub struct VirtualCamera {
    id: String,
    source: FrameSource,
    deny_permission: bool,
    disconnect_after: Option<usize>,
    truncate_after: Option<usize>,
    microphone: bool,
    acquire_delay: Duration,
    stats: Arc<VirtualCameraStats>,
}

impl VirtualCamera {
    /// Camera streaming the moving test pattern
    pub fn test_pattern() -> Self {
        Self::with_source("virtual:test-pattern".to_string(), FrameSource::TestPattern)
    }

    /// Camera streaming a still image from disk
    pub fn from_image_file(path: &Path) -> BackendResult<Self> {
        let source = load_image_source(path)?;
        Ok(Self::with_source(
            format!("virtual:{}", path.display()),
            source,
        ))
    }

    fn with_source(id: String, source: FrameSource) -> Self {
        Self {
            id,
            source,
            deny_permission: false,
            disconnect_after: None,
            truncate_after: None,
            microphone: true,
            acquire_delay: Duration::ZERO,
            stats: Arc::new(VirtualCameraStats::default()),
        }
    }

    /// Refuse every acquisition with [`DeviceError::PermissionDenied`]
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Disconnect each stream after it has delivered `frames` snapshots
    pub fn disconnect_after(mut self, frames: usize) -> Self {
        self.disconnect_after = Some(frames);
        self
    }

    /// Deliver frames with a short pixel buffer once `frames` good ones went out
    pub fn truncate_frames_after(mut self, frames: usize) -> Self {
        self.truncate_after = Some(frames);
        self
    }

    /// Open streams without an audio track even when one is requested
    pub fn without_microphone(mut self) -> Self {
        self.microphone = false;
        self
    }

    /// Simulate a slow permission prompt
    pub fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = delay;
        self
    }

    /// Shared counters for this camera and every stream it opens
    pub fn stats(&self) -> Arc<VirtualCameraStats> {
        Arc::clone(&self.stats)
    }
}

impl CameraDevice for VirtualCamera {
    type Stream = VirtualStream;

    fn device_id(&self) -> String {
        self.id.clone()
    }

    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> impl std::future::Future<Output = BackendResult<VirtualStream>> + Send {
        let camera = self.clone();
        let constraints = *constraints;

        async move {
            if !camera.acquire_delay.is_zero() {
                tokio::time::sleep(camera.acquire_delay).await;
            }

            if camera.deny_permission {
                return Err(DeviceError::PermissionDenied);
            }

            if constraints.resolution.is_empty() {
                return Err(DeviceError::Backend(format!(
                    "Unsupported resolution {}",
                    constraints.resolution
                )));
            }

            let audio = constraints.audio && camera.microphone;
            if constraints.audio && !audio {
                warn!(device = %camera.id, "No microphone available, opening video only");
            }

            // Image sources are fitted once so snapshots only copy
            let source = match &camera.source {
                FrameSource::Image(image) => FrameSource::Image(Arc::new(render_source(
                    &FrameSource::Image(Arc::clone(image)),
                    constraints.resolution,
                    0,
                ))),
                FrameSource::TestPattern => FrameSource::TestPattern,
            };

            camera.stats.acquisitions.fetch_add(1, Ordering::SeqCst);
            debug!(device = %camera.id, constraints = %constraints, "Virtual stream opened");

            Ok(VirtualStream {
                device_id: camera.id,
                resolution: constraints.resolution,
                audio,
                source,
                live: AtomicBool::new(true),
                delivered: AtomicU64::new(0),
                disconnect_after: camera.disconnect_after,
                truncate_after: camera.truncate_after,
                recording_started: None,
                released: false,
                stats: camera.stats,
            })
        }
    }
}

/// Live stream from a [`VirtualCamera`]
#[derive(Debug)]
pub struct VirtualStream {
    device_id: String,
    resolution: Resolution,
    audio: bool,
    source: FrameSource,
    live: AtomicBool,
    delivered: AtomicU64,
    disconnect_after: Option<usize>,
    truncate_after: Option<usize>,
    recording_started: Option<tokio::time::Instant>,
    released: bool,
    stats: Arc<VirtualCameraStats>,
}

impl VirtualStream {
    /// Simulate the device being unplugged
    pub fn disconnect(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            warn!(device = %self.device_id, "Virtual camera disconnected");
        }
    }
}

impl LiveStream for VirtualStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn has_audio(&self) -> bool {
        self.audio
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> BackendResult<CameraFrame> {
        if !self.is_live() {
            return Err(DeviceError::Disconnected);
        }

        let index = self.delivered.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.disconnect_after
            && index >= limit as u64
        {
            self.disconnect();
            return Err(DeviceError::Disconnected);
        }

        self.stats.snapshots.fetch_add(1, Ordering::SeqCst);
        let image = match &self.source {
            FrameSource::Image(image) => image.as_ref().clone(),
            FrameSource::TestPattern => render_test_pattern(self.resolution, index),
        };

        if let Some(limit) = self.truncate_after
            && index >= limit as u64
        {
            let (width, height) = image.dimensions();
            let mut data = image.into_raw();
            data.truncate(data.len() / 2);
            warn!(device = %self.device_id, frame = index, "Delivering truncated frame");
            return Ok(CameraFrame::new(width, height, data));
        }
        Ok(CameraFrame::from_image(image))
    }

    fn start_recording(&mut self) -> Result<(), RecordingError> {
        if !self.audio {
            return Err(RecordingError::NoAudioDevice);
        }
        if !self.is_live() {
            return Err(RecordingError::Failed("Camera disconnected".to_string()));
        }
        if self.recording_started.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        self.recording_started = Some(tokio::time::Instant::now());
        info!(device = %self.device_id, "Virtual recording started");
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<RecordedClip, RecordingError> {
        let started = self
            .recording_started
            .take()
            .ok_or(RecordingError::NotRecording)?;
        let duration = started.elapsed();

        let frame_count = ((duration.as_secs_f64() * VIRTUAL_RECORDING_FPS as f64).ceil() as u64)
            .max(1);

        // Motion JPEG: one baseline JPEG per frame, concatenated
        let mut data = Vec::new();
        for index in 0..frame_count {
            let frame = match &self.source {
                FrameSource::TestPattern => render_test_pattern(RECORDING_SIZE, index),
                FrameSource::Image(image) => {
                    render_source(&FrameSource::Image(Arc::clone(image)), RECORDING_SIZE, 0)
                }
            };
            let rgb = DynamicImage::ImageRgba8(frame).to_rgb8();
            JpegEncoder::new_with_quality(&mut data, 80)
                .encode(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| RecordingError::Failed(e.to_string()))?;
        }

        info!(
            device = %self.device_id,
            duration_ms = duration.as_millis() as u64,
            frames = frame_count,
            bytes = data.len(),
            "Virtual recording stopped"
        );

        Ok(RecordedClip {
            data,
            mime: "video/x-motion-jpeg".to_string(),
            duration,
        })
    }

    fn stop(&mut self) {
        self.recording_started = None;
        self.live.store(false, Ordering::SeqCst);
        if !self.released {
            self.released = true;
            self.stats.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_delivers_requested_resolution() {
        let camera = VirtualCamera::test_pattern();
        let stream = camera.acquire(&StreamConstraints::burst()).await.unwrap();
        let frame = stream.snapshot().unwrap();
        assert_eq!(frame.resolution(), Resolution::new(640, 640));
        assert_eq!(frame.data.len(), frame.expected_len());
    }

    #[tokio::test]
    async fn test_disconnect_after_limit() {
        let camera = VirtualCamera::test_pattern().disconnect_after(2);
        let stream = camera.acquire(&StreamConstraints::photo()).await.unwrap();
        assert!(stream.snapshot().is_ok());
        assert!(stream.snapshot().is_ok());
        assert_eq!(stream.snapshot().unwrap_err(), DeviceError::Disconnected);
        assert!(!stream.is_live());
    }

    #[tokio::test]
    async fn test_recording_requires_audio() {
        let camera = VirtualCamera::test_pattern().without_microphone();
        let mut stream = camera.acquire(&StreamConstraints::video()).await.unwrap();
        assert!(!stream.has_audio());
        assert_eq!(stream.start_recording(), Err(RecordingError::NoAudioDevice));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recording_produces_clip() {
        let camera = VirtualCamera::test_pattern();
        let mut stream = camera.acquire(&StreamConstraints::video()).await.unwrap();
        stream.start_recording().unwrap();
        assert_eq!(
            stream.start_recording(),
            Err(RecordingError::AlreadyRecording)
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        let clip = stream.stop_recording().unwrap();
        assert_eq!(clip.mime, "video/x-motion-jpeg");
        assert_eq!(clip.duration, Duration::from_secs(2));
        assert!(clip.data.starts_with(&[0xFF, 0xD8]));
        assert_eq!(stream.stop_recording().unwrap_err(), RecordingError::NotRecording);
    }
}

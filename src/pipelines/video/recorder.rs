// SPDX-License-Identifier: GPL-3.0-only

//! Video recording driver
//!
//! Drives the platform recorder on a live stream:
//! - Requires an audio track before starting
//! - Enforces the maximum clip duration
//! - Returns the container blob produced by the recorder on stop

use crate::backends::camera::LiveStream;
use crate::backends::camera::types::RecordedClip;
use crate::constants::MAX_VIDEO_DURATION_SECS;
use crate::errors::RecordingError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The operator pressed stop
    Requested,
    /// The maximum duration elapsed
    MaxDuration,
}

/// Video recorder state for one session
#[derive(Debug, Clone)]
pub struct VideoRecorder {
    max_duration: Duration,
    started_at: Option<Instant>,
}

impl Default for VideoRecorder {
    fn default() -> Self {
        Self::new(Duration::from_secs(MAX_VIDEO_DURATION_SECS))
    }
}

impl VideoRecorder {
    pub fn new(max_duration: Duration) -> Self {
        Self {
            max_duration,
            started_at: None,
        }
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    pub fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time since recording started
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Time left before the automatic stop
    pub fn remaining(&self) -> Duration {
        self.max_duration.saturating_sub(self.elapsed())
    }

    /// Start the platform recorder
    ///
    /// # Returns
    /// * `Err(RecordingError::NoAudioDevice)` - The stream has no audio track
    /// * `Err(RecordingError::AlreadyRecording)` - Already started
    pub fn start<S: LiveStream + ?Sized>(&mut self, stream: &mut S) -> Result<(), RecordingError> {
        if self.started_at.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }
        if !stream.has_audio() {
            return Err(RecordingError::NoAudioDevice);
        }

        stream.start_recording()?;
        self.started_at = Some(Instant::now());

        info!(
            device = %stream.device_id(),
            max_secs = self.max_duration.as_secs(),
            "Video recording started"
        );
        Ok(())
    }

    /// Stop the platform recorder and take the finished clip
    pub fn stop<S: LiveStream + ?Sized>(&mut self, stream: &mut S) -> Result<RecordedClip, RecordingError> {
        if self.started_at.take().is_none() {
            return Err(RecordingError::NotRecording);
        }

        let clip = stream.stop_recording()?;
        info!(
            duration_ms = clip.duration.as_millis() as u64,
            bytes = clip.data.len(),
            mime = %clip.mime,
            "Video recording stopped"
        );
        Ok(clip)
    }

    /// Resolve when the maximum duration is reached
    ///
    /// Pending forever when not recording.
    pub async fn limit_reached(&self) {
        match self.started_at {
            Some(started) => sleep_until(started + self.max_duration).await,
            None => std::future::pending().await,
        }
    }

    /// Record until `stop` resolves or the maximum duration elapses
    pub async fn record_until<S, F>(
        &mut self,
        stream: &mut S,
        stop: F,
    ) -> Result<(RecordedClip, StopReason), RecordingError>
    where
        S: LiveStream + ?Sized,
        F: Future<Output = ()>,
    {
        self.start(stream)?;

        let reason = tokio::select! {
            _ = stop => StopReason::Requested,
            _ = self.limit_reached() => StopReason::MaxDuration,
        };
        debug!(reason = ?reason, "Recording stop requested");

        let clip = self.stop(stream)?;
        Ok((clip, reason))
    }
}

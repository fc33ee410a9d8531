// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state machine
//!
//! One [`CaptureSession`] drives one guest interaction from an armed camera
//! to a stored artifact:
//!
//! ```text
//!  Idle ──arm──▶ Armed ──trigger──▶ Countdown ──fire──▶ Capturing
//!                 ▲  │                  │                   │
//!          retake │  └──record (video)──┼──────────────────▶│
//!                 │                     │ abort             ▼
//!             Reviewing ◀───────────────┼──────────────── Composing
//!                 │ confirm             ▼
//!                 ▼                  Armed / Cancelled
//!             Exporting ──stored──▶ Done
//! ```
//!
//! `Cancelled` and `Failed` are reachable from every non-terminal phase. A
//! failed session can be re-armed or its export retried, depending on the
//! [`Recovery`] recorded with the failure.
//!
//! Long-running operations (countdown, burst, recording) hold `&mut self`,
//! so they are aborted through a [`CaptureControl`] handle taken beforehand.

use super::countdown::{Countdown, CountdownOutcome};
use super::state::{
    CaptureMode, ExportedMedia, Recovery, SessionEvent, SessionFailure, SessionPhase,
};
use crate::backends::camera::types::{CameraFrame, Resolution};
use crate::backends::camera::{CameraDevice, CameraStreamManager, LiveStream, ScopedStream};
use crate::config::Config;
use crate::errors::{DeviceError, RecordingError, SamplingError, SessionError, SessionResult};
use crate::pipelines::photo::burst_mode::{BurstProgress, BurstSampler};
use crate::pipelines::photo::capture::PhotoCapture;
use crate::pipelines::photo::compositor::CompositionRequest;
use crate::pipelines::photo::encoding::Playback;
use crate::pipelines::photo::overlay::{Branding, Watermark};
use crate::pipelines::photo::processing::FilterControls;
use crate::pipelines::photo::stickers::StickerBoard;
use crate::pipelines::photo::PhotoPipeline;
use crate::pipelines::video::VideoRecorder;
use crate::storage::{ArtifactMetadata, MediaArtifact, MediaStore};
use chrono::{DateTime, Local};
use image::RgbaImage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Pending abort request for an in-flight capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbortRequest {
    #[default]
    None,
    /// Stop the capture and return to armed on the same stream
    Retake,
    /// Stop the capture and end the session
    Cancel,
}

/// How a capture attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Artifact ready, session is reviewing
    Ready,
    /// Aborted with a retake; session is armed again
    Retaken,
    /// Aborted with a cancel; session is cancelled
    Cancelled,
}

/// Abort handle for a running session
///
/// Cheap to clone and usable from other tasks (or a signal handler) while
/// the session itself is busy in a countdown, burst or recording.
#[derive(Debug, Clone)]
pub struct CaptureControl {
    tx: Arc<watch::Sender<AbortRequest>>,
}

impl CaptureControl {
    fn new() -> (Self, watch::Receiver<AbortRequest>) {
        let (tx, rx) = watch::channel(AbortRequest::None);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Abort the in-flight capture and go back to armed
    pub fn retake(&self) {
        self.tx.send_replace(AbortRequest::Retake);
    }

    /// Abort whatever is running and cancel the session
    pub fn cancel(&self) {
        self.tx.send_replace(AbortRequest::Cancel);
    }

    pub fn pending(&self) -> AbortRequest {
        *self.tx.borrow()
    }

    fn clear(&self) {
        self.tx.send_replace(AbortRequest::None);
    }
}

/// Resolve once an abort is requested
///
/// A retake only counts when `include_retake` is set; cancel always counts.
async fn abort_requested(mut rx: watch::Receiver<AbortRequest>, include_retake: bool) {
    loop {
        let request = *rx.borrow_and_update();
        match request {
            AbortRequest::Cancel => return,
            AbortRequest::Retake if include_retake => return,
            _ => {}
        }
        if rx.changed().await.is_err() {
            // Control dropped; nothing can abort any more
            std::future::pending::<()>().await;
        }
    }
}

fn emit_to(events: &Option<mpsc::UnboundedSender<SessionEvent>>, event: SessionEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is watching
        let _ = tx.send(event);
    }
}

/// One guest interaction from armed camera to stored artifact
pub struct CaptureSession<D: CameraDevice, S: MediaStore> {
    id: Uuid,
    mode: CaptureMode,
    phase: SessionPhase,
    config: Config,
    cameras: CameraStreamManager<D>,
    store: S,
    branding: Branding,
    pipeline: PhotoPipeline,
    stream: Option<ScopedStream<D::Stream>>,
    created_at: DateTime<Local>,
    captured_at: Option<DateTime<Local>>,

    // Captured data, exclusively owned until export
    still: Option<Arc<CameraFrame>>,
    preview: Option<RgbaImage>,
    artifact: Option<MediaArtifact>,
    frame_count: usize,
    burst_progress: Option<BurstProgress>,

    // Photo edits
    filters: FilterControls,
    stickers: StickerBoard,

    recorder: VideoRecorder,
    failure: Option<SessionFailure>,
    exported: Option<ExportedMedia>,
    control: CaptureControl,
    abort_rx: watch::Receiver<AbortRequest>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl<D: CameraDevice, S: MediaStore> CaptureSession<D, S> {
    /// Create an idle session
    pub fn new(
        cameras: CameraStreamManager<D>,
        store: S,
        config: Config,
        branding: Branding,
    ) -> Self {
        let id = Uuid::new_v4();
        let board = config.constraints_for(CaptureMode::default()).resolution;
        let (control, abort_rx) = CaptureControl::new();

        info!(session = %id, "Capture session created");

        Self {
            id,
            mode: CaptureMode::default(),
            phase: SessionPhase::Idle,
            pipeline: PhotoPipeline::with_quality(config.jpeg_quality),
            recorder: VideoRecorder::new(config.max_video_duration()),
            config,
            cameras,
            store,
            branding,
            stream: None,
            created_at: Local::now(),
            captured_at: None,
            still: None,
            preview: None,
            artifact: None,
            frame_count: 0,
            burst_progress: None,
            filters: FilterControls::new(),
            stickers: StickerBoard::new(board.width, board.height),
            failure: None,
            exported: None,
            control,
            abort_rx,
            events: None,
        }
    }

    /// Send [`SessionEvent`]s to `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn captured_at(&self) -> Option<DateTime<Local>> {
        self.captured_at
    }

    /// Abort handle for in-flight captures
    pub fn control(&self) -> CaptureControl {
        self.control.clone()
    }

    pub fn filters(&self) -> &FilterControls {
        &self.filters
    }

    pub fn stickers(&self) -> &StickerBoard {
        &self.stickers
    }

    /// Rendered photo shown while reviewing
    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    /// Encoded artifact, once one exists
    pub fn artifact(&self) -> Option<&MediaArtifact> {
        self.artifact.as_ref()
    }

    /// Progress of the current burst (gif/boomerang only)
    pub fn burst_progress(&self) -> Option<&BurstProgress> {
        self.burst_progress.as_ref()
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    pub fn exported(&self) -> Option<&ExportedMedia> {
        self.exported.as_ref()
    }

    /// Whether a live stream is attached
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stream_resolution(&self) -> Option<Resolution> {
        self.stream.as_deref().map(LiveStream::resolution)
    }

    fn emit(&self, event: SessionEvent) {
        emit_to(&self.events, event);
    }

    fn transition(&mut self, to: SessionPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        info!(session = %self.id, mode = %self.mode, from = %from, to = %to, "Session phase changed");
        self.phase = to;
        self.emit(SessionEvent::PhaseChanged { from, to });
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        debug!(session = %self.id, phase = %self.phase, action, "Rejected session action");
        SessionError::InvalidTransition {
            phase: self.phase,
            action,
        }
    }

    /// Move to Failed, release the camera and record the cause
    fn fail(&mut self, error: impl Into<SessionError>, recovery: Recovery) -> SessionError {
        let error = error.into();
        match &error {
            SessionError::Compositing(_) => {
                error!(session = %self.id, error = %error, "Session failed")
            }
            _ => warn!(session = %self.id, error = %error, recovery = ?recovery, "Session failed"),
        }

        self.release_stream();
        self.recorder = VideoRecorder::new(self.config.max_video_duration());
        if recovery != Recovery::RetryExport {
            self.discard_capture();
        }

        self.failure = Some(SessionFailure {
            error: error.clone(),
            recovery,
        });
        self.transition(SessionPhase::Failed);
        self.emit(SessionEvent::Failed {
            message: error.to_string(),
            recovery,
        });
        error
    }

    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!(session = %self.id, device = %stream.device_id(), "Releasing session stream");
        }
    }

    fn discard_capture(&mut self) {
        self.still = None;
        self.preview = None;
        self.artifact = None;
        self.captured_at = None;
        self.frame_count = 0;
        self.burst_progress = None;
    }

    fn reset_edits(&mut self) {
        self.filters.reset();
        self.stickers.clear();
    }

    /// Read the pending abort; a stale retake is dropped
    fn take_abort(&mut self) -> AbortRequest {
        let request = *self.abort_rx.borrow_and_update();
        if request == AbortRequest::Retake {
            self.control.clear();
            self.abort_rx.borrow_and_update();
        }
        request
    }

    /// Apply the abort that interrupted a capture
    fn handle_abort(&mut self) -> CaptureOutcome {
        let request = *self.abort_rx.borrow_and_update();
        self.discard_capture();
        self.recorder = VideoRecorder::new(self.config.max_video_duration());

        if request == AbortRequest::Cancel {
            self.cancel_now();
            return CaptureOutcome::Cancelled;
        }

        self.control.clear();
        self.abort_rx.borrow_and_update();
        info!(session = %self.id, "Capture aborted, back to armed");
        self.transition(SessionPhase::Armed);
        CaptureOutcome::Retaken
    }

    fn cancel_now(&mut self) {
        self.release_stream();
        self.recorder = VideoRecorder::new(self.config.max_video_duration());
        self.discard_capture();
        info!(session = %self.id, "Session cancelled");
        self.transition(SessionPhase::Cancelled);
    }

    /// Drop any held stream and acquire one for the current mode
    async fn acquire_stream(&mut self) -> SessionResult<()> {
        self.release_stream();

        let constraints = self.config.constraints_for(self.mode);
        let rx = self.abort_rx.clone();
        let result = tokio::select! {
            result = self.cameras.acquire(&constraints) => Some(result),
            _ = abort_requested(rx, false) => None,
        };

        match result {
            Some(Ok(stream)) => {
                let resolution = stream.resolution();
                self.stickers.resize_bounds(resolution.width, resolution.height);
                self.stream = Some(stream);
                self.transition(SessionPhase::Armed);
                Ok(())
            }
            Some(Err(e)) => Err(self.fail(e, Recovery::Rearm)),
            None => {
                self.cancel_now();
                Ok(())
            }
        }
    }

    /// Acquire the camera for `mode`
    ///
    /// # Returns
    /// * `Ok(())` - Armed (or cancelled while acquiring)
    /// * `Err(SessionError::Device)` - Acquisition refused; the session failed
    pub async fn arm(&mut self, mode: CaptureMode) -> SessionResult<()> {
        if self.phase != SessionPhase::Idle {
            return Err(self.invalid("arm"));
        }
        if self.take_abort() == AbortRequest::Cancel {
            self.cancel_now();
            return Ok(());
        }

        info!(session = %self.id, mode = %mode, "Arming session");
        self.mode = mode;
        self.acquire_stream().await
    }

    /// Change mode, re-acquiring the stream with the new constraints
    ///
    /// Any captured data and edits are discarded.
    pub async fn switch_mode(&mut self, mode: CaptureMode) -> SessionResult<()> {
        if !matches!(self.phase, SessionPhase::Armed | SessionPhase::Reviewing) {
            return Err(self.invalid("switch mode"));
        }
        if mode == self.mode && self.phase == SessionPhase::Armed {
            return Ok(());
        }

        info!(session = %self.id, from = %self.mode, to = %mode, "Switching capture mode");
        self.discard_capture();
        self.reset_edits();
        self.mode = mode;
        self.acquire_stream().await
    }

    /// Re-acquire the camera after a device or sampling failure
    pub async fn rearm(&mut self) -> SessionResult<()> {
        let recoverable = self.phase == SessionPhase::Failed
            && self.failure.as_ref().map(|f| f.recovery) == Some(Recovery::Rearm);
        if !recoverable {
            return Err(self.invalid("re-arm"));
        }

        self.failure = None;
        self.discard_capture();
        self.acquire_stream().await
    }

    /// Count down and capture a still or burst
    ///
    /// Video mode records through [`CaptureSession::start_recording`] or
    /// [`CaptureSession::record_video`] instead.
    pub async fn trigger_capture(&mut self) -> SessionResult<CaptureOutcome> {
        if self.phase != SessionPhase::Armed {
            return Err(self.invalid("trigger capture"));
        }
        if !self.mode.uses_countdown() {
            return Err(self.invalid("trigger a countdown in video mode"));
        }
        if self.take_abort() == AbortRequest::Cancel {
            self.cancel_now();
            return Ok(CaptureOutcome::Cancelled);
        }

        self.transition(SessionPhase::Countdown);
        let events = self.events.clone();
        let rx = self.abort_rx.clone();
        let outcome = Countdown::new(self.config.countdown_seconds)
            .run(abort_requested(rx, true), |remaining| {
                emit_to(&events, SessionEvent::CountdownTick(remaining))
            })
            .await;

        if let CountdownOutcome::Aborted { remaining } = outcome {
            debug!(session = %self.id, remaining, "Countdown aborted");
            return Ok(self.handle_abort());
        }

        self.emit(SessionEvent::CountdownFired);
        self.transition(SessionPhase::Capturing);
        self.captured_at = Some(Local::now());

        if self.mode.is_burst() {
            self.capture_burst().await
        } else {
            self.capture_photo().await
        }
    }

    async fn capture_photo(&mut self) -> SessionResult<CaptureOutcome> {
        let still = match self.stream.as_deref() {
            Some(stream) => PhotoCapture::capture_still(stream),
            None => Err(DeviceError::Disconnected),
        };
        let still = match still {
            Ok(still) => Arc::new(still),
            Err(e) => return Err(self.fail(e, Recovery::Rearm)),
        };

        info!(session = %self.id, width = still.width, height = still.height, "Still captured");
        self.still = Some(still);
        self.transition(SessionPhase::Composing);
        self.render_preview().await?;
        self.transition(SessionPhase::Reviewing);
        Ok(CaptureOutcome::Ready)
    }

    async fn capture_burst(&mut self) -> SessionResult<CaptureOutcome> {
        let Some(config) = self.config.burst_for(self.mode) else {
            return Err(self.invalid("sample a burst"));
        };
        let sampler = match BurstSampler::new(config) {
            Ok(sampler) => sampler,
            Err(e) => return Err(self.fail(e, Recovery::Rearm)),
        };
        self.burst_progress = Some(sampler.progress());

        let events = self.events.clone();
        let rx = self.abort_rx.clone();
        let result = match self.stream.as_deref() {
            Some(stream) => {
                let run = sampler.run(stream, |captured, total| {
                    emit_to(&events, SessionEvent::FrameCaptured { captured, total })
                });
                tokio::select! {
                    biased;
                    _ = abort_requested(rx, true) => None,
                    result = run => Some(result),
                }
            }
            None => Some(Err(SamplingError::Interrupted {
                captured: 0,
                expected: config.frame_count,
                cause: DeviceError::Disconnected,
            })),
        };

        let buffer = match result {
            None => return Ok(self.handle_abort()),
            Some(Ok(buffer)) => buffer,
            // A malformed frame is a broken device contract, not worth a retry
            Some(Err(SamplingError::Frame(e))) => return Err(self.fail(e, Recovery::None)),
            Some(Err(e)) => return Err(self.fail(e, Recovery::Rearm)),
        };

        self.frame_count = buffer.len();
        self.transition(SessionPhase::Composing);

        let playback = match self.mode {
            CaptureMode::Boomerang => Playback::Boomerang,
            _ => Playback::Forward,
        };
        match self
            .pipeline
            .encode_burst(buffer, config.interval(), playback)
            .await
        {
            Ok(encoded) => {
                self.artifact = Some(MediaArtifact::from_encoded(encoded, self.mode));
            }
            Err(e) => return Err(self.fail(e, Recovery::None)),
        }

        self.transition(SessionPhase::Reviewing);
        Ok(CaptureOutcome::Ready)
    }

    fn watermark(&self) -> Watermark {
        let timestamp = self.captured_at.unwrap_or(self.created_at);
        Watermark::new(self.branding.clone(), timestamp.naive_local())
    }

    /// Composite the held still with the current edits
    async fn render_preview(&mut self) -> SessionResult<()> {
        let Some(frame) = self.still.clone() else {
            return Err(self.invalid("render without a still"));
        };

        let request = CompositionRequest {
            frame,
            filters: self.filters.settings(),
            stickers: self.stickers.stickers().to_vec(),
            watermark: self.watermark(),
        };

        match self.pipeline.compose(request).await {
            Ok(image) => {
                self.preview = Some(image);
                self.artifact = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e, Recovery::None)),
        }
    }

    /// Change filters or stickers (photo mode only)
    ///
    /// Allowed while armed (edits apply to the next capture) and while
    /// reviewing, where the review image is re-rendered immediately.
    pub async fn edit<F>(&mut self, change: F) -> SessionResult<()>
    where
        F: FnOnce(&mut FilterControls, &mut StickerBoard),
    {
        if self.mode != CaptureMode::Photo {
            return Err(self.invalid("edit filters or stickers outside photo mode"));
        }
        if !matches!(self.phase, SessionPhase::Armed | SessionPhase::Reviewing) {
            return Err(self.invalid("edit"));
        }

        change(&mut self.filters, &mut self.stickers);
        debug!(
            session = %self.id,
            filters = %self.filters.settings().to_css(),
            stickers = self.stickers.stickers().len(),
            "Edits applied"
        );

        if self.phase == SessionPhase::Reviewing {
            self.render_preview().await?;
        }
        Ok(())
    }

    /// Start recording straight from armed (video mode)
    pub fn start_recording(&mut self) -> SessionResult<()> {
        if self.phase != SessionPhase::Armed || self.mode != CaptureMode::Video {
            return Err(self.invalid("start recording"));
        }
        if self.take_abort() == AbortRequest::Cancel {
            self.cancel_now();
            return Ok(());
        }

        let started = match self.stream.as_deref_mut() {
            Some(stream) => self.recorder.start(stream),
            None => Err(RecordingError::Failed("no live stream".to_string())),
        };
        if let Err(e) = started {
            return Err(self.fail(e, Recovery::Rearm));
        }

        self.captured_at = Some(Local::now());
        self.transition(SessionPhase::Capturing);
        self.emit(SessionEvent::RecordingStarted);
        Ok(())
    }

    /// Stop recording and review the clip
    pub fn stop_recording(&mut self) -> SessionResult<()> {
        if self.phase != SessionPhase::Capturing || !self.recorder.is_recording() {
            return Err(self.invalid("stop recording"));
        }

        let clip = match self.stream.as_deref_mut() {
            Some(stream) => self.recorder.stop(stream),
            None => Err(RecordingError::Failed("no live stream".to_string())),
        };
        let clip = match clip {
            Ok(clip) => clip,
            Err(e) => return Err(self.fail(e, Recovery::Rearm)),
        };

        self.transition(SessionPhase::Composing);
        self.emit(SessionEvent::RecordingStopped {
            duration_ms: clip.duration.as_millis() as u64,
        });
        self.artifact = Some(MediaArtifact::from_clip(clip, None));
        self.transition(SessionPhase::Reviewing);
        Ok(())
    }

    /// Record until `stop` resolves, the duration limit passes, or an abort
    pub async fn record_video<F>(&mut self, stop: F) -> SessionResult<CaptureOutcome>
    where
        F: Future<Output = ()>,
    {
        if self.phase != SessionPhase::Armed || self.mode != CaptureMode::Video {
            return Err(self.invalid("record video"));
        }
        if self.take_abort() == AbortRequest::Cancel {
            self.cancel_now();
            return Ok(CaptureOutcome::Cancelled);
        }

        self.captured_at = Some(Local::now());
        self.transition(SessionPhase::Capturing);
        self.emit(SessionEvent::RecordingStarted);

        let rx = self.abort_rx.clone();
        let stop_or_abort = async move {
            tokio::select! {
                _ = stop => {}
                _ = abort_requested(rx, true) => {}
            }
        };

        let result = match self.stream.as_deref_mut() {
            Some(stream) => self.recorder.record_until(stream, stop_or_abort).await,
            None => Err(RecordingError::Failed("no live stream".to_string())),
        };

        let (clip, reason) = match result {
            Ok(recorded) => recorded,
            Err(e) => return Err(self.fail(e, Recovery::Rearm)),
        };

        if *self.abort_rx.borrow() != AbortRequest::None {
            debug!(session = %self.id, bytes = clip.data.len(), "Recording aborted, clip discarded");
            return Ok(self.handle_abort());
        }

        info!(session = %self.id, reason = ?reason, "Recording finished");
        self.transition(SessionPhase::Composing);
        self.emit(SessionEvent::RecordingStopped {
            duration_ms: clip.duration.as_millis() as u64,
        });
        self.artifact = Some(MediaArtifact::from_clip(clip, None));
        self.transition(SessionPhase::Reviewing);
        Ok(CaptureOutcome::Ready)
    }

    /// Discard the capture and edits, back to armed on the same stream
    pub async fn retake(&mut self) -> SessionResult<()> {
        if self.phase != SessionPhase::Reviewing {
            return Err(self.invalid("retake"));
        }

        info!(session = %self.id, "Retake requested");
        self.discard_capture();
        self.reset_edits();

        if self.stream.as_deref().is_some_and(LiveStream::is_live) {
            self.transition(SessionPhase::Armed);
            Ok(())
        } else {
            self.acquire_stream().await
        }
    }

    /// Approve the reviewed artifact and export it
    pub async fn confirm(&mut self) -> SessionResult<ExportedMedia> {
        if self.phase != SessionPhase::Reviewing {
            return Err(self.invalid("confirm"));
        }
        self.export().await
    }

    /// Try the store again after an export failure
    pub async fn retry_export(&mut self) -> SessionResult<ExportedMedia> {
        let recoverable = self.phase == SessionPhase::Failed
            && self.failure.as_ref().map(|f| f.recovery) == Some(Recovery::RetryExport);
        if !recoverable {
            return Err(self.invalid("retry export"));
        }

        info!(session = %self.id, "Retrying export");
        self.failure = None;
        self.export().await
    }

    async fn export(&mut self) -> SessionResult<ExportedMedia> {
        self.transition(SessionPhase::Exporting);

        let artifact = match (self.artifact.clone(), self.preview.clone()) {
            (Some(artifact), _) => artifact,
            (None, Some(preview)) => match self.pipeline.encode_photo(preview).await {
                Ok(encoded) => {
                    let artifact = MediaArtifact::from_encoded(encoded, self.mode);
                    self.artifact = Some(artifact.clone());
                    artifact
                }
                Err(e) => return Err(self.fail(e, Recovery::None)),
            },
            (None, None) => {
                return Err(self.fail(
                    crate::errors::CompositingError::Encoding("nothing to export".to_string()),
                    Recovery::None,
                ));
            }
        };

        let metadata = self.metadata(&artifact);
        info!(
            session = %self.id,
            mime = %artifact.mime,
            bytes = artifact.len(),
            "Exporting artifact"
        );

        match self.store.store(&artifact, &metadata).await {
            Ok(url) => {
                let exported = ExportedMedia {
                    url: url.clone(),
                    mime: artifact.mime.clone(),
                    mode: self.mode,
                    session_id: self.id.to_string(),
                };
                self.exported = Some(exported.clone());
                self.release_stream();
                self.still = None;
                self.preview = None;
                self.emit(SessionEvent::Exported { url });
                self.transition(SessionPhase::Done);
                Ok(exported)
            }
            Err(e) => Err(self.fail(e, Recovery::RetryExport)),
        }
    }

    fn metadata(&self, artifact: &MediaArtifact) -> ArtifactMetadata {
        let photo = self.mode == CaptureMode::Photo;
        let captured_at = self.captured_at.unwrap_or(self.created_at);

        ArtifactMetadata {
            session_id: self.id.to_string(),
            mode: self.mode,
            mime: artifact.mime.clone(),
            filter_settings: photo.then(|| self.filters.settings()),
            sticker_placements: if photo {
                self.stickers.stickers().to_vec()
            } else {
                Vec::new()
            },
            event_id: self.branding.event_id.clone(),
            captured_at: captured_at.to_rfc3339(),
            frame_count: self.mode.is_burst().then_some(self.frame_count),
            width: artifact.dimensions.map(|(w, _)| w),
            height: artifact.dimensions.map(|(_, h)| h),
        }
    }

    /// End the session, releasing the camera and any captured data
    pub fn cancel(&mut self) -> SessionResult<()> {
        if self.phase.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.cancel_now();
        Ok(())
    }
}

impl<D: CameraDevice, S: MediaStore> std::fmt::Debug for CaptureSession<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("stream", &self.stream)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_camera::VirtualCamera;
    use crate::storage::MemoryMediaStore;

    fn session(camera: VirtualCamera) -> CaptureSession<VirtualCamera, MemoryMediaStore> {
        CaptureSession::new(
            CameraStreamManager::new(camera),
            MemoryMediaStore::new(),
            Config::default(),
            Branding::default(),
        )
    }

    #[tokio::test]
    async fn test_invalid_actions_leave_state_alone() {
        let mut session = session(VirtualCamera::test_pattern());

        let err = session.confirm().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                phase: SessionPhase::Idle,
                action: "confirm",
            }
        );
        assert!(session.trigger_capture().await.is_err());
        assert_eq!(session.phase(), SessionPhase::Idle);

        session.arm(CaptureMode::Photo).await.unwrap();
        assert!(session.arm(CaptureMode::Photo).await.is_err());
        assert!(session.stop_recording().is_err());
        assert_eq!(session.phase(), SessionPhase::Armed);
    }

    #[tokio::test]
    async fn test_edits_rejected_outside_photo_mode() {
        let mut session = session(VirtualCamera::test_pattern());
        session.arm(CaptureMode::Gif).await.unwrap();

        let result = session.edit(|filters, _| filters.reset()).await;
        assert!(matches!(result, Err(SessionError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_switch_mode_reacquires_with_new_constraints() {
        let camera = VirtualCamera::test_pattern();
        let stats = camera.stats();
        let mut session = session(camera);

        session.arm(CaptureMode::Photo).await.unwrap();
        assert_eq!(session.stream_resolution(), Some(Resolution::new(1280, 720)));

        session.switch_mode(CaptureMode::Boomerang).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Armed);
        assert_eq!(session.stream_resolution(), Some(Resolution::new(640, 640)));
        assert_eq!(stats.acquisitions(), 2);
        assert_eq!(stats.live_streams(), 1);
    }

    #[tokio::test]
    async fn test_cancel_releases_stream() {
        let camera = VirtualCamera::test_pattern();
        let stats = camera.stats();
        let mut session = session(camera);

        session.arm(CaptureMode::Photo).await.unwrap();
        session.cancel().unwrap();
        assert_eq!(session.phase(), SessionPhase::Cancelled);
        assert!(!session.has_stream());
        assert_eq!(stats.live_streams(), 0);
        assert!(session.cancel().is_err());
    }

    #[tokio::test]
    async fn test_video_without_microphone_fails_with_rearm() {
        let mut session = session(VirtualCamera::test_pattern().without_microphone());
        session.arm(CaptureMode::Video).await.unwrap();

        let err = session.start_recording().unwrap_err();
        assert_eq!(err, SessionError::Recording(RecordingError::NoAudioDevice));
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.failure().map(|f| f.recovery), Some(Recovery::Rearm));
    }
}

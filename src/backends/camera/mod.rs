// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureSession    │
//! └──────────┬──────────┘
//!            │ acquire / drop
//!            ▼
//! ┌─────────────────────┐
//! │ CameraStreamManager │  ← Device leases, scoped release
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraDevice Trait │  ← Platform capability surface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │VirtualCamera │  ← Synthetic implementation
//!     └──────────────┘
//! ```

pub mod manager;
pub mod types;

pub use manager::{CameraStreamManager, ScopedStream};
pub use types::*;

use crate::errors::RecordingError;
use std::future::Future;

/// A live camera stream
///
/// Obtained from [`CameraDevice::acquire`]. The stream stays live until
/// [`LiveStream::stop`] is called; [`ScopedStream`] calls it on drop.
pub trait LiveStream: Send + Sync {
    /// Identifier of the device backing this stream
    fn device_id(&self) -> &str;

    /// Resolution the device is delivering
    fn resolution(&self) -> Resolution;

    /// Whether a microphone track was opened alongside the video
    fn has_audio(&self) -> bool;

    /// Whether the device is still delivering frames
    fn is_live(&self) -> bool;

    /// Copy the current stream content into a still frame
    ///
    /// This is synchronous: it returns whatever the stream shows right now.
    ///
    /// # Returns
    /// * `Ok(CameraFrame)` - RGBA frame at the stream's native resolution
    /// * `Err(DeviceError::Disconnected)` - The device went away
    fn snapshot(&self) -> BackendResult<CameraFrame>;

    /// Start the platform recorder on this stream
    fn start_recording(&mut self) -> Result<(), RecordingError>;

    /// Stop the platform recorder and return the finished container
    fn stop_recording(&mut self) -> Result<RecordedClip, RecordingError>;

    /// Stop all tracks and release the device
    fn stop(&mut self);
}

/// Platform capability surface for one camera device
pub trait CameraDevice: Send + Sync {
    type Stream: LiveStream + 'static;

    /// Stable identifier used for lease bookkeeping
    fn device_id(&self) -> String;

    /// Open a live stream matching `constraints`
    ///
    /// Acquisition may fail (permission denied, no device, busy). Failures are
    /// reported to the caller as-is and never retried here.
    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = BackendResult<Self::Stream>> + Send;
}

// SPDX-License-Identifier: GPL-3.0-only

//! PixelBooth - capture and composition core for a photo booth kiosk
//!
//! This library acquires a camera, counts down, captures a photo, a timed
//! burst or a video clip, composites filters, stickers and a branding
//! watermark, and hands the finished artifact to a media store.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Capture session state machine and countdown
//! - [`backends`]: Camera device abstraction and the virtual camera
//! - [`pipelines`]: Photo compositing, burst sampling, encoding and video recording
//! - [`storage`]: Media store interface and implementations
//! - [`config`]: Kiosk configuration handling
//!
//! # Example
//!
//! ```ignore
//! let cameras = CameraStreamManager::new(VirtualCamera::test_pattern());
//! let store = LocalMediaStore::new("/tmp/booth");
//! let mut session = CaptureSession::new(cameras, store, Config::default(), Branding::default());
//! session.arm(CaptureMode::Photo).await?;
//! session.trigger_capture().await?;
//! let exported = session.confirm().await?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{CaptureMode, CaptureSession, SessionEvent, SessionPhase};
pub use config::Config;
pub use errors::{SessionError, SessionResult};

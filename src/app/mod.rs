// SPDX-License-Identifier: GPL-3.0-only

//! Capture session logic
//!
//! # Architecture
//!
//! - `state`: Session phases, capture modes, events and failure records
//! - `countdown`: Drift-free countdown before a capture fires
//! - `session`: The state machine that owns the camera and captured data
//!
//! # Main Types
//!
//! - [`CaptureSession`]: One guest interaction, armed camera to stored artifact
//! - [`CaptureControl`]: Abort handle usable while a capture is in flight
//! - [`SessionEvent`]: Notifications for a preview or operator surface

pub mod countdown;
pub mod session;
pub mod state;

pub use countdown::{Countdown, CountdownEvent, CountdownOutcome};
pub use session::{AbortRequest, CaptureControl, CaptureOutcome, CaptureSession};
pub use state::{
    CaptureMode, ExportedMedia, Recovery, SessionEvent, SessionFailure, SessionPhase,
};

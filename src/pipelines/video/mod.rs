// SPDX-License-Identifier: GPL-3.0-only

//! Video recording pipeline
//!
//! Container encoding belongs to the platform recorder behind
//! [`crate::backends::camera::LiveStream`]. This module only drives it:
//! start, stop on request or at the duration limit, collect the clip.

pub mod recorder;

pub use recorder::{StopReason, VideoRecorder};

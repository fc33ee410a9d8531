// SPDX-License-Identifier: GPL-3.0-only

//! Session state types

use crate::backends::camera::types::StreamConstraints;
use crate::errors::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the booth captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Photo,
    Video,
    Gif,
    Boomerang,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 4] = [
        CaptureMode::Photo,
        CaptureMode::Video,
        CaptureMode::Gif,
        CaptureMode::Boomerang,
    ];

    /// Animated modes sample a burst instead of a single still
    pub fn is_burst(&self) -> bool {
        matches!(self, CaptureMode::Gif | CaptureMode::Boomerang)
    }

    /// Video starts recording straight from armed
    pub fn uses_countdown(&self) -> bool {
        !matches!(self, CaptureMode::Video)
    }

    /// Default stream constraints for this mode
    pub fn default_constraints(&self) -> StreamConstraints {
        match self {
            CaptureMode::Photo => StreamConstraints::photo(),
            CaptureMode::Video => StreamConstraints::video(),
            CaptureMode::Gif | CaptureMode::Boomerang => StreamConstraints::burst(),
        }
    }

    /// Short tag used in file names and metadata
    pub fn tag(&self) -> &'static str {
        match self {
            CaptureMode::Photo => "photo",
            CaptureMode::Video => "video",
            CaptureMode::Gif => "gif",
            CaptureMode::Boomerang => "boomerang",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Lifecycle phase of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No stream held
    #[default]
    Idle,
    /// Stream live, waiting for the trigger
    Armed,
    /// Counting down to capture
    Countdown,
    /// Taking a still, sampling a burst, or recording
    Capturing,
    /// Building the artifact
    Composing,
    /// Artifact ready for approval; photo edits re-render here
    Reviewing,
    /// Handing the artifact to the store
    Exporting,
    /// Stored; public URL recorded
    Done,
    /// Aborted by the operator
    Cancelled,
    /// Stopped by an error
    Failed,
}

impl SessionPhase {
    /// Done and Cancelled never change again; Failed may be recovered
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Done | SessionPhase::Cancelled)
    }

    /// Phases in which a capture is in flight
    pub fn is_capturing(&self) -> bool {
        matches!(
            self,
            SessionPhase::Countdown | SessionPhase::Capturing | SessionPhase::Composing
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Armed => "armed",
            SessionPhase::Countdown => "counting down",
            SessionPhase::Capturing => "capturing",
            SessionPhase::Composing => "composing",
            SessionPhase::Reviewing => "reviewing",
            SessionPhase::Exporting => "exporting",
            SessionPhase::Done => "done",
            SessionPhase::Cancelled => "cancelled",
            SessionPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// What the operator can do after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Acquire the camera again and start over
    Rearm,
    /// The artifact is intact; try the store again
    RetryExport,
    /// Nothing to recover; start a new session
    None,
}

/// Failure details kept on a failed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub error: SessionError,
    pub recovery: Recovery,
}

impl SessionFailure {
    /// Human-readable cause
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Notifications emitted while a session runs
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    CountdownTick(u32),
    CountdownFired,
    FrameCaptured {
        captured: usize,
        total: usize,
    },
    RecordingStarted,
    RecordingStopped {
        duration_ms: u64,
    },
    Failed {
        message: String,
        recovery: Recovery,
    },
    Exported {
        url: String,
    },
}

/// Result handed to the sharing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedMedia {
    pub url: String,
    pub mime: String,
    pub mode: CaptureMode,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_properties() {
        assert!(CaptureMode::Gif.is_burst());
        assert!(CaptureMode::Boomerang.is_burst());
        assert!(!CaptureMode::Photo.is_burst());
        assert!(!CaptureMode::Video.uses_countdown());
        assert!(CaptureMode::Video.default_constraints().audio);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(SessionPhase::Done.is_terminal());
        assert!(SessionPhase::Cancelled.is_terminal());
        assert!(!SessionPhase::Failed.is_terminal());
        assert!(!SessionPhase::Reviewing.is_terminal());
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&CaptureMode::Boomerang).unwrap();
        assert_eq!(json, "\"boomerang\"");
    }
}

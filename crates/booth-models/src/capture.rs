//! Capture phase state machine and media kinds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capture phase states.
///
/// ```text
/// Idle -> Previewing -> (CapturingPhoto | Recording) -> Reviewing
///                ^                                          |
///                +--------------- retake -------------------+-> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// Session created, pipeline not yet running
    #[default]
    Idle,
    /// Live composited preview running
    Previewing,
    /// Photo snapshot in flight
    CapturingPhoto,
    /// Video recording in flight
    Recording,
    /// Captured media shown for review
    Reviewing,
    /// Session finished
    Done,
}

/// Rejected state transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid capture transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: CaptureState,
    pub to: CaptureState,
}

impl CaptureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Previewing => "previewing",
            CaptureState::CapturingPhoto => "capturing_photo",
            CaptureState::Recording => "recording",
            CaptureState::Reviewing => "reviewing",
            CaptureState::Done => "done",
        }
    }

    /// Whether `to` is a legal next state.
    pub fn can_transition_to(&self, to: CaptureState) -> bool {
        use CaptureState::*;
        matches!(
            (*self, to),
            (Idle, Previewing)
                | (Previewing, CapturingPhoto)
                | (Previewing, Recording)
                | (CapturingPhoto, Reviewing)
                | (Recording, Reviewing)
                | (Reviewing, Previewing)
                | (Reviewing, Done)
        )
    }

    /// Validated transition.
    pub fn transition_to(&self, to: CaptureState) -> Result<CaptureState, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: *self, to })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Done)
    }
}

/// Kind of captured media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Storage key path segment.
    pub fn key_part(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/png",
            MediaKind::Video => "video/webm",
        }
    }

    /// Suggested download filename for a given artist.
    pub fn download_name(&self, artist_name: &str) -> String {
        match self {
            MediaKind::Image => format!("{artist_name}-image.png"),
            MediaKind::Video => format!("{artist_name}-video.webm"),
        }
    }
}

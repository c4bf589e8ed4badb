//! Shared data models for the FanBooth backend.
//!
//! This crate provides Serde-serializable types for:
//! - Artist profiles and overlay frame sequences
//! - Session parameters carried via encrypted QR routing
//! - Capture state machine and media kinds
//! - Transaction counters and reporting schemas
//! - Recording format candidates and compositor placement

pub mod artist;
pub mod capture;
pub mod encoding;
pub mod placement;
pub mod sequence;
pub mod session;
pub mod transaction;

// Re-export common types
pub use artist::{ArtistProfile, ARTIST_COUNT};
pub use capture::{CaptureState, MediaKind, TransitionError};
pub use encoding::{RecordingFormat, RECORD_FPS};
pub use placement::{Anchor, BackgroundKind, NormalizedRect, Placement, PixelRect};
pub use sequence::{AnimationSequence, FrameCadence, FramePattern, SequenceVariant};
pub use session::{AccessId, SessionParams};
pub use transaction::{
    ArtistSaveShareTotal, ArtistTotal, CounterField, CreateAccessRequest, CreateAccessResponse,
    DailyAggregate, IncrementRequest, TransactionReport,
};

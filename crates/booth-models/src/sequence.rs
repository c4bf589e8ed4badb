//! Overlay animation sequences and frame path patterns.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which variant of a sequence is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SequenceVariant {
    /// Standard outcome overlay
    Normal,
    /// Rare outcome overlay
    Secret,
    /// Follow-up animation played after a secret outcome
    Congratulations,
}

impl SequenceVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceVariant::Normal => "normal",
            SequenceVariant::Secret => "secret",
            SequenceVariant::Congratulations => "congratulations",
        }
    }
}

/// A zero-padded frame filename pattern.
///
/// The asset packs are inconsistent about padding width (`_00.png` vs
/// `0000.png`), so the width is part of the pattern rather than assumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FramePattern {
    /// Directory containing the frames, relative to the assets root
    pub dir: String,
    /// Filename prefix before the frame number
    pub prefix: String,
    /// Zero-pad width of the frame number
    pub pad: usize,
    /// Total number of frames
    pub count: usize,
}

impl FramePattern {
    pub fn new(
        dir: impl Into<String>,
        prefix: impl Into<String>,
        pad: usize,
        count: usize,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            pad,
            count,
        }
    }

    /// Path of frame `index`, relative to the assets root.
    pub fn path(&self, index: usize) -> String {
        format!(
            "{}/{}{:0width$}.png",
            self.dir,
            self.prefix,
            index,
            width = self.pad
        )
    }

    /// All frame paths in playback order.
    pub fn paths(&self) -> Vec<String> {
        (0..self.count).map(|i| self.path(i)).collect()
    }
}

/// Per-frame display cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FrameCadence {
    /// Fixed delay between frames, in milliseconds.
    Uniform { delay_ms: u64 },
    /// Frames near the middle of the sequence play faster than the ends,
    /// giving the spin a wind-up/wind-down feel.
    Eased { fast_ms: u64, slow_ms: u64 },
}

impl FrameCadence {
    /// The observed spin curve: 40ms through the middle half, 100ms elsewhere.
    pub const SPIN: FrameCadence = FrameCadence::Eased {
        fast_ms: 40,
        slow_ms: 100,
    };

    /// The standard overlay loop cadence (~10 fps).
    pub const OVERLAY: FrameCadence = FrameCadence::Uniform { delay_ms: 100 };

    /// Delay to hold frame `index` of a sequence of `len` frames.
    pub fn delay(&self, index: usize, len: usize) -> Duration {
        match *self {
            FrameCadence::Uniform { delay_ms } => Duration::from_millis(delay_ms),
            FrameCadence::Eased { fast_ms, slow_ms } => {
                let mid = len / 2;
                let distance = index.abs_diff(mid);
                if distance < mid / 2 {
                    Duration::from_millis(fast_ms)
                } else {
                    Duration::from_millis(slow_ms)
                }
            }
        }
    }
}

/// An ordered, finite overlay sequence.
///
/// Immutable once built; the playback cursor lives with whoever drives the
/// animation, not here.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnimationSequence {
    frames: Vec<String>,
    cadence: FrameCadence,
    variant: SequenceVariant,
}

impl AnimationSequence {
    pub fn new(frames: Vec<String>, cadence: FrameCadence, variant: SequenceVariant) -> Self {
        Self {
            frames,
            cadence,
            variant,
        }
    }

    /// Build from a frame pattern.
    pub fn from_pattern(
        pattern: &FramePattern,
        cadence: FrameCadence,
        variant: SequenceVariant,
    ) -> Self {
        Self::new(pattern.paths(), cadence, variant)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn variant(&self) -> SequenceVariant {
        self.variant
    }

    pub fn cadence(&self) -> FrameCadence {
        self.cadence
    }

    /// Frame path at `index`; panics if out of range (indexes come from a
    /// cursor already wrapped modulo `len`).
    pub fn frame(&self, index: usize) -> &str {
        &self.frames[index]
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Delay to hold frame `index`.
    pub fn delay(&self, index: usize) -> Duration {
        self.cadence.delay(index, self.frames.len())
    }

    /// Total play-once duration.
    pub fn total_duration(&self) -> Duration {
        (0..self.frames.len()).map(|i| self.delay(i)).sum()
    }
}

/// Spin-phase sequences shared by all artists.
pub mod spin {
    use super::{AnimationSequence, FrameCadence, FramePattern, SequenceVariant};

    pub const SPIN_FRAME_COUNT: usize = 90;
    pub const CONGRATS_FRAME_COUNT: usize = 20;

    pub fn normal() -> AnimationSequence {
        let pattern = FramePattern::new("spin/standard", "Comp 2_", 5, SPIN_FRAME_COUNT);
        AnimationSequence::from_pattern(&pattern, FrameCadence::SPIN, SequenceVariant::Normal)
    }

    pub fn secret() -> AnimationSequence {
        let pattern = FramePattern::new("spin/secret", "Comp 1_", 5, SPIN_FRAME_COUNT);
        AnimationSequence::from_pattern(&pattern, FrameCadence::SPIN, SequenceVariant::Secret)
    }

    pub fn congratulations() -> AnimationSequence {
        let pattern = FramePattern::new("spin/congrats", "congrat", 4, CONGRATS_FRAME_COUNT);
        AnimationSequence::from_pattern(
            &pattern,
            FrameCadence::OVERLAY,
            SequenceVariant::Congratulations,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_padding() {
        let two = FramePattern::new("a", "x_", 2, 30);
        assert_eq!(two.path(7), "a/x_07.png");

        let four = FramePattern::new("a", "x", 4, 30);
        assert_eq!(four.path(7), "a/x0007.png");
    }

    #[test]
    fn test_paths_match_count() {
        let pattern = FramePattern::new("seq", "frame_", 4, 30);
        let paths = pattern.paths();
        assert_eq!(paths.len(), pattern.count);
        assert_eq!(paths[0], "seq/frame_0000.png");
        assert_eq!(paths[29], "seq/frame_0029.png");
    }

    #[test]
    fn test_eased_cadence_fast_middle_slow_ends() {
        let cadence = FrameCadence::SPIN;
        let len = 90;
        // mid = 45, fast band is distance < 22
        assert_eq!(cadence.delay(45, len), Duration::from_millis(40));
        assert_eq!(cadence.delay(30, len), Duration::from_millis(40));
        assert_eq!(cadence.delay(0, len), Duration::from_millis(100));
        assert_eq!(cadence.delay(89, len), Duration::from_millis(100));
    }

    #[test]
    fn test_sequence_from_pattern() {
        let pattern = FramePattern::new("seq", "f", 4, 20);
        let seq =
            AnimationSequence::from_pattern(&pattern, FrameCadence::OVERLAY, SequenceVariant::Normal);
        assert_eq!(seq.len(), 20);
        assert_eq!(seq.frame(0), "seq/f0000.png");
        assert_eq!(seq.total_duration(), Duration::from_millis(2000));
    }

    #[test]
    fn test_spin_sequences() {
        assert_eq!(spin::normal().len(), spin::SPIN_FRAME_COUNT);
        assert_eq!(spin::secret().len(), spin::SPIN_FRAME_COUNT);
        assert_eq!(spin::congratulations().len(), spin::CONGRATS_FRAME_COUNT);
        assert_eq!(
            spin::congratulations().variant(),
            SequenceVariant::Congratulations
        );
    }
}

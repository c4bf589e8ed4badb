//! Static artist catalog.
//!
//! One profile per promoted artist: a background plate plus normal and
//! secret overlay sequences. The asset packs were produced by different
//! designers, hence the mixed filename padding conventions below.

use std::sync::OnceLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::sequence::FramePattern;

/// Number of artists in the campaign. Reporting zero-fills ids `1..=ARTIST_COUNT`.
pub const ARTIST_COUNT: u32 = 13;

/// Frames per artist overlay sequence.
pub const OVERLAY_FRAME_COUNT: usize = 30;

/// A single artist's asset configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArtistProfile {
    /// Artist id, `1..=ARTIST_COUNT`
    pub artist_id: u32,
    /// Display name, used in download filenames and upload keys
    pub name: String,
    /// Background plate path, relative to the assets root
    pub background: String,
    /// Standard overlay sequence
    pub normal: FramePattern,
    /// Secret overlay sequence
    pub secret: FramePattern,
}

impl ArtistProfile {
    /// Look up a profile by artist id.
    pub fn by_id(artist_id: u32) -> Option<&'static ArtistProfile> {
        catalog().iter().find(|a| a.artist_id == artist_id)
    }
}

fn profile(
    artist_id: u32,
    name: &str,
    background: &str,
    normal: FramePattern,
    secret: FramePattern,
) -> ArtistProfile {
    ArtistProfile {
        artist_id,
        name: name.to_string(),
        background: background.to_string(),
        normal,
        secret,
    }
}

fn pattern(dir: &str, prefix: &str, pad: usize) -> FramePattern {
    FramePattern::new(dir, prefix, pad, OVERLAY_FRAME_COUNT)
}

/// The full artist catalog, built once per process.
pub fn catalog() -> &'static [ArtistProfile] {
    static CATALOG: OnceLock<Vec<ArtistProfile>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        vec![
            profile(
                1,
                "JAMESJI",
                "artists/jamesji/bg.png",
                pattern("artists/jamesji/standard", "Jamesji_standard", 4),
                pattern("artists/jamesji/secret", "Jamesji_secret", 4),
            ),
            profile(
                2,
                "THAI",
                "artists/thai/bg.png",
                pattern("artists/thai/standard", "Thai_standard_", 2),
                pattern("artists/thai/secret", "Thai_secret", 4),
            ),
            profile(
                3,
                "NEX",
                "artists/nex/bg.png",
                pattern("artists/nex/standard", "Nex_standard", 4),
                pattern("artists/nex/secret", "Nex_secret", 4),
            ),
            profile(
                4,
                "KHUNPOL",
                "artists/khunpol/bg.png",
                pattern("artists/khunpol/standard", "Khunpol_standard_", 2),
                pattern("artists/khunpol/secret", "Khunpol_secret_", 2),
            ),
            profile(
                5,
                "AA",
                "artists/aa/bg.png",
                pattern("artists/aa/standard", "", 4),
                pattern("artists/aa/secret", "", 4),
            ),
            profile(
                6,
                "HEART",
                "artists/heart/bg.png",
                pattern("artists/heart/standard", "Heart_standard_", 2),
                pattern("artists/heart/secret", "Heart_secret_", 2),
            ),
            profile(
                7,
                "COPPER",
                "artists/copper/bg.png",
                pattern("artists/copper/standard", "Copper_standard", 4),
                pattern("artists/copper/secret", "Copper_secret", 4),
            ),
            profile(
                8,
                "JUNGT",
                "artists/jungt/bg.png",
                pattern("artists/jungt/standard", "JungT_standard", 4),
                pattern("artists/jungt/secret", "JungT_secret", 4),
            ),
            profile(
                9,
                "ALAN",
                "artists/alan/bg.png",
                pattern("artists/alan/standard", "Alan_standard", 2),
                pattern("artists/alan/secret", "Alan_secret_", 2),
            ),
            profile(
                10,
                "JINWOOK",
                "artists/jinwook/bg.png",
                pattern("artists/jinwook/standard", "Jinwook_standard_", 2),
                pattern("artists/jinwook/secret", "Jinwook_secret_", 2),
            ),
            profile(
                11,
                "PHUTATCHAI",
                "artists/phutatchai/bg.png",
                pattern("artists/phutatchai/standard", "Phutatchai_standard", 4),
                pattern("artists/phutatchai/secret", "Phutatchai_secret", 4),
            ),
            profile(
                12,
                "PEEMWASU",
                "artists/peemwasu/bg.png",
                pattern("artists/peemwasu/standard", "Peemwasu_standard", 4),
                pattern("artists/peemwasu/secret", "Peemwasu_secret", 4),
            ),
            profile(
                13,
                "MARKRIS",
                "artists/markris/bg.png",
                pattern("artists/markris/standard", "Marckris_standard_", 2),
                pattern("artists/markris/secret", "Marckris_secret_", 2),
            ),
        ]
    })
}

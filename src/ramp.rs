//! Grayscale ramps and brightness to glyph mapping.
//!
//! A ramp lists glyphs from darkest-appearing (densest ink) to
//! lightest-appearing. Level `0` maps to the first glyph and level `255` to
//! the last, through `floor(level * len / 256)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AsciiError;

/// 10-glyph ramp.
pub const COMPACT_RAMP: &str = "@%#*+=-:. ";

/// 70-glyph ramp.
pub const EXTENDED_RAMP: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Which built-in ramp a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampKind {
    #[default]
    Compact,
    Extended,
}

impl RampKind {
    pub fn name(&self) -> &'static str {
        match self {
            RampKind::Compact => "compact",
            RampKind::Extended => "extended",
        }
    }
}

impl fmt::Display for RampKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RampKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "short" | "10" => Ok(RampKind::Compact),
            "extended" | "long" | "70" => Ok(RampKind::Extended),
            other => Err(format!("unknown ramp '{}' (expected 'compact' or 'extended')", other)),
        }
    }
}

/// An ordered, non-empty list of printable ASCII glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ramp {
    glyphs: Vec<u8>,
}

impl Ramp {
    pub fn compact() -> Self {
        Self { glyphs: COMPACT_RAMP.as_bytes().to_vec() }
    }

    pub fn extended() -> Self {
        Self { glyphs: EXTENDED_RAMP.as_bytes().to_vec() }
    }

    pub fn from_kind(kind: RampKind) -> Self {
        match kind {
            RampKind::Compact => Self::compact(),
            RampKind::Extended => Self::extended(),
        }
    }

    /// A user supplied ramp, darkest glyph first.
    ///
    /// Only printable ASCII (space through `~`) is accepted, since every glyph
    /// has to exist in the raster fonts.
    pub fn custom(glyphs: &str) -> Result<Self, AsciiError> {
        if glyphs.is_empty() {
            return Err(AsciiError::InvalidRamp("ramp is empty".to_string()));
        }
        if let Some(bad) = glyphs.chars().find(|c| !(' '..='~').contains(c)) {
            return Err(AsciiError::InvalidRamp(format!(
                "{:?} is not a printable ASCII character",
                bad
            )));
        }
        Ok(Self { glyphs: glyphs.as_bytes().to_vec() })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[u8] {
        &self.glyphs
    }

    pub fn as_str(&self) -> &str {
        // constructors only admit ASCII
        std::str::from_utf8(&self.glyphs).unwrap_or_default()
    }
}

/// Ramp index for a brightness level: `floor(level * len / 256)`, clamped.
///
/// The 256 divisor keeps level 255 inside the ramp for every length; the
/// clamp is a backstop.
pub fn glyph_index(level: u8, len: usize) -> usize {
    (level as usize * len / 256).min(len.saturating_sub(1))
}

/// Glyph for a brightness level, computed directly.
pub fn map_brightness(level: u8, ramp: &Ramp) -> char {
    ramp.glyphs[glyph_index(level, ramp.len())] as char
}

/// Every level's glyph for one ramp, precomputed.
///
/// Built once per run and shared read-only by all frames and workers. A
/// lookup is observably identical to [`map_brightness`].
#[derive(Debug, Clone)]
pub struct GlyphTable {
    glyphs: [u8; 256],
}

impl GlyphTable {
    pub fn new(ramp: &Ramp) -> Self {
        let mut glyphs = [0u8; 256];
        for (level, slot) in glyphs.iter_mut().enumerate() {
            *slot = ramp.glyphs[glyph_index(level as u8, ramp.len())];
        }
        Self { glyphs }
    }

    #[inline]
    pub fn glyph(&self, level: u8) -> char {
        self.glyphs[level as usize] as char
    }

    #[inline]
    pub fn byte(&self, level: u8) -> u8 {
        self.glyphs[level as usize]
    }
}

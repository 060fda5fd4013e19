//! Fonts used to rasterize ASCII canvases.
//!
//! Every font is treated as monospace: the cell footprint is measured once
//! and reused for every glyph.

use std::fs;
use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{GrayImage, Luma};

use crate::error::AsciiError;

/// A fixed-width font that can ink glyphs onto a grayscale raster.
pub trait GlyphFont: Send + Sync {
    /// Pixel footprint `(width, height)` of one glyph cell.
    fn cell_size(&self) -> (u32, u32);

    /// Draw `glyph` in black with its cell's top-left corner at `(x, y)`.
    ///
    /// Strokes falling outside `target` are clipped.
    fn draw_glyph(&self, target: &mut GrayImage, glyph: char, x: u32, y: u32);
}

/// Built-in 8x8 bitmap font covering printable ASCII, optionally upscaled by
/// an integer factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    scale: u32,
}

impl BitmapFont {
    pub const GLYPH_SIZE: u32 = 8;

    /// `scale` of 0 is treated as 1.
    pub fn new(scale: u32) -> Self {
        Self { scale: scale.max(1) }
    }

    fn rows_for(glyph: char) -> &'static [u8; 8] {
        let code = glyph as u32;
        if (0x20..=0x7E).contains(&code) {
            &BASIC_GLYPHS[(code - 0x20) as usize]
        } else {
            &BASIC_GLYPHS[('?' as u32 - 0x20) as usize]
        }
    }
}

impl Default for BitmapFont {
    fn default() -> Self {
        Self::new(1)
    }
}

impl GlyphFont for BitmapFont {
    fn cell_size(&self) -> (u32, u32) {
        (Self::GLYPH_SIZE * self.scale, Self::GLYPH_SIZE * self.scale)
    }

    fn draw_glyph(&self, target: &mut GrayImage, glyph: char, x: u32, y: u32) {
        let (width, height) = target.dimensions();
        for (dy, bits) in Self::rows_for(glyph).iter().enumerate() {
            for dx in 0..Self::GLYPH_SIZE {
                // bit 0 is the leftmost pixel
                if bits >> dx & 1 == 0 {
                    continue;
                }
                let px = x + dx * self.scale;
                let py = y + dy as u32 * self.scale;
                for sy in py..(py + self.scale).min(height) {
                    for sx in px..(px + self.scale).min(width) {
                        target.put_pixel(sx, sy, Luma([0]));
                    }
                }
            }
        }
    }
}

/// A TrueType/OpenType font rasterized with `ab_glyph`.
///
/// The cell is as wide as the advance of `A` and as tall as the line
/// (ascent to descent), both rounded up. Proportional fonts still get one
/// fixed cell per glyph, so they render slightly misaligned.
pub struct TtfFont {
    font: FontVec,
    scale: PxScale,
    cell: (u32, u32),
}

impl TtfFont {
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self, AsciiError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(AsciiError::Font(format!("font size must be positive, got {}", size)));
        }
        let font = FontVec::try_from_vec(data).map_err(|e| AsciiError::Font(e.to_string()))?;
        let scale = PxScale::from(size);
        let cell = {
            let scaled = font.as_scaled(scale);
            let advance = scaled.h_advance(scaled.glyph_id('A'));
            let line = scaled.ascent() - scaled.descent();
            (advance.ceil().max(1.0) as u32, line.ceil().max(1.0) as u32)
        };
        log::debug!("loaded font at {}px, cell {}x{}", size, cell.0, cell.1);
        Ok(Self { font, scale, cell })
    }

    pub fn from_file(path: &Path, size: f32) -> Result<Self, AsciiError> {
        let data = fs::read(path).map_err(|e| AsciiError::Font(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data, size)
    }
}

impl GlyphFont for TtfFont {
    fn cell_size(&self) -> (u32, u32) {
        self.cell
    }

    fn draw_glyph(&self, target: &mut GrayImage, glyph: char, x: u32, y: u32) {
        let scaled = self.font.as_scaled(self.scale);
        let mut positioned = scaled.scaled_glyph(glyph);
        positioned.position = point(x as f32, y as f32 + scaled.ascent());

        let Some(outlined) = self.font.outline_glyph(positioned) else {
            // whitespace has no outline
            return;
        };
        let bounds = outlined.px_bounds();
        let (width, height) = target.dimensions();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i64 + gx as i64;
            let py = bounds.min.y as i64 + gy as i64;
            if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                return;
            }
            let ink = (255.0 * (1.0 - coverage.clamp(0.0, 1.0))).round() as u8;
            let pixel = target.get_pixel_mut(px as u32, py as u32);
            pixel.0[0] = pixel.0[0].min(ink);
        });
    }
}

/// font8x8 basic set (public domain, Daniel Hepper), U+0020 through U+007E.
const BASIC_GLYPHS: [[u8; 8]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x18, 0x3C, 0x3C, 0x18, 0x18, 0x00, 0x18, 0x00], // '!'
    [0x36, 0x36, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x36, 0x36, 0x7F, 0x36, 0x7F, 0x36, 0x36, 0x00], // '#'
    [0x0C, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x0C, 0x00], // '$'
    [0x00, 0x63, 0x33, 0x18, 0x0C, 0x66, 0x63, 0x00], // '%'
    [0x1C, 0x36, 0x1C, 0x6E, 0x3B, 0x33, 0x6E, 0x00], // '&'
    [0x06, 0x06, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00], // '\''
    [0x18, 0x0C, 0x06, 0x06, 0x06, 0x0C, 0x18, 0x00], // '('
    [0x06, 0x0C, 0x18, 0x18, 0x18, 0x0C, 0x06, 0x00], // ')'
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // '*'
    [0x00, 0x0C, 0x0C, 0x3F, 0x0C, 0x0C, 0x00, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ','
    [0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00], // '.'
    [0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01, 0x00], // '/'
    [0x3E, 0x63, 0x73, 0x7B, 0x6F, 0x67, 0x3E, 0x00], // '0'
    [0x0C, 0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x3F, 0x00], // '1'
    [0x1E, 0x33, 0x30, 0x1C, 0x06, 0x33, 0x3F, 0x00], // '2'
    [0x1E, 0x33, 0x30, 0x1C, 0x30, 0x33, 0x1E, 0x00], // '3'
    [0x38, 0x3C, 0x36, 0x33, 0x7F, 0x30, 0x78, 0x00], // '4'
    [0x3F, 0x03, 0x1F, 0x30, 0x30, 0x33, 0x1E, 0x00], // '5'
    [0x1C, 0x06, 0x03, 0x1F, 0x33, 0x33, 0x1E, 0x00], // '6'
    [0x3F, 0x33, 0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x00], // '7'
    [0x1E, 0x33, 0x33, 0x1E, 0x33, 0x33, 0x1E, 0x00], // '8'
    [0x1E, 0x33, 0x33, 0x3E, 0x30, 0x18, 0x0E, 0x00], // '9'
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x00], // ':'
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ';'
    [0x18, 0x0C, 0x06, 0x03, 0x06, 0x0C, 0x18, 0x00], // '<'
    [0x00, 0x00, 0x3F, 0x00, 0x00, 0x3F, 0x00, 0x00], // '='
    [0x06, 0x0C, 0x18, 0x30, 0x18, 0x0C, 0x06, 0x00], // '>'
    [0x1E, 0x33, 0x30, 0x18, 0x0C, 0x00, 0x0C, 0x00], // '?'
    [0x3E, 0x63, 0x7B, 0x7B, 0x7B, 0x03, 0x1E, 0x00], // '@'
    [0x0C, 0x1E, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x00], // 'A'
    [0x3F, 0x66, 0x66, 0x3E, 0x66, 0x66, 0x3F, 0x00], // 'B'
    [0x3C, 0x66, 0x03, 0x03, 0x03, 0x66, 0x3C, 0x00], // 'C'
    [0x1F, 0x36, 0x66, 0x66, 0x66, 0x36, 0x1F, 0x00], // 'D'
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x46, 0x7F, 0x00], // 'E'
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x06, 0x0F, 0x00], // 'F'
    [0x3C, 0x66, 0x03, 0x03, 0x73, 0x66, 0x7C, 0x00], // 'G'
    [0x33, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x33, 0x00], // 'H'
    [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'I'
    [0x78, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E, 0x00], // 'J'
    [0x67, 0x66, 0x36, 0x1E, 0x36, 0x66, 0x67, 0x00], // 'K'
    [0x0F, 0x06, 0x06, 0x06, 0x46, 0x66, 0x7F, 0x00], // 'L'
    [0x63, 0x77, 0x7F, 0x7F, 0x6B, 0x63, 0x63, 0x00], // 'M'
    [0x63, 0x67, 0x6F, 0x7B, 0x73, 0x63, 0x63, 0x00], // 'N'
    [0x1C, 0x36, 0x63, 0x63, 0x63, 0x36, 0x1C, 0x00], // 'O'
    [0x3F, 0x66, 0x66, 0x3E, 0x06, 0x06, 0x0F, 0x00], // 'P'
    [0x1E, 0x33, 0x33, 0x33, 0x3B, 0x1E, 0x38, 0x00], // 'Q'
    [0x3F, 0x66, 0x66, 0x3E, 0x36, 0x66, 0x67, 0x00], // 'R'
    [0x1E, 0x33, 0x07, 0x0E, 0x38, 0x33, 0x1E, 0x00], // 'S'
    [0x3F, 0x2D, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'T'
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x33, 0x3F, 0x00], // 'U'
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // 'V'
    [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // 'W'
    [0x63, 0x63, 0x36, 0x1C, 0x1C, 0x36, 0x63, 0x00], // 'X'
    [0x33, 0x33, 0x33, 0x1E, 0x0C, 0x0C, 0x1E, 0x00], // 'Y'
    [0x7F, 0x63, 0x31, 0x18, 0x4C, 0x66, 0x7F, 0x00], // 'Z'
    [0x1E, 0x06, 0x06, 0x06, 0x06, 0x06, 0x1E, 0x00], // '['
    [0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x40, 0x00], // '\\'
    [0x1E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1E, 0x00], // ']'
    [0x08, 0x1C, 0x36, 0x63, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // '_'
    [0x0C, 0x0C, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00], // '`'
    [0x00, 0x00, 0x1E, 0x30, 0x3E, 0x33, 0x6E, 0x00], // 'a'
    [0x07, 0x06, 0x06, 0x3E, 0x66, 0x66, 0x3B, 0x00], // 'b'
    [0x00, 0x00, 0x1E, 0x33, 0x03, 0x33, 0x1E, 0x00], // 'c'
    [0x38, 0x30, 0x30, 0x3E, 0x33, 0x33, 0x6E, 0x00], // 'd'
    [0x00, 0x00, 0x1E, 0x33, 0x3F, 0x03, 0x1E, 0x00], // 'e'
    [0x1C, 0x36, 0x06, 0x0F, 0x06, 0x06, 0x0F, 0x00], // 'f'
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x1F], // 'g'
    [0x07, 0x06, 0x36, 0x6E, 0x66, 0x66, 0x67, 0x00], // 'h'
    [0x0C, 0x00, 0x0E, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'i'
    [0x30, 0x00, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E], // 'j'
    [0x07, 0x06, 0x66, 0x36, 0x1E, 0x36, 0x67, 0x00], // 'k'
    [0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // 'l'
    [0x00, 0x00, 0x33, 0x7F, 0x7F, 0x6B, 0x63, 0x00], // 'm'
    [0x00, 0x00, 0x1F, 0x33, 0x33, 0x33, 0x33, 0x00], // 'n'
    [0x00, 0x00, 0x1E, 0x33, 0x33, 0x33, 0x1E, 0x00], // 'o'
    [0x00, 0x00, 0x3B, 0x66, 0x66, 0x3E, 0x06, 0x0F], // 'p'
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x78], // 'q'
    [0x00, 0x00, 0x3B, 0x6E, 0x66, 0x06, 0x0F, 0x00], // 'r'
    [0x00, 0x00, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x00], // 's'
    [0x08, 0x0C, 0x3E, 0x0C, 0x0C, 0x2C, 0x18, 0x00], // 't'
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x33, 0x6E, 0x00], // 'u'
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // 'v'
    [0x00, 0x00, 0x63, 0x6B, 0x7F, 0x7F, 0x36, 0x00], // 'w'
    [0x00, 0x00, 0x63, 0x36, 0x1C, 0x36, 0x63, 0x00], // 'x'
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x3E, 0x30, 0x1F], // 'y'
    [0x00, 0x00, 0x3F, 0x19, 0x0C, 0x26, 0x3F, 0x00], // 'z'
    [0x38, 0x0C, 0x0C, 0x07, 0x0C, 0x0C, 0x38, 0x00], // '{'
    [0x18, 0x18, 0x18, 0x00, 0x18, 0x18, 0x18, 0x00], // '|'
    [0x07, 0x0C, 0x0C, 0x38, 0x0C, 0x0C, 0x07, 0x00], // '}'
    [0x6E, 0x3B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // '~'
];

#[cfg(test)]
mod tests {
    use super::*;

    fn ink(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p.0[0] == 0).count()
    }

    #[test]
    fn test_bitmap_cell_size() {
        assert_eq!(BitmapFont::new(1).cell_size(), (8, 8));
        assert_eq!(BitmapFont::new(2).cell_size(), (16, 16));
        assert_eq!(BitmapFont::new(0).cell_size(), (8, 8));
    }

    #[test]
    fn test_space_draws_nothing() {
        let mut img = GrayImage::from_pixel(8, 8, Luma([255]));
        BitmapFont::default().draw_glyph(&mut img, ' ', 0, 0);
        assert_eq!(ink(&img), 0);
    }

    #[test]
    fn test_glyph_ink() {
        let mut img = GrayImage::from_pixel(8, 8, Luma([255]));
        BitmapFont::default().draw_glyph(&mut img, '_', 0, 0);
        // underscore is the full bottom row
        assert_eq!(ink(&img), 8);
        assert!((0..8).all(|x| img.get_pixel(x, 7).0[0] == 0));
    }

    #[test]
    fn test_scaled_glyph_ink() {
        let mut img = GrayImage::from_pixel(16, 16, Luma([255]));
        BitmapFont::new(2).draw_glyph(&mut img, '_', 0, 0);
        assert_eq!(ink(&img), 32);
    }

    #[test]
    fn test_draw_clips_at_edge() {
        let mut img = GrayImage::from_pixel(4, 4, Luma([255]));
        BitmapFont::default().draw_glyph(&mut img, '@', 0, 0);
        assert!(ink(&img) > 0);
    }

    #[test]
    fn test_dense_glyphs_carry_more_ink() {
        let count = |c| {
            let mut img = GrayImage::from_pixel(8, 8, Luma([255]));
            BitmapFont::default().draw_glyph(&mut img, c, 0, 0);
            ink(&img)
        };
        assert!(count('@') > count('.'));
        assert!(count('#') > count(':'));
    }

    #[test]
    fn test_ttf_rejects_garbage() {
        assert!(matches!(TtfFont::from_bytes(vec![0, 1, 2, 3], 12.0), Err(AsciiError::Font(_))));
        assert!(TtfFont::from_bytes(Vec::new(), 0.0).is_err());
    }
}

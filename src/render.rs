//! Rasterizing an ASCII canvas back into an image.

use image::{GrayImage, Luma};

use crate::canvas::AsciiCanvas;
use crate::font::GlyphFont;

/// Output raster size for a `columns x rows` canvas in `font`.
pub fn raster_size(columns: u32, rows: u32, font: &dyn GlyphFont) -> (u32, u32) {
    let (char_width, char_height) = font.cell_size();
    (char_width * columns, char_height * rows)
}

/// Draw `canvas` onto a white grayscale image in black glyphs.
///
/// The image is exactly `cell_width * columns` by `cell_height * rows`
/// pixels. Row `j` starts at pixel row `j * cell_height`, left-aligned, each
/// glyph in its own fixed cell.
pub fn render(canvas: &AsciiCanvas, font: &dyn GlyphFont) -> GrayImage {
    let (char_width, char_height) = font.cell_size();
    let (width, height) = raster_size(canvas.columns(), canvas.rows(), font);
    let mut out = GrayImage::from_pixel(width, height, Luma([255]));

    for (j, line) in canvas.lines().enumerate() {
        let y = j as u32 * char_height;
        for (i, glyph) in line.chars().enumerate() {
            if glyph == ' ' {
                continue;
            }
            font.draw_glyph(&mut out, glyph, i as u32 * char_width, y);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BitmapFont;

    #[test]
    fn test_output_dimensions() {
        let canvas = AsciiCanvas::from_lines(&["@@@", "..."]).unwrap();
        let img = render(&canvas, &BitmapFont::default());
        assert_eq!(img.dimensions(), (24, 16));
    }

    #[test]
    fn test_blank_canvas_stays_white() {
        let canvas = AsciiCanvas::from_lines(&["   ", "   "]).unwrap();
        let img = render(&canvas, &BitmapFont::new(2));
        assert!(img.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_glyphs_land_in_their_cells() {
        let canvas = AsciiCanvas::from_lines(&[" _", "  "]).unwrap();
        let img = render(&canvas, &BitmapFont::default());
        // underscore fills the bottom row of cell (0, 1) only
        for x in 0..16 {
            let expected = if x >= 8 { 0 } else { 255 };
            assert_eq!(img.get_pixel(x, 7).0[0], expected, "pixel ({}, 7)", x);
        }
        assert!((0..16).all(|x| img.get_pixel(x, 15).0[0] == 255));
    }

    #[test]
    fn test_only_black_and_white() {
        let canvas = AsciiCanvas::from_lines(&["@%#*+=-:. "]).unwrap();
        let img = render(&canvas, &BitmapFont::default());
        assert!(img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }
}

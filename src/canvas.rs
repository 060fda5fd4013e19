//! The character grid produced for one frame.

use image::GrayImage;

use crate::grid::TileGrid;
use crate::ramp::GlyphTable;
use crate::sampler::{brightness_level, sample};

/// A `rows x columns` grid of ASCII glyphs, row-major.
///
/// Built fresh per frame and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiCanvas {
    rows: u32,
    columns: u32,
    cells: Vec<u8>,
}

impl AsciiCanvas {
    /// Sample every tile of `grid` in `frame` and look its level up in `table`.
    pub fn from_frame(frame: &GrayImage, grid: &TileGrid, table: &GlyphTable) -> Self {
        let (rows, columns) = (grid.rows(), grid.columns());
        let mut cells = Vec::with_capacity(rows as usize * columns as usize);
        for row in 0..rows {
            let row_span = grid.row_span(row);
            for col in 0..columns {
                let avg = sample(frame, row_span.clone(), grid.col_span(col));
                cells.push(table.byte(brightness_level(avg)));
            }
        }
        Self { rows, columns, cells }
    }

    /// Build a canvas from equal-length lines of ASCII text.
    ///
    /// Returns `None` for no lines, ragged lines or non-ASCII text.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Option<Self> {
        let columns = lines.first()?.as_ref().len();
        let mut cells = Vec::with_capacity(columns * lines.len());
        for line in lines {
            let line = line.as_ref();
            if !line.is_ascii() || line.len() != columns {
                return None;
            }
            cells.extend_from_slice(line.as_bytes());
        }
        Some(Self {
            rows: lines.len() as u32,
            columns: columns as u32,
            cells,
        })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn get(&self, row: u32, col: u32) -> Option<char> {
        if row >= self.rows || col >= self.columns {
            return None;
        }
        Some(self.cells[(row * self.columns + col) as usize] as char)
    }

    /// One row of glyphs.
    pub fn row(&self, row: u32) -> &str {
        let start = (row * self.columns) as usize;
        let bytes = &self.cells[start..start + self.columns as usize];
        // cells are ASCII by construction
        std::str::from_utf8(bytes).unwrap_or_default()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Rows joined by `\n`, with a trailing newline.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.columns as usize + 1) * self.rows as usize);
        for line in self.lines() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::compute_grid;
    use crate::ramp::Ramp;
    use image::Luma;

    #[test]
    fn test_two_tone_frame() {
        // left half black, right half white
        let frame = GrayImage::from_fn(8, 4, |x, _| Luma([if x < 4 { 0 } else { 255 }]));
        let grid = compute_grid(8, 4, 2, 1.0).unwrap();
        let table = GlyphTable::new(&Ramp::compact());
        let canvas = AsciiCanvas::from_frame(&frame, &grid, &table);

        assert_eq!(canvas.rows(), 1);
        assert_eq!(canvas.columns(), 2);
        assert_eq!(canvas.row(0), "@ ");
    }

    #[test]
    fn test_text_export() {
        let canvas = AsciiCanvas::from_lines(&["ab", "cd"]).unwrap();
        assert_eq!(canvas.to_text(), "ab\ncd\n");
        assert_eq!(canvas.get(1, 0), Some('c'));
        assert_eq!(canvas.get(2, 0), None);
    }

    #[test]
    fn test_from_lines_rejects_ragged() {
        assert!(AsciiCanvas::from_lines(&["abc", "d"]).is_none());
        assert!(AsciiCanvas::from_lines::<&str>(&[]).is_none());
        assert!(AsciiCanvas::from_lines(&["é"]).is_none());
    }
}

//! Tile geometry: how a frame is cut into one tile per output character.

use std::ops::Range;

use crate::error::AsciiError;

/// Rows and columns of tiles covering a frame, with their pixel cut points.
///
/// `row_bounds` has `rows + 1` entries spanning `[0, height]` and
/// `col_bounds` has `columns + 1` entries spanning `[0, width]`. Consecutive
/// cut points delimit one half-open tile edge, so the tiles partition the
/// frame with no gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    rows: u32,
    columns: u32,
    row_bounds: Vec<u32>,
    col_bounds: Vec<u32>,
}

impl TileGrid {
    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn row_bounds(&self) -> &[u32] {
        &self.row_bounds
    }

    pub fn col_bounds(&self) -> &[u32] {
        &self.col_bounds
    }

    /// Pixel rows covered by tile row `row`.
    pub fn row_span(&self, row: u32) -> Range<u32> {
        let r = row as usize;
        self.row_bounds[r]..self.row_bounds[r + 1]
    }

    /// Pixel columns covered by tile column `col`.
    pub fn col_span(&self, col: u32) -> Range<u32> {
        let c = col as usize;
        self.col_bounds[c]..self.col_bounds[c + 1]
    }
}

/// Compute the tile grid for a `width` x `height` frame at `columns`
/// characters per row.
///
/// `scale` corrects for the glyph cell aspect ratio: a tile is
/// `width / columns` pixels wide and `tile_width / scale` pixels tall, and the
/// row count is the whole number of such tiles that fit in `height`.
///
/// Fails with [`AsciiError::InvalidGeometry`] when `columns > width`,
/// `rows > height`, or no full tile row fits. Nothing is clamped.
pub fn compute_grid(width: u32, height: u32, columns: u32, scale: f64) -> Result<TileGrid, AsciiError> {
    let invalid = |rows: u64| AsciiError::InvalidGeometry { width, height, columns, rows };

    if columns == 0 || !scale.is_finite() || scale <= 0.0 {
        return Err(invalid(0));
    }

    let tile_width = width as f64 / columns as f64;
    let tile_height = tile_width / scale;
    // `as` saturates, so an absurd scale lands on u64::MAX and fails below.
    let rows = (height as f64 / tile_height).floor() as u64;

    if columns > width || rows > height as u64 || rows == 0 {
        return Err(invalid(rows));
    }
    let rows = rows as u32;

    log::trace!("grid {}x{} -> {} cols x {} rows (tile {:.2}x{:.2})", width, height, columns, rows, tile_width, tile_height);

    Ok(TileGrid {
        rows,
        columns,
        row_bounds: cut_points(height, rows),
        col_bounds: cut_points(width, columns),
    })
}

/// `parts + 1` evenly spaced cut points over `[0, extent]`, each rounded to
/// the nearest pixel (halves round up). The last point is exactly `extent`.
///
/// Integer arithmetic keeps the edge free of float drift. With
/// `parts <= extent` the spacing is at least one pixel, so every span is
/// non-empty.
fn cut_points(extent: u32, parts: u32) -> Vec<u32> {
    let extent = extent as u64;
    let parts = parts as u64;
    (0..=parts)
        .map(|i| ((2 * i * extent + parts) / (2 * parts)) as u32)
        .collect()
}

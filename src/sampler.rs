//! Tile brightness sampling.

use std::ops::Range;

use image::GrayImage;

/// Mean luminance of the half-open region `rows x cols` of `frame`.
///
/// The result lies in `[0, 255]`. Spans are clipped to the frame; a region
/// that ends up empty samples as `0.0`. Tiles one pixel wide or tall are
/// ordinary regions and need no special casing.
pub fn sample(frame: &GrayImage, rows: Range<u32>, cols: Range<u32>) -> f64 {
    let (width, height) = frame.dimensions();
    let (y1, y2) = (rows.start.min(height), rows.end.min(height));
    let (x1, x2) = (cols.start.min(width), cols.end.min(width));
    if y1 >= y2 || x1 >= x2 {
        return 0.0;
    }

    let stride = width as usize;
    let raw = frame.as_raw();
    let mut sum: u64 = 0;
    for y in y1 as usize..y2 as usize {
        let start = y * stride + x1 as usize;
        let end = y * stride + x2 as usize;
        sum += raw[start..end].iter().map(|&v| v as u64).sum::<u64>();
    }

    let count = (y2 - y1) as u64 * (x2 - x1) as u64;
    sum as f64 / count as f64
}

/// Truncate a sampled mean toward zero into a brightness level.
///
/// Levels feed the glyph table, so this rule fixes which glyph a tile on a
/// level boundary gets: 127.9 is level 127, never 128.
pub fn brightness_level(avg: f64) -> u8 {
    // float-to-int `as` truncates and saturates; NaN becomes 0
    avg.clamp(0.0, 255.0) as u8
}

//! Tests for the per-frame transform through the public API.
//!
//! Covers:
//! - Tile grid shape and partition properties
//! - Ramp endpoints and glyph table equivalence
//! - Uniform and split frames through the full converter
//! - Geometry failures

use glyphcast::ramp::glyph_index;
use glyphcast::render::raster_size;
use glyphcast::*;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

fn converter(columns: u32, aspect_scale: f64, ramp: Ramp) -> FrameConverter {
    FrameConverter::with_bitmap_font(GridSettings { columns, aspect_scale }, ramp)
}

fn assert_partition(bounds: &[u32], extent: u32) {
    assert_eq!(bounds.first(), Some(&0));
    assert_eq!(bounds.last(), Some(&extent));
    for pair in bounds.windows(2) {
        assert!(pair[0] <= pair[1], "cut points must not decrease: {:?}", bounds);
    }
}

// ==================== Grid Tests ====================

#[test]
fn test_grid_square_tiles() {
    let grid = compute_grid(100, 50, 10, 1.0).unwrap();
    assert_eq!((grid.rows(), grid.columns()), (5, 10));
    assert_eq!(grid.col_bounds(), &[0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    assert_eq!(grid.row_bounds(), &[0, 10, 20, 30, 40, 50]);
}

#[test]
fn test_grid_half_scale_doubles_tile_height() {
    // tile 10 wide, 20 tall: 50 / 20 = 2.5 -> 2 rows
    let grid = compute_grid(100, 50, 10, 0.5).unwrap();
    assert_eq!(grid.rows(), 2);
    assert_eq!(grid.row_bounds(), &[0, 25, 50]);
}

#[test]
fn test_grid_partitions_awkward_sizes() {
    for &(w, h, cols, scale) in &[(1920, 1080, 120, 0.5), (641, 479, 77, 0.43), (33, 1000, 33, 0.05), (7, 7, 3, 1.0)] {
        let grid = compute_grid(w, h, cols, scale).unwrap();
        assert_eq!(grid.col_bounds().len(), cols as usize + 1);
        assert_eq!(grid.row_bounds().len(), grid.rows() as usize + 1);
        assert_partition(grid.col_bounds(), w);
        assert_partition(grid.row_bounds(), h);
    }
}

#[test]
fn test_grid_rejects_too_many_columns() {
    let err = compute_grid(5, 5, 10, 0.5).unwrap_err();
    assert!(matches!(err, AsciiError::InvalidGeometry { width: 5, height: 5, columns: 10, .. }));
}

#[test]
fn test_grid_rejects_bad_parameters() {
    assert!(compute_grid(100, 100, 0, 0.5).is_err());
    assert!(compute_grid(100, 100, 10, 0.0).is_err());
    assert!(compute_grid(100, 100, 10, -1.0).is_err());
    assert!(compute_grid(100, 100, 10, f64::NAN).is_err());
    // too short for a single row of tiles
    assert!(compute_grid(100, 4, 10, 1.0).is_err());
    // more rows than pixel rows
    assert!(compute_grid(100, 10, 100, 20.0).is_err());
}

// ==================== Ramp Tests ====================

#[test]
fn test_ramp_endpoints() {
    let compact = Ramp::compact();
    assert_eq!(compact.len(), 10);
    assert_eq!(map_brightness(0, &compact), '@');
    assert_eq!(map_brightness(255, &compact), ' ');

    let extended = Ramp::extended();
    assert_eq!(extended.len(), 70);
    assert_eq!(map_brightness(0, &extended), '$');
    assert_eq!(map_brightness(255, &extended), ' ');
}

#[test]
fn test_glyph_index_is_monotone() {
    for len in [1usize, 2, 10, 70, 256, 300] {
        let mut last = 0;
        for level in 0..=255u8 {
            let idx = glyph_index(level, len);
            assert!(idx < len);
            assert!(idx >= last);
            last = idx;
        }
    }
}

#[test]
fn test_table_matches_direct_mapping() {
    for ramp in [Ramp::compact(), Ramp::extended(), Ramp::custom("#o. ").unwrap()] {
        let table = GlyphTable::new(&ramp);
        for level in 0..=255u8 {
            assert_eq!(table.glyph(level), map_brightness(level, &ramp));
        }
    }
}

#[test]
fn test_custom_ramp_validation() {
    assert!(matches!(Ramp::custom(""), Err(AsciiError::InvalidRamp(_))));
    assert!(matches!(Ramp::custom("ab\tc"), Err(AsciiError::InvalidRamp(_))));
    assert!(matches!(Ramp::custom("█▓▒░"), Err(AsciiError::InvalidRamp(_))));
}

// ==================== Sampler Tests ====================

#[test]
fn test_sample_mean_and_quantize() {
    let mut frame = GrayImage::new(2, 2);
    frame.put_pixel(0, 0, Luma([0]));
    frame.put_pixel(1, 0, Luma([255]));
    frame.put_pixel(0, 1, Luma([100]));
    frame.put_pixel(1, 1, Luma([101]));
    let avg = sample(&frame, 0..2, 0..2);
    assert!((avg - 114.0).abs() < 1e-9);
    assert_eq!(brightness_level(avg), 114);
    assert_eq!(brightness_level(127.99), 127);
}

// ==================== Converter Tests ====================

#[test]
fn test_uniform_frame_maps_every_cell() {
    let conv = converter(10, 1.0, Ramp::extended());
    for value in [0u8, 37, 128, 200, 255] {
        let frame = GrayImage::from_pixel(100, 50, Luma([value]));
        let canvas = conv.canvas(&frame).unwrap();
        let expected = map_brightness(value, &Ramp::extended());
        for row in 0..canvas.rows() {
            for col in 0..canvas.columns() {
                assert_eq!(canvas.get(row, col), Some(expected));
            }
        }
    }
}

#[test]
fn test_split_frame_keeps_halves_apart() {
    // left half black, right half white
    let frame = GrayImage::from_fn(100, 50, |x, _| if x < 50 { Luma([0]) } else { Luma([255]) });
    let canvas = converter(10, 1.0, Ramp::compact()).canvas(&frame).unwrap();
    for row in canvas.lines() {
        assert_eq!(row, "@@@@@     ");
    }
}

#[test]
fn test_end_to_end_raster_size() {
    let conv = converter(10, 1.0, Ramp::compact());
    let frame = GrayImage::from_pixel(100, 50, Luma([90]));
    let raster = conv.convert(&frame).unwrap();
    assert_eq!(raster.dimensions(), raster_size(10, 5, conv.font()));
    assert_eq!(raster.dimensions(), (80, 40));
}

#[test]
fn test_bright_frame_renders_blank_canvas() {
    let conv = converter(10, 1.0, Ramp::compact());
    let frame = GrayImage::from_pixel(100, 50, Luma([255]));
    let raster = conv.convert(&frame).unwrap();
    assert!(raster.pixels().all(|p| p.0[0] == 255));
}

#[test]
fn test_dark_frame_draws_ink() {
    let conv = converter(10, 1.0, Ramp::compact());
    let frame = GrayImage::from_pixel(100, 50, Luma([0]));
    let raster = conv.convert(&frame).unwrap();
    assert!(raster.pixels().any(|p| p.0[0] < 128));
}

#[test]
fn test_color_input_reduced_to_luma() {
    let conv = converter(4, 1.0, Ramp::compact());
    let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([255, 255, 255])));
    let (canvas, _) = conv.convert_image(&white).unwrap();
    assert_eq!(canvas.to_text(), "    \n".repeat(4));
}

#[test]
fn test_too_small_frame_fails_before_sampling() {
    let conv = converter(10, 0.5, Ramp::compact());
    let frame = GrayImage::from_pixel(5, 5, Luma([0]));
    assert!(matches!(conv.convert(&frame), Err(AsciiError::InvalidGeometry { .. })));
}

#[test]
fn test_canvas_text_round_trip() {
    let canvas = AsciiCanvas::from_lines(&["@@..", "::  "]).unwrap();
    assert_eq!(canvas.to_text(), "@@..\n::  \n");
    assert!(AsciiCanvas::from_lines(&["abc", "ab"]).is_none());
}

//! End-to-end tests for directory and single image conversion.
//!
//! These run on PNG files in a temp directory; nothing here needs ffmpeg.
//! The video checks stop before decoding, with a shell stub reporting the
//! stream geometry.

use glyphcast::*;
use image::{GrayImage, Luma};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_gray(path: &Path, width: u32, height: u32, value: u8) {
    GrayImage::from_pixel(width, height, Luma([value])).save(path).unwrap();
}

fn small_options() -> ConversionOptions {
    ConversionOptions::default().with_columns(4).with_scale(1.0)
}

#[test]
fn test_directory_conversion_orders_by_path() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    // written out of order on purpose
    write_gray(&input.path().join("c.png"), 40, 40, 128);
    write_gray(&input.path().join("a.png"), 40, 40, 0);
    write_gray(&input.path().join("b.png"), 40, 40, 255);
    fs::write(input.path().join("notes.txt"), "not an image").unwrap();

    let converter = AsciiConverter::new();
    let opts = small_options().with_save_text(true);
    let outputs = converter.convert_directory(input.path(), output.path(), &opts).unwrap();

    assert_eq!(outputs.len(), 3);
    let texts: Vec<String> = outputs
        .iter()
        .map(|o| fs::read_to_string(o.text_path.as_ref().unwrap()).unwrap())
        .collect();
    assert_eq!(texts[0], "@@@@\n".repeat(4));
    assert_eq!(texts[1], "    \n".repeat(4));
    assert_eq!(texts[2], "====\n".repeat(4));

    for (i, out) in outputs.iter().enumerate() {
        assert_eq!(out.index, i);
        assert_eq!(out.image_path, output.path().join(format!("ascii_{:06}.png", i)));
        let raster = image::open(&out.image_path).unwrap().to_luma8();
        assert_eq!(raster.dimensions(), (32, 32));
    }
}

#[test]
fn test_directory_aborts_on_small_image() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_gray(&input.path().join("a.png"), 40, 40, 0);
    write_gray(&input.path().join("b.png"), 2, 2, 0);

    let err = AsciiConverter::new()
        .convert_directory(input.path(), output.path(), &small_options())
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<AsciiError>(), Some(AsciiError::InvalidGeometry { .. })));
}

#[test]
fn test_directory_skips_small_image_on_request() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_gray(&input.path().join("a.png"), 40, 40, 0);
    write_gray(&input.path().join("b.png"), 2, 2, 0);
    write_gray(&input.path().join("c.png"), 40, 40, 0);

    let opts = small_options().with_geometry_policy(GeometryPolicy::Skip);
    let outputs = AsciiConverter::new()
        .convert_directory(input.path(), output.path(), &opts)
        .unwrap();
    let indices: Vec<usize> = outputs.iter().map(|o| o.index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert!(!output.path().join("ascii_000001.png").exists());
}

#[test]
fn test_empty_directory_is_empty_input() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let err = AsciiConverter::new()
        .convert_directory(input.path(), output.path(), &small_options())
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<AsciiError>(), Some(AsciiError::EmptyInput(_))));
}

#[test]
fn test_directory_progress_reaches_total() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    for name in ["1.png", "2.png", "3.png", "4.png", "5.png"] {
        write_gray(&input.path().join(name), 40, 40, 60);
    }

    let seen = std::sync::Mutex::new(Vec::new());
    AsciiConverter::new()
        .convert_directory_with_progress(input.path(), output.path(), &small_options(), |p| {
            seen.lock().unwrap().push(p);
        })
        .unwrap();

    let seen = seen.into_inner().unwrap();
    let last = seen.last().unwrap();
    assert_eq!(last.phase, ProgressPhase::Complete);
    assert_eq!(last.completed, 5);
    let max_done = seen
        .iter()
        .filter(|p| p.phase == ProgressPhase::ConvertingFrames)
        .map(|p| p.completed)
        .max();
    assert_eq!(max_done, Some(5));
}

#[test]
fn test_single_image_writes_png_and_text() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    write_gray(&input, 40, 40, 0);
    let out = dir.path().join("nested").join("out.png");

    let converter = AsciiConverter::new();
    let opts = small_options().with_save_text(true);
    let canvas = converter.convert_image(&input, &out, &opts).unwrap();

    assert_eq!((canvas.rows(), canvas.columns()), (4, 4));
    assert!(out.exists());
    assert_eq!(fs::read_to_string(out.with_extension("txt")).unwrap(), canvas.to_text());
}

#[test]
fn test_image_to_string() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    write_gray(&input, 100, 50, 255);

    let text = AsciiConverter::new()
        .image_to_string(&input, &ConversionOptions::default().with_columns(10).with_scale(1.0))
        .unwrap();
    assert_eq!(text, "          \n".repeat(5));
}

#[test]
fn test_image_with_custom_ramp() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    write_gray(&input, 40, 40, 0);

    let opts = small_options().with_custom_ramp("X. ");
    let text = AsciiConverter::new().image_to_string(&input, &opts).unwrap();
    assert_eq!(text, "XXXX\n".repeat(4));
}

#[test]
fn test_glyph_scale_enlarges_raster() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    write_gray(&input, 40, 40, 0);
    let out = dir.path().join("big.png");

    let opts = small_options().with_glyph_scale(2);
    AsciiConverter::new().convert_image(&input, &out, &opts).unwrap();
    let raster = image::open(&out).unwrap().to_luma8();
    assert_eq!(raster.dimensions(), (64, 64));
}

#[test]
fn test_converter_from_config_file() {
    let dir = TempDir::new().unwrap();
    let cfg = dir.path().join("glyphcast.toml");
    fs::write(
        &cfg,
        "default_preset = \"tiny\"\ncustom_ramp = \"#. \"\n[presets.tiny]\ncolumns = 4\nscale = 1.0\n",
    )
    .unwrap();

    let converter = AsciiConverter::from_config_file(&cfg).unwrap();
    let opts = converter.options_from_preset("tiny").unwrap();
    assert_eq!(opts.columns, 4);
    assert_eq!(opts.resolve_ramp().unwrap().as_str(), "#. ");
    assert!(converter.get_preset("default").is_none());
}

#[test]
fn test_assemble_video_without_frames() {
    let dir = TempDir::new().unwrap();
    let err = AsciiConverter::new()
        .assemble_video(&[], 25.0, &dir.path().join("out.mp4"), &FfmpegConfig::default())
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<AsciiError>(), Some(AsciiError::EmptyInput(_))));
    assert!(!dir.path().join("out.mp4").exists());
}

#[test]
fn test_directory_orders_numbered_frames_numerically() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_gray(&input.path().join("frame1.png"), 40, 40, 0);
    write_gray(&input.path().join("frame2.png"), 40, 40, 255);
    write_gray(&input.path().join("frame10.png"), 40, 40, 128);

    let opts = small_options().with_save_text(true);
    let outputs = AsciiConverter::new()
        .convert_directory(input.path(), output.path(), &opts)
        .unwrap();

    let first_glyphs: Vec<String> = outputs
        .iter()
        .map(|o| fs::read_to_string(o.text_path.as_ref().unwrap()).unwrap()[..1].to_string())
        .collect();
    assert_eq!(first_glyphs, vec!["@", " ", "="]);
}

#[cfg(unix)]
#[test]
fn test_video_too_small_leaves_no_frames_dir() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    // stands in for ffprobe, reporting a 5x5 stream
    let ffprobe = dir.path().join("ffprobe");
    fs::write(
        &ffprobe,
        "#!/bin/sh\necho '{\"streams\":[{\"width\":5,\"height\":5,\"r_frame_rate\":\"25/1\"}]}'\n",
    )
    .unwrap();
    fs::set_permissions(&ffprobe, fs::Permissions::from_mode(0o755)).unwrap();

    let video_opts = VideoOptions {
        ffmpeg: FfmpegConfig {
            ffmpeg_path: Some(dir.path().join("missing-ffmpeg")),
            ffprobe_path: Some(ffprobe),
        },
        ..VideoOptions::default()
    };
    let out = dir.path().join("out");
    let err = AsciiConverter::new()
        .convert_video(&dir.path().join("in.mp4"), &out, &video_opts, &ConversionOptions::default())
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<AsciiError>(), Some(AsciiError::InvalidGeometry { .. })));
    assert!(!out.join(FRAMES_DIR).exists());
}

#[test]
fn test_video_rejects_zero_fps() {
    let dir = TempDir::new().unwrap();
    let video_opts = VideoOptions {
        fps: Some(0),
        ..VideoOptions::default()
    };
    let out = dir.path().join("out");
    assert!(AsciiConverter::new()
        .convert_video(&dir.path().join("in.mp4"), &out, &video_opts, &ConversionOptions::default())
        .is_err());
    assert!(!out.exists());
}

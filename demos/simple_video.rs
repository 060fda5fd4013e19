//! Example: Convert a video to an ASCII-art video with progress reporting
//! Run with: cargo run --example simple_video

use glyphcast::{AsciiConverter, ProgressPhase, VideoOptions};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let converter = AsciiConverter::new();
    let conv_opts = converter.options_from_preset("small")?;

    let video_opts = VideoOptions {
        fps: Some(12),
        start: Some("0".to_string()),
        end: Some("5".to_string()),
        ..VideoOptions::default()
    };

    let input = Path::new("resources/source.mp4");
    if !input.exists() {
        println!("Put a video at {} to try this example.", input.display());
        return Ok(());
    }

    let summary = converter.convert_video_with_progress(input, Path::new("example_video_output"), &video_opts, &conv_opts, |progress| {
        match progress.phase {
            ProgressPhase::ConvertingFrames => print!("\r{}", progress.message),
            _ => println!("\n{}", progress.message),
        }
    })?;

    if let Some(video) = summary.video {
        println!("{} frames at {} fps -> {}", summary.frames, summary.fps, video.display());
    }
    Ok(())
}

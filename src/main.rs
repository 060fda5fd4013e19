use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dialoguer::{Confirm, FuzzySelect, Input};
use glyphcast::{
    load_config, AsciiConverter, GeometryPolicy, Progress, ProgressPhase, RampKind, VideoOptions, FRAMES_DIR,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(version, about = "Turn videos and images into ASCII-art videos and images.")]
struct Args {
    /// Input video, image, or directory of images
    input: Option<PathBuf>,

    /// Output directory for the generated files
    out: Option<PathBuf>,

    /// Characters per output row
    #[arg(long)]
    columns: Option<u32>,

    /// Glyph aspect correction (tile height = tile width / scale)
    #[arg(long)]
    scale: Option<f64>,

    /// Brightness ramp: compact or extended
    #[arg(long)]
    ramp: Option<RampKind>,

    /// Use the extended 70-glyph ramp
    #[arg(long, default_value_t = false, conflicts_with = "ramp")]
    more_levels: bool,

    /// Output frames per second (defaults to the source rate)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    fps: Option<u32>,

    /// TrueType font to draw glyphs with
    #[arg(long)]
    font: Option<PathBuf>,

    /// Pixel size for --font
    #[arg(long)]
    font_size: Option<f32>,

    /// Integer upscale for the built-in bitmap font
    #[arg(long)]
    glyph_scale: Option<u32>,

    /// Use default quality preset
    #[arg(long, default_value_t = false, conflicts_with_all = &["small", "large"])]
    default: bool,

    /// Use the small preset
    #[arg(long, short, default_value_t = false, conflicts_with_all = &["default", "large"])]
    small: bool,

    /// Use the large preset
    #[arg(long, short, default_value_t = false, conflicts_with_all = &["default", "small"])]
    large: bool,

    /// Config file (TOML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write every frame as a .txt file
    #[arg(long, default_value_t = false)]
    save_text: bool,

    /// Keep the per-frame PNGs after the video is encoded
    #[arg(long, default_value_t = false)]
    keep_frames: bool,

    /// Skip frames too small for the requested columns instead of aborting
    #[arg(long, default_value_t = false)]
    skip_invalid: bool,

    /// Only write frames; do not encode a video
    #[arg(long, default_value_t = false)]
    no_video: bool,

    /// Start time for video conversion (e.g., 00:01:23.456 or 83.456)
    #[arg(long)]
    start: Option<String>,

    /// End time for video conversion (e.g., 00:01:23.456 or 83.456)
    #[arg(long)]
    end: Option<String>,

    /// Log details to standard output
    #[arg(long, default_value_t = false)]
    log_details: bool,
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    let is_interactive = !(args.default || args.small || args.large);

    // --- Interactive Prompts ---
    if args.input.is_none() {
        if !is_interactive {
            return Err(anyhow!("Input file must be provided when using a preset."));
        }
        let files = find_media_files();
        if files.is_empty() {
            return Err(anyhow!("No media files found in current directory."));
        }
        let selection = FuzzySelect::with_theme(&dialoguer::theme::ColorfulTheme::default())
            .with_prompt("Choose an input file")
            .default(0)
            .items(&files)
            .interact()?;
        args.input = Some(PathBuf::from(&files[selection]));
    }

    let input_path = args.input.clone().ok_or_else(|| anyhow!("no input selected"))?;
    if !input_path.exists() {
        return Err(anyhow!("Input path does not exist: {}", input_path.display()));
    }
    let is_image_input = input_path.is_file() && is_image(&input_path);
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("glyphcast_output")
        .to_string();

    let mut output_path = args.out.clone().unwrap_or_else(|| PathBuf::from("."));
    if input_path.is_file() {
        output_path.push(&stem);
    }

    // Load config and decide preset
    let cfg = load_config(args.config.as_deref())?;
    let converter = AsciiConverter::with_config(cfg.clone())?;

    let active_preset_name = if args.small {
        "small"
    } else if args.large {
        "large"
    } else {
        cfg.default_preset.as_str()
    };
    let mut conv_opts = converter.options_from_preset(active_preset_name)?;
    let preset_fps = cfg.preset(active_preset_name)?.fps;

    if is_interactive {
        if args.columns.is_none() {
            args.columns = Some(
                Input::new()
                    .with_prompt("Columns (width)")
                    .default(conv_opts.columns)
                    .interact()?,
            );
        }
        if args.scale.is_none() {
            args.scale = Some(
                Input::new()
                    .with_prompt("Aspect scale")
                    .default(conv_opts.aspect_scale)
                    .interact()?,
            );
        }
    }

    if let Some(columns) = args.columns {
        conv_opts.columns = columns;
    }
    if let Some(scale) = args.scale {
        conv_opts.aspect_scale = scale;
    }
    if args.more_levels {
        conv_opts.ramp = RampKind::Extended;
    } else if let Some(ramp) = args.ramp {
        conv_opts.ramp = ramp;
    }
    if let Some(font) = &args.font {
        conv_opts.font = Some(font.clone());
    }
    if let Some(size) = args.font_size {
        conv_opts.font_size = size;
    }
    if let Some(scale) = args.glyph_scale {
        conv_opts.glyph_scale = scale;
    }
    conv_opts.save_text = args.save_text;
    if args.skip_invalid {
        conv_opts.on_invalid_geometry = GeometryPolicy::Skip;
    }

    // --- Execution ---
    fs::create_dir_all(&output_path).context("creating output dir")?;

    let frames_path = if input_path.is_dir() {
        output_path.clone()
    } else {
        output_path.join(FRAMES_DIR)
    };
    if !is_image_input && has_frames(&frames_path) {
        if is_interactive
            && !Confirm::new()
                .with_prompt(format!(
                    "Output directory {} already contains frames. Overwrite?",
                    frames_path.display()
                ))
                .default(false)
                .interact()?
        {
            println!("Operation cancelled.");
            return Ok(());
        }
        remove_frames(&frames_path)?;
    }

    let (frame_count, video_fps, video_path) = if is_image_input {
        println!("Converting image to ASCII...");
        let out = output_path.join(format!("{}.png", stem));
        converter.convert_image(&input_path, &out, &conv_opts)?;
        (1, None, None)
    } else if input_path.is_dir() {
        println!("Converting directory of images...");
        let pb = ProgressBar::new(0);
        pb.set_style(bar_style()?);
        let outputs = converter.convert_directory_with_progress(&input_path, &output_path, &conv_opts, |p| {
            if p.phase == ProgressPhase::ConvertingFrames {
                pb.set_length(p.total as u64);
                pb.set_position(p.completed as u64);
            }
        })?;
        pb.finish_with_message("Done");
        (outputs.len(), None, None)
    } else {
        println!("Converting video frames...");
        let video_opts = VideoOptions {
            fps: args.fps.or(preset_fps),
            start: args.start.clone(),
            end: args.end.clone(),
            encode: !args.no_video,
            keep_frames: args.keep_frames || args.no_video,
            ffmpeg: cfg.ffmpeg.clone(),
            ..VideoOptions::default()
        };

        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style()?);
        let summary = converter.convert_video_with_progress(&input_path, &output_path, &video_opts, &conv_opts, |p: Progress| {
            match p.phase {
                ProgressPhase::ConvertingFrames => pb.set_position(p.completed as u64),
                ProgressPhase::Complete => {}
                _ => pb.set_message(p.message),
            }
        })?;
        pb.finish_with_message("Done");
        (summary.frames, Some(summary.fps), summary.video)
    };

    println!("\nASCII generation complete in {}", output_path.display());

    // --- Create details.md ---
    let ramp_name = match &conv_opts.custom_ramp {
        Some(glyphs) => format!("custom ({})", glyphs),
        None => conv_opts.ramp.to_string(),
    };
    let mut details = format!(
        "Version: {}\nFrames: {}\nColumns: {}\nScale: {}\nRamp: {}",
        env!("CARGO_PKG_VERSION"),
        frame_count,
        conv_opts.columns,
        conv_opts.aspect_scale,
        ramp_name
    );
    if let Some(font) = &conv_opts.font {
        details.push_str(&format!("\nFont: {} ({}px)", font.display(), conv_opts.font_size));
    }
    if let Some(fps) = video_fps {
        details.push_str(&format!("\nFPS: {}", fps));
    }
    if let Some(video) = &video_path {
        details.push_str(&format!("\nVideo: {}", video.display()));
    }

    let details_path = output_path.join("details.md");
    fs::write(details_path, &details).context("writing details file")?;

    if args.log_details {
        println!("\n--- Generation Details ---");
        println!("{}", details);
    }

    Ok(())
}

fn bar_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")?
        .progress_chars("#>-"))
}

fn spinner_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} frames {msg}")?)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
}

fn has_frames(dir: &Path) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .any(|e| e.file_name().to_str().is_some_and(is_frame_name))
}

fn is_frame_name(name: &str) -> bool {
    name.starts_with("ascii_") && (name.ends_with(".png") || name.ends_with(".txt"))
}

fn remove_frames(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.file_name().and_then(|s| s.to_str()).is_some_and(is_frame_name) {
            fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        }
    }
    Ok(())
}

fn find_media_files() -> Vec<String> {
    WalkDir::new(".")
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path().is_file()
                && e.path().extension().is_some_and(|ext| {
                    matches!(ext.to_str(), Some("mp4" | "mkv" | "mov" | "avi" | "webm" | "png" | "jpg" | "jpeg"))
                })
        })
        .filter_map(|e| e.path().to_str().map(str::to_string))
        .collect()
}

//! # glyphcast - ASCII Art Video Library
//!
//! `glyphcast` turns video frames into ASCII-art images: each frame is cut
//! into a grid of tiles, every tile's mean brightness picks a glyph from a
//! grayscale ramp, and the glyph grid is drawn back into a raster in a
//! monospace font. The rasters are then reassembled into a video.
//!
//! ## Features
//!
//! - Compact (10 glyph) and extended (70 glyph) ramps, or a custom one
//! - Precomputed 256-entry glyph table shared by every frame of a run
//! - Built-in 8x8 bitmap font, or any TrueType font
//! - Parallel frame conversion with order restored from frame indices
//! - Progress reporting for integration with UI applications
//!
//! ## Example
//!
//! ```no_run
//! use glyphcast::{AsciiConverter, ConversionOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = AsciiConverter::new();
//! let options = ConversionOptions::default().with_columns(100).with_scale(0.5);
//! converter.convert_image(Path::new("input.png"), Path::new("ascii.png"), &options)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Working with frames directly
//!
//! ```
//! use glyphcast::{FrameConverter, GridSettings, Ramp};
//! use image::{GrayImage, Luma};
//!
//! let converter = FrameConverter::with_bitmap_font(
//!     GridSettings { columns: 10, aspect_scale: 1.0 },
//!     Ramp::compact(),
//! );
//! let frame = GrayImage::from_pixel(100, 50, Luma([0]));
//! let canvas = converter.canvas(&frame).unwrap();
//! assert_eq!((canvas.rows(), canvas.columns()), (5, 10));
//! assert_eq!(canvas.row(0), "@@@@@@@@@@");
//! ```

pub mod canvas;
pub mod config;
pub mod convert;
pub mod error;
pub mod font;
pub mod grid;
pub mod media;
pub mod pipeline;
pub mod ramp;
pub mod render;
pub mod sampler;

pub use canvas::AsciiCanvas;
pub use config::{load_config, AppConfig, Preset};
pub use convert::{FrameConverter, GridSettings};
pub use error::AsciiError;
pub use font::{BitmapFont, GlyphFont, TtfFont};
pub use grid::{compute_grid, TileGrid};
pub use media::{DecodeOptions, DecodedFrame, FfmpegConfig, FrameDecoder, VideoInfo};
pub use pipeline::{FrameOutput, FrameSink, GeometryPolicy};
pub use ramp::{map_brightness, GlyphTable, Ramp, RampKind, COMPACT_RAMP, EXTENDED_RAMP};
pub use render::render;
pub use sampler::{brightness_level, sample};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the current phase of a conversion operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressPhase {
    /// Probing the video and starting the decoder
    DecodingFrames,
    /// Converting frames to ASCII rasters
    ConvertingFrames,
    /// Assembling the rasters into a video
    EncodingVideo,
    /// Conversion completed successfully
    Complete,
}

/// Progress information for conversion operations
///
/// This struct provides detailed progress information that can be used
/// to display progress in UI applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// Current phase of the conversion
    pub phase: ProgressPhase,
    /// Number of items completed in the current phase
    pub completed: usize,
    /// Total number of items in the current phase (0 if unknown/indeterminate)
    pub total: usize,
    /// Percentage complete (0.0 to 100.0)
    pub percentage: f64,
    /// Human-readable message describing current status
    pub message: String,
}

impl Progress {
    pub fn decoding_frames() -> Self {
        Self {
            phase: ProgressPhase::DecodingFrames,
            completed: 0,
            total: 0,
            percentage: 0.0,
            message: "Decoding video frames...".to_string(),
        }
    }

    /// Frame conversion progress; `total` is 0 while the frame count is unknown.
    pub fn converting_frames(completed: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            (completed as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let message = if total > 0 {
            format!("Converting frame {} of {}", completed, total)
        } else {
            format!("Converted {} frames", completed)
        };
        Self {
            phase: ProgressPhase::ConvertingFrames,
            completed,
            total,
            percentage,
            message,
        }
    }

    pub fn encoding_video(frames: usize) -> Self {
        Self {
            phase: ProgressPhase::EncodingVideo,
            completed: 0,
            total: frames,
            percentage: 0.0,
            message: format!("Encoding {} frames into video...", frames),
        }
    }

    pub fn complete(total_frames: usize) -> Self {
        Self {
            phase: ProgressPhase::Complete,
            completed: total_frames,
            total: total_frames,
            percentage: 100.0,
            message: format!("Conversion complete: {} frames", total_frames),
        }
    }
}

/// Options for the per-frame ASCII transform
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Characters per output row
    pub columns: u32,
    /// Glyph cell aspect correction (tile height = tile width / scale)
    pub aspect_scale: f64,
    /// Built-in ramp to map brightness with
    pub ramp: RampKind,
    /// Custom ramp, darkest glyph first; takes precedence over `ramp`
    pub custom_ramp: Option<String>,
    /// TrueType font to render with; the built-in bitmap font when `None`
    pub font: Option<PathBuf>,
    /// Pixel size for `font`
    pub font_size: f32,
    /// Integer upscale for the built-in bitmap font
    pub glyph_scale: u32,
    /// Also write each canvas as text
    pub save_text: bool,
    /// Abort the run or skip frames that are too small
    pub on_invalid_geometry: GeometryPolicy,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            columns: 120,
            aspect_scale: 0.5,
            ramp: RampKind::Compact,
            custom_ramp: None,
            font: None,
            font_size: 12.0,
            glyph_scale: 1,
            save_text: false,
            on_invalid_geometry: GeometryPolicy::Abort,
        }
    }
}

impl ConversionOptions {
    pub fn with_columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_scale(mut self, aspect_scale: f64) -> Self {
        self.aspect_scale = aspect_scale;
        self
    }

    pub fn with_ramp(mut self, ramp: RampKind) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn with_custom_ramp(mut self, glyphs: impl Into<String>) -> Self {
        self.custom_ramp = Some(glyphs.into());
        self
    }

    pub fn with_font(mut self, path: impl Into<PathBuf>, size: f32) -> Self {
        self.font = Some(path.into());
        self.font_size = size;
        self
    }

    pub fn with_glyph_scale(mut self, scale: u32) -> Self {
        self.glyph_scale = scale;
        self
    }

    pub fn with_save_text(mut self, save_text: bool) -> Self {
        self.save_text = save_text;
        self
    }

    pub fn with_geometry_policy(mut self, policy: GeometryPolicy) -> Self {
        self.on_invalid_geometry = policy;
        self
    }

    /// Options from a preset, with the config's ramp and font choices.
    pub fn from_preset(preset: &Preset, config: &AppConfig) -> Self {
        Self {
            columns: preset.columns,
            aspect_scale: preset.scale,
            ramp: preset.ramp,
            custom_ramp: config.custom_ramp.clone(),
            font: config.font.clone(),
            font_size: config.font_size,
            glyph_scale: config.glyph_scale,
            ..Self::default()
        }
    }

    pub fn grid_settings(&self) -> GridSettings {
        GridSettings {
            columns: self.columns,
            aspect_scale: self.aspect_scale,
        }
    }

    pub fn resolve_ramp(&self) -> Result<Ramp, AsciiError> {
        match &self.custom_ramp {
            Some(glyphs) => Ramp::custom(glyphs),
            None => Ok(Ramp::from_kind(self.ramp)),
        }
    }

    pub fn resolve_font(&self) -> Result<Box<dyn GlyphFont>, AsciiError> {
        match &self.font {
            Some(path) => Ok(Box::new(TtfFont::from_file(path, self.font_size)?)),
            None => Ok(Box::new(BitmapFont::new(self.glyph_scale))),
        }
    }

    /// Build the run's converter: ramp, glyph table and font, once.
    pub fn build_converter(&self) -> Result<FrameConverter, AsciiError> {
        Ok(FrameConverter::new(self.grid_settings(), self.resolve_ramp()?, self.resolve_font()?))
    }

    fn sink(&self, dir: &Path) -> FrameSink {
        FrameSink {
            dir: dir.to_path_buf(),
            save_text: self.save_text,
            on_invalid_geometry: self.on_invalid_geometry,
        }
    }
}

/// Options for video conversion
#[derive(Debug, Clone)]
pub struct VideoOptions {
    /// Output frames per second; `None` keeps the source rate
    pub fps: Option<u32>,
    /// Start time (e.g., "00:01:23.456" or "83.456")
    pub start: Option<String>,
    /// End time (e.g., "00:01:23.456" or "83.456")
    pub end: Option<String>,
    /// Assemble the converted frames into `ascii_video.mp4`
    pub encode: bool,
    /// Keep the per-frame PNGs after encoding
    pub keep_frames: bool,
    /// Frames decoded and converted per parallel batch
    pub batch_size: usize,
    /// Media tool locations
    pub ffmpeg: FfmpegConfig,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            fps: None,
            start: None,
            end: None,
            encode: true,
            keep_frames: false,
            batch_size: pipeline::DEFAULT_BATCH_SIZE,
            ffmpeg: FfmpegConfig::default(),
        }
    }
}

/// What a video conversion produced.
#[derive(Debug, Clone)]
pub struct VideoSummary {
    /// Frames converted (skipped frames excluded)
    pub frames: usize,
    /// Rate of the output video
    pub fps: f64,
    /// Directory holding the per-frame outputs
    pub frames_dir: PathBuf,
    /// The assembled video, when encoding was requested
    pub video: Option<PathBuf>,
}

/// Name of the per-frame output directory inside a video output directory.
pub const FRAMES_DIR: &str = "ascii_frames";
/// Name of the assembled video inside a video output directory.
pub const VIDEO_FILE: &str = "ascii_video.mp4";

/// Main converter struct for ASCII art generation
pub struct AsciiConverter {
    config: AppConfig,
}

impl AsciiConverter {
    /// Create a new converter with default configuration
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Create a converter with custom configuration
    pub fn with_config(config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load configuration from a TOML or JSON file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self {
            config: AppConfig::from_file(path)?,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Convert a single image to an ASCII raster
    ///
    /// Writes a PNG to `output`, plus a `.txt` next to it when
    /// `options.save_text` is set, and returns the canvas.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use glyphcast::{AsciiConverter, ConversionOptions, RampKind};
    /// use std::path::Path;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let converter = AsciiConverter::new();
    /// let options = ConversionOptions::default().with_ramp(RampKind::Extended);
    /// let canvas = converter.convert_image(Path::new("image.png"), Path::new("ascii.png"), &options)?;
    /// println!("{}", canvas.to_text());
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_image(&self, input: &Path, output: &Path, options: &ConversionOptions) -> Result<AsciiCanvas> {
        let converter = options.build_converter()?;
        let image = image::open(input).with_context(|| format!("opening {}", input.display()))?;
        let (canvas, raster) = converter
            .convert_image(&image)
            .with_context(|| format!("converting {}", input.display()))?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        raster.save(output).with_context(|| format!("writing {}", output.display()))?;
        if options.save_text {
            let txt = output.with_extension("txt");
            fs::write(&txt, canvas.to_text()).with_context(|| format!("writing {}", txt.display()))?;
        }
        Ok(canvas)
    }

    /// Convert image to ASCII text (without writing anything)
    pub fn image_to_string(&self, input: &Path, options: &ConversionOptions) -> Result<String> {
        let converter = options.build_converter()?;
        let frame = image::open(input)
            .with_context(|| format!("opening {}", input.display()))?
            .to_luma8();
        let canvas = converter
            .canvas(&frame)
            .with_context(|| format!("converting {}", input.display()))?;
        Ok(canvas.to_text())
    }

    /// Convert a video into ASCII frames and an ASCII video
    ///
    /// Frames land in `output_dir/ascii_frames`, the video in
    /// `output_dir/ascii_video.mp4`.
    pub fn convert_video(&self, input: &Path, output_dir: &Path, video_opts: &VideoOptions, conv_opts: &ConversionOptions) -> Result<VideoSummary> {
        self.convert_video_with_progress(input, output_dir, video_opts, conv_opts, |_| {})
    }

    /// Convert a video with detailed progress reporting
    ///
    /// # Example
    ///
    /// ```no_run
    /// use glyphcast::{AsciiConverter, ConversionOptions, ProgressPhase, VideoOptions};
    /// use std::path::Path;
    ///
    /// let converter = AsciiConverter::new();
    /// converter.convert_video_with_progress(
    ///     Path::new("video.mp4"),
    ///     Path::new("output"),
    ///     &VideoOptions::default(),
    ///     &ConversionOptions::default(),
    ///     |progress| {
    ///         if progress.phase == ProgressPhase::ConvertingFrames {
    ///             println!("{}", progress.message);
    ///         }
    ///     },
    /// ).unwrap();
    /// ```
    pub fn convert_video_with_progress<F>(
        &self,
        input: &Path,
        output_dir: &Path,
        video_opts: &VideoOptions,
        conv_opts: &ConversionOptions,
        progress_callback: F,
    ) -> Result<VideoSummary>
    where
        F: Fn(Progress),
    {
        if video_opts.fps == Some(0) {
            return Err(anyhow!("output fps must be at least 1"));
        }
        let converter = conv_opts.build_converter()?;

        // Phase 1: probe and start decoding
        progress_callback(Progress::decoding_frames());
        let info = media::probe(input, &video_opts.ffmpeg)?;
        if conv_opts.on_invalid_geometry == GeometryPolicy::Abort {
            // every frame shares the stream geometry
            converter
                .grid_for(info.width, info.height)
                .with_context(|| format!("checking {}", input.display()))?;
        }
        let decode_opts = DecodeOptions {
            fps: video_opts.fps.map(f64::from),
            start: video_opts.start.clone(),
            end: video_opts.end.clone(),
        };
        let frames_dir = output_dir.join(FRAMES_DIR);
        fs::create_dir_all(&frames_dir).context("creating output directory")?;
        let decoder = FrameDecoder::spawn(input, &info, &decode_opts, &video_opts.ffmpeg)?;
        let fps = decoder.fps();
        log::info!("decoding {} ({}x{}) at {} fps", input.display(), info.width, info.height, fps);

        // Phase 2: convert
        let outputs = pipeline::convert_stream(
            &converter,
            decoder,
            &conv_opts.sink(&frames_dir),
            video_opts.batch_size,
            |done| progress_callback(Progress::converting_frames(done, 0)),
        )?;

        // Phase 3: assemble
        let video = if video_opts.encode {
            progress_callback(Progress::encoding_video(outputs.len()));
            let video_path = output_dir.join(VIDEO_FILE);
            self.assemble_video(&outputs, fps, &video_path, &video_opts.ffmpeg)?;
            if !video_opts.keep_frames {
                remove_frame_images(&outputs)?;
            }
            Some(video_path)
        } else {
            None
        };

        progress_callback(Progress::complete(outputs.len()));
        Ok(VideoSummary {
            frames: outputs.len(),
            fps,
            frames_dir,
            video,
        })
    }

    /// Convert a directory of images to ASCII frames
    ///
    /// Images are taken in path order; that order is the frame index.
    pub fn convert_directory(&self, input_dir: &Path, output_dir: &Path, options: &ConversionOptions) -> Result<Vec<FrameOutput>> {
        self.convert_directory_with_progress(input_dir, output_dir, options, |_| {})
    }

    /// Convert a directory of images with detailed progress reporting
    pub fn convert_directory_with_progress<F>(&self, input_dir: &Path, output_dir: &Path, options: &ConversionOptions, progress_callback: F) -> Result<Vec<FrameOutput>>
    where
        F: Fn(Progress) + Send + Sync,
    {
        let converter = options.build_converter()?;
        let images = pipeline::collect_images(input_dir);
        let outputs = pipeline::convert_image_files(&converter, &images, &options.sink(output_dir), |done, total| {
            progress_callback(Progress::converting_frames(done, total))
        })?;
        progress_callback(Progress::complete(outputs.len()));
        Ok(outputs)
    }

    /// Encode converted frames into a video, ordered by frame index
    pub fn assemble_video(&self, frames: &[FrameOutput], fps: f64, output: &Path, ffmpeg: &FfmpegConfig) -> Result<()> {
        let mut ordered: Vec<&FrameOutput> = frames.iter().collect();
        ordered.sort_by_key(|f| f.index);
        let paths: Vec<&Path> = ordered.iter().map(|f| f.image_path.as_path()).collect();
        media::encode(&paths, fps, output, ffmpeg)
    }

    pub fn get_preset(&self, name: &str) -> Option<&Preset> {
        self.config.presets.get(name)
    }

    /// Get conversion options from a preset name
    pub fn options_from_preset(&self, preset_name: &str) -> Result<ConversionOptions> {
        let preset = self.config.preset(preset_name)?;
        Ok(ConversionOptions::from_preset(preset, &self.config))
    }
}

impl Default for AsciiConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_frame_images(outputs: &[FrameOutput]) -> Result<()> {
    for out in outputs {
        fs::remove_file(&out.image_path).with_context(|| format!("removing {}", out.image_path.display()))?;
    }
    Ok(())
}

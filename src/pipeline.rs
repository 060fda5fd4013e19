//! Parallel per-frame processing and ordered output.
//!
//! Frames are independent: each worker converts one frame and writes one
//! uniquely named file, so nothing is locked. Ordering is restored from the
//! sequence index each frame carries.

use std::cmp::Ordering as CmpOrdering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use image::GrayImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::convert::FrameConverter;
use crate::error::AsciiError;
use crate::media::DecodedFrame;

/// What to do with a frame too small for the requested density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryPolicy {
    /// Stop the run; the settings are wrong for this input.
    #[default]
    Abort,
    /// Log and leave the frame out.
    Skip,
}

/// Where and how converted frames are written.
#[derive(Debug, Clone)]
pub struct FrameSink {
    pub dir: PathBuf,
    /// Also write each canvas as a `.txt` file.
    pub save_text: bool,
    pub on_invalid_geometry: GeometryPolicy,
}

impl FrameSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            save_text: false,
            on_invalid_geometry: GeometryPolicy::Abort,
        }
    }
}

/// Files written for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutput {
    pub index: usize,
    pub image_path: PathBuf,
    pub text_path: Option<PathBuf>,
}

/// Zero-padded output name for a frame, e.g. `ascii_000042.png`.
pub fn frame_file_name(index: usize, extension: &str) -> String {
    format!("ascii_{:06}.{}", index, extension)
}

/// Number of frames decoded and converted together.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Convert and write a single frame. `Ok(None)` means it was skipped.
pub fn process_frame(converter: &FrameConverter, index: usize, frame: &GrayImage, sink: &FrameSink) -> Result<Option<FrameOutput>> {
    let canvas = match converter.canvas(frame) {
        Ok(canvas) => canvas,
        Err(err @ AsciiError::InvalidGeometry { .. }) if sink.on_invalid_geometry == GeometryPolicy::Skip => {
            log::warn!("skipping frame {}: {}", index, err);
            return Ok(None);
        }
        Err(err) => return Err(anyhow::Error::new(err).context(format!("converting frame {}", index))),
    };

    let image_path = sink.dir.join(frame_file_name(index, "png"));
    converter
        .render(&canvas)
        .save(&image_path)
        .with_context(|| format!("writing {}", image_path.display()))?;

    let text_path = if sink.save_text {
        let path = sink.dir.join(frame_file_name(index, "txt"));
        fs::write(&path, canvas.to_text()).with_context(|| format!("writing {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    Ok(Some(FrameOutput { index, image_path, text_path }))
}

/// Convert one batch of decoded frames across the rayon pool.
pub fn process_batch(converter: &FrameConverter, frames: &[DecodedFrame], sink: &FrameSink) -> Result<Vec<FrameOutput>> {
    let written: Vec<Option<FrameOutput>> = frames
        .par_iter()
        .map(|frame| process_frame(converter, frame.index, &frame.image, sink))
        .collect::<Result<_>>()?;
    Ok(written.into_iter().flatten().collect())
}

/// Convert a stream of decoded frames batch by batch.
///
/// `progress` receives the number of frames handled so far. Outputs come
/// back sorted by frame index. An empty stream, or one where every frame was
/// skipped, is [`AsciiError::EmptyInput`].
pub fn convert_stream<I, F>(converter: &FrameConverter, frames: I, sink: &FrameSink, batch_size: usize, progress: F) -> Result<Vec<FrameOutput>>
where
    I: IntoIterator<Item = Result<DecodedFrame>>,
    F: Fn(usize),
{
    fs::create_dir_all(&sink.dir).with_context(|| format!("creating {}", sink.dir.display()))?;

    let batch_size = batch_size.max(1);
    let mut frames = frames.into_iter();
    let mut outputs = Vec::new();
    let mut seen = 0usize;

    loop {
        let batch: Vec<DecodedFrame> = frames.by_ref().take(batch_size).collect::<Result<_>>()?;
        if batch.is_empty() {
            break;
        }
        log::debug!("converting frames {}..{}", seen, seen + batch.len());
        seen += batch.len();
        outputs.extend(process_batch(converter, &batch, sink)?);
        progress(seen);
    }

    finish(outputs, seen, &sink.dir)
}

/// Image files (`png`, `jpg`, `jpeg`) directly inside `dir`, ordered by
/// [`natural_cmp`] on the file name so `frame2.png` precedes `frame10.png`.
pub fn collect_images(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        })
        .collect();
    images.sort_by(|a, b| {
        let name = |p: &Path| p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        natural_cmp(&name(a), &name(b)).then_with(|| a.cmp(b))
    });
    images
}

/// Compare strings with runs of ASCII digits ordered by numeric value.
///
/// Leading zeros do not count, so `img007` and `img7` compare equal.
pub fn natural_cmp(a: &str, b: &str) -> CmpOrdering {
    let (mut a, mut b) = (a.as_bytes(), b.as_bytes());
    while let (Some(&x), Some(&y)) = (a.first(), b.first()) {
        if x.is_ascii_digit() && y.is_ascii_digit() {
            let (num_a, rest_a) = split_digits(a);
            let (num_b, rest_b) = split_digits(b);
            let (num_a, num_b) = (trim_zeros(num_a), trim_zeros(num_b));
            let ord = num_a.len().cmp(&num_b.len()).then_with(|| num_a.cmp(num_b));
            if ord != CmpOrdering::Equal {
                return ord;
            }
            a = rest_a;
            b = rest_b;
        } else {
            if x != y {
                return x.cmp(&y);
            }
            a = &a[1..];
            b = &b[1..];
        }
    }
    a.len().cmp(&b.len())
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    s.split_at(s.iter().take_while(|c| c.is_ascii_digit()).count())
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    &digits[digits.iter().take_while(|&&c| c == b'0').count()..]
}

/// Convert image files in parallel; the position in `paths` is the frame
/// index.
pub fn convert_image_files<F>(converter: &FrameConverter, paths: &[PathBuf], sink: &FrameSink, progress: F) -> Result<Vec<FrameOutput>>
where
    F: Fn(usize, usize) + Send + Sync,
{
    if paths.is_empty() {
        return Err(AsciiError::EmptyInput(format!("no images to convert into {}", sink.dir.display())).into());
    }
    fs::create_dir_all(&sink.dir).with_context(|| format!("creating {}", sink.dir.display()))?;

    let total = paths.len();
    let completed = AtomicUsize::new(0);
    progress(0, total);

    let written: Vec<Option<FrameOutput>> = paths
        .par_iter()
        .enumerate()
        .map(|(index, path)| -> Result<Option<FrameOutput>> {
            let frame = image::open(path)
                .with_context(|| format!("opening {}", path.display()))?
                .to_luma8();
            let out = process_frame(converter, index, &frame, sink)?;

            let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(current, total);
            Ok(out)
        })
        .collect::<Result<_>>()?;

    finish(written.into_iter().flatten().collect(), total, &sink.dir)
}

fn finish(mut outputs: Vec<FrameOutput>, seen: usize, dir: &Path) -> Result<Vec<FrameOutput>> {
    if outputs.is_empty() {
        let reason = if seen == 0 {
            "no frames decoded".to_string()
        } else {
            format!("all {} frames were skipped", seen)
        };
        return Err(AsciiError::EmptyInput(format!("{} for {}", reason, dir.display())).into());
    }
    outputs.sort_by_key(|o| o.index);
    log::info!("wrote {} of {} frames to {}", outputs.len(), seen, dir.display());
    Ok(outputs)
}

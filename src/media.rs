//! Video decoding and encoding through the `ffmpeg` and `ffprobe` binaries.
//!
//! Frames come out of ffmpeg as raw 8-bit luminance on a pipe, each tagged
//! with its position in the stream, and go back in as PNG bytes in the order
//! the caller hands them over. No frame order is ever recovered from a file
//! name.

use std::ffi::OsStr;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command as ProcCommand, Stdio};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::AsciiError;

/// Where to find the media binaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

impl FfmpegConfig {
    pub fn ffmpeg_cmd(&self) -> &OsStr {
        self.ffmpeg_path.as_deref().map(Path::as_os_str).unwrap_or(OsStr::new("ffmpeg"))
    }

    pub fn ffprobe_cmd(&self) -> &OsStr {
        self.ffprobe_path.as_deref().map(Path::as_os_str).unwrap_or(OsStr::new("ffprobe"))
    }
}

/// Geometry and rate of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

/// Parse an ffprobe rate such as `30000/1001` or `25`.
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => s.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

pub(crate) fn parse_probe_json(json: &[u8]) -> Result<VideoInfo> {
    let probe: ProbeOutput = serde_json::from_slice(json).context("parsing ffprobe json")?;
    let stream = probe.streams.first().ok_or_else(|| anyhow!("no video stream found"))?;
    let width = stream.width.filter(|&w| w > 0).ok_or_else(|| anyhow!("video stream has no width"))?;
    let height = stream.height.filter(|&h| h > 0).ok_or_else(|| anyhow!("video stream has no height"))?;
    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .ok_or_else(|| anyhow!("video stream has no usable frame rate"))?;
    Ok(VideoInfo { width, height, fps })
}

/// Probe the first video stream of `input`.
pub fn probe(input: &Path, ffmpeg: &FfmpegConfig) -> Result<VideoInfo> {
    let output = ProcCommand::new(ffmpeg.ffprobe_cmd())
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "json",
        ])
        .arg(input)
        .output()
        .context("running ffprobe")?;

    if !output.status.success() {
        return Err(anyhow!(
            "ffprobe failed on {}: {}",
            input.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    parse_probe_json(&output.stdout).with_context(|| format!("probing {}", input.display()))
}

/// Which part of the video to decode, and at what rate.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Sampling rate; `None` keeps the stream's own rate.
    pub fps: Option<f64>,
    /// Start time (e.g. "00:01:23.456" or "83.456").
    pub start: Option<String>,
    /// End time, same formats as `start`.
    pub end: Option<String>,
}

pub fn parse_timestamp(s: &str) -> f64 {
    s.split(':').rev().enumerate().fold(0.0, |acc, (i, v)| {
        acc + v.parse::<f64>().unwrap_or(0.0) * 60f64.powi(i as i32)
    })
}

fn has_start(start: Option<&str>) -> Option<&str> {
    start.filter(|s| !s.is_empty() && *s != "0")
}

/// ffmpeg arguments that stream gray frames of `input` to stdout.
pub fn decode_args(input: &Path, opts: &DecodeOptions) -> Vec<String> {
    let mut args: Vec<String> = vec!["-loglevel".into(), "error".into(), "-noautorotate".into()];

    let start = has_start(opts.start.as_deref());
    if let Some(s) = start {
        args.push("-ss".into());
        args.push(s.to_string());
    }

    args.push("-i".into());
    args.push(input.to_string_lossy().into_owned());

    if let Some(e) = opts.end.as_deref().filter(|e| !e.is_empty()) {
        match start {
            Some(s) => {
                let duration = parse_timestamp(e) - parse_timestamp(s);
                if duration > 0.0 {
                    args.push("-t".into());
                    args.push(duration.to_string());
                }
            }
            None => {
                args.push("-t".into());
                args.push(e.to_string());
            }
        }
    }

    args.push("-an".into());
    if let Some(fps) = opts.fps {
        args.push("-vf".into());
        args.push(format!("fps={}", fps));
    }
    args.extend(["-f", "rawvideo", "-pix_fmt", "gray", "-"].map(String::from));
    args
}

/// One decoded frame with its position in the output sequence.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// 0-based position in decode order.
    pub index: usize,
    /// Presentation time relative to the decode start.
    pub timestamp: Duration,
    pub image: GrayImage,
}

/// Streaming decoder yielding frames in order.
pub struct FrameDecoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    fps: f64,
    next_index: usize,
    done: bool,
    reaped: bool,
}

impl FrameDecoder {
    /// Start decoding `input`. `info` must come from [`probe`] on the same file.
    pub fn spawn(input: &Path, info: &VideoInfo, opts: &DecodeOptions, ffmpeg: &FfmpegConfig) -> Result<Self> {
        let args = decode_args(input, opts);
        log::debug!("spawning {:?} {}", ffmpeg.ffmpeg_cmd(), args.join(" "));

        let mut child = ProcCommand::new(ffmpeg.ffmpeg_cmd())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .context("running ffmpeg")?;
        let stdout = child.stdout.take().ok_or_else(|| anyhow!("ffmpeg stdout unavailable"))?;

        Ok(Self {
            child,
            stdout: BufReader::with_capacity(info.width as usize * info.height as usize, stdout),
            width: info.width,
            height: info.height,
            fps: opts.fps.unwrap_or(info.fps),
            next_index: 0,
            done: false,
            reaped: false,
        })
    }

    /// The rate frames are decoded at.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self) -> Result<Option<DecodedFrame>> {
        let len = self.width as usize * self.height as usize;
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("reading frames from ffmpeg"),
            }
        }

        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }
        if filled < len {
            self.finish()?;
            return Err(anyhow!("ffmpeg produced a truncated frame ({} of {} bytes)", filled, len));
        }

        let image = GrayImage::from_raw(self.width, self.height, buf)
            .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", self.width, self.height))?;
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(DecodedFrame {
            index,
            timestamp: Duration::from_secs_f64(index as f64 / self.fps),
            image,
        }))
    }

    fn finish(&mut self) -> Result<()> {
        self.done = true;
        self.reaped = true;
        let status = self.child.wait().context("waiting for ffmpeg")?;
        if !status.success() {
            return Err(anyhow!("ffmpeg failed"));
        }
        Ok(())
    }
}

impl Iterator for FrameDecoder {
    type Item = Result<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(frame) => frame.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Drop for FrameDecoder {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// ffmpeg arguments that read PNGs from stdin and write an H.264 video.
pub fn encode_args(fps: f64, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec!["-loglevel".into(), "error".into(), "-y".into()];
    args.extend(["-f", "image2pipe", "-c:v", "png"].map(String::from));
    args.push("-framerate".into());
    args.push(fps.to_string());
    args.push("-i".into());
    args.push("-".into());
    // yuv420p needs even dimensions
    args.push("-vf".into());
    args.push("pad=ceil(iw/2)*2:ceil(ih/2)*2:color=white".into());
    args.extend(["-c:v", "libx264", "-pix_fmt", "yuv420p"].map(String::from));
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Assemble `frames` (PNG files, already in presentation order) into a video.
///
/// Fails with [`AsciiError::EmptyInput`] before touching `output` when there
/// is nothing to encode.
pub fn encode<P: AsRef<Path>>(frames: &[P], fps: f64, output: &Path, ffmpeg: &FfmpegConfig) -> Result<()> {
    if frames.is_empty() {
        return Err(AsciiError::EmptyInput(format!("no frames to assemble into {}", output.display())).into());
    }
    if !fps.is_finite() || fps <= 0.0 {
        return Err(anyhow!("invalid output frame rate {}", fps));
    }

    let args = encode_args(fps, output);
    log::debug!("spawning {:?} {}", ffmpeg.ffmpeg_cmd(), args.join(" "));
    let mut child = ProcCommand::new(ffmpeg.ffmpeg_cmd())
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .context("running ffmpeg for encoding")?;

    let write_result = (|| -> Result<()> {
        let mut stdin = child.stdin.take().ok_or_else(|| anyhow!("ffmpeg stdin unavailable"))?;
        for frame in frames {
            let frame = frame.as_ref();
            let bytes = std::fs::read(frame).with_context(|| format!("reading {}", frame.display()))?;
            stdin.write_all(&bytes).context("piping frame to ffmpeg")?;
        }
        Ok(())
    })();

    let status = child.wait().context("waiting for ffmpeg")?;
    write_result?;
    if !status.success() {
        return Err(anyhow!("ffmpeg encoding failed"));
    }
    log::info!("encoded {} frames at {} fps into {}", frames.len(), fps, output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_parse_probe_json() {
        let json = br#"{"streams":[{"width":640,"height":360,"r_frame_rate":"24/1"}]}"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info, VideoInfo { width: 640, height: 360, fps: 24.0 });
    }

    #[test]
    fn test_parse_probe_json_without_stream() {
        assert!(parse_probe_json(br#"{"streams":[]}"#).is_err());
        assert!(parse_probe_json(br#"{}"#).is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("83.5"), 83.5);
        assert_eq!(parse_timestamp("01:23.5"), 83.5);
        assert_eq!(parse_timestamp("1:00:00"), 3600.0);
    }

    #[test]
    fn test_decode_args_trim_and_rate() {
        let opts = DecodeOptions {
            fps: Some(10.0),
            start: Some("5".into()),
            end: Some("8".into()),
        };
        let args = decode_args(Path::new("in.mp4"), &opts);
        let joined = args.join(" ");
        assert!(joined.contains("-ss 5 -i in.mp4 -t 3"));
        assert!(joined.contains("-vf fps=10"));
        assert!(joined.ends_with("-f rawvideo -pix_fmt gray -"));
    }

    #[test]
    fn test_decode_args_defaults() {
        let args = decode_args(Path::new("in.mp4"), &DecodeOptions::default());
        assert!(!args.iter().any(|a| a == "-ss" || a == "-t" || a == "-vf"));
    }

    #[test]
    fn test_encode_args() {
        let args = encode_args(24.0, Path::new("out.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-f image2pipe"));
        assert!(joined.contains("-framerate 24 -i -"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_encode_empty_is_rejected() {
        let frames: Vec<PathBuf> = Vec::new();
        let err = encode(&frames, 24.0, Path::new("never.mp4"), &FfmpegConfig::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<AsciiError>(), Some(AsciiError::EmptyInput(_))));
        assert!(!Path::new("never.mp4").exists());
    }
}

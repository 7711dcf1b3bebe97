//! Uniform frame sampling from local video files.

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::core::models::MediaFrame;
use crate::errors::PipelineError;

const JPEG_QUALITY: u8 = 85;

/// Decoded access to the frames of one video.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    /// The frame at `index` in RGB order, or `None` if it cannot be decoded.
    fn read_frame(&mut self, index: usize) -> Option<RgbImage>;
}

/// Frame source backed by the `ffprobe` and `ffmpeg` executables.
pub struct FfmpegSource {
    path: PathBuf,
    width: u32,
    height: u32,
    frames: usize,
}

impl FfmpegSource {
    /// Probe `path` for its first video stream.
    ///
    /// # Errors
    ///
    /// Returns an error if `ffprobe` is missing, fails, or reports no frames.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_packets",
                "-show_entries",
                "stream=width,height,nb_read_packets",
                "-of",
                "json",
            ])
            .arg(path)
            .output()?;

        if !output.status.success() {
            return Err(PipelineError::Media(format!(
                "ffprobe could not open {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let probe: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| PipelineError::Media(format!("Unreadable ffprobe output: {e}")))?;
        let (width, height, frames) = parse_probe(&probe).ok_or_else(|| {
            PipelineError::Media(format!("No decodable video stream in {}", path.display()))
        })?;

        debug!(
            "Probed {}: {}x{}, {} frames",
            path.display(),
            width,
            height,
            frames
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            frames,
        })
    }
}

fn parse_probe(probe: &Value) -> Option<(u32, u32, usize)> {
    let stream = probe.get("streams")?.as_array()?.first()?;
    let width = u32::try_from(stream.get("width")?.as_u64()?).ok()?;
    let height = u32::try_from(stream.get("height")?.as_u64()?).ok()?;
    let frames = stream
        .get("nb_read_packets")
        .and_then(|v| v.as_str().map(str::to_string).or_else(|| Some(v.to_string())))
        .and_then(|raw| raw.trim_matches('"').parse::<usize>().ok())?;

    if width == 0 || height == 0 || frames == 0 {
        return None;
    }
    Some((width, height, frames))
}

impl FrameSource for FfmpegSource {
    fn frame_count(&self) -> usize {
        self.frames
    }

    fn read_frame(&mut self, index: usize) -> Option<RgbImage> {
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-noautorotate", "-i"])
            .arg(&self.path)
            .args([
                "-vf",
                &format!("select=eq(n\\,{index})"),
                "-vframes",
                "1",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "pipe:1",
            ])
            .output()
            .ok()?;

        if !output.status.success() {
            debug!("ffmpeg could not decode frame {}", index);
            return None;
        }
        RgbImage::from_raw(self.width, self.height, output.stdout)
    }
}

fn encode_jpeg(frame: RgbImage) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(frame)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .ok()?;
    Some(buf)
}

/// Pick up to `max_frames` frames at a uniform stride across the whole video.
///
/// Frames that fail to decode are skipped, so fewer frames than requested may
/// come back.
#[must_use]
pub fn sample_frames(source: &mut dyn FrameSource, max_frames: usize) -> Vec<MediaFrame> {
    let total = source.frame_count();
    if max_frames == 0 || total == 0 {
        return Vec::new();
    }

    let stride = (total / max_frames).max(1);
    let mut frames = Vec::with_capacity(max_frames);
    let mut index = 0;

    while frames.len() < max_frames && index < total {
        if let Some(jpeg) = source.read_frame(index).and_then(encode_jpeg) {
            frames.push(MediaFrame {
                position: frames.len(),
                source_frame: index,
                jpeg,
            });
        }
        index += stride;
    }

    frames
}

/// Sample frames from a video on disk. Empty when the file cannot be opened.
#[must_use]
pub fn sample(video_path: &Path, max_frames: usize) -> Vec<MediaFrame> {
    match FfmpegSource::open(video_path) {
        Ok(mut source) => {
            let frames = sample_frames(&mut source, max_frames);
            info!(
                "Sampled {} of {} requested frames from {}",
                frames.len(),
                max_frames,
                video_path.display()
            );
            frames
        }
        Err(e) => {
            warn!("Could not open video {}: {}", video_path.display(), e);
            Vec::new()
        }
    }
}

/// Produces frames for a video path; the seam the video chain samples through.
pub trait FrameSampler: Send + Sync {
    fn sample(&self, video_path: &Path, max_frames: usize) -> Vec<MediaFrame>;
}

pub struct FfmpegSampler;

impl FrameSampler for FfmpegSampler {
    fn sample(&self, video_path: &Path, max_frames: usize) -> Vec<MediaFrame> {
        sample(video_path, max_frames)
    }
}

//! Video handling: frame sampling and the video understanding chain

pub mod frames;
pub mod video;

pub use frames::{FfmpegSampler, FrameSampler, FrameSource, sample, sample_frames};
pub use video::{HYBRID_FRAME_COUNT, VideoUnderstandingChain};

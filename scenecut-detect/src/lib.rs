//! scenecut Detection Library
//!
//! This library finds scene cuts in a video: frames are decoded on one thread,
//! scored against their predecessor on another, and the resulting cut signal is
//! filtered before it becomes a list of scenes.

pub mod content_detector;
pub mod cut_filter;
pub mod frame_scorer;
pub mod frame_source;
pub mod image_ops;
pub mod progress_tracker;
pub mod scene_manager;
pub mod video_reader;

pub use content_detector::ContentDetector;
pub use cut_filter::{CutFilter, FilterMode};
pub use frame_scorer::{FrameScorer, ScoreWeights};
pub use frame_source::FrameSource;
pub use scene_manager::{SceneManager, StopHandle};
pub use video_reader::VideoReader;

use std::path::PathBuf;

/// Result type for scenecut-detect operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for scenecut-detect operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("scenecut core error: {0}")]
    Core(#[from] scenecut_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("Video file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported video codec: {0}")]
    UnsupportedCodec(String),

    #[error("Frame rate is unavailable, pass one explicitly")]
    RateUnavailable,

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Invalid video frame")]
    InvalidVideo,

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Decode thread panicked")]
    DecodeThreadPanicked,
}

impl Error {
    /// Returns true if the error means the frame source could not be opened
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::UnsupportedCodec(_)
                | Error::RateUnavailable
                | Error::NoVideoStream
        )
    }
}

/// Detector configuration
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Score above which a frame is treated as a cut candidate
    pub threshold: f64,
    /// Minimum scene length in frames enforced by the cut filter
    pub min_scene_len: u64,
    /// Per-channel weights of the frame score
    pub weights: ScoreWeights,
    /// How the cut filter handles candidates closer than `min_scene_len`
    pub filter_mode: FilterMode,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 27.0,
            min_scene_len: 15,
            weights: ScoreWeights::default(),
            filter_mode: FilterMode::Merge,
        }
    }
}

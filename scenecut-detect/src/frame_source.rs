//! Source of decoded frames for the detection pipeline

use crate::Result;
use image::RgbImage;
use scenecut_core::Timecode;

/// A stream of decoded frames with a monotonic position.
///
/// The pipeline reads a source from its decode thread only.
pub trait FrameSource {
    /// Decoded frame size as `(width, height)`
    fn frame_size(&self) -> (u32, u32);

    /// Total number of frames, if known (may be an estimate)
    fn frame_count(&self) -> u64;

    /// Frame rate in frames per second
    fn frame_rate(&self) -> f64;

    /// Timecode of frame 0 at the source's frame rate
    fn base_timecode(&self) -> Timecode;

    /// Decodes the next frame, or returns `None` at end of stream
    fn read_next(&mut self) -> Result<Option<RgbImage>>;

    /// Position of the most recently read frame
    fn position(&self) -> Timecode;
}

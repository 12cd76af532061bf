//! Video decoding using FFmpeg

use crate::{Error, FrameSource, Result};
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use log::{debug, warn};
use scenecut_core::{Timecode, MIN_FPS_DELTA};
use std::path::Path;
use std::sync::OnceLock;

/// Consecutive decode failures tolerated before the stream is treated as ended
pub const MAX_DECODE_RETRIES: u32 = 5;

static FFMPEG_INIT: OnceLock<std::result::Result<(), ffmpeg::Error>> = OnceLock::new();

/// Initialize FFmpeg (once per process)
fn init_ffmpeg() -> Result<()> {
    FFMPEG_INIT.get_or_init(ffmpeg::init).clone()?;
    Ok(())
}

/// Frame source that decodes a video file frame by frame
pub struct VideoReader {
    input: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<ffmpeg::software::scaling::Context>,
    base_timecode: Timecode,
    frame_count: u64,
    frames_read: u64,
    eof_sent: bool,
    finished: bool,
}

impl VideoReader {
    /// Opens a video file.
    ///
    /// `forced_fps` overrides the frame rate reported by the container.
    pub fn open<P: AsRef<Path>>(path: P, forced_fps: Option<f64>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        init_ffmpeg()?;

        let input = ffmpeg::format::input(&path)?;

        // Find the video stream
        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(Error::NoVideoStream)?;
        let video_stream_index = video_stream.index();

        let parameters = video_stream.parameters();
        if parameters.id() == ffmpeg::codec::Id::None {
            return Err(Error::UnsupportedCodec(
                "video codec detection failed".to_string(),
            ));
        }

        let decoder = ffmpeg::codec::context::Context::from_parameters(parameters)
            .and_then(|context| context.decoder().video())
            .map_err(|e| Error::UnsupportedCodec(e.to_string()))?;

        let fps = match forced_fps {
            Some(fps) => fps,
            None => stream_frame_rate(&video_stream).ok_or(Error::RateUnavailable)?,
        };
        let base_timecode = Timecode::from_frames(0, fps)?;

        let frame_count = estimate_frame_count(&input, &video_stream, fps);

        debug!(
            "opened {}: {}x{} @ {fps:.3} fps, ~{frame_count} frames",
            path.display(),
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            scaler: None,
            base_timecode,
            frame_count,
            frames_read: 0,
            eof_sent: false,
            finished: false,
        })
    }

    /// Gets the video width
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Gets the video height
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// Decodes until one frame is available or the stream is drained
    fn decode_next(&mut self) -> Result<Option<RgbImage>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded).map(Some);
            }
            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = ffmpeg::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Converts a decoded frame to packed RGB
    fn convert(&mut self, decoded: &ffmpeg::frame::Video) -> Result<RgbImage> {
        if self.scaler.is_none() {
            self.scaler = Some(ffmpeg::software::scaling::Context::get(
                decoded.format(),
                decoded.width(),
                decoded.height(),
                ffmpeg::format::Pixel::RGB24,
                decoded.width(),
                decoded.height(),
                ffmpeg::software::scaling::Flags::BILINEAR,
            )?);
        }

        let mut rgb_frame = ffmpeg::frame::Video::empty();
        if let Some(ref mut scaler) = self.scaler {
            scaler.run(decoded, &mut rgb_frame)?;
        }

        // Copy rows, skipping the stride padding
        let width = rgb_frame.width();
        let height = rgb_frame.height();
        let row_bytes = width as usize * 3;
        let stride = rgb_frame.stride(0);
        let src = rgb_frame.data(0);
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for y in 0..height as usize {
            let offset = y * stride;
            let row = src
                .get(offset..offset + row_bytes)
                .ok_or(Error::InvalidVideo)?;
            data.extend_from_slice(row);
        }

        RgbImage::from_raw(width, height, data).ok_or(Error::InvalidVideo)
    }
}

impl FrameSource for VideoReader {
    fn frame_size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn frame_rate(&self) -> f64 {
        self.base_timecode.fps()
    }

    fn base_timecode(&self) -> Timecode {
        self.base_timecode
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }

        let mut failures = 0;
        loop {
            match self.decode_next() {
                Ok(Some(frame)) => {
                    self.frames_read += 1;
                    return Ok(Some(frame));
                }
                Ok(None) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(err) => {
                    failures += 1;
                    if failures >= MAX_DECODE_RETRIES {
                        warn!(
                            "giving up after {failures} failed decode attempts at frame {}: {err}",
                            self.frames_read
                        );
                        self.finished = true;
                        return Ok(None);
                    }
                    debug!("decode attempt {failures} failed, retrying: {err}");
                }
            }
        }
    }

    fn position(&self) -> Timecode {
        self.base_timecode + self.frames_read.saturating_sub(1)
    }
}

/// Frame rate reported by the stream, if usable
fn stream_frame_rate(stream: &ffmpeg::format::stream::Stream<'_>) -> Option<f64> {
    [stream.avg_frame_rate(), stream.rate()]
        .into_iter()
        .filter(|rate| rate.denominator() != 0)
        .map(f64::from)
        .find(|fps| fps.is_finite() && *fps >= MIN_FPS_DELTA)
}

/// Total frames from the stream header, falling back to duration × fps
fn estimate_frame_count(
    input: &ffmpeg::format::context::Input,
    stream: &ffmpeg::format::stream::Stream<'_>,
    fps: f64,
) -> u64 {
    if let Ok(frames) = u64::try_from(stream.frames()) {
        if frames > 0 {
            return frames;
        }
    }

    let time_base = stream.time_base();
    let duration_secs = if stream.duration() > 0 && time_base.denominator() != 0 {
        stream.duration() as f64 * f64::from(time_base)
    } else {
        // Fallback to container duration
        input.duration().max(0) as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE)
    };

    (duration_secs * fps).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_open_missing_file() {
        let path = PathBuf::from("/nonexistent/scenecut/clip.mp4");
        let err = match VideoReader::open(&path, Some(30.0)) {
            Ok(_) => panic!("opening a missing file should fail"),
            Err(err) => err,
        };

        assert!(matches!(&err, Error::NotFound(p) if *p == path));
        assert!(err.is_source_unavailable());
    }
}

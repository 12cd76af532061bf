//! Frame-accurate timecodes at a fixed frame rate

use crate::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// Smallest frame rate accepted, and the tolerance used when comparing rates.
pub const MIN_FPS_DELTA: f64 = 1.0 / 100_000.0;

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 60.0 * SECONDS_PER_MINUTE;
const MINUTES_PER_HOUR: u64 = 60;

/// Fractional digits beyond this are always zero at any supported frame rate
const MAX_PRECISION: usize = 9;

/// A position on a video timeline, stored as a frame count at a fixed rate.
///
/// Arithmetic never goes below frame 0. Operations that combine two timecodes
/// require both to share a frame rate (within [`MIN_FPS_DELTA`]), so equality
/// and ordering go through [`Timecode::try_eq`] and [`Timecode::try_cmp`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Timecode {
    frame_num: u64,
    fps: f64,
}

impl Timecode {
    /// Creates a timecode from a frame count
    pub fn from_frames(frames: i64, fps: f64) -> Result<Self> {
        let fps = validate_fps(fps)?;
        let frame_num = u64::try_from(frames).map_err(|_| {
            Error::InvalidArgument(format!("frame count must be non-negative, got {frames}"))
        })?;
        Ok(Self { frame_num, fps })
    }

    /// Creates a timecode from a duration in seconds, rounded to the nearest frame
    pub fn from_seconds(seconds: f64, fps: f64) -> Result<Self> {
        let fps = validate_fps(fps)?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "seconds must be a non-negative number, got {seconds}"
            )));
        }
        Ok(Self {
            frame_num: seconds_to_frames(seconds, fps),
            fps,
        })
    }

    /// Parses a timecode string.
    ///
    /// Accepted forms:
    /// - `9000` – a literal frame count
    /// - `00:05:00` or `00:05:00.000` – hours, minutes and seconds
    /// - `300.0`, `300.5` or `300s` – seconds
    pub fn parse(text: &str, fps: f64) -> Result<Self> {
        let fps = validate_fps(fps)?;
        let frame_num = parse_frames(text.trim(), fps)?;
        Ok(Self { frame_num, fps })
    }

    /// Frame index
    pub fn frame_num(&self) -> u64 {
        self.frame_num
    }

    /// Frame rate in frames per second
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Position in seconds
    pub fn seconds(&self) -> f64 {
        self.frame_num as f64 / self.fps
    }

    /// Checks whether `fps` matches this timecode's frame rate
    pub fn equal_framerate(&self, fps: f64) -> bool {
        (self.fps - fps).abs() < MIN_FPS_DELTA
    }

    /// Formats the timecode as `HH:MM:SS.fff` with `precision` fractional digits
    /// (at most 9).
    ///
    /// Seconds that round up to 60 carry into the minutes, and 60 minutes carry
    /// into the hours.
    pub fn to_formatted_string(&self, precision: usize) -> String {
        let precision = precision.min(MAX_PRECISION);
        let total = self.seconds();
        let mut hrs = (total / SECONDS_PER_HOUR) as u64;
        let remaining = total - hrs as f64 * SECONDS_PER_HOUR;
        let mut mins = (remaining / SECONDS_PER_MINUTE) as u64;
        let mut secs = (remaining - mins as f64 * SECONDS_PER_MINUTE).max(0.0);

        let scale = 10f64.powi(precision as i32);
        secs = ((secs * scale).round() / scale).min(SECONDS_PER_MINUTE);
        if secs >= SECONDS_PER_MINUTE {
            secs = 0.0;
            mins += 1;
            if mins >= MINUTES_PER_HOUR {
                mins = 0;
                hrs += 1;
            }
        }

        if precision == 0 {
            format!("{hrs:02}:{mins:02}:{:02}", secs as u64)
        } else {
            format!(
                "{hrs:02}:{mins:02}:{secs:0width$.precision$}",
                width = precision + 3
            )
        }
    }

    /// Moves forward by a (possibly negative) number of frames
    pub fn add_frames(&self, frames: i64) -> Self {
        Self {
            frame_num: offset_frames(self.frame_num, frames),
            fps: self.fps,
        }
    }

    /// Moves backward by a (possibly negative) number of frames, stopping at frame 0
    pub fn sub_frames(&self, frames: i64) -> Self {
        let frame_num = if frames >= 0 {
            self.frame_num.saturating_sub(frames.unsigned_abs())
        } else {
            self.frame_num.saturating_add(frames.unsigned_abs())
        };
        Self {
            frame_num,
            fps: self.fps,
        }
    }

    /// Moves forward by a number of seconds, rounded to the nearest frame
    pub fn add_seconds(&self, seconds: f64) -> Self {
        self.add_frames((seconds * self.fps).round() as i64)
    }

    /// Moves backward by a number of seconds, stopping at frame 0
    pub fn sub_seconds(&self, seconds: f64) -> Self {
        self.sub_frames((seconds * self.fps).round() as i64)
    }

    /// Adds another timecode of the same frame rate
    pub fn try_add(&self, other: &Timecode) -> Result<Self> {
        self.check_rate(other)?;
        Ok(Self {
            frame_num: self.frame_num.saturating_add(other.frame_num),
            fps: self.fps,
        })
    }

    /// Subtracts another timecode of the same frame rate, stopping at frame 0
    pub fn try_sub(&self, other: &Timecode) -> Result<Self> {
        self.check_rate(other)?;
        Ok(Self {
            frame_num: self.frame_num.saturating_sub(other.frame_num),
            fps: self.fps,
        })
    }

    /// Orders two timecodes by frame count; fails if their frame rates differ
    pub fn try_cmp(&self, other: &Timecode) -> Result<Ordering> {
        self.check_rate(other)?;
        Ok(self.frame_num.cmp(&other.frame_num))
    }

    /// Checks two timecodes for the same frame; fails if their frame rates differ
    pub fn try_eq(&self, other: &Timecode) -> Result<bool> {
        self.try_cmp(other).map(Ordering::is_eq)
    }

    /// Adds a timecode string (any form accepted by [`Timecode::parse`]) at this rate
    pub fn add_str(&self, text: &str) -> Result<Self> {
        let frames = parse_frames(text.trim(), self.fps)?;
        Ok(*self + frames)
    }

    /// Subtracts a timecode string at this rate, stopping at frame 0
    pub fn sub_str(&self, text: &str) -> Result<Self> {
        let frames = parse_frames(text.trim(), self.fps)?;
        Ok(*self - frames)
    }

    /// Orders this timecode against a timecode string read at this rate
    pub fn cmp_str(&self, text: &str) -> Result<Ordering> {
        let frames = parse_frames(text.trim(), self.fps)?;
        Ok(self.frame_num.cmp(&frames))
    }

    /// Orders this timecode against a raw frame count
    pub fn cmp_frames(&self, frames: u64) -> Ordering {
        self.frame_num.cmp(&frames)
    }

    /// Orders this timecode against a raw number of seconds
    pub fn cmp_seconds(&self, seconds: f64) -> Ordering {
        self.seconds().total_cmp(&seconds)
    }

    fn check_rate(&self, other: &Timecode) -> Result<()> {
        if self.equal_framerate(other.fps) {
            Ok(())
        } else {
            Err(Error::IncompatibleRate {
                left: self.fps,
                right: other.fps,
            })
        }
    }
}

impl Add<u64> for Timecode {
    type Output = Timecode;

    fn add(self, frames: u64) -> Timecode {
        Timecode {
            frame_num: self.frame_num.saturating_add(frames),
            fps: self.fps,
        }
    }
}

impl Sub<u64> for Timecode {
    type Output = Timecode;

    fn sub(self, frames: u64) -> Timecode {
        Timecode {
            frame_num: self.frame_num.saturating_sub(frames),
            fps: self.fps,
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_formatted_string(3))
    }
}

fn validate_fps(fps: f64) -> Result<f64> {
    if fps.is_finite() && fps >= MIN_FPS_DELTA {
        Ok(fps)
    } else {
        Err(Error::InvalidArgument(format!(
            "frame rate must be at least {MIN_FPS_DELTA}, got {fps}"
        )))
    }
}

fn seconds_to_frames(seconds: f64, fps: f64) -> u64 {
    (seconds * fps).round() as u64
}

fn offset_frames(base: u64, delta: i64) -> u64 {
    if delta >= 0 {
        base.saturating_add(delta.unsigned_abs())
    } else {
        base.saturating_sub(delta.unsigned_abs())
    }
}

fn parse_frames(text: &str, fps: f64) -> Result<u64> {
    if text.is_empty() {
        return Err(Error::Parse("empty timecode".into()));
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<u64>()
            .map_err(|e| Error::Parse(format!("'{text}': {e}")));
    }

    if text.contains(':') {
        let parts: Vec<&str> = text.split(':').collect();
        let [hrs, mins, secs] = parts.as_slice() else {
            return Err(Error::Parse(format!("'{text}': expected HH:MM:SS[.fff]")));
        };
        let hrs = parse_whole(hrs, text)?;
        let mins = parse_whole(mins, text)?;
        let secs = parse_decimal(secs, text)?;
        if mins >= MINUTES_PER_HOUR || secs >= SECONDS_PER_MINUTE {
            return Err(Error::Parse(format!(
                "'{text}': minutes and seconds must be below 60"
            )));
        }
        let total = hrs as f64 * SECONDS_PER_HOUR + mins as f64 * SECONDS_PER_MINUTE + secs;
        return Ok(seconds_to_frames(total, fps));
    }

    let number = text.strip_suffix('s').unwrap_or(text);
    parse_decimal(number, text).map(|secs| seconds_to_frames(secs, fps))
}

fn parse_whole(component: &str, text: &str) -> Result<u64> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Parse(format!("'{text}': '{component}' is not a whole number")));
    }
    component
        .parse::<u64>()
        .map_err(|e| Error::Parse(format!("'{text}': {e}")))
}

fn parse_decimal(component: &str, text: &str) -> Result<f64> {
    if component.is_empty()
        || !component.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        return Err(Error::Parse(format!("'{text}': '{component}' is not a number")));
    }
    component
        .parse::<f64>()
        .map_err(|e| Error::Parse(format!("'{text}': {e}")))
}

//! Flash filtering of raw cut candidates
//!
//! A per-frame "above threshold" signal is noisy: camera flashes and short
//! spikes trip it for a frame or two. The filter enforces a minimum scene
//! length by merging runs of candidates that are too close together and only
//! emitting a cut once the run is over.

use crate::{Error, Result};

/// How candidates closer than the minimum length are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Merge consecutive candidates into a single cut at the end of the run
    #[default]
    Merge,
    /// Drop candidates that arrive too soon (not implemented)
    Suppress,
}

/// State of the merge filter between frames.
///
/// `step` is a pure transition, so the filter logic can be exercised without
/// a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterState {
    pub min_length: u64,
    /// Most recent above-threshold frame; seeded with the first frame seen
    pub last_above: Option<u64>,
    pub merge_active: bool,
    pub merge_start: Option<u64>,
}

impl FilterState {
    /// Creates the initial state for a filter with the given minimum length
    pub fn new(min_length: u64) -> Self {
        Self {
            min_length,
            last_above: None,
            merge_active: false,
            merge_start: None,
        }
    }

    /// Advances the state by one frame, returning the new state and any confirmed cut
    pub fn step(self, frame_num: u64, above_threshold: bool) -> (Self, Option<u64>) {
        if self.min_length == 0 {
            return (self, above_threshold.then_some(frame_num));
        }

        let mut next = self;
        let last_above = *next.last_above.get_or_insert(frame_num);
        let min_length_met = frame_num.saturating_sub(last_above) >= next.min_length;

        if above_threshold {
            next.last_above = Some(frame_num);
        }
        let last_above = next.last_above.unwrap_or(frame_num);

        if next.merge_active {
            let merge_start = next.merge_start.unwrap_or(last_above);
            let frames_in_window = last_above.saturating_sub(merge_start);
            if min_length_met && !above_threshold && frames_in_window >= next.min_length {
                next.merge_active = false;
                return (next, Some(last_above));
            }
            return (next, None);
        }

        if !above_threshold {
            return (next, None);
        }

        if min_length_met {
            return (next, Some(frame_num));
        }

        next.merge_active = true;
        next.merge_start = Some(frame_num);
        (next, None)
    }
}

/// Stateful wrapper around [`FilterState`] for one detection run
#[derive(Debug, Clone)]
pub struct CutFilter {
    mode: FilterMode,
    state: FilterState,
}

impl CutFilter {
    /// Creates a new filter
    pub fn new(mode: FilterMode, min_length: u64) -> Self {
        Self {
            mode,
            state: FilterState::new(min_length),
        }
    }

    /// Feeds one frame's threshold signal through the filter.
    ///
    /// Frames must arrive in strictly increasing order. Returns the cuts
    /// confirmed by this frame (at most one).
    pub fn filter(&mut self, frame_num: u64, above_threshold: bool) -> Result<Vec<u64>> {
        match self.mode {
            FilterMode::Merge => {
                let (state, cut) = self.state.step(frame_num, above_threshold);
                self.state = state;
                Ok(cut.into_iter().collect())
            }
            FilterMode::Suppress => Err(Error::NotImplemented("suppress filter mode")),
        }
    }

    /// Returns true while a run of candidates is being merged.
    ///
    /// A merge that is still open when the stream ends is never emitted.
    pub fn is_merging(&self) -> bool {
        self.state.merge_active
    }

    /// Current filter state
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Restores the initial state
    pub fn reset(&mut self) {
        self.state = FilterState::new(self.state.min_length);
    }
}

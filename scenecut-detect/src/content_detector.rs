//! Content-aware cut detection: frame score, threshold, flash filter

use crate::cut_filter::CutFilter;
use crate::frame_scorer::FrameScorer;
use crate::{DetectorConfig, Result};
use image::RgbImage;
use log::debug;

/// Turns a stream of frames into confirmed cut frame indices
pub struct ContentDetector {
    threshold: f64,
    scorer: FrameScorer,
    filter: CutFilter,
    last_score: Option<f64>,
}

impl ContentDetector {
    /// Creates a detector from the given configuration
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold: config.threshold,
            scorer: FrameScorer::new(config.weights),
            filter: CutFilter::new(config.filter_mode, config.min_scene_len),
            last_score: None,
        }
    }

    /// Scores a frame and feeds the result through the flash filter.
    ///
    /// Returns any cuts confirmed by this frame.
    pub fn process_frame(&mut self, frame_num: u64, frame: &RgbImage) -> Result<Vec<u64>> {
        let score = self.scorer.score(frame_num, frame);
        self.last_score = Some(score);

        let above_threshold = score > self.threshold;
        let cuts = self.filter.filter(frame_num, above_threshold)?;
        if above_threshold {
            debug!(
                "frame {frame_num}: score {score:.3} above threshold {:.3}, confirmed cuts {cuts:?}",
                self.threshold
            );
        }
        Ok(cuts)
    }

    /// Score of the most recently processed frame
    pub fn last_score(&self) -> Option<f64> {
        self.last_score
    }

    /// Threshold a frame score must exceed to count as a cut candidate
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns true if a merged cut is pending
    pub fn is_merging(&self) -> bool {
        self.filter.is_merging()
    }

    /// Forgets all per-stream state
    pub fn reset(&mut self) {
        self.scorer.reset();
        self.filter.reset();
        self.last_score = None;
    }
}

impl Default for ContentDetector {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

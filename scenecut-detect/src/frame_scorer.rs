//! Frame-to-frame content scoring in HSV space

use crate::image_ops::{self, HsvPlanes};
use crate::Result;
use image::{GrayImage, RgbImage};
use log::trace;
use scenecut_core::Error as CoreError;

/// Relative weight of each component in the frame score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub hue: f64,
    pub saturation: f64,
    pub luminance: f64,
    /// Carried for configuration compatibility; no edge delta is computed,
    /// so this weight only ever scales a zero.
    pub edges: f64,
}

impl ScoreWeights {
    /// Creates a weight set, rejecting one whose absolute sum is zero
    pub fn new(hue: f64, saturation: f64, luminance: f64, edges: f64) -> Result<Self> {
        let weights = Self {
            hue,
            saturation,
            luminance,
            edges,
        };
        let normalizer = weights.normalizer();
        if !normalizer.is_finite() || normalizer <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "score weights must have a positive absolute sum, got {normalizer}"
            ))
            .into());
        }
        Ok(weights)
    }

    /// Sum of the absolute weights
    pub fn normalizer(&self) -> f64 {
        self.hue.abs() + self.saturation.abs() + self.luminance.abs() + self.edges.abs()
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            hue: 1.0,
            saturation: 1.0,
            luminance: 1.0,
            edges: 0.0,
        }
    }
}

/// Scores each frame against the one before it.
///
/// Only the previous frame's planes are retained.
pub struct FrameScorer {
    weights: ScoreWeights,
    last_frame: Option<HsvPlanes>,
}

impl FrameScorer {
    /// Creates a new scorer with the given weights
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights,
            last_frame: None,
        }
    }

    /// Scores `frame` against the previously scored frame.
    ///
    /// The first frame always scores `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if `frame` does not have the same dimensions as the previous frame.
    pub fn score(&mut self, frame_num: u64, frame: &RgbImage) -> f64 {
        let planes = image_ops::split_hsv(frame);

        let score = match self.last_frame.as_ref() {
            None => 0.0,
            Some(last) => {
                let delta_hue = mean_abs_diff(&planes.hue, &last.hue);
                let delta_sat = mean_abs_diff(&planes.saturation, &last.saturation);
                let delta_lum = mean_abs_diff(&planes.luminance, &last.luminance);
                let delta_edges = 0.0;

                let weighted = self.weights.hue * delta_hue
                    + self.weights.saturation * delta_sat
                    + self.weights.luminance * delta_lum
                    + self.weights.edges * delta_edges;
                let score = weighted / self.weights.normalizer();

                trace!(
                    "frame {frame_num}: hue {delta_hue:.3} sat {delta_sat:.3} lum {delta_lum:.3} -> {score:.3}"
                );
                score
            }
        };

        self.last_frame = Some(planes);
        score
    }

    /// Forgets the previous frame, so the next frame scores `0.0`
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

/// Mean absolute per-pixel difference between two planes.
///
/// # Panics
///
/// Panics if the planes have different dimensions.
pub fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> f64 {
    assert_eq!(
        a.dimensions(),
        b.dimensions(),
        "planes must have identical dimensions"
    );

    let pixel_count = a.as_raw().len();
    if pixel_count == 0 {
        return 0.0;
    }

    let total: i64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&pa, &pb)| (i64::from(pa) - i64::from(pb)).abs())
        .sum();

    total as f64 / pixel_count as f64
}

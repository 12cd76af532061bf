//! Scene spans built from detected cuts

use crate::Timecode;

/// A detected scene covering the half-open range `[start, end)`
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Scene {
    /// First frame of the scene
    pub start: Timecode,
    /// First frame after the scene (exclusive)
    pub end: Timecode,
}

impl Scene {
    /// Creates a new scene span
    pub fn new(start: Timecode, end: Timecode) -> Self {
        Self { start, end }
    }

    /// Number of frames in this scene
    pub fn frame_len(&self) -> u64 {
        self.end.frame_num().saturating_sub(self.start.frame_num())
    }

    /// Duration of this scene in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_len() as f64 / self.start.fps()
    }

    /// Checks if the given frame falls inside this scene
    pub fn contains(&self, frame_num: u64) -> bool {
        frame_num >= self.start.frame_num() && frame_num < self.end.frame_num()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_span() {
        let start = Timecode::from_frames(10, 25.0).unwrap();
        let end = Timecode::from_frames(60, 25.0).unwrap();
        let scene = Scene::new(start, end);

        assert_eq!(scene.frame_len(), 50);
        assert!((scene.duration_secs() - 2.0).abs() < 1e-9);
        assert!(scene.contains(10));
        assert!(scene.contains(59));
        assert!(!scene.contains(60));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_scene_serializes() {
        let scene = Scene::new(
            Timecode::from_frames(0, 30.0).unwrap(),
            Timecode::from_frames(30, 30.0).unwrap(),
        );
        let json = serde_json::to_value(scene).unwrap();
        assert_eq!(json["start"]["frame_num"], 0);
        assert_eq!(json["end"]["frame_num"], 30);
    }
}

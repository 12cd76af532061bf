//! Scene detection pipeline
//!
//! Frames are decoded (and downscaled) on a dedicated thread and handed to
//! the caller's thread through a bounded queue, where they are scored and
//! filtered strictly in order. Accumulated cuts are turned into a scene list
//! once detection finishes.

use crate::content_detector::ContentDetector;
use crate::frame_source::FrameSource;
use crate::image_ops::{self, DEFAULT_MIN_WIDTH};
use crate::progress_tracker::ProgressTracker;
use crate::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use image::RgbImage;
use log::{debug, info, warn};
use scenecut_core::{Scene, Timecode};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Frames buffered between the decode thread and the scorer
pub const MAX_FRAME_QUEUE_LENGTH: usize = 4;

const PROGRESS_INTERVAL: u64 = 500;

/// A decoded frame and its position; `None` marks the end of the stream
type QueuedFrame = Option<(RgbImage, Timecode)>;

/// Cooperative stop signal shared with a running [`SceneManager::detect_scenes`]
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the running detection to stop as soon as possible
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Runs a [`ContentDetector`] over a frame source and collects the cuts
pub struct SceneManager {
    detector: ContentDetector,
    downscale: Option<u32>,
    cutting_list: BTreeSet<u64>,
    base_timecode: Option<Timecode>,
    start_pos: Option<Timecode>,
    last_pos: Option<Timecode>,
    frame_size: Option<(u32, u32)>,
    stop: StopHandle,
}

impl SceneManager {
    /// Creates a new scene manager around a detector
    pub fn new(detector: ContentDetector) -> Self {
        Self {
            detector,
            downscale: None,
            cutting_list: BTreeSet::new(),
            base_timecode: None,
            start_pos: None,
            last_pos: None,
            frame_size: None,
            stop: StopHandle::default(),
        }
    }

    /// Sets a fixed downscale factor; `None` picks one from the frame width
    pub fn with_downscale(mut self, factor: Option<u32>) -> Self {
        self.downscale = factor;
        self
    }

    /// Handle that can stop a running detection from another thread
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Decoded frame size of the last analysed source
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }

    /// Performs scene detection on `source`.
    ///
    /// Blocks until the source is exhausted or a stop is requested, and
    /// returns the number of frames scored. Cuts found before a stop are kept.
    pub fn detect_scenes<S>(&mut self, source: &mut S) -> Result<u64>
    where
        S: FrameSource + Send,
    {
        let frame_size = source.frame_size();
        let downscale_factor = match self.downscale {
            Some(factor) => factor.max(1),
            None => image_ops::compute_downscale_factor(frame_size.0, DEFAULT_MIN_WIDTH),
        };
        let total_frames = source.frame_count();

        self.base_timecode = Some(source.base_timecode());
        self.frame_size = Some(frame_size);
        self.stop.clear();

        info!(
            "Detecting scenes: {}x{} @ {:.3} fps, downscale factor {downscale_factor}",
            frame_size.0,
            frame_size.1,
            source.frame_rate()
        );

        let decode_stop = self.stop.clone();

        let processed = thread::scope(|scope| -> Result<u64> {
            // Scoped so a scoring panic drops the receiver before the join
            let (sender, receiver) = bounded::<QueuedFrame>(MAX_FRAME_QUEUE_LENGTH);
            let decoder = thread::Builder::new()
                .name("scenecut-decode".into())
                .spawn_scoped(scope, move || {
                    decode_frames(source, downscale_factor, &sender, &decode_stop)
                })?;

            let result = self.process_frames(&receiver, total_frames);
            if result.is_err() {
                self.stop.stop();
            }
            if self.stop.is_stopped() {
                drain(&receiver);
            }

            decoder.join().map_err(|_| Error::DecodeThreadPanicked)?;
            result
        })?;

        info!(
            "Detected {} cuts in {processed} frames",
            self.cutting_list.len()
        );
        Ok(processed)
    }

    /// Scores queued frames in order until the end marker or a stop request
    fn process_frames(&mut self, queue: &Receiver<QueuedFrame>, total_frames: u64) -> Result<u64> {
        let mut progress = ProgressTracker::new(total_frames, "Detecting scenes:");

        while !self.stop.is_stopped() {
            let Ok(Some((frame, position))) = queue.recv() else {
                break;
            };
            if self.stop.is_stopped() {
                break;
            }

            if self.start_pos.is_none() {
                self.start_pos = Some(position);
            }
            self.last_pos = Some(position);

            let cuts = self.detector.process_frame(position.frame_num(), &frame)?;
            self.cutting_list.extend(cuts);
            progress.increment_and_report(PROGRESS_INTERVAL);
        }

        if self.stop.is_stopped() {
            debug!("stop requested after {} frames", progress.processed());
        }
        if self.detector.is_merging() {
            debug!("stream ended with a merged cut pending; it is not emitted");
        }
        progress.finish();
        Ok(progress.processed())
    }

    /// Detected cuts as timecodes, sorted and without duplicates
    pub fn get_cut_list(&self) -> Vec<Timecode> {
        let Some(base) = self.base_timecode else {
            return Vec::new();
        };
        self.cutting_list.iter().map(|&cut| base + cut).collect()
    }

    /// Splits the analysed range into scenes at each cut.
    ///
    /// Without any cuts this returns one scene spanning everything when
    /// `start_in_scene` is set, and an empty list otherwise.
    pub fn get_scene_list(&self, start_in_scene: bool) -> Vec<Scene> {
        let (Some(start), Some(last)) = (self.start_pos, self.last_pos) else {
            return Vec::new();
        };
        let end = last + 1;

        let cuts = self.get_cut_list();
        if cuts.is_empty() {
            return if start_in_scene {
                vec![Scene::new(start, end)]
            } else {
                Vec::new()
            };
        }
        scenes_from_cuts(&cuts, start, end)
    }

    /// Forgets all cuts and per-stream state
    pub fn clear(&mut self) {
        self.cutting_list.clear();
        self.base_timecode = None;
        self.start_pos = None;
        self.last_pos = None;
        self.frame_size = None;
        self.detector.reset();
    }
}

/// Decode thread body: reads, downscales and queues frames until the source
/// ends, fails, or a stop is requested
fn decode_frames<S: FrameSource>(
    source: &mut S,
    downscale_factor: u32,
    queue: &Sender<QueuedFrame>,
    stop: &StopHandle,
) {
    while !stop.is_stopped() {
        let frame = match source.read_next() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(err) => {
                warn!("decoding stopped early: {err}");
                break;
            }
        };
        let position = source.position();
        let frame = image_ops::downscale(frame, downscale_factor);

        if queue.send(Some((frame, position))).is_err() {
            return;
        }
    }
    let _ = queue.send(None);
}

/// Discards queued frames until the decode thread has finished
fn drain(queue: &Receiver<QueuedFrame>) {
    let mut discarded = 0;
    for item in queue.iter() {
        if item.is_none() {
            break;
        }
        discarded += 1;
    }
    debug!("discarded {discarded} queued frames");
}

/// Builds contiguous scenes `[start, c1), [c1, c2), ..., [cn, end)`
fn scenes_from_cuts(cuts: &[Timecode], start: Timecode, end: Timecode) -> Vec<Scene> {
    let mut scenes = Vec::with_capacity(cuts.len() + 1);
    let mut scene_start = start;

    for &cut in cuts {
        if cut.frame_num() <= scene_start.frame_num() || cut.frame_num() >= end.frame_num() {
            continue;
        }
        scenes.push(Scene::new(scene_start, cut));
        scene_start = cut;
    }
    scenes.push(Scene::new(scene_start, end));
    scenes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(frame: i64) -> Timecode {
        Timecode::from_frames(frame, 30.0).unwrap()
    }

    #[test]
    fn test_scenes_partition_range() {
        let scenes = scenes_from_cuts(&[tc(10), tc(25)], tc(0), tc(40));
        let bounds: Vec<_> = scenes
            .iter()
            .map(|s| (s.start.frame_num(), s.end.frame_num()))
            .collect();
        assert_eq!(bounds, vec![(0, 10), (10, 25), (25, 40)]);
    }

    #[test]
    fn test_scenes_ignore_cuts_outside_range() {
        let scenes = scenes_from_cuts(&[tc(5), tc(12), tc(50)], tc(5), tc(20));
        let bounds: Vec<_> = scenes
            .iter()
            .map(|s| (s.start.frame_num(), s.end.frame_num()))
            .collect();
        assert_eq!(bounds, vec![(5, 12), (12, 20)]);
    }

    #[test]
    fn test_empty_manager_has_no_scenes() {
        let manager = SceneManager::new(ContentDetector::default());
        assert!(manager.get_cut_list().is_empty());
        assert!(manager.get_scene_list(true).is_empty());
    }

    #[test]
    fn test_stop_handle_is_shared() {
        let manager = SceneManager::new(ContentDetector::default());
        let handle = manager.stop_handle();
        assert!(!manager.stop.is_stopped());
        handle.stop();
        assert!(manager.stop.is_stopped());
    }
}

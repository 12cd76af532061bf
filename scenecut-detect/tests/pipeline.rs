use image::{Rgb, RgbImage};
use scenecut_core::Timecode;
use scenecut_detect::scene_manager::MAX_FRAME_QUEUE_LENGTH;
use scenecut_detect::{
    ContentDetector, DetectorConfig, Error, FilterMode, FrameSource, Result, SceneManager,
    StopHandle,
};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

const FPS: f64 = 30.0;

/// In-memory frame source: grey frames whose level is chosen per index
struct SyntheticSource {
    width: u32,
    height: u32,
    len: u64,
    level: fn(u64) -> u8,
    next: u64,
    fail_at: Option<u64>,
    stop_at: Option<(u64, StopHandle)>,
    resize_at: Option<(u64, u32)>,
}

impl SyntheticSource {
    fn new(len: u64, level: fn(u64) -> u8) -> Self {
        Self {
            width: 64,
            height: 36,
            len,
            level,
            next: 0,
            fail_at: None,
            stop_at: None,
            resize_at: None,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_count(&self) -> u64 {
        self.len
    }

    fn frame_rate(&self) -> f64 {
        FPS
    }

    fn base_timecode(&self) -> Timecode {
        Timecode::from_frames(0, FPS).unwrap()
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>> {
        if let Some((at, handle)) = &self.stop_at {
            if self.next == *at {
                handle.stop();
            }
        }
        if let Some((at, width)) = self.resize_at {
            if self.next == at {
                self.width = width;
            }
        }
        if self.fail_at == Some(self.next) {
            return Err(Error::InvalidVideo);
        }
        if self.next >= self.len {
            return Ok(None);
        }
        let value = (self.level)(self.next);
        self.next += 1;
        Ok(Some(RgbImage::from_pixel(
            self.width,
            self.height,
            Rgb([value, value, value]),
        )))
    }

    fn position(&self) -> Timecode {
        Timecode::from_frames(self.next.saturating_sub(1) as i64, FPS).unwrap()
    }
}

fn jump_at_ten(frame: u64) -> u8 {
    if frame < 10 {
        30
    } else {
        220
    }
}

fn manager(min_scene_len: u64) -> SceneManager {
    let config = DetectorConfig {
        min_scene_len,
        ..DetectorConfig::default()
    };
    SceneManager::new(ContentDetector::new(&config))
}

fn bounds(manager: &SceneManager, start_in_scene: bool) -> Vec<(u64, u64)> {
    manager
        .get_scene_list(start_in_scene)
        .iter()
        .map(|s| (s.start.frame_num(), s.end.frame_num()))
        .collect()
}

#[test]
fn test_single_hard_cut_splits_two_scenes() {
    let mut source = SyntheticSource::new(40, jump_at_ten);
    let mut manager = manager(5);

    let processed = manager.detect_scenes(&mut source).unwrap();

    assert_eq!(processed, 40);
    let cuts: Vec<u64> = manager.get_cut_list().iter().map(|c| c.frame_num()).collect();
    assert_eq!(cuts, vec![10]);
    assert_eq!(bounds(&manager, false), vec![(0, 10), (10, 40)]);
}

#[test]
fn test_no_cuts_follows_start_in_scene() {
    let mut source = SyntheticSource::new(20, |_| 128);
    let mut manager = manager(5);
    manager.detect_scenes(&mut source).unwrap();

    assert!(manager.get_cut_list().is_empty());
    assert!(manager.get_scene_list(false).is_empty());
    assert_eq!(bounds(&manager, true), vec![(0, 20)]);
}

#[test]
fn test_flash_is_merged_away() {
    // One bright frame at 3 followed by a return to the old level
    let mut source = SyntheticSource::new(60, |f| if f == 3 { 250 } else { 20 });
    let mut manager = manager(10);
    manager.detect_scenes(&mut source).unwrap();

    assert!(manager.get_cut_list().is_empty());
}

#[test]
fn test_downscaling_keeps_original_frame_indices() {
    let mut source = SyntheticSource::new(40, jump_at_ten);
    source.width = 1024;
    source.height = 64;
    let mut manager = manager(5);
    manager.detect_scenes(&mut source).unwrap();

    assert_eq!(manager.frame_size(), Some((1024, 64)));
    assert_eq!(bounds(&manager, false), vec![(0, 10), (10, 40)]);
}

#[test]
fn test_stop_keeps_accumulated_cuts() {
    let mut manager = manager(5);
    let mut source = SyntheticSource::new(10_000, jump_at_ten);
    source.stop_at = Some((25, manager.stop_handle()));

    let processed = manager.detect_scenes(&mut source).unwrap();

    // Frames 0..=24 were queued before the stop, so the scorer saw at least
    // all but the queued ones and the one it was holding
    assert!((20..=25).contains(&processed), "processed {processed}");
    assert_eq!(source.next, 26);
    let cuts: Vec<u64> = manager.get_cut_list().iter().map(|c| c.frame_num()).collect();
    assert_eq!(cuts, vec![10]);
}

#[test]
fn test_decode_failure_ends_stream() {
    let mut source = SyntheticSource::new(40, jump_at_ten);
    source.fail_at = Some(15);
    let mut manager = manager(5);

    let processed = manager.detect_scenes(&mut source).unwrap();

    assert_eq!(processed, 15);
    assert_eq!(bounds(&manager, false), vec![(0, 10), (10, 15)]);
}

#[test]
fn test_suppress_mode_error_does_not_deadlock() {
    let config = DetectorConfig {
        filter_mode: FilterMode::Suppress,
        ..DetectorConfig::default()
    };
    let mut manager = SceneManager::new(ContentDetector::new(&config));
    let mut source = SyntheticSource::new(1_000, jump_at_ten);

    let result = manager.detect_scenes(&mut source);

    assert!(matches!(result, Err(Error::NotImplemented(_))));
    assert!(source.next < 1_000);
}

#[test]
fn test_clear_resets_state() {
    let mut source = SyntheticSource::new(40, jump_at_ten);
    let mut manager = manager(5);
    manager.detect_scenes(&mut source).unwrap();
    assert!(!manager.get_cut_list().is_empty());

    manager.clear();
    assert!(manager.get_cut_list().is_empty());
    assert!(manager.get_scene_list(true).is_empty());

    // A second run starts from a fresh scorer
    let mut source = SyntheticSource::new(40, jump_at_ten);
    manager.detect_scenes(&mut source).unwrap();
    assert_eq!(bounds(&manager, false), vec![(0, 10), (10, 40)]);
}

#[test]
fn test_decoder_lead_is_bounded_by_queue() {
    for stop_at in [5, 25, 200] {
        let mut manager = manager(5);
        let mut source = SyntheticSource::new(10_000, jump_at_ten);
        source.stop_at = Some((stop_at, manager.stop_handle()));

        let processed = manager.detect_scenes(&mut source).unwrap();

        // Queued frames plus one held by each thread
        let lead = source.next - processed;
        assert!(
            lead <= MAX_FRAME_QUEUE_LENGTH as u64 + 2,
            "decoder ran {lead} frames ahead of the scorer"
        );
    }
}

#[test]
fn test_scorer_panic_unwinds_instead_of_hanging() {
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);

    thread::spawn(move || {
        // Frame size changes mid-stream, which the scorer rejects with a panic
        let mut source = SyntheticSource::new(1_000, |_| 100);
        source.resize_at = Some((10, 32));
        let mut manager = manager(5);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            manager.detect_scenes(&mut source)
        }));
        let _ = done_tx.send(outcome.is_err());
    });

    let panicked = done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("detect_scenes did not return after the scorer panicked");
    assert!(panicked);
}

use image::RgbImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{DetectorFactory, HolisticConfig, HolisticDetector, HolisticLandmarks};
use crate::core::landmark::{Landmark, HAND_LANDMARKS, POSE_LANDMARKS};
use crate::core::video::ExtractError;

/// 某一帧哪些区域被"检测到"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionPresence {
    pub pose: bool,
    pub left_hand: bool,
    pub right_hand: bool,
}

impl RegionPresence {
    pub const ALL: RegionPresence = RegionPresence {
        pose: true,
        left_hand: true,
        right_hand: true,
    };

    pub const NONE: RegionPresence = RegionPresence {
        pose: false,
        left_hand: false,
        right_hand: false,
    };
}

type PresencePattern = Arc<dyn Fn(u64) -> RegionPresence + Send + Sync>;

/// Counts detector instances, so tests can check every one was released.
#[derive(Debug, Default)]
pub struct DetectorStats {
    created: AtomicUsize,
    released: AtomicUsize,
}

impl DetectorStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// 按帧序号返回预设结果的检测器
pub struct MockHolisticDetector {
    pattern: PresencePattern,
    fail_at: Option<u64>,
    frames_seen: u64,
    stats: Arc<DetectorStats>,
}

impl MockHolisticDetector {
    fn landmarks(count: usize, frame: u64, region: f64) -> Vec<Landmark> {
        (0..count)
            .map(|i| {
                Landmark::new(
                    0.01 * (i + 1) as f64,
                    region + 0.001 * frame as f64,
                    -0.05,
                )
            })
            .collect()
    }
}

impl HolisticDetector for MockHolisticDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<HolisticLandmarks, ExtractError> {
        let frame = self.frames_seen;
        self.frames_seen += 1;

        if self.fail_at == Some(frame) {
            return Err(ExtractError::Detector(format!("mock detector failure at frame {}", frame)));
        }

        let presence = (self.pattern)(frame);
        Ok(HolisticLandmarks {
            pose: presence
                .pose
                .then(|| Self::landmarks(POSE_LANDMARKS, frame, 0.3)),
            left_hand: presence
                .left_hand
                .then(|| Self::landmarks(HAND_LANDMARKS, frame, 0.6)),
            right_hand: presence
                .right_hand
                .then(|| Self::landmarks(HAND_LANDMARKS, frame, 0.9)),
        })
    }
}

impl Drop for MockHolisticDetector {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockDetectorFactory {
    pattern: PresencePattern,
    fail_at: Option<u64>,
    stats: Arc<DetectorStats>,
}

impl MockDetectorFactory {
    /// Every region detected on every frame.
    pub fn new() -> Self {
        Self::with_pattern(|_| RegionPresence::ALL)
    }

    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> RegionPresence + Send + Sync + 'static,
    {
        Self {
            pattern: Arc::new(pattern),
            fail_at: None,
            stats: Arc::new(DetectorStats::default()),
        }
    }

    /// Detectors created by this factory fail on the given frame index.
    pub fn failing_at(mut self, frame: u64) -> Self {
        self.fail_at = Some(frame);
        self
    }

    pub fn stats(&self) -> Arc<DetectorStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for MockDetectorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorFactory for MockDetectorFactory {
    fn create(&self, _config: &HolisticConfig) -> Result<Box<dyn HolisticDetector>, ExtractError> {
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockHolisticDetector {
            pattern: Arc::clone(&self.pattern),
            fail_at: self.fail_at,
            frames_seen: 0,
            stats: Arc::clone(&self.stats),
        }))
    }
}

use log::{debug, info};
use std::path::Path;

use super::error::ExtractError;
use super::source::VideoOpener;
use crate::core::detector::{DetectorFactory, HolisticConfig};
use crate::core::landmark::VideoLandmarkSequence;

/// 单个视频的关键点提取
///
/// 每次 `extract` 打开一个新的帧源和一个新的检测器实例，两者都在函数返回前
/// 随作用域释放（成功、解码失败、检测失败都一样）。
pub struct VideoLandmarkExtractor<'a> {
    opener: &'a dyn VideoOpener,
    detectors: &'a dyn DetectorFactory,
    config: &'a HolisticConfig,
}

impl<'a> VideoLandmarkExtractor<'a> {
    pub fn new(
        opener: &'a dyn VideoOpener,
        detectors: &'a dyn DetectorFactory,
        config: &'a HolisticConfig,
    ) -> Self {
        Self {
            opener,
            detectors,
            config,
        }
    }

    pub fn extract(&self, video_path: &Path) -> Result<VideoLandmarkSequence, ExtractError> {
        // 先打开视频，打不开就不创建检测器
        let mut source = self.opener.open(video_path)?;
        let mut detector = self.detectors.create(self.config)?;
        let mut sequence = VideoLandmarkSequence::new();

        while let Some(frame) = source.read_frame()? {
            let image = frame.to_rgb()?;
            let landmarks = detector.detect(&image)?;
            sequence.push(landmarks.to_feature_vector());
        }

        debug!(
            "🎬 {}: {} frames extracted",
            video_path.display(),
            sequence.len()
        );
        if sequence.is_empty() {
            info!("⚠️ {}: no readable frames", video_path.display());
        }

        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detector::{MockDetectorFactory, RegionPresence};
    use crate::core::landmark::{FEATURE_LEN, LEFT_HAND_OFFSET, RIGHT_HAND_OFFSET};
    use crate::core::video::{MockVideo, MockVideoOpener};

    #[test]
    fn test_sequence_length_matches_frames() {
        let opener = MockVideoOpener::new(MockVideo::Frames(10));
        let detectors = MockDetectorFactory::new();
        let config = HolisticConfig::default();
        let extractor = VideoLandmarkExtractor::new(&opener, &detectors, &config);

        let sequence = extractor.extract(Path::new("catA/001.mp4")).unwrap();

        assert_eq!(sequence.len(), 10);
        assert!(sequence
            .frames()
            .iter()
            .all(|f| f.as_slice().len() == FEATURE_LEN && f.as_slice().iter().all(|&v| v != 0.0)));
    }

    #[test]
    fn test_empty_video_yields_empty_sequence() {
        let opener = MockVideoOpener::new(MockVideo::Frames(0));
        let detectors = MockDetectorFactory::new();
        let config = HolisticConfig::default();
        let extractor = VideoLandmarkExtractor::new(&opener, &detectors, &config);

        let sequence = extractor.extract(Path::new("empty.mp4")).unwrap();
        assert!(sequence.is_empty());
        assert_eq!(detectors.stats().released(), 1);
    }

    #[test]
    fn test_missing_hands_are_zero_filled() {
        let opener = MockVideoOpener::new(MockVideo::Frames(4));
        let detectors = MockDetectorFactory::with_pattern(|n| RegionPresence {
            pose: true,
            left_hand: n % 2 == 0,
            right_hand: false,
        });
        let config = HolisticConfig::default();
        let extractor = VideoLandmarkExtractor::new(&opener, &detectors, &config);

        let sequence = extractor.extract(Path::new("clip.mov")).unwrap();
        let frames = sequence.frames();

        assert_eq!(frames.len(), 4);
        assert!(frames[0].left_hand().iter().all(|&v| v != 0.0));
        assert!(frames[1].left_hand().iter().all(|&v| v == 0.0));
        for frame in frames {
            assert!(frame.pose().iter().all(|&v| v != 0.0));
            assert!(frame.as_slice()[RIGHT_HAND_OFFSET..].iter().all(|&v| v == 0.0));
            assert_eq!(frame.pose().len(), LEFT_HAND_OFFSET);
        }
    }

    #[test]
    fn test_open_failure_creates_no_detector() {
        let opener = MockVideoOpener::new(MockVideo::Unopenable);
        let detectors = MockDetectorFactory::new();
        let config = HolisticConfig::default();
        let extractor = VideoLandmarkExtractor::new(&opener, &detectors, &config);

        let result = extractor.extract(Path::new("broken.avi"));

        assert!(matches!(result, Err(ExtractError::VideoOpen { .. })));
        assert_eq!(detectors.stats().created(), 0);
    }

    #[test]
    fn test_decode_failure_releases_detector() {
        let opener = MockVideoOpener::new(MockVideo::FailAfter(3));
        let detectors = MockDetectorFactory::new();
        let config = HolisticConfig::default();
        let extractor = VideoLandmarkExtractor::new(&opener, &detectors, &config);

        let result = extractor.extract(Path::new("cut.mts"));

        assert!(matches!(result, Err(ExtractError::Decode { frame_index: 3, .. })));
        let stats = detectors.stats();
        assert_eq!(stats.created(), 1);
        assert_eq!(stats.released(), 1);
    }

    #[test]
    fn test_detector_failure_aborts_video() {
        let opener = MockVideoOpener::new(MockVideo::Frames(5));
        let detectors = MockDetectorFactory::new().failing_at(2);
        let config = HolisticConfig::default();
        let extractor = VideoLandmarkExtractor::new(&opener, &detectors, &config);

        assert!(matches!(
            extractor.extract(Path::new("x.mp4")),
            Err(ExtractError::Detector(_))
        ));
        assert_eq!(detectors.stats().released(), 1);
    }

    #[test]
    fn test_detector_not_reused_across_videos() {
        let opener = MockVideoOpener::new(MockVideo::Frames(2));
        let detectors = MockDetectorFactory::new();
        let config = HolisticConfig::default();
        let extractor = VideoLandmarkExtractor::new(&opener, &detectors, &config);

        extractor.extract(Path::new("a.mp4")).unwrap();
        extractor.extract(Path::new("b.mp4")).unwrap();

        let stats = detectors.stats();
        assert_eq!(stats.created(), 2);
        assert_eq!(stats.released(), 2);
    }
}

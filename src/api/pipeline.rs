//! 关键点批处理入口

use log::info;

use crate::config::{ConfigError, PipelineConfig};
use crate::core::batch::{BatchError, BatchReport, BatchTraversal};
use crate::core::detector::{DetectorFactory, SidecarDetectorFactory};
use crate::core::video::{FfmpegOpener, VideoOpener};

/// 批处理管线 - 配置 + 解码器 + 检测器
///
/// ```no_run
/// use sign_landmarks::api::LandmarkPipeline;
/// use sign_landmarks::config::PipelineConfig;
///
/// let config = PipelineConfig::from_file("pipeline.json5".as_ref())?;
/// let report = LandmarkPipeline::create(config)?.run()?;
/// println!("{} processed", report.processed);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct LandmarkPipeline {
    config: PipelineConfig,
    opener: Box<dyn VideoOpener>,
    detectors: Box<dyn DetectorFactory>,
}

impl LandmarkPipeline {
    /// ffmpeg 解码 + sidecar 检测器
    pub fn create(config: PipelineConfig) -> Result<Self, ConfigError> {
        let opener = FfmpegOpener::new(&config.decoder.ffmpeg, &config.decoder.ffprobe);
        let detectors =
            SidecarDetectorFactory::new(&config.sidecar.program, config.sidecar.args.clone());
        Self::with_backends(config, Box::new(opener), Box::new(detectors))
    }

    /// Same pipeline with caller-supplied decoder and detector backends.
    pub fn with_backends(
        config: PipelineConfig,
        opener: Box<dyn VideoOpener>,
        detectors: Box<dyn DetectorFactory>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "🎬 LandmarkPipeline: created (root {}, output {}, workers {})",
            config.root_folder.display(),
            config.output_folder.display(),
            config.workers
        );
        Ok(Self {
            config,
            opener,
            detectors,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<BatchReport, BatchError> {
        BatchTraversal::new(self.opener.as_ref(), self.detectors.as_ref())
            .with_detector_config(self.config.detector.clone())
            .with_workers(self.config.workers)
            .run(
                &self.config.root_folder,
                &self.config.output_folder,
                &self.config.ledger_path,
            )
    }
}

impl Drop for LandmarkPipeline {
    fn drop(&mut self) {
        info!("🗑️ LandmarkPipeline: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detector::MockDetectorFactory;
    use crate::core::video::{MockVideo, MockVideoOpener};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_create_rejects_invalid_config() {
        assert!(matches!(
            LandmarkPipeline::create(PipelineConfig::default()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_run_with_mock_backends() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("videos");
        fs::create_dir_all(root.join("hello")).unwrap();
        fs::write(root.join("hello/word_12.mp4"), b"").unwrap();

        let config = PipelineConfig {
            root_folder: root,
            output_folder: dir.path().join("npy"),
            ledger_path: dir.path().join("labels.csv"),
            ..Default::default()
        };

        let pipeline = LandmarkPipeline::with_backends(
            config,
            Box::new(MockVideoOpener::new(MockVideo::Frames(3))),
            Box::new(MockDetectorFactory::new()),
        )
        .unwrap();

        let report = pipeline.run().unwrap();
        assert_eq!(report.processed, 1);
        assert!(dir.path().join("npy/word_12.npy").is_file());
        assert_eq!(pipeline.config().ledger_path, dir.path().join("labels.csv"));
    }
}

//! 运行配置：JSON5 文件 + 命令行覆盖

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::detector::HolisticConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// ffmpeg / ffprobe 可执行文件位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Command line of the holistic detector sidecar. Detector flags are appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python3"),
            args: vec!["scripts/holistic_sidecar.py".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// `root/<category>/<video>` input tree.
    pub root_folder: PathBuf,
    pub output_folder: PathBuf,
    pub ledger_path: PathBuf,
    /// 1 = sequential, 0 = one worker per CPU.
    pub workers: usize,
    pub detector: HolisticConfig,
    pub decoder: DecoderConfig,
    pub sidecar: SidecarConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root_folder: PathBuf::new(),
            output_folder: PathBuf::from("processed/npy"),
            ledger_path: PathBuf::from("processed/labels.csv"),
            workers: 1,
            detector: HolisticConfig::default(),
            decoder: DecoderConfig::default(),
            sidecar: SidecarConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json5_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        json5::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json5_str(&text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_folder.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("root_folder is required".to_string()));
        }
        if self.output_folder.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_folder must not be empty".to_string()));
        }
        if self.ledger_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("ledger_path must not be empty".to_string()));
        }
        check_unit("min_detection_confidence", self.detector.min_detection_confidence)?;
        check_unit("min_tracking_confidence", self.detector.min_tracking_confidence)?;
        Ok(())
    }
}

fn check_unit(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detector::ModelComplexity;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_folder, PathBuf::from("processed/npy"));
        assert_eq!(config.ledger_path, PathBuf::from("processed/labels.csv"));
        assert_eq!(config.workers, 1);
        assert_eq!(config.detector, HolisticConfig::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_json5_partial() {
        let text = r#"{
            // 手语视频目录
            root_folder: "/data/sign-videos",
            workers: 4,
            detector: { model_complexity: 2, min_tracking_confidence: 0.7 },
        }"#;

        let config = PipelineConfig::from_json5_str(text, Path::new("test.json5")).unwrap();

        assert_eq!(config.root_folder, PathBuf::from("/data/sign-videos"));
        assert_eq!(config.workers, 4);
        assert_eq!(config.detector.model_complexity, ModelComplexity::Heavy);
        assert_eq!(config.detector.min_tracking_confidence, 0.7);
        assert_eq!(config.detector.min_detection_confidence, 0.5);
        assert_eq!(config.output_folder, PathBuf::from("processed/npy"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = PipelineConfig {
            root_folder: PathBuf::from("videos"),
            ..Default::default()
        };
        config.detector.min_detection_confidence = 1.5;

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = PipelineConfig::from_json5_str("{ workers: ", Path::new("bad.json5")).unwrap_err();
        assert!(err.to_string().contains("bad.json5"));
    }
}

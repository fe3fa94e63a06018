//! Holistic 检测器抽象 - 一帧 RGB 图像 → pose / 左手 / 右手关键点

pub mod mock;
pub mod sidecar;

pub use mock::{DetectorStats, MockDetectorFactory, MockHolisticDetector, RegionPresence};
pub use sidecar::{SidecarDetector, SidecarDetectorFactory};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::core::landmark::{vectorize, FrameFeatureVector, Landmark};
use crate::core::video::ExtractError;

/// 模型精度档位（对应 MediaPipe model_complexity 0/1/2）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ModelComplexity {
    Lite,
    Full,
    Heavy,
}

impl ModelComplexity {
    pub fn as_u8(self) -> u8 {
        match self {
            ModelComplexity::Lite => 0,
            ModelComplexity::Full => 1,
            ModelComplexity::Heavy => 2,
        }
    }
}

impl TryFrom<u8> for ModelComplexity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ModelComplexity::Lite),
            1 => Ok(ModelComplexity::Full),
            2 => Ok(ModelComplexity::Heavy),
            other => Err(format!("model_complexity must be 0, 1 or 2, got {}", other)),
        }
    }
}

impl From<ModelComplexity> for u8 {
    fn from(value: ModelComplexity) -> Self {
        value.as_u8()
    }
}

/// Detector settings, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolisticConfig {
    /// `false` keeps temporal tracking between consecutive frames.
    pub static_image_mode: bool,
    pub model_complexity: ModelComplexity,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for HolisticConfig {
    fn default() -> Self {
        Self {
            static_image_mode: false,
            model_complexity: ModelComplexity::Full,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// 一帧的检测结果，未检测到的区域为 None
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolisticLandmarks {
    pub pose: Option<Vec<Landmark>>,
    pub left_hand: Option<Vec<Landmark>>,
    pub right_hand: Option<Vec<Landmark>>,
}

impl HolisticLandmarks {
    pub fn to_feature_vector(&self) -> FrameFeatureVector {
        vectorize(
            self.pose.as_deref(),
            self.left_hand.as_deref(),
            self.right_hand.as_deref(),
        )
    }
}

/// 检测器实例。带时序跟踪状态，只服务一个视频，Drop 时释放资源。
pub trait HolisticDetector: Send {
    fn detect(&mut self, image: &RgbImage) -> Result<HolisticLandmarks, ExtractError>;
}

/// Creates one fresh detector instance per video.
pub trait DetectorFactory: Send + Sync {
    fn create(&self, config: &HolisticConfig) -> Result<Box<dyn HolisticDetector>, ExtractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HolisticConfig::default();
        assert!(!config.static_image_mode);
        assert_eq!(config.model_complexity, ModelComplexity::Full);
        assert_eq!(config.min_detection_confidence, 0.5);
        assert_eq!(config.min_tracking_confidence, 0.5);
    }

    #[test]
    fn test_model_complexity_from_number() {
        let config: HolisticConfig =
            serde_json::from_str(r#"{"model_complexity": 2, "static_image_mode": true}"#).unwrap();
        assert_eq!(config.model_complexity, ModelComplexity::Heavy);
        assert!(config.static_image_mode);
        assert_eq!(config.min_tracking_confidence, 0.5);

        assert!(serde_json::from_str::<HolisticConfig>(r#"{"model_complexity": 3}"#).is_err());
    }
}

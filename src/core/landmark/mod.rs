//! 关键点向量化 - 姿态 33 点 + 左右手各 21 点，每帧固定 225 维

pub mod sequence;
pub mod vectorizer;

pub use sequence::VideoLandmarkSequence;
pub use vectorizer::{
    vectorize, FrameFeatureVector, Landmark, FEATURE_LEN, HAND_LANDMARKS, LEFT_HAND_OFFSET,
    POSE_LANDMARKS, RIGHT_HAND_OFFSET,
};

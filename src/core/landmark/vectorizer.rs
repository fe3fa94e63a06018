use serde::{Deserialize, Serialize};

/// MediaPipe Pose 关键点数量
pub const POSE_LANDMARKS: usize = 33;
/// 单手关键点数量
pub const HAND_LANDMARKS: usize = 21;

const COORDS: usize = 3;

pub const LEFT_HAND_OFFSET: usize = POSE_LANDMARKS * COORDS;
pub const RIGHT_HAND_OFFSET: usize = LEFT_HAND_OFFSET + HAND_LANDMARKS * COORDS;
/// 每帧特征向量长度：(33 + 21 + 21) × 3 = 225
pub const FEATURE_LEN: usize = RIGHT_HAND_OFFSET + HAND_LANDMARKS * COORDS;

/// A single 3D landmark (normalized coordinates, z is relative depth).
///
/// Deserializes from either `{"x":..,"y":..,"z":..}` or a `[x, y, z]` triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 一帧的特征向量，布局固定：
/// `[0,99)` pose，`[99,162)` 左手，`[162,225)` 右手，每个点依次 x,y,z
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatureVector {
    values: [f64; FEATURE_LEN],
}

impl FrameFeatureVector {
    pub fn zeros() -> Self {
        Self {
            values: [0.0; FEATURE_LEN],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn pose(&self) -> &[f64] {
        &self.values[..LEFT_HAND_OFFSET]
    }

    pub fn left_hand(&self) -> &[f64] {
        &self.values[LEFT_HAND_OFFSET..RIGHT_HAND_OFFSET]
    }

    pub fn right_hand(&self) -> &[f64] {
        &self.values[RIGHT_HAND_OFFSET..]
    }

    pub fn len(&self) -> usize {
        FEATURE_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for FrameFeatureVector {
    fn default() -> Self {
        Self::zeros()
    }
}

/// 把一帧的检测结果展平成 225 维向量
///
/// 缺失的区域整段填 0。坐标原样写入，不做裁剪或范围检查。
/// 区域内点数超出预期的部分被忽略，不足的部分保持 0，保证宽度恒定。
pub fn vectorize(
    pose: Option<&[Landmark]>,
    left_hand: Option<&[Landmark]>,
    right_hand: Option<&[Landmark]>,
) -> FrameFeatureVector {
    let mut vector = FrameFeatureVector::zeros();

    write_region(&mut vector.values[..LEFT_HAND_OFFSET], pose);
    write_region(
        &mut vector.values[LEFT_HAND_OFFSET..RIGHT_HAND_OFFSET],
        left_hand,
    );
    write_region(&mut vector.values[RIGHT_HAND_OFFSET..], right_hand);

    vector
}

fn write_region(span: &mut [f64], landmarks: Option<&[Landmark]>) {
    let Some(landmarks) = landmarks else {
        return;
    };

    for (slot, lm) in span.chunks_exact_mut(COORDS).zip(landmarks) {
        slot[0] = lm.x;
        slot[1] = lm.y;
        slot[2] = lm.z;
    }
}

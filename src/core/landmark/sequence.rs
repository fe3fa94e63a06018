use ndarray::Array2;

use super::vectorizer::{FrameFeatureVector, FEATURE_LEN};

/// 单个视频的逐帧特征序列，按播放顺序排列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoLandmarkSequence {
    frames: Vec<FrameFeatureVector>,
}

impl VideoLandmarkSequence {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: FrameFeatureVector) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FrameFeatureVector] {
        &self.frames
    }

    /// `(num_frames, 225)` row-major array, ready for `.npy` output.
    /// An empty sequence yields shape `(0, 225)`.
    pub fn to_array(&self) -> Array2<f64> {
        let mut array = Array2::<f64>::zeros((self.frames.len(), FEATURE_LEN));
        for (mut row, frame) in array.rows_mut().into_iter().zip(&self.frames) {
            row.assign(&ndarray::ArrayView1::from(frame.as_slice()));
        }
        array
    }
}

impl FromIterator<FrameFeatureVector> for VideoLandmarkSequence {
    fn from_iter<I: IntoIterator<Item = FrameFeatureVector>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

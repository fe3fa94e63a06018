use image::RgbImage;

use super::error::ExtractError;

/// 解码器输出的一帧，BGR24 排列（与 OpenCV / ffmpeg bgr24 一致）
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // BGR 格式
    pub frame_number: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, frame_number: u64) -> Self {
        Self {
            width,
            height,
            data,
            frame_number,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Expected byte length of a BGR24 frame with these dimensions.
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }

    /// 转换成检测器需要的 RGB 排列
    pub fn to_rgb(&self) -> Result<RgbImage, ExtractError> {
        if self.data.len() != Self::expected_len(self.width, self.height) {
            return Err(ExtractError::Decode {
                frame_index: self.frame_number,
                reason: format!(
                    "frame buffer has {} bytes, expected {} for {}x{} bgr24",
                    self.data.len(),
                    Self::expected_len(self.width, self.height),
                    self.width,
                    self.height
                ),
            });
        }

        let mut rgb = Vec::with_capacity(self.data.len());
        for chunk in self.data.chunks_exact(3) {
            rgb.push(chunk[2]); // R
            rgb.push(chunk[1]); // G
            rgb.push(chunk[0]); // B
        }

        RgbImage::from_raw(self.width, self.height, rgb).ok_or_else(|| ExtractError::Decode {
            frame_index: self.frame_number,
            reason: "frame buffer does not fit image dimensions".to_string(),
        })
    }
}

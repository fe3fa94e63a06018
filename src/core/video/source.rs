use std::path::Path;

use super::error::ExtractError;
use super::frame::Frame;

/// 打开后的视频帧源。资源在 Drop 时释放。
pub trait VideoSource: Send {
    /// Next decoded frame in playback order.
    ///
    /// `Ok(None)` is the normal end of stream; an `Err` is a mid-stream
    /// failure and ends the video.
    fn read_frame(&mut self) -> Result<Option<Frame>, ExtractError>;
}

/// 视频解码器入口，每个视频打开一个独立的 [`VideoSource`]
pub trait VideoOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, ExtractError>;
}

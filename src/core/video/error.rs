use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open video {path}: {reason}")]
    VideoOpen { path: PathBuf, reason: String },
    #[error("decode failed at frame {frame_index}: {reason}")]
    Decode { frame_index: u64, reason: String },
    #[error("detector error: {0}")]
    Detector(String),
}

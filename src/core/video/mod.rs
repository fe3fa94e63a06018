pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod frame;
pub mod mock;
pub mod source;

pub use error::ExtractError;
pub use extractor::VideoLandmarkExtractor;
pub use ffmpeg::FfmpegOpener;
pub use frame::Frame;
pub use mock::{MockVideo, MockVideoOpener};
pub use source::{VideoOpener, VideoSource};

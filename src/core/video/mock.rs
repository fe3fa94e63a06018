use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::error::ExtractError;
use super::frame::Frame;
use super::source::{VideoOpener, VideoSource};

const MOCK_WIDTH: u32 = 4;
const MOCK_HEIGHT: u32 = 4;

/// 模拟视频的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockVideo {
    /// Opens and yields this many frames, then ends normally.
    Frames(u64),
    /// Fails to open.
    Unopenable,
    /// Yields this many frames, then fails mid-stream.
    FailAfter(u64),
}

/// 按文件名返回预设行为的解码器，用于测试和降级场景
pub struct MockVideoOpener {
    default: MockVideo,
    videos: HashMap<String, MockVideo>,
    opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockVideoOpener {
    pub fn new(default: MockVideo) -> Self {
        Self {
            default,
            videos: HashMap::new(),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the behavior of the video whose file name is `file_name`.
    pub fn with_video(mut self, file_name: impl Into<String>, video: MockVideo) -> Self {
        self.videos.insert(file_name.into(), video);
        self
    }

    /// Every path passed to `open`, in call order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().map(|paths| paths.clone()).unwrap_or_default()
    }

    fn behavior_for(&self, path: &Path) -> MockVideo {
        path.file_name()
            .and_then(|name| self.videos.get(name.to_string_lossy().as_ref()))
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for MockVideoOpener {
    fn default() -> Self {
        Self::new(MockVideo::Frames(1))
    }
}

impl VideoOpener for MockVideoOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, ExtractError> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(path.to_path_buf());
        }

        let (frames, fail_at_end) = match self.behavior_for(path) {
            MockVideo::Unopenable => {
                return Err(ExtractError::VideoOpen {
                    path: path.to_path_buf(),
                    reason: "mock video is unopenable".to_string(),
                })
            }
            MockVideo::Frames(n) => (n, false),
            MockVideo::FailAfter(n) => (n, true),
        };

        Ok(Box::new(MockVideoSource {
            remaining: frames,
            fail_at_end,
            next_index: 0,
        }))
    }
}

struct MockVideoSource {
    remaining: u64,
    fail_at_end: bool,
    next_index: u64,
}

impl VideoSource for MockVideoSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, ExtractError> {
        if self.remaining == 0 {
            if self.fail_at_end {
                return Err(ExtractError::Decode {
                    frame_index: self.next_index,
                    reason: "mock decode failure".to_string(),
                });
            }
            return Ok(None);
        }

        self.remaining -= 1;
        let index = self.next_index;
        self.next_index += 1;

        let data = vec![(index % 256) as u8; Frame::expected_len(MOCK_WIDTH, MOCK_HEIGHT)];
        Ok(Some(Frame::new(MOCK_WIDTH, MOCK_HEIGHT, data, index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut dyn VideoSource) -> Result<u64, ExtractError> {
        let mut count = 0;
        while source.read_frame()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    #[test]
    fn test_scripted_frames() {
        let opener = MockVideoOpener::new(MockVideo::Frames(3)).with_video("b.mp4", MockVideo::Frames(0));

        let mut a = opener.open(Path::new("cat/a.mp4")).unwrap();
        let mut b = opener.open(Path::new("cat/b.mp4")).unwrap();

        assert_eq!(drain(a.as_mut()).unwrap(), 3);
        assert_eq!(drain(b.as_mut()).unwrap(), 0);
        assert_eq!(opener.opened().len(), 2);
    }

    #[test]
    fn test_unopenable_and_failing() {
        let opener = MockVideoOpener::default()
            .with_video("bad.avi", MockVideo::Unopenable)
            .with_video("cut.mov", MockVideo::FailAfter(2));

        assert!(matches!(
            opener.open(Path::new("x/bad.avi")),
            Err(ExtractError::VideoOpen { .. })
        ));

        let mut cut = opener.open(Path::new("x/cut.mov")).unwrap();
        assert!(matches!(
            drain(cut.as_mut()),
            Err(ExtractError::Decode { frame_index: 2, .. })
        ));
    }
}

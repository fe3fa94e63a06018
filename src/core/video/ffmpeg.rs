//! ffprobe + ffmpeg 管道解码
//!
//! ffprobe 读取首个视频流的宽高，然后 ffmpeg 以 rawvideo/bgr24 输出到 stdout，
//! 每次读取 `width * height * 3` 字节为一帧。

use log::{debug, info};
use serde::Deserialize;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use super::error::ExtractError;
use super::frame::Frame;
use super::source::{VideoOpener, VideoSource};

/// Keep the tail of ffmpeg's stderr in error messages short.
const STDERR_TAIL_CHARS: usize = 400;

#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegOpener {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32), ExtractError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| open_error(path, format!("failed to run {}: {}", self.ffprobe.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(open_error(
                path,
                format!("ffprobe exited with {}: {}", output.status, tail(stderr.trim())),
            ));
        }

        parse_probe_dimensions(&String::from_utf8_lossy(&output.stdout))
            .map_err(|reason| open_error(path, reason))
    }
}

impl Default for FfmpegOpener {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl VideoOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, ExtractError> {
        let (width, height) = self.probe_dimensions(path)?;
        debug!("🎞️ {}: {}x{}", path.display(), width, height);

        let mut child = Command::new(&self.ffmpeg)
            .args(decode_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| open_error(path, format!("failed to run {}: {}", self.ffmpeg.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| open_error(path, "ffmpeg stdout not captured".to_string()))?;

        // stderr 单独线程读取，避免管道写满导致 ffmpeg 阻塞
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        Ok(Box::new(FfmpegSource {
            path: path.to_path_buf(),
            child,
            stdout,
            stderr_reader,
            width,
            height,
            frame_index: 0,
            finished: false,
        }))
    }
}

pub struct FfmpegSource {
    path: PathBuf,
    child: Child,
    stdout: ChildStdout,
    stderr_reader: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    frame_index: u64,
    finished: bool,
}

impl FfmpegSource {
    fn decode_error(&self, reason: String) -> ExtractError {
        ExtractError::Decode {
            frame_index: self.frame_index,
            reason,
        }
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr_reader
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }

    /// stdout 读完后确认 ffmpeg 正常退出
    fn finish(&mut self) -> Result<(), ExtractError> {
        self.finished = true;
        let status = self
            .child
            .wait()
            .map_err(|e| self.decode_error(format!("waiting for ffmpeg failed: {}", e)))?;
        let stderr = self.collect_stderr();

        if status.success() {
            Ok(())
        } else {
            Err(self.decode_error(format!(
                "ffmpeg exited with {}: {}",
                status,
                tail(stderr.trim())
            )))
        }
    }
}

impl VideoSource for FfmpegSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, ExtractError> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; Frame::expected_len(self.width, self.height)];
        let filled = read_full(&mut self.stdout, &mut buf)
            .map_err(|e| self.decode_error(format!("reading ffmpeg output failed: {}", e)))?;

        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }

        if filled < buf.len() {
            self.finish()?;
            return Err(self.decode_error(format!(
                "truncated frame: got {} of {} bytes",
                filled,
                buf.len()
            )));
        }

        let frame = Frame::new(self.width, self.height, buf, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
        let _ = self.collect_stderr();
        info!(
            "🗑️ FfmpegSource: released {} after {} frames",
            self.path.display(),
            self.frame_index
        );
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

fn parse_probe_dimensions(json: &str) -> Result<(u32, u32), String> {
    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| format!("unreadable ffprobe output: {}", e))?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| "no video stream".to_string())?;

    match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
        (w, h) => Err(format!("invalid video dimensions {:?}x{:?}", w, h)),
    }
}

/// ffmpeg 参数：每个解码帧原样输出一次（passthrough 不按帧率补帧或丢帧）
fn decode_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-noautorotate", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());
    args.extend(
        ["-fps_mode", "passthrough", "-f", "rawvideo", "-pix_fmt", "bgr24", "-"]
            .into_iter()
            .map(OsString::from),
    );
    args
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn open_error(path: &Path, reason: String) -> ExtractError {
    ExtractError::VideoOpen {
        path: path.to_path_buf(),
        reason,
    }
}

fn tail(text: &str) -> &str {
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text;
    }
    let skip = count - STDERR_TAIL_CHARS;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

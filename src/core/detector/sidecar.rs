//! 外部进程检测器（sidecar）
//!
//! 每个视频启动一个 sidecar 进程，逐帧通过 stdin/stdout 交换数据：
//!
//! * request: one JSON line `{"width":W,"height":H}` followed by `W*H*3` RGB bytes
//! * reply: one JSON line `{"pose":[[x,y,z],..]|null,"left_hand":..,"right_hand":..}`
//!   or `{"error":"..."}`
//!
//! 关闭 stdin 即通知 sidecar 退出。

use image::RgbImage;
use log::{debug, info, warn};
use serde::Deserialize;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::{DetectorFactory, HolisticConfig, HolisticDetector, HolisticLandmarks};
use crate::core::landmark::{Landmark, HAND_LANDMARKS, POSE_LANDMARKS};
use crate::core::video::ExtractError;

#[derive(Debug, Clone)]
pub struct SidecarDetectorFactory {
    program: PathBuf,
    args: Vec<String>,
}

impl SidecarDetectorFactory {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn config_args(config: &HolisticConfig) -> Vec<String> {
        let mut args = vec![
            "--model-complexity".to_string(),
            config.model_complexity.as_u8().to_string(),
            "--min-detection-confidence".to_string(),
            config.min_detection_confidence.to_string(),
            "--min-tracking-confidence".to_string(),
            config.min_tracking_confidence.to_string(),
        ];
        if config.static_image_mode {
            args.push("--static-image-mode".to_string());
        }
        args
    }
}

impl DetectorFactory for SidecarDetectorFactory {
    fn create(&self, config: &HolisticConfig) -> Result<Box<dyn HolisticDetector>, ExtractError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(Self::config_args(config))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                ExtractError::Detector(format!(
                    "failed to start sidecar {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExtractError::Detector("sidecar pipes not captured".to_string()));
            }
        };

        debug!("🔧 SidecarDetector: started {} (pid {})", self.program.display(), child.id());
        Ok(Box::new(SidecarDetector {
            child,
            stdin: Some(BufWriter::new(stdin)),
            stdout: BufReader::new(stdout),
            frames: 0,
        }))
    }
}

pub struct SidecarDetector {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    stdout: BufReader<ChildStdout>,
    frames: u64,
}

impl SidecarDetector {
    fn send_frame(&mut self, image: &RgbImage) -> std::io::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sidecar stdin closed")
        })?;
        writeln!(
            stdin,
            "{{\"width\":{},\"height\":{}}}",
            image.width(),
            image.height()
        )?;
        stdin.write_all(image.as_raw())?;
        stdin.flush()
    }
}

impl HolisticDetector for SidecarDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<HolisticLandmarks, ExtractError> {
        self.send_frame(image).map_err(|e| {
            ExtractError::Detector(format!("writing frame {} to sidecar failed: {}", self.frames, e))
        })?;

        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).map_err(|e| {
            ExtractError::Detector(format!("reading sidecar reply failed: {}", e))
        })?;
        if read == 0 {
            return Err(ExtractError::Detector(format!(
                "sidecar exited before answering frame {}",
                self.frames
            )));
        }

        self.frames += 1;
        parse_reply(&line)
    }
}

impl Drop for SidecarDetector {
    fn drop(&mut self) {
        // 先关 stdin，sidecar 读到 EOF 后自行退出
        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.flush();
        }
        match self.child.wait() {
            Ok(status) if !status.success() => {
                warn!("⚠️ SidecarDetector: sidecar exited with {}", status)
            }
            Err(e) => warn!("⚠️ SidecarDetector: wait failed: {}", e),
            _ => {}
        }
        info!("🗑️ SidecarDetector: released after {} frames", self.frames);
    }
}

#[derive(Debug, Deserialize)]
struct SidecarReply {
    #[serde(default)]
    pose: Option<Vec<Landmark>>,
    #[serde(default)]
    left_hand: Option<Vec<Landmark>>,
    #[serde(default)]
    right_hand: Option<Vec<Landmark>>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_reply(line: &str) -> Result<HolisticLandmarks, ExtractError> {
    let reply: SidecarReply = serde_json::from_str(line.trim())
        .map_err(|e| ExtractError::Detector(format!("invalid sidecar reply: {}", e)))?;

    if let Some(error) = reply.error {
        return Err(ExtractError::Detector(error));
    }

    Ok(HolisticLandmarks {
        pose: check_count("pose", reply.pose, POSE_LANDMARKS)?,
        left_hand: check_count("left_hand", reply.left_hand, HAND_LANDMARKS)?,
        right_hand: check_count("right_hand", reply.right_hand, HAND_LANDMARKS)?,
    })
}

fn check_count(
    region: &str,
    landmarks: Option<Vec<Landmark>>,
    expected: usize,
) -> Result<Option<Vec<Landmark>>, ExtractError> {
    match landmarks {
        Some(points) if points.len() != expected => Err(ExtractError::Detector(format!(
            "{} has {} landmarks, expected {}",
            region,
            points.len(),
            expected
        ))),
        other => Ok(other),
    }
}

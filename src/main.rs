use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use sign_landmarks::api::LandmarkPipeline;
use sign_landmarks::config::PipelineConfig;
use sign_landmarks::core::detector::ModelComplexity;

#[derive(Parser, Debug)]
#[command(
    name = "sign-extract",
    about = "Extract per-frame pose and hand landmarks from a sign-language video tree"
)]
struct Cli {
    /// JSON5 config file; flags below override its values.
    #[arg(long, env = "SIGN_EXTRACT_CONFIG")]
    config: Option<PathBuf>,

    /// Input tree laid out as <root>/<category>/<video>.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Folder receiving one <id>.npy per video (created if missing).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Label CSV appended at the end of the run.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Parallel videos; 1 = sequential, 0 = one per CPU.
    #[arg(long)]
    workers: Option<usize>,

    /// Run the detector per image, without temporal tracking.
    #[arg(long, default_value_t = false)]
    static_image_mode: bool,

    /// Holistic model variant: 0 (lite), 1 (full), 2 (heavy).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
    model_complexity: Option<u8>,

    #[arg(long)]
    min_detection_confidence: Option<f32>,

    #[arg(long)]
    min_tracking_confidence: Option<f32>,

    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    ffprobe: Option<PathBuf>,

    /// Detector sidecar executable.
    #[arg(long, value_name = "PATH")]
    sidecar: Option<PathBuf>,

    /// Argument passed to the sidecar before the detector flags (repeatable).
    #[arg(long = "sidecar-arg", value_name = "ARG", allow_hyphen_values = true)]
    sidecar_args: Vec<String>,

    /// Write the batch report as JSON to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<(PipelineConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(root) = self.root {
            config.root_folder = root;
        }
        if let Some(output) = self.output {
            config.output_folder = output;
        }
        if let Some(ledger) = self.ledger {
            config.ledger_path = ledger;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.static_image_mode {
            config.detector.static_image_mode = true;
        }
        if let Some(level) = self.model_complexity {
            config.detector.model_complexity =
                ModelComplexity::try_from(level).map_err(anyhow::Error::msg)?;
        }
        if let Some(value) = self.min_detection_confidence {
            config.detector.min_detection_confidence = value;
        }
        if let Some(value) = self.min_tracking_confidence {
            config.detector.min_tracking_confidence = value;
        }
        if let Some(ffmpeg) = self.ffmpeg {
            config.decoder.ffmpeg = ffmpeg;
        }
        if let Some(ffprobe) = self.ffprobe {
            config.decoder.ffprobe = ffprobe;
        }
        if let Some(sidecar) = self.sidecar {
            config.sidecar.program = sidecar;
        }
        if !self.sidecar_args.is_empty() {
            config.sidecar.args = self.sidecar_args;
        }

        Ok((config, self.report))
    }
}

fn main() -> Result<()> {
    sign_landmarks::init_logging();

    let (config, report_path) = Cli::parse().into_config()?;
    let pipeline = LandmarkPipeline::create(config).context("invalid pipeline configuration")?;
    let report = pipeline.run().context("batch run failed")?;

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!("📝 Report written to {}", path.display());
    }

    Ok(())
}

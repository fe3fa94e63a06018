use log::{error, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::artifact::ArtifactStore;
use super::discovery::{discover_videos, VideoAsset};
use super::error::{BatchError, VideoError};
use super::ledger::{LabelLedger, LabelRecord};
use crate::core::detector::{DetectorFactory, HolisticConfig};
use crate::core::video::{VideoLandmarkExtractor, VideoOpener};

/// 失败视频及其错误信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedVideo {
    pub path: PathBuf,
    pub error: String,
}

/// 一次批处理的结果统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    /// Videos whose artifact was already in the output folder.
    pub skipped_videos: Vec<PathBuf>,
    pub failed: usize,
    pub failures: Vec<FailedVideo>,
    /// Label records appended to the ledger by this run.
    pub labels: Vec<LabelRecord>,
}

/// 批处理遍历 `root/<category>/<video>`
///
/// 输出目录在开始时做一次快照，已存在 `<id>.npy` 的视频直接跳过；本次运行中新生成
/// 的产物不会影响后续视频的跳过判断。单个视频失败只记录，不中断批次；
/// 所有标签在最后一次性写入账本。
///
/// `workers > 1` 时待处理视频在 rayon 线程池上并行提取，每个任务各自创建检测器；
/// 结果按发现顺序收集，账本内容与顺序执行一致。`0` 表示使用全部 CPU。
pub struct BatchTraversal<'a> {
    opener: &'a dyn VideoOpener,
    detectors: &'a dyn DetectorFactory,
    detector_config: HolisticConfig,
    workers: usize,
}

impl<'a> BatchTraversal<'a> {
    pub fn new(opener: &'a dyn VideoOpener, detectors: &'a dyn DetectorFactory) -> Self {
        Self {
            opener,
            detectors,
            detector_config: HolisticConfig::default(),
            workers: 1,
        }
    }

    pub fn with_detector_config(mut self, config: HolisticConfig) -> Self {
        self.detector_config = config;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    fn resolved_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    pub fn run(
        &self,
        root_folder: &Path,
        output_folder: &Path,
        ledger_path: &Path,
    ) -> Result<BatchReport, BatchError> {
        let store = ArtifactStore::open(output_folder).map_err(|source| BatchError::OutputFolder {
            path: output_folder.to_path_buf(),
            source,
        })?;
        let existing = store.snapshot().map_err(|source| BatchError::Snapshot {
            path: output_folder.to_path_buf(),
            source,
        })?;
        let assets = discover_videos(root_folder).map_err(|source| BatchError::RootFolder {
            path: root_folder.to_path_buf(),
            source,
        })?;

        info!(
            "🔍 Found {} videos under {}, {} entries already in {}",
            assets.len(),
            root_folder.display(),
            existing.len(),
            output_folder.display()
        );

        let mut report = BatchReport::default();
        let mut pending = Vec::new();
        for asset in assets {
            let artifact = asset.artifact_name();
            if existing.contains(&artifact) {
                info!(
                    "⏭ Already exists, skipping: {} ({})",
                    asset.path.display(),
                    artifact
                );
                report.skipped += 1;
                report.skipped_videos.push(asset.path);
            } else {
                pending.push(asset);
            }
        }
        warn_on_collisions(&pending);

        let outcomes = self.execute(&pending, &store)?;

        let mut ledger = LabelLedger::new(ledger_path);
        for (asset, outcome) in pending.iter().zip(outcomes) {
            match outcome {
                Ok(record) => {
                    report.processed += 1;
                    report.labels.push(record.clone());
                    ledger.push(record);
                }
                Err(e) => {
                    report.failed += 1;
                    report.failures.push(FailedVideo {
                        path: asset.path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if let Err(source) = ledger.flush() {
            let records = ledger.pending().to_vec();
            error!(
                "❌ Label ledger flush failed for {}: {} ({} label records not written)",
                ledger_path.display(),
                source,
                records.len()
            );
            for record in &records {
                error!("❌ Unwritten label row: {},{}", record.artifact_name, record.numeric_label);
            }
            return Err(BatchError::LedgerFlush { records, source });
        }

        info!(
            "🏁 Batch finished: {} processed, {} skipped, {} failed",
            report.processed, report.skipped, report.failed
        );
        Ok(report)
    }

    fn execute(
        &self,
        pending: &[VideoAsset],
        store: &ArtifactStore,
    ) -> Result<Vec<Result<LabelRecord, VideoError>>, BatchError> {
        let workers = self.resolved_workers();
        if workers <= 1 || pending.len() <= 1 {
            return Ok(pending.iter().map(|asset| self.process(asset, store)).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("landmark-worker-{}", i))
            .build()
            .map_err(|e| BatchError::WorkerPool(e.to_string()))?;

        // 同名产物的视频放在同一组里按发现顺序执行，最后写入的与顺序执行一致
        let groups = artifact_groups(pending);
        info!(
            "🧵 Extracting {} videos ({} groups) on {} workers",
            pending.len(),
            groups.len(),
            workers
        );
        let grouped: Vec<Vec<(usize, Result<LabelRecord, VideoError>)>> = pool.install(|| {
            groups
                .par_iter()
                .map(|group| {
                    group
                        .iter()
                        .map(|&i| (i, self.process(&pending[i], store)))
                        .collect::<Vec<_>>()
                })
                .collect()
        });

        let mut outcomes: Vec<Option<Result<LabelRecord, VideoError>>> =
            pending.iter().map(|_| None).collect();
        for (i, outcome) in grouped.into_iter().flatten() {
            outcomes[i] = Some(outcome);
        }
        Ok(outcomes.into_iter().flatten().collect())
    }

    /// 提取 + 持久化；只有产物成功落盘才生成标签记录
    fn process(&self, asset: &VideoAsset, store: &ArtifactStore) -> Result<LabelRecord, VideoError> {
        let artifact = asset.artifact_name();
        info!("▶ Processing: {}", asset.path.display());

        let extractor =
            VideoLandmarkExtractor::new(self.opener, self.detectors, &self.detector_config);

        let outcome = extractor
            .extract(&asset.path)
            .map_err(VideoError::from)
            .and_then(|sequence| {
                store
                    .persist(&artifact, &sequence)
                    .map_err(|source| VideoError::Persistence {
                        artifact: artifact.clone(),
                        source,
                    })?;
                Ok(LabelRecord::new(artifact.clone(), &asset.id))
            });

        match &outcome {
            Ok(_) => info!("✔ Saved: {}", artifact),
            Err(e) => error!("❌ Failed: {} - {}", asset.path.display(), e),
        }
        outcome
    }
}

/// Indices of `pending` grouped by artifact name, groups and members in discovery order.
fn artifact_groups(pending: &[VideoAsset]) -> Vec<Vec<usize>> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, asset) in pending.iter().enumerate() {
        match by_name.get(&asset.artifact_name()) {
            Some(&group) => groups[group].push(i),
            None => {
                by_name.insert(asset.artifact_name(), groups.len());
                groups.push(vec![i]);
            }
        }
    }
    groups
}

/// 同名产物（不同分类下 id 相同）在同一次运行中都会被处理，后写入的覆盖先写入的
fn warn_on_collisions(pending: &[VideoAsset]) {
    let mut seen = HashSet::new();
    for asset in pending {
        let artifact = asset.artifact_name();
        if !seen.insert(artifact.clone()) {
            warn!(
                "⚠️ {} maps to {} which another video in this run also produces",
                asset.path.display(),
                artifact
            );
        }
    }
}

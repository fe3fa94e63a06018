use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::ledger::LabelRecord;
use crate::core::video::ExtractError;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("npy write error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
}

/// 单个视频失败，只记录不中断批处理
#[derive(Debug, Error)]
pub enum VideoError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("failed to persist {artifact}: {source}")]
    Persistence {
        artifact: String,
        #[source]
        source: PersistError,
    },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("cannot open ledger {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot sync ledger {path}: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 整个批次级别的错误，返回给调用方
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot prepare output folder {path}: {source}")]
    OutputFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot list output folder {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot list root folder {path}: {source}")]
    RootFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("worker pool error: {0}")]
    WorkerPool(String),
    /// `records` 是没写进账本的标签；对应产物已落盘，下次运行会被跳过
    #[error("label ledger flush failed, {} label records lost: {source}", .records.len())]
    LedgerFlush {
        records: Vec<LabelRecord>,
        #[source]
        source: LedgerError,
    },
}

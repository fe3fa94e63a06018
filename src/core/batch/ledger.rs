//! 标签账本：`file_name,label_id` CSV，只追加
//!
//! 运行期间标签记录只在内存中累积，批次结束时一次性追加到文件。
//! 已有的行从不改写，也不去重：删除产物后重跑会追加重复的标签行。

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use super::error::LedgerError;

pub const LEDGER_HEADER: [&str; 2] = ["file_name", "label_id"];

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));

/// 从视频 id 中提取数字作为标签，保持原顺序；没有数字时为空字符串
///
/// Digits are Unicode decimal digits (`Nd`). Superscripts and circled digits
/// such as `²` or `①` are not decimal digits and are dropped.
pub fn numeric_label(id: &str) -> String {
    DIGITS.find_iter(id).map(|m| m.as_str()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelRecord {
    pub artifact_name: String,
    pub numeric_label: String,
}

impl LabelRecord {
    pub fn new(artifact_name: impl Into<String>, video_id: &str) -> Self {
        Self {
            artifact_name: artifact_name.into(),
            numeric_label: numeric_label(video_id),
        }
    }
}

pub struct LabelLedger {
    path: PathBuf,
    pending: Vec<LabelRecord>,
}

impl LabelLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn push(&mut self, record: LabelRecord) {
        self.pending.push(record);
    }

    pub fn pending(&self) -> &[LabelRecord] {
        &self.pending
    }

    /// 追加所有待写记录，文件为空时先写表头。成功后清空内存批次，返回写入行数。
    ///
    /// On failure the pending records are kept so the caller can report or retry.
    pub fn flush(&mut self) -> Result<usize, LedgerError> {
        let open_error = |source| LedgerError::Open {
            path: self.path.clone(),
            source,
        };
        let write_error = |source| LedgerError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(open_error)?;
        let is_empty = file.metadata().map_err(open_error)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_empty {
            writer.write_record(LEDGER_HEADER).map_err(write_error)?;
        }
        for record in &self.pending {
            writer
                .write_record([record.artifact_name.as_str(), record.numeric_label.as_str()])
                .map_err(write_error)?;
        }

        let file = writer.into_inner().map_err(|e| LedgerError::Sync {
            path: self.path.clone(),
            source: e.into_error(),
        })?;
        file.sync_all().map_err(|source| LedgerError::Sync {
            path: self.path.clone(),
            source,
        })?;

        let written = self.pending.len();
        self.pending.clear();
        info!("📄 Label CSV saved: {} (+{} rows)", self.path.display(), written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_numeric_label() {
        assert_eq!(numeric_label("SIGN_0231"), "0231");
        assert_eq!(numeric_label("clipA"), "");
        assert_eq!(numeric_label("a1b2c3"), "123");
        assert_eq!(numeric_label("001"), "001");
    }

    #[test]
    fn test_numeric_label_decimal_digits_only() {
        // 阿拉伯-印度数字属于 Nd，保留
        assert_eq!(numeric_label("sign_٣4"), "٣4");
        assert_eq!(numeric_label("clip²"), "");
        assert_eq!(numeric_label("①word7"), "7");
    }

    #[test]
    fn test_flush_new_file_writes_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed/labels.csv");

        let mut ledger = LabelLedger::new(&path);
        ledger.push(LabelRecord::new("001.npy", "001"));
        ledger.push(LabelRecord::new("clipA.npy", "clipA"));

        assert_eq!(ledger.flush().unwrap(), 2);
        assert!(ledger.pending().is_empty());
        assert_eq!(
            read_lines(&path),
            vec!["file_name,label_id", "001.npy,001", "clipA.npy,"]
        );
    }

    #[test]
    fn test_flush_appends_without_second_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labels.csv");

        let mut first = LabelLedger::new(&path);
        first.push(LabelRecord::new("a1.npy", "a1"));
        first.flush().unwrap();

        let mut second = LabelLedger::new(&path);
        second.push(LabelRecord::new("b2.npy", "b2"));
        second.push(LabelRecord::new("a1.npy", "a1"));
        second.flush().unwrap();

        assert_eq!(
            read_lines(&path),
            vec!["file_name,label_id", "a1.npy,1", "b2.npy,2", "a1.npy,1"]
        );
    }

    #[test]
    fn test_empty_batch_only_creates_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labels.csv");

        let mut ledger = LabelLedger::new(&path);
        assert_eq!(ledger.flush().unwrap(), 0);
        assert_eq!(ledger.flush().unwrap(), 0);

        assert_eq!(read_lines(&path), vec!["file_name,label_id"]);
    }

    #[test]
    fn test_existing_empty_file_gets_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "").unwrap();

        let mut ledger = LabelLedger::new(&path);
        ledger.push(LabelRecord::new("x9.npy", "x9"));
        ledger.flush().unwrap();

        assert_eq!(read_lines(&path), vec!["file_name,label_id", "x9.npy,9"]);
    }

    #[test]
    fn test_flush_failure_keeps_pending() {
        let dir = tempdir().unwrap();
        // 账本路径是个目录，打开必然失败
        let path = dir.path().join("labels.csv");
        fs::create_dir_all(&path).unwrap();

        let mut ledger = LabelLedger::new(&path);
        ledger.push(LabelRecord::new("a.npy", "a"));

        assert!(matches!(ledger.flush(), Err(LedgerError::Open { .. })));
        assert_eq!(ledger.pending().len(), 1);
    }
}

//! 输入目录遍历：`root/<category>/<video-file>`

use log::warn;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 支持的视频后缀，大小写敏感（`.MP4` / `.Mp4` 不在其中）
pub const VIDEO_EXTENSIONS: [&str; 6] = [".mp4", ".avi", ".mts", ".MTS", ".mov", ".MOV"];

/// Extension of the persisted landmark arrays.
pub const ARTIFACT_EXTENSION: &str = "npy";

/// One input recording found during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub path: PathBuf,
    /// Name of the immediate parent folder.
    pub category: String,
    /// File name without its last extension.
    pub id: String,
}

impl VideoAsset {
    pub fn from_path(path: PathBuf, category: impl Into<String>) -> Option<Self> {
        let id = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self {
            path,
            category: category.into(),
            id,
        })
    }

    /// `<id>.npy`
    pub fn artifact_name(&self) -> String {
        format!("{}.{}", self.id, ARTIFACT_EXTENSION)
    }
}

pub fn is_video_file_name(name: &str) -> bool {
    VIDEO_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// 列出 root 下的所有视频，分类目录按名称排序，目录内文件也按名称排序
///
/// root 本身无法读取时返回错误；单个分类目录读取失败只记录警告并跳过。
pub fn discover_videos(root: &Path) -> io::Result<Vec<VideoAsset>> {
    let mut categories = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.path().is_dir() {
            categories.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    categories.sort();

    let mut assets = Vec::new();
    for (category, dir) in categories {
        match list_category(&dir, &category) {
            Ok(mut found) => assets.append(&mut found),
            Err(e) => warn!("⚠️ Cannot list category {}: {}", dir.display(), e),
        }
    }
    Ok(assets)
}

fn list_category(dir: &Path, category: &str) -> io::Result<Vec<VideoAsset>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_video_file_name(&name) && entry.path().is_file() {
            files.push((name, entry.path()));
        }
    }
    files.sort();

    Ok(files
        .into_iter()
        .filter_map(|(_, path)| VideoAsset::from_path(path, category))
        .collect())
}

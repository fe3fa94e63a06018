use log::debug;
use ndarray_npy::WriteNpyExt;
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::error::PersistError;
use crate::core::landmark::VideoLandmarkSequence;

/// 输出目录：产物 `.npy` 文件
///
/// 写入先落到同目录临时文件，fsync 后 rename 为最终文件名，所以目录中出现的
/// `<id>.npy` 一定是完整文件。
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens the output folder, creating it if missing.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, artifact_name: &str) -> PathBuf {
        self.dir.join(artifact_name)
    }

    /// 当前目录下所有条目名的快照（本次运行期间只读）
    pub fn snapshot(&self) -> io::Result<HashSet<String>> {
        let mut names = HashSet::new();
        for entry in fs::read_dir(&self.dir)? {
            names.insert(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    /// Writes the sequence as a `(frames, 225)` f64 `.npy` array.
    pub fn persist(
        &self,
        artifact_name: &str,
        sequence: &VideoLandmarkSequence,
    ) -> Result<PathBuf, PersistError> {
        let target = self.path_for(artifact_name);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            sequence.to_array().write_npy(&mut writer)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        // 失败时临时文件随 NamedTempFile 一起删除
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        debug!("💾 {} ({} frames)", target.display(), sequence.len());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::landmark::{vectorize, Landmark, FEATURE_LEN, HAND_LANDMARKS};
    use ndarray::Array2;
    use ndarray_npy::read_npy;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_dir() {
        let root = tempdir().unwrap();
        let dir = root.path().join("processed/npy");

        let store = ArtifactStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_persist_round_trip_shape() {
        let root = tempdir().unwrap();
        let store = ArtifactStore::open(root.path()).unwrap();

        let hand = vec![Landmark::new(0.25, 0.5, 0.75); HAND_LANDMARKS];
        let sequence: VideoLandmarkSequence =
            (0..3).map(|_| vectorize(None, Some(&hand), None)).collect();

        let path = store.persist("001.npy", &sequence).unwrap();
        let array: Array2<f64> = read_npy(&path).unwrap();

        assert_eq!(array.dim(), (3, FEATURE_LEN));
        assert_eq!(array[[2, 99]], 0.25);
        assert_eq!(array[[2, 0]], 0.0);
    }

    #[test]
    fn test_snapshot_lists_only_committed_files() {
        let root = tempdir().unwrap();
        let store = ArtifactStore::open(root.path()).unwrap();

        store.persist("a.npy", &VideoLandmarkSequence::new()).unwrap();
        store.persist("b.npy", &VideoLandmarkSequence::new()).unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("a.npy"));
        assert!(snapshot.contains("b.npy"));
    }

    #[test]
    fn test_persist_empty_sequence() {
        let root = tempdir().unwrap();
        let store = ArtifactStore::open(root.path()).unwrap();

        let path = store.persist("empty.npy", &VideoLandmarkSequence::new()).unwrap();
        let array: Array2<f64> = read_npy(&path).unwrap();
        assert_eq!(array.dim(), (0, FEATURE_LEN));
    }

    #[test]
    fn test_persist_into_missing_dir_fails() {
        let root = tempdir().unwrap();
        let store = ArtifactStore::open(root.path().join("out")).unwrap();
        fs::remove_dir(store.dir()).unwrap();

        assert!(store.persist("x.npy", &VideoLandmarkSequence::new()).is_err());
    }
}

//! 批处理：目录遍历 → 关键点提取 → `.npy` 产物 → 标签账本

pub mod artifact;
pub mod discovery;
pub mod error;
pub mod ledger;
pub mod traversal;

pub use artifact::ArtifactStore;
pub use discovery::{discover_videos, is_video_file_name, VideoAsset, ARTIFACT_EXTENSION, VIDEO_EXTENSIONS};
pub use error::{BatchError, LedgerError, PersistError, VideoError};
pub use ledger::{numeric_label, LabelLedger, LabelRecord, LEDGER_HEADER};
pub use traversal::{BatchReport, BatchTraversal, FailedVideo};

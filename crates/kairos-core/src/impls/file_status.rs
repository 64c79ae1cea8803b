//! FileStatusStore - ディレクトリ内に task_id ごとの status ファイルを置く
//!
//! `<dir>/<task_id>.status` に 1 行だけ書く。書き込みは一時ファイルに
//! 全体を書いてから rename するので、読み手は旧レコードか新レコードの
//! どちらかしか見ない。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::FixedOffset;

use crate::domain::{StatusRecord, TaskId};
use crate::ports::{StatusStore, StatusStoreError};

pub struct FileStatusStore {
    dir: PathBuf,
    offset: FixedOffset,
}

impl FileStatusStore {
    /// `offset` is used to interpret timestamps when reading records back.
    pub fn new(dir: impl Into<PathBuf>, offset: FixedOffset) -> Self {
        Self {
            dir: dir.into(),
            offset,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, task_id: &TaskId) -> PathBuf {
        self.dir.join(format!("{task_id}.status"))
    }

    fn temp_path(&self, task_id: &TaskId) -> PathBuf {
        self.dir
            .join(format!(".{task_id}.status.{}.tmp", std::process::id()))
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn write(
        &self,
        task_id: &TaskId,
        record: &StatusRecord,
    ) -> Result<(), StatusStoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self.temp_path(task_id);
        let mut content = record.render();
        content.push('\n');
        tokio::fs::write(&tmp, content).await?;

        if let Err(e) = tokio::fs::rename(&tmp, self.record_path(task_id)).await {
            // ignore cleanup error: the rename error is the one worth reporting
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read(&self, task_id: &TaskId) -> Result<Option<StatusRecord>, StatusStoreError> {
        match tokio::fs::read_to_string(self.record_path(task_id)).await {
            Ok(raw) => Ok(Some(StatusRecord::parse(&raw, self.offset)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

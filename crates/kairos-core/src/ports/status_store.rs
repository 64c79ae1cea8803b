//! StatusStore port - 外部からポーリングされる status の保存先
//!
//! task_id ごとに 1 レコード。書き込みは常に全体の上書き。
//! レコードが存在しない = そのタスクは一度も開始していない。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{StatusParseError, StatusRecord, TaskId};

#[derive(Debug, Error)]
pub enum StatusStoreError {
    #[error("status store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt status record: {0}")]
    Parse(#[from] StatusParseError),
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Overwrites the record for `task_id` in a single operation.
    async fn write(
        &self,
        task_id: &TaskId,
        record: &StatusRecord,
    ) -> Result<(), StatusStoreError>;

    async fn read(&self, task_id: &TaskId) -> Result<Option<StatusRecord>, StatusStoreError>;
}

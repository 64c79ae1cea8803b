//! InMemoryStatusStore - テスト・リハーサル用の status 保存先
//!
//! 現在値に加えて書き込み履歴（描画済み文字列）を保持し、
//! Running → Success のような遷移をそのまま検証できるようにする。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{StatusRecord, TaskId};
use crate::ports::{StatusStore, StatusStoreError};

#[derive(Default)]
struct Inner {
    current: HashMap<TaskId, StatusRecord>,
    history: Vec<(TaskId, String)>,
}

#[derive(Default)]
pub struct InMemoryStatusStore {
    inner: Mutex<Inner>,
    unreachable: AtomicBool,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write and read fail with an I/O error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Rendered records written for `task_id`, oldest first.
    pub async fn history(&self, task_id: &TaskId) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .history
            .iter()
            .filter(|(id, _)| id == task_id)
            .map(|(_, rendered)| rendered.clone())
            .collect()
    }

    fn check_reachable(&self) -> Result<(), StatusStoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StatusStoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "status store unreachable",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn write(
        &self,
        task_id: &TaskId,
        record: &StatusRecord,
    ) -> Result<(), StatusStoreError> {
        self.check_reachable()?;
        let mut inner = self.inner.lock().await;
        inner.history.push((task_id.clone(), record.render()));
        inner.current.insert(task_id.clone(), record.clone());
        Ok(())
    }

    async fn read(&self, task_id: &TaskId) -> Result<Option<StatusRecord>, StatusStoreError> {
        self.check_reachable()?;
        let inner = self.inner.lock().await;
        Ok(inner.current.get(task_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::civil::{default_offset, parse_target};
    use std::time::Duration;

    #[tokio::test]
    async fn write_overwrites_and_keeps_history() {
        let store = InMemoryStatusStore::new();
        let id = TaskId::new("krp").unwrap();
        let at = parse_target("2025-10-22 11:43:00", default_offset()).unwrap();

        assert!(store.read(&id).await.unwrap().is_none());

        store.write(&id, &StatusRecord::running(at)).await.unwrap();
        store
            .write(&id, &StatusRecord::success(at, Duration::from_secs(2)))
            .await
            .unwrap();

        let current = store.read(&id).await.unwrap().unwrap();
        assert_eq!(current.elapsed, Some(Duration::from_secs(2)));
        assert_eq!(
            store.history(&id).await,
            vec![
                "2025-10-22 11:43:00.000@Running".to_string(),
                "2025-10-22 11:43:00.000@Success#2.000s".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn unreachable_store_fails_writes() {
        let store = InMemoryStatusStore::new();
        store.set_unreachable(true);
        let id = TaskId::new("krp").unwrap();
        let at = parse_target("2025-10-22 11:43:00", default_offset()).unwrap();
        assert!(matches!(
            store.write(&id, &StatusRecord::running(at)).await,
            Err(StatusStoreError::Io(_))
        ));
    }
}

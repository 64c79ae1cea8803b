//! OrchestratorBuilder - TaskOrchestrator の構築とワイヤリング
//!
//! 必須の capability（status store / logger / driver）が欠けていれば
//! build() の時点で BuildError を返す。Clock だけは省略でき、
//! 省略時は SystemClock（UTC+09:00）を使う。

use std::sync::Arc;

use crate::app::orchestrator::TaskOrchestrator;
use crate::ports::{ActionDriver, Clock, Logger, StatusStore, SystemClock, UlidGenerator};

/// # 使用例
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .status_store(Arc::new(FileStatusStore::new("status", offset)))
///     .logger(logger)
///     .driver(Arc::new(driver))
///     .build()?;
/// ```
#[derive(Default)]
pub struct OrchestratorBuilder {
    clock: Option<Arc<dyn Clock>>,
    status_store: Option<Arc<dyn StatusStore>>,
    logger: Option<Arc<dyn Logger>>,
    driver: Option<Arc<dyn ActionDriver>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing {0}: it must be provided before build()")]
    Missing(&'static str),
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn status_store(mut self, status_store: Arc<dyn StatusStore>) -> Self {
        self.status_store = Some(status_store);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn driver(mut self, driver: Arc<dyn ActionDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn build(self) -> Result<TaskOrchestrator, BuildError> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::default()) as Arc<dyn Clock>);
        Ok(TaskOrchestrator {
            ids: UlidGenerator::new(clock.clone()),
            clock,
            status_store: self.status_store.ok_or(BuildError::Missing("status store"))?,
            logger: self.logger.ok_or(BuildError::Missing("logger"))?,
            driver: self.driver.ok_or(BuildError::Missing("action driver"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryStatusStore, MemoryLogger, ScriptedDriver};

    #[test]
    fn test_build_success() {
        let built = OrchestratorBuilder::new()
            .status_store(Arc::new(InMemoryStatusStore::new()))
            .logger(Arc::new(MemoryLogger::new()))
            .driver(Arc::new(ScriptedDriver::new(vec![])))
            .build();
        assert!(built.is_ok());
    }

    #[test]
    fn test_build_missing_driver() {
        let built = OrchestratorBuilder::new()
            .status_store(Arc::new(InMemoryStatusStore::new()))
            .logger(Arc::new(MemoryLogger::new()))
            .build();
        assert!(matches!(built, Err(BuildError::Missing("action driver"))));
    }

    #[test]
    fn test_build_missing_status_store() {
        let built = OrchestratorBuilder::new()
            .logger(Arc::new(MemoryLogger::new()))
            .driver(Arc::new(ScriptedDriver::new(vec![])))
            .build();
        assert!(matches!(built, Err(BuildError::Missing("status store"))));
    }
}

//! Errors - エラー型と分類
//!
//! Attempt 単位の失敗（Contested / Transient / Fatal）はエラーではなく
//! `AttemptOutcome` として Retry Engine の中で解決される。
//! ここに並ぶのは Engine の外へ伝播するものだけ。

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use super::civil::format_timestamp;

/// The target instant is not strictly in the future at task start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "invalid schedule: target {} is not after now {}",
    format_timestamp(.target),
    format_timestamp(.now)
)]
pub struct InvalidSchedule {
    pub target: DateTime<FixedOffset>,
    pub now: DateTime<FixedOffset>,
}

/// Failure reported by an Action Driver call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The call did not complete within its own bounded timeout.
    #[error("driver timeout: {0}")]
    Timeout(String),

    /// Anything else; invalidates the current surface context.
    #[error("driver failure: {0}")]
    Unexpected(String),
}

/// Errors that end a task outside the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error(transparent)]
    InvalidSchedule(#[from] InvalidSchedule),

    #[error("driver setup failed: {0}")]
    DriverSetup(DriverError),

    #[error("final commit failed: {0}")]
    DriverCommit(DriverError),
}

impl TaskError {
    /// One-line summary suitable for a status record.
    pub fn summary(&self) -> String {
        match self {
            TaskError::InvalidSchedule(_) => "invalid schedule".to_string(),
            TaskError::DriverSetup(e) => format!("driver setup failed: {}", e.detail()),
            TaskError::DriverCommit(e) => format!("final commit failed: {}", e.detail()),
        }
    }
}

impl DriverError {
    pub fn detail(&self) -> &str {
        match self {
            DriverError::Timeout(d) | DriverError::Unexpected(d) => d,
        }
    }
}

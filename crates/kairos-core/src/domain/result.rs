//! Task result returned by the orchestrator.

use serde::{Deserialize, Serialize};

use super::state::TerminationReason;

/// Final result of one task run.
///
/// Constructed only through [`TaskResult::acquired`] and [`TaskResult::failed`]
/// so that `succeeded == true` always comes with `TerminationReason::Acquired`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub succeeded: bool,
    /// Probes performed by the retry loop; 0 when the loop never started.
    pub attempts: u32,
    pub elapsed_seconds: f64,
    pub termination_reason: TerminationReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
}

impl TaskResult {
    pub fn acquired(attempts: u32, elapsed_seconds: f64) -> Self {
        Self {
            succeeded: true,
            attempts,
            elapsed_seconds,
            termination_reason: TerminationReason::Acquired,
            error_summary: None,
        }
    }

    pub fn failed(
        reason: TerminationReason,
        attempts: u32,
        elapsed_seconds: f64,
        error_summary: Option<String>,
    ) -> Self {
        Self {
            succeeded: false,
            attempts,
            elapsed_seconds,
            termination_reason: reason,
            error_summary,
        }
    }

    /// Summary written into the status record for a failed run.
    pub fn failure_summary(&self) -> String {
        match &self.error_summary {
            Some(s) => s.clone(),
            None => self.termination_reason.as_str().to_string(),
        }
    }

    /// Process exit code: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded { 0 } else { 1 }
    }
}
